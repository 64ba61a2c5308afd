//! Prompt file helpers.

/// System prompt used when neither `system_prompt` nor `system_prompt_file`
/// is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/system_prompt.md"
));
