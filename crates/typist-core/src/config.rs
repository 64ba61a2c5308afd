//! Configuration management for typist.
//!
//! Loads configuration from ${TYPIST_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::core::format::{DEFAULT_INDENT, DEFAULT_WIDTH};
use crate::core::generator::DEFAULT_FALLBACK_REPLY;
use crate::core::typing::TypingProfile;
use crate::transport::SerialSettings;

/// Returns the default config template with comments.
///
/// This is embedded from default_config.toml at compile time.
/// To update, edit default_config.toml directly.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

/// Recursively merges items from source table into target table.
fn merge_items(target: &mut toml_edit::Table, source: &toml_edit::Table) {
    use toml_edit::Item;

    for (key, value) in source {
        match value {
            Item::Value(v) => {
                target[key] = Item::Value(v.clone());
            }
            Item::Table(src_table) => {
                if let Some(Item::Table(target_table)) = target.get_mut(key) {
                    merge_items(target_table, src_table);
                } else {
                    target[key] = Item::Table(src_table.clone());
                }
            }
            Item::ArrayOfTables(src_arr) => {
                target[key] = Item::ArrayOfTables(src_arr.clone());
            }
            Item::None => {}
        }
    }
}

pub mod paths {
    //! Path resolution for typist configuration.
    //!
    //! TYPIST_HOME resolution order:
    //! 1. TYPIST_HOME environment variable (if set)
    //! 2. ~/.config/typist (default)

    use std::path::PathBuf;

    use anyhow::{Context, Result};

    /// Returns the typist home directory.
    ///
    /// # Errors
    /// Returns an error when TYPIST_HOME is unset and no home directory can
    /// be determined.
    pub fn typist_home() -> Result<PathBuf> {
        if let Ok(home) = std::env::var("TYPIST_HOME")
            && !home.trim().is_empty()
        {
            return Ok(PathBuf::from(home));
        }

        dirs::home_dir()
            .map(|h| h.join(".config").join("typist"))
            .context("Could not determine home directory; set TYPIST_HOME")
    }

    /// Returns the path to the config.toml file.
    ///
    /// # Errors
    /// See [`typist_home`].
    pub fn config_path() -> Result<PathBuf> {
        Ok(typist_home()?.join("config.toml"))
    }
}

/// Chat backend configuration (`[provider]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Optional API key (overrides OPENAI_API_KEY).
    pub api_key: Option<String>,
    /// Optional API base URL (for proxies and compatible servers).
    pub base_url: Option<String>,
    pub model: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub frequency_penalty: Option<f64>,
    /// Request timeout in seconds (0 disables)
    pub request_timeout_secs: u64,
}

impl ProviderConfig {
    const DEFAULT_MODEL: &str = "gpt-4o-mini";
    const DEFAULT_MAX_TOKENS: u32 = 512;
    const DEFAULT_TEMPERATURE: f64 = 0.94;
    const DEFAULT_TOP_P: f64 = 1.0;
    const DEFAULT_FREQUENCY_PENALTY: f64 = 0.2;
    const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: Self::DEFAULT_MODEL.to_string(),
            max_tokens: Some(Self::DEFAULT_MAX_TOKENS),
            temperature: Some(Self::DEFAULT_TEMPERATURE),
            top_p: Some(Self::DEFAULT_TOP_P),
            frequency_penalty: Some(Self::DEFAULT_FREQUENCY_PENALTY),
            request_timeout_secs: Self::DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Conversation loop settings (`[session]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Column budget for wrapped replies
    pub width: usize,
    /// Spaces in front of every continuation line
    pub indent: usize,
    /// Written untouched before every reply
    pub prompt_marker: String,
    /// Typed once when the session starts
    pub greeting: Option<String>,
    /// Typed when the chat backend fails
    pub fallback_reply: String,
    /// Wait between input polls while the device is idle
    pub poll_interval_ms: u64,
}

impl SessionConfig {
    const DEFAULT_PROMPT_MARKER: &str = "     > ";
    const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Returns the greeting if set and non-empty.
    pub fn effective_greeting(&self) -> Option<&str> {
        self.greeting
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            indent: DEFAULT_INDENT,
            prompt_marker: Self::DEFAULT_PROMPT_MARKER.to_string(),
            greeting: None,
            fallback_reply: DEFAULT_FALLBACK_REPLY.to_string(),
            poll_interval_ms: Self::DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Optional inline system prompt
    pub system_prompt: Option<String>,

    /// Optional path to a file containing the system prompt
    pub system_prompt_file: Option<String>,

    /// Serial line settings
    pub serial: SerialSettings,

    /// Keystroke timing and typo behaviour
    pub typing: TypingProfile,

    /// Chat backend
    pub provider: ProviderConfig,

    /// Conversation loop
    pub session: SessionConfig,
}

impl Config {
    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the path cannot be resolved or the file is invalid.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path()?)
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Returns the effective system prompt, preferring the file if both are
    /// set. Falls back to the built-in prompt when neither is.
    ///
    /// # Errors
    /// Returns an error if `system_prompt_file` cannot be read.
    pub fn effective_system_prompt(&self) -> Result<String> {
        if let Some(path_str) = &self.system_prompt_file {
            let content = fs::read_to_string(path_str)
                .with_context(|| format!("Failed to read system prompt file: {path_str}"))?;
            let trimmed = content.trim();
            if !trimmed.is_empty() {
                return Ok(trimmed.to_string());
            }
        }

        let inline = self.system_prompt.as_deref().unwrap_or("").trim();
        if inline.is_empty() {
            Ok(crate::prompts::DEFAULT_SYSTEM_PROMPT.trim().to_string())
        } else {
            Ok(inline.to_string())
        }
    }

    /// Rejects settings that would misbehave at runtime.
    ///
    /// # Errors
    /// Returns an error naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        self.typing.validate()?;
        if self.session.width == 0 {
            bail!("session.width must be at least 1");
        }
        if self.session.indent >= self.session.width {
            bail!(
                "session.indent ({}) must be smaller than session.width ({})",
                self.session.indent,
                self.session.width
            );
        }
        if self.session.poll_interval_ms == 0 {
            bail!("session.poll_interval_ms must be positive");
        }
        if self.serial.baud_rate == 0 {
            bail!("serial.baud_rate must be positive");
        }
        Ok(())
    }

    /// Creates a default config file at the given path.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Generates a fresh config TOML from Rust defaults.
    ///
    /// This is used by `xtask update-default-config` to keep
    /// `default_config.toml` in sync with Rust default values.
    ///
    /// # Errors
    /// Returns an error if the defaults or the template fail to round-trip.
    pub fn generate() -> Result<String> {
        use toml_edit::DocumentMut;

        let generated_toml = toml::to_string(&Config::default())
            .context("Failed to serialize default config to TOML")?;

        // Template keeps the comments, generated values win
        let mut doc: DocumentMut = default_config_template()
            .parse()
            .context("Failed to parse default config template")?;
        let generated_doc: DocumentMut = generated_toml
            .parse()
            .context("Failed to parse generated config")?;

        merge_items(doc.as_table_mut(), generated_doc.as_table());

        Ok(doc.to_string())
    }

    /// Writes config content to a file, creating parent directories as needed.
    /// Uses atomic write (temp file + rename) to prevent corruption.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;
    use crate::core::typing::DelayRange;
    use crate::transport::FlowControlSetting;

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nonexistent.toml");

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.serial.baud_rate, 1200);
        assert_eq!(config.session.prompt_marker, "     > ");
    }

    #[test]
    fn test_load_partial_config_merges_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(
            &config_path,
            "[serial]\nport = \"/dev/ttyUSB0\"\n\n[typing]\ntypo_probability = 0.1\n",
        )
        .unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.serial.effective_port(), Some("/dev/ttyUSB0"));
        assert_eq!(config.serial.flow_control, FlowControlSetting::Software);
        assert!((config.typing.typo_probability - 0.1).abs() < f64::EPSILON);
        assert_eq!(config.typing.keystroke, DelayRange::new(50, 200));
        assert_eq!(config.provider.max_tokens, Some(512));
    }

    #[test]
    fn test_load_invalid_toml_names_path() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "[serial\n").unwrap();

        let err = Config::load_from(&config_path).unwrap_err();
        assert!(format!("{err:#}").contains("config.toml"));
    }

    #[test]
    fn test_init_creates_config_with_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("subdir").join("config.toml");

        Config::init(&config_path).unwrap();

        assert!(config_path.exists());
        let contents = fs::read_to_string(&config_path).unwrap();
        assert!(contents.contains("# typist configuration"));
        assert!(contents.contains("# port ="));

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_init_fails_if_exists() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(&config_path, "").unwrap();

        assert!(Config::init(&config_path).is_err());
    }

    #[test]
    fn test_generate_matches_defaults_and_keeps_comments() {
        let generated = Config::generate().unwrap();

        assert!(generated.contains("# typist configuration"));
        let parsed: Config = toml::from_str(&generated).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_system_prompt_file_wins_over_inline() {
        let dir = tempdir().unwrap();
        let prompt_file = dir.path().join("prompt.txt");
        fs::write(&prompt_file, "file prompt\n").unwrap();

        let config = Config {
            system_prompt_file: Some(prompt_file.to_str().unwrap().to_string()),
            system_prompt: Some("inline prompt".to_string()),
            ..Default::default()
        };

        assert_eq!(config.effective_system_prompt().unwrap(), "file prompt");
    }

    #[test]
    fn test_system_prompt_defaults_to_builtin() {
        let config = Config {
            system_prompt: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.effective_system_prompt().unwrap(),
            crate::prompts::DEFAULT_SYSTEM_PROMPT.trim()
        );
    }

    #[test]
    fn test_missing_system_prompt_file_is_error() {
        let config = Config {
            system_prompt_file: Some("/nonexistent/typist/prompt.md".to_string()),
            ..Default::default()
        };
        assert!(config.effective_system_prompt().is_err());
    }

    #[test]
    fn test_validate_rejects_indent_wider_than_width() {
        let config = Config {
            session: SessionConfig {
                width: 4,
                indent: 4,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("session.indent"));
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_zero_poll_interval() {
        let config = Config {
            session: SessionConfig {
                poll_interval_ms: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("session.poll_interval_ms"));
    }

    #[test]
    fn test_validate_rejects_zero_settle() {
        let mut config = Config::default();
        config.typing.settle_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("typing.settle_ms"));
    }

    #[test]
    fn test_request_timeout_zero_disables() {
        let provider = ProviderConfig {
            request_timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(provider.request_timeout(), None);
        assert_eq!(
            ProviderConfig::default().request_timeout(),
            Some(Duration::from_secs(60))
        );
    }

    #[test]
    fn test_blank_greeting_is_none() {
        let session = SessionConfig {
            greeting: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(session.effective_greeting(), None);
    }
}
