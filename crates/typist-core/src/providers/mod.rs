//! Chat backends for reply generation.

pub mod openai;
pub mod shared;

use std::future::Future;

pub use openai::{OpenAIChatClient, OpenAIChatConfig};
pub use shared::{
    ChatMessage, Conversation, ProviderError, ProviderErrorKind, ProviderResult, Role,
    resolve_api_key, resolve_base_url,
};

/// A text generator that may fail.
///
/// Failures are converted to a fallback reply by
/// [`Generator`](crate::core::generator::Generator), never by the backend.
pub trait ChatBackend {
    /// Produces the assistant's next message for `messages`.
    fn complete(
        &self,
        messages: &[ChatMessage],
    ) -> impl Future<Output = ProviderResult<String>> + Send;
}
