//! Reply generation boundary.
//!
//! Backend failures stop here: the caller always gets text back.

use crate::providers::{ChatBackend, ChatMessage, Conversation};

/// Reply used when the backend fails.
pub const DEFAULT_FALLBACK_REPLY: &str =
    "Oops, I had trouble thinking there. Can we try a different topic?";

/// Result of one generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub reply: String,
    /// History including the prompt and the reply
    pub history: Conversation,
    /// Whether `reply` is the fallback
    pub fell_back: bool,
}

/// Wraps a [`ChatBackend`] and never fails.
pub struct Generator<B> {
    backend: B,
    fallback: String,
}

impl<B: ChatBackend> Generator<B> {
    pub fn new(backend: B) -> Self {
        Self::with_fallback(backend, DEFAULT_FALLBACK_REPLY)
    }

    pub fn with_fallback(backend: B, fallback: impl Into<String>) -> Self {
        Self {
            backend,
            fallback: fallback.into(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Appends `prompt` to `history`, asks the backend for a reply and
    /// appends that too. On failure the fallback reply is recorded instead.
    pub async fn generate(&self, prompt: &str, mut history: Conversation) -> Turn {
        history.push(ChatMessage::user(prompt));

        let (reply, fell_back) = match self.backend.complete(history.messages()).await {
            Ok(reply) => (reply, false),
            Err(err) => {
                tracing::warn!(kind = %err.kind, error = %err, "reply generation failed");
                (self.fallback.clone(), true)
            }
        };

        history.push(ChatMessage::assistant(reply.clone()));
        Turn {
            reply,
            history,
            fell_back,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::providers::{ProviderError, ProviderResult, Role};

    /// Backend that answers from a script and records what it was sent.
    struct ScriptedBackend {
        replies: Mutex<Vec<ProviderResult<String>>>,
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedBackend {
        fn new(replies: Vec<ProviderResult<String>>) -> Self {
            Self {
                replies: Mutex::new(replies),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl ChatBackend for ScriptedBackend {
        async fn complete(&self, messages: &[ChatMessage]) -> ProviderResult<String> {
            self.seen.lock().unwrap().push(messages.to_vec());
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                return Err(ProviderError::api_error("script exhausted"));
            }
            replies.remove(0)
        }
    }

    #[tokio::test]
    async fn test_generate_appends_prompt_and_reply() {
        let generator = Generator::new(ScriptedBackend::new(vec![Ok("Hello!".to_string())]));
        let history = Conversation::new(Some("You are a good friend."));

        let turn = generator.generate("hi", history).await;

        assert_eq!(turn.reply, "Hello!");
        assert!(!turn.fell_back);
        let roles: Vec<Role> = turn.history.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant]);

        // the backend saw the prompt but not the reply
        let seen = generator.backend().seen.lock().unwrap();
        assert_eq!(seen[0].len(), 2);
        assert_eq!(seen[0][1], ChatMessage::user("hi"));
    }

    #[tokio::test]
    async fn test_generate_falls_back_on_failure() {
        let generator = Generator::new(ScriptedBackend::new(vec![Err(ProviderError::timeout(
            "Request timed out",
        ))]));

        let turn = generator.generate("hi", Conversation::default()).await;

        assert_eq!(turn.reply, DEFAULT_FALLBACK_REPLY);
        assert!(turn.fell_back);
        assert_eq!(
            turn.history.last(),
            Some(&ChatMessage::assistant(DEFAULT_FALLBACK_REPLY))
        );
    }

    #[tokio::test]
    async fn test_custom_fallback() {
        let generator = Generator::with_fallback(ScriptedBackend::new(vec![]), "Ribbon jammed.");
        let turn = generator.generate("hi", Conversation::default()).await;
        assert_eq!(turn.reply, "Ribbon jammed.");
    }

    #[tokio::test]
    async fn test_history_accumulates_across_turns() {
        let generator = Generator::new(ScriptedBackend::new(vec![
            Ok("one".to_string()),
            Ok("two".to_string()),
        ]));

        let first = generator.generate("a", Conversation::default()).await;
        let second = generator.generate("b", first.history).await;

        assert_eq!(second.history.len(), 4);
        let seen = generator.backend().seen.lock().unwrap();
        assert_eq!(seen[1].len(), 3);
    }
}
