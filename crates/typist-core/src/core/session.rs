//! Conversation session: read a line, generate a reply, type it back.

use crate::config::SessionConfig;
use crate::core::collector::LineCollector;
use crate::core::format;
use crate::core::generator::Generator;
use crate::core::typing::{EmitReport, Pacing, TypingEmulator};
use crate::providers::{ChatBackend, Conversation};
use crate::transport::{Transport, TransportResult};

/// What happened during one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnSummary {
    pub user_message: String,
    pub reply: String,
    pub fell_back: bool,
    pub emitted: EmitReport,
}

/// Drives one conversation over one transport.
///
/// The session owns the transport and the history; all transport access is
/// sequential from this loop.
pub struct Session<T, B, P> {
    transport: T,
    collector: LineCollector,
    generator: Generator<B>,
    emulator: TypingEmulator<P>,
    history: Conversation,
    settings: SessionConfig,
}

impl<T, B, P> Session<T, B, P>
where
    T: Transport,
    B: ChatBackend,
    P: Pacing,
{
    pub fn new(
        transport: T,
        generator: Generator<B>,
        emulator: TypingEmulator<P>,
        history: Conversation,
        settings: SessionConfig,
    ) -> Self {
        Self {
            transport,
            collector: LineCollector::new(settings.poll_interval()),
            generator,
            emulator,
            history,
            settings,
        }
    }

    pub fn history(&self) -> &Conversation {
        &self.history
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Types `text` the way replies are typed: wrapped, behind the prompt
    /// marker.
    ///
    /// # Errors
    /// Returns the first transport fault.
    pub async fn say(&mut self, text: &str) -> TransportResult<EmitReport> {
        let formatted = format::format(text, self.settings.width, self.settings.indent);
        self.emulator
            .emit(&mut self.transport, &formatted, &self.settings.prompt_marker)
            .await
    }

    /// Runs one exchange: collect, generate, format, emit.
    ///
    /// # Errors
    /// Returns the first transport fault. Generation failures are not
    /// errors; they produce the fallback reply.
    pub async fn run_turn(&mut self) -> TransportResult<TurnSummary> {
        let user_message = self.collector.collect_line(&mut self.transport).await?;
        tracing::info!(message = %user_message, "line received");

        let history = std::mem::take(&mut self.history);
        let turn = self.generator.generate(&user_message, history).await;
        self.history = turn.history;
        tracing::info!(reply = %turn.reply, fell_back = turn.fell_back, "reply ready");

        let emitted = self.say(&turn.reply).await?;
        Ok(TurnSummary {
            user_message,
            reply: turn.reply,
            fell_back: turn.fell_back,
            emitted,
        })
    }

    /// Types the greeting, if any, then runs exchanges until the transport
    /// fails. There is no other way out.
    ///
    /// # Errors
    /// Returns the transport fault that ended the session.
    pub async fn run(&mut self) -> TransportResult<()> {
        if let Some(greeting) = self.settings.effective_greeting().map(str::to_string) {
            self.say(&greeting).await?;
        }
        loop {
            let summary = self.run_turn().await?;
            tracing::debug!(
                turns = self.history.len() / 2,
                typos = summary.emitted.typos,
                "exchange complete"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::core::generator::DEFAULT_FALLBACK_REPLY;
    use crate::core::typing::InstantPacing;
    use crate::providers::{ChatMessage, ProviderError, ProviderResult, Role};
    use crate::transport::{MemoryTransport, TransportErrorKind};

    struct QueueBackend(Mutex<Vec<ProviderResult<String>>>);

    impl QueueBackend {
        fn new(replies: Vec<ProviderResult<String>>) -> Self {
            Self(Mutex::new(replies))
        }
    }

    impl ChatBackend for QueueBackend {
        async fn complete(&self, _messages: &[ChatMessage]) -> ProviderResult<String> {
            let mut replies = self.0.lock().unwrap();
            if replies.is_empty() {
                return Err(ProviderError::api_error("no more replies"));
            }
            replies.remove(0)
        }
    }

    fn session(
        input: &str,
        replies: Vec<ProviderResult<String>>,
        settings: SessionConfig,
    ) -> Session<MemoryTransport, QueueBackend, InstantPacing> {
        Session::new(
            MemoryTransport::with_input(input),
            Generator::new(QueueBackend::new(replies)),
            TypingEmulator::new(InstantPacing::default()),
            Conversation::new(Some("You are a good friend.")),
            settings,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_turn_echoes_input_then_types_reply() {
        let mut session = session(
            "hello\r",
            vec![Ok("Hi back.".to_string())],
            SessionConfig::default(),
        );

        let summary = session.run_turn().await.unwrap();

        assert_eq!(summary.user_message, "hello");
        assert_eq!(summary.reply, "Hi back.");
        assert!(!summary.fell_back);
        assert_eq!(
            session.transport().output_string(),
            "  hello\r     > Hi back.\r"
        );
        let roles: Vec<Role> = session.history().messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_reply_is_wrapped_with_hanging_indent() {
        let settings = SessionConfig {
            width: 12,
            indent: 3,
            prompt_marker: "> ".to_string(),
            ..Default::default()
        };
        let mut session = session(
            "q\r",
            vec![Ok("one two three four".to_string())],
            settings,
        );

        session.run_turn().await.unwrap();

        assert_eq!(
            session.transport().output_string(),
            "  q\r> one two\r   three four\r"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_generation_failure_types_fallback() {
        let mut session = session(
            "hi\r",
            vec![Err(ProviderError::timeout("slow"))],
            SessionConfig {
                width: 200,
                ..Default::default()
            },
        );

        let summary = session.run_turn().await.unwrap();

        assert!(summary.fell_back);
        assert!(
            session
                .transport()
                .output_string()
                .ends_with(&format!("> {DEFAULT_FALLBACK_REPLY}\r"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_greets_then_stops_on_transport_fault() {
        let settings = SessionConfig {
            greeting: Some("Hey there.".to_string()),
            ..Default::default()
        };
        let mut session = session("", vec![], settings);
        session.transport_mut().fail_writes();

        let err = session.run().await.unwrap_err();

        assert_eq!(err.kind, TransportErrorKind::Write);
        assert_eq!(session.history().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_carries_across_turns() {
        let mut session = session(
            "one\rtwo\r",
            vec![Ok("first".to_string()), Ok("second".to_string())],
            SessionConfig::default(),
        );

        session.run_turn().await.unwrap();
        let summary = session.run_turn().await.unwrap();

        assert_eq!(summary.user_message, "two");
        assert_eq!(session.history().len(), 5);
        assert_eq!(
            session.history().last(),
            Some(&ChatMessage::assistant("second"))
        );
    }
}
