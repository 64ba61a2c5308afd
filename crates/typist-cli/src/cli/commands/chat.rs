//! Chat command handler.

use std::sync::Arc;

use anyhow::{Context, Result};
use typist_core::config::Config;
use typist_core::core::generator::Generator;
use typist_core::core::session::Session;
use typist_core::core::typing::{RandomPacing, TypingEmulator};
use typist_core::providers::{Conversation, OpenAIChatClient, OpenAIChatConfig};
use typist_core::transport::SerialTransport;

use crate::cli::Interrupted;

pub async fn run(config: &Config) -> Result<()> {
    let system_prompt = config.effective_system_prompt()?;
    let client_config =
        OpenAIChatConfig::from_provider(&config.provider).context("configure chat backend")?;
    let client = OpenAIChatClient::new(client_config)?;
    let transport = SerialTransport::open(&config.serial).context("open serial port")?;

    tracing::info!(
        port = config.serial.effective_port().unwrap_or_default(),
        baud = config.serial.baud_rate,
        model = client.model(),
        "session started"
    );

    let mut session = Session::new(
        transport,
        Generator::with_fallback(client, config.session.fallback_reply.clone()),
        TypingEmulator::new(RandomPacing::new(Arc::new(config.typing.clone()))),
        Conversation::new(Some(system_prompt.as_str())),
        config.session.clone(),
    );

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    tokio::select! {
        result = session.run() => result.context("session ended"),
        _ = &mut ctrl_c => {
            tracing::info!("interrupted");
            Err(Interrupted.into())
        }
    }
}
