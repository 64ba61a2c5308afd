//! Type command handler: one message, no conversation.

use std::sync::Arc;

use anyhow::{Context, Result};
use typist_core::config::Config;
use typist_core::core::format;
use typist_core::core::typing::{InstantPacing, RandomPacing, TypingEmulator};
use typist_core::transport::SerialTransport;

pub async fn run(config: &Config, text: &str, clean: bool) -> Result<()> {
    let mut transport = SerialTransport::open(&config.serial).context("open serial port")?;
    let formatted = format::format(text, config.session.width, config.session.indent);

    let report = if clean {
        TypingEmulator::new(InstantPacing::for_profile(&config.typing))
            .emit(&mut transport, &formatted, "")
            .await
    } else {
        let pacing = RandomPacing::new(Arc::new(config.typing.clone()));
        TypingEmulator::new(pacing)
            .emit(&mut transport, &formatted, "")
            .await
    };
    let report = report.context("type message")?;

    tracing::info!(
        keystrokes = report.keystrokes,
        typos = report.typos,
        "message typed"
    );
    Ok(())
}
