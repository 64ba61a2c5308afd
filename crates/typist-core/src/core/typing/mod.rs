//! Typing emulator: sends a message one keystroke at a time, with human
//! pauses and the occasional visible, corrected typo.

mod pacing;
mod profile;

use std::time::Duration;

pub use pacing::{InstantPacing, Pacing, Pause, RandomPacing};
pub use profile::{DelayRange, TypingProfile};

use crate::core::ascii;
use crate::transport::{BACKSPACE, CARRIAGE_RETURN, Transport, TransportResult};

/// Counters from one `emit` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitReport {
    /// Characters of the message written (prefix and terminator excluded)
    pub keystrokes: usize,
    /// Typo + backspace pairs injected
    pub typos: usize,
}

/// Streams text to a transport at human pace.
#[derive(Debug, Clone)]
pub struct TypingEmulator<P> {
    pacing: P,
}

impl<P: Pacing> TypingEmulator<P> {
    pub fn new(pacing: P) -> Self {
        Self { pacing }
    }

    pub fn pacing(&self) -> &P {
        &self.pacing
    }

    /// Types `message` after writing `clean_prefix` verbatim.
    ///
    /// The message is transliterated to ASCII first. A carriage return and
    /// the settle pause always follow, since the device commits the line on
    /// the carriage return.
    ///
    /// # Errors
    /// Any write or flush failure is returned immediately; output already
    /// typed is not resumed.
    pub async fn emit<T>(
        &mut self,
        transport: &mut T,
        message: &str,
        clean_prefix: &str,
    ) -> TransportResult<EmitReport>
    where
        T: Transport + ?Sized,
    {
        if !clean_prefix.is_empty() {
            transport.write(&ascii::encode_lossy(clean_prefix))?;
            transport.flush()?;
        }

        let mut report = EmitReport::default();
        for c in ascii::transliterate(message).chars() {
            if self.type_char(transport, c).await? {
                report.typos += 1;
            }
            report.keystrokes += 1;
        }

        transport.write(&[CARRIAGE_RETURN])?;
        transport.flush()?;
        hold(self.pacing.delay(Pause::Settle)).await;

        tracing::debug!(
            keystrokes = report.keystrokes,
            typos = report.typos,
            "message emitted"
        );
        Ok(report)
    }

    /// Types one character. Returns whether a typo was shown first.
    async fn type_char<T>(&mut self, transport: &mut T, c: char) -> TransportResult<bool>
    where
        T: Transport + ?Sized,
    {
        let mut typo = false;
        if self.pacing.should_typo()
            && let Some(wrong) = self.pacing.pick_substitute(c)
        {
            transport.write(&[ascii::encode_char(wrong)])?;
            transport.flush()?;
            hold(self.pacing.delay(Pause::TypoDisplay)).await;

            transport.write(&[BACKSPACE])?;
            transport.flush()?;
            hold(self.pacing.delay(Pause::TypoCorrection)).await;
            typo = true;
        }

        transport.write(&[ascii::encode_char(c)])?;
        transport.flush()?;
        hold(self.pacing.delay(Pause::Keystroke)).await;

        match c {
            '.' | ',' | '?' | '!' => hold(self.pacing.delay(Pause::Punctuation)).await,
            ' ' => hold(self.pacing.delay(Pause::Whitespace)).await,
            _ => {}
        }
        Ok(typo)
    }
}

async fn hold(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
