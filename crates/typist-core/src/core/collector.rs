//! Line collector: reads what the operator types, echoing it back with a
//! left margin, until a carriage return.

use std::time::Duration;

use crate::core::ascii;
use crate::transport::{CARRIAGE_RETURN, LINE_FEED, Transport, TransportResult};

/// Written before the first byte of every echoed line.
pub const MARGIN: &[u8] = b"  ";

/// Wait between polls when nothing is buffered.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EchoState {
    AwaitingMargin,
    InLine,
}

/// Collects one line per call from a polled transport.
///
/// A line feed re-arms the margin but only a carriage return completes the
/// line, so a device that sends bare line feeds is never answered.
#[derive(Debug, Clone)]
pub struct LineCollector {
    poll_interval: Duration,
}

impl Default for LineCollector {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl LineCollector {
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    /// Waits for a carriage return and returns the line before it.
    ///
    /// Every byte read is echoed; bytes that are not ASCII are dropped from
    /// the returned text. There is no timeout.
    ///
    /// # Errors
    /// Returns the first transport fault.
    pub async fn collect_line<T>(&self, transport: &mut T) -> TransportResult<String>
    where
        T: Transport + ?Sized,
    {
        let mut line = Vec::new();
        let mut state = EchoState::AwaitingMargin;

        loop {
            if transport.bytes_available()? == 0 {
                tokio::time::sleep(self.poll_interval).await;
                continue;
            }
            let Some(byte) = transport.read_byte()? else {
                tokio::time::sleep(self.poll_interval).await;
                continue;
            };

            if state == EchoState::AwaitingMargin {
                transport.write(MARGIN)?;
                state = EchoState::InLine;
            }
            transport.write(&[byte])?;
            transport.flush()?;

            if byte == LINE_FEED || byte == CARRIAGE_RETURN {
                state = EchoState::AwaitingMargin;
            }
            if byte == CARRIAGE_RETURN {
                break;
            }
            line.push(byte);
        }

        let text = ascii::decode_lenient(&line);
        tracing::debug!(bytes = line.len() + 1, "line collected");
        Ok(text)
    }
}
