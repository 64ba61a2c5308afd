use std::collections::VecDeque;

use super::{Transport, TransportError, TransportResult};

/// In-memory transport.
///
/// Input bytes are queued up front (or pushed later); written bytes stay
/// pending until `flush`, so only flushed output is visible through
/// [`MemoryTransport::output`].
#[derive(Debug, Default)]
pub struct MemoryTransport {
    input: VecDeque<u8>,
    pending: Vec<u8>,
    output: Vec<u8>,
    flushes: usize,
    fail_writes: bool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport whose read side yields `input`.
    pub fn with_input(input: impl AsRef<[u8]>) -> Self {
        let mut transport = Self::new();
        transport.push_input(input);
        transport
    }

    /// Queues more bytes on the read side.
    pub fn push_input(&mut self, input: impl AsRef<[u8]>) {
        self.input.extend(input.as_ref());
    }

    /// Bytes that have been written and flushed.
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Flushed output decoded lossily, for assertions.
    pub fn output_string(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }

    /// Bytes written but not flushed yet.
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    /// Number of successful flushes.
    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    /// Bytes not yet consumed from the read side.
    pub fn remaining_input(&self) -> usize {
        self.input.len()
    }

    /// Makes every subsequent write fail.
    pub fn fail_writes(&mut self) {
        self.fail_writes = true;
    }
}

impl Transport for MemoryTransport {
    fn write(&mut self, bytes: &[u8]) -> TransportResult<()> {
        if self.fail_writes {
            return Err(TransportError::write("memory transport closed"));
        }
        self.pending.extend_from_slice(bytes);
        Ok(())
    }

    fn flush(&mut self) -> TransportResult<()> {
        self.output.append(&mut self.pending);
        self.flushes += 1;
        Ok(())
    }

    fn read_byte(&mut self) -> TransportResult<Option<u8>> {
        Ok(self.input.pop_front())
    }

    fn bytes_available(&mut self) -> TransportResult<usize> {
        Ok(self.input.len())
    }
}
