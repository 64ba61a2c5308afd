//! Byte-oriented duplex transports.
//!
//! The engine talks to the typewriter through the [`Transport`] trait only:
//! - `serial`: production binding over a serial port
//! - `memory`: in-memory buffers for tests and dry runs

mod memory;
mod serial;

use std::fmt;

pub use memory::MemoryTransport;
pub use serial::{
    FlowControlSetting, ParitySetting, PortSummary, SerialSettings, SerialTransport, list_ports,
};

/// Backspace control byte.
pub const BACKSPACE: u8 = 0x08;
/// Line terminator; completes an input line and commits an output line.
pub const CARRIAGE_RETURN: u8 = b'\r';
/// Newline; re-arms the input margin but does not complete a line.
pub const LINE_FEED: u8 = b'\n';
/// Byte written for characters the transport cannot represent.
pub const PLACEHOLDER: u8 = b'?';

/// Minimal capability set the engine needs from a duplex channel.
///
/// Calls are issued strictly sequentially by a single owner.
pub trait Transport {
    /// Writes all bytes to the channel.
    ///
    /// # Errors
    /// Returns a [`TransportError`] if the device rejects the write.
    fn write(&mut self, bytes: &[u8]) -> TransportResult<()>;

    /// Makes previously written bytes visible to the device.
    ///
    /// # Errors
    /// Returns a [`TransportError`] if the flush fails.
    fn flush(&mut self) -> TransportResult<()>;

    /// Reads one byte if one is available.
    ///
    /// # Errors
    /// Returns a [`TransportError`] if the read fails.
    fn read_byte(&mut self) -> TransportResult<Option<u8>>;

    /// Returns the number of bytes waiting to be read.
    ///
    /// # Errors
    /// Returns a [`TransportError`] if the device cannot be queried.
    fn bytes_available(&mut self) -> TransportResult<usize>;
}

/// Categories of transport faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The channel could not be opened
    Open,
    /// Reading or polling failed
    Read,
    /// Writing failed
    Write,
    /// Flushing failed
    Flush,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportErrorKind::Open => write!(f, "open"),
            TransportErrorKind::Read => write!(f, "read"),
            TransportErrorKind::Write => write!(f, "write"),
            TransportErrorKind::Flush => write!(f, "flush"),
        }
    }
}

/// Fault on the physical channel. Never retried.
#[derive(Debug, Clone)]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn open(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Open, message)
    }

    pub fn read(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Read, message)
    }

    pub fn write(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Write, message)
    }

    pub fn flush(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Flush, message)
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transport {} failed: {}", self.kind, self.message)
    }
}

impl std::error::Error for TransportError {}

/// Result type for transport operations.
pub type TransportResult<T> = std::result::Result<T, TransportError>;
