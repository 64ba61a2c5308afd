//! Serial-port transport.

use std::io::{self, Read, Write};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serialport::{DataBits, FlowControl, Parity, SerialPort, SerialPortType, StopBits};

use super::{Transport, TransportError, TransportResult};

/// Parity setting for the `[serial]` config table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParitySetting {
    #[default]
    None,
    Odd,
    Even,
}

/// Flow control setting for the `[serial]` config table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FlowControlSetting {
    None,
    /// XON/XOFF
    #[default]
    Software,
    /// RTS/CTS
    Hardware,
}

/// Line settings, fixed when the port is opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    /// Device path (e.g. `/dev/ttyUSB0`, `COM3`)
    pub port: Option<String>,
    pub baud_rate: u32,
    /// 5, 6, 7 or 8
    pub data_bits: u8,
    pub parity: ParitySetting,
    /// 1 or 2
    pub stop_bits: u8,
    pub flow_control: FlowControlSetting,
    /// Read timeout in milliseconds
    pub timeout_ms: u64,
}

impl SerialSettings {
    const DEFAULT_BAUD_RATE: u32 = 1200;
    const DEFAULT_DATA_BITS: u8 = 8;
    const DEFAULT_STOP_BITS: u8 = 1;
    const DEFAULT_TIMEOUT_MS: u64 = 1000;

    /// Returns the configured port if set and non-empty.
    pub fn effective_port(&self) -> Option<&str> {
        self.port.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    fn data_bits(&self) -> TransportResult<DataBits> {
        match self.data_bits {
            5 => Ok(DataBits::Five),
            6 => Ok(DataBits::Six),
            7 => Ok(DataBits::Seven),
            8 => Ok(DataBits::Eight),
            other => Err(TransportError::open(format!(
                "unsupported data_bits {other} (expected 5-8)"
            ))),
        }
    }

    fn stop_bits(&self) -> TransportResult<StopBits> {
        match self.stop_bits {
            1 => Ok(StopBits::One),
            2 => Ok(StopBits::Two),
            other => Err(TransportError::open(format!(
                "unsupported stop_bits {other} (expected 1 or 2)"
            ))),
        }
    }

    fn parity(&self) -> Parity {
        match self.parity {
            ParitySetting::None => Parity::None,
            ParitySetting::Odd => Parity::Odd,
            ParitySetting::Even => Parity::Even,
        }
    }

    fn flow_control(&self) -> FlowControl {
        match self.flow_control {
            FlowControlSetting::None => FlowControl::None,
            FlowControlSetting::Software => FlowControl::Software,
            FlowControlSetting::Hardware => FlowControl::Hardware,
        }
    }
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: Self::DEFAULT_BAUD_RATE,
            data_bits: Self::DEFAULT_DATA_BITS,
            parity: ParitySetting::default(),
            stop_bits: Self::DEFAULT_STOP_BITS,
            flow_control: FlowControlSetting::default(),
            timeout_ms: Self::DEFAULT_TIMEOUT_MS,
        }
    }
}

/// Transport over an open serial port.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    /// Opens the configured port.
    ///
    /// # Errors
    /// Returns an `Open` error if no port is configured, a setting is out of
    /// range, or the device cannot be opened.
    pub fn open(settings: &SerialSettings) -> TransportResult<Self> {
        let Some(path) = settings.effective_port() else {
            return Err(TransportError::open(
                "no serial port configured; set [serial].port or pass --port",
            ));
        };

        let port = serialport::new(path, settings.baud_rate)
            .data_bits(settings.data_bits()?)
            .parity(settings.parity())
            .stop_bits(settings.stop_bits()?)
            .flow_control(settings.flow_control())
            .timeout(settings.timeout())
            .open()
            .map_err(|e| TransportError::open(format!("{path}: {e}")))?;

        tracing::debug!(
            port = path,
            baud = settings.baud_rate,
            "opened serial transport"
        );
        Ok(Self { port })
    }
}

impl Transport for SerialTransport {
    fn write(&mut self, bytes: &[u8]) -> TransportResult<()> {
        self.port
            .write_all(bytes)
            .map_err(|e| TransportError::write(e.to_string()))
    }

    fn flush(&mut self) -> TransportResult<()> {
        self.port
            .flush()
            .map_err(|e| TransportError::flush(e.to_string()))
    }

    fn read_byte(&mut self) -> TransportResult<Option<u8>> {
        let mut buf = [0u8; 1];
        match self.port.read(&mut buf) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(buf[0])),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(None),
            Err(e) => Err(TransportError::read(e.to_string())),
        }
    }

    fn bytes_available(&mut self) -> TransportResult<usize> {
        self.port
            .bytes_to_read()
            .map(|n| n as usize)
            .map_err(|e| TransportError::read(e.to_string()))
    }
}

/// A serial port visible to the system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSummary {
    pub name: String,
    pub description: String,
}

/// Lists serial ports visible to the system.
///
/// # Errors
/// Returns a `Read` error if the platform enumeration fails.
pub fn list_ports() -> TransportResult<Vec<PortSummary>> {
    let ports = serialport::available_ports().map_err(|e| TransportError::read(e.to_string()))?;
    Ok(ports
        .into_iter()
        .map(|info| PortSummary {
            description: describe_port_type(&info.port_type),
            name: info.port_name,
        })
        .collect())
}

fn describe_port_type(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(usb) => {
            let product = usb
                .product
                .as_deref()
                .or(usb.manufacturer.as_deref())
                .unwrap_or("USB serial");
            format!("{product} ({:04x}:{:04x})", usb.vid, usb.pid)
        }
        SerialPortType::PciPort => "PCI".to_string(),
        SerialPortType::BluetoothPort => "Bluetooth".to_string(),
        SerialPortType::Unknown => "unknown".to_string(),
    }
}
