//! Ports command handler.

use anyhow::{Context, Result};
use typist_core::transport;

pub fn run() -> Result<()> {
    let ports = transport::list_ports().context("list serial ports")?;
    if ports.is_empty() {
        println!("No serial ports found.");
        return Ok(());
    }

    for port in ports {
        println!("{}\t{}", port.name, port.description);
    }
    Ok(())
}
