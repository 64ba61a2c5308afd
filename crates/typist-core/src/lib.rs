//! Core typist library (terminal I/O engine, transports, providers, config).

pub mod config;
pub mod core;
pub mod prompts;
pub mod providers;
pub mod transport;
