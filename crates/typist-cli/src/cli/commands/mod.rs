//! CLI command handlers.

pub mod chat;
pub mod config;
pub mod ports;
pub mod type_text;
