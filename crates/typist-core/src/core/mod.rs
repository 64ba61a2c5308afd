//! Core module: the conversation engine, independent of any device.
//!
//! This module contains:
//! - `ascii`: Transliteration and lenient decoding for the 7-bit wire
//! - `typing`: Human-paced keystroke emission with corrected typos
//! - `collector`: Echoing line reader
//! - `format`: Word wrap with a hanging indent
//! - `generator`: Reply generation with a fallback
//! - `session`: The read/generate/type loop

pub mod ascii;
pub mod collector;
pub mod format;
pub mod generator;
pub mod session;
pub mod typing;
