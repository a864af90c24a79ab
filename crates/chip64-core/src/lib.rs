//! Chip64 core.

#![warn(missing_docs)]

pub mod core;
pub mod debugger;
pub mod devices;
pub mod emulator;
pub mod errors;
pub mod program;
