//! Lectern Infrastructure Library
//!
//! Process-level plumbing shared by Lectern binaries.

pub mod telemetry;

pub use telemetry::{init_telemetry, shutdown_telemetry, LogFormat};
