//! Error metadata module
//!
//! Errors raised inside the metadata pipeline never reach an API response.
//! They describe themselves so callers can log them at a matching level and
//! group them by a stable code.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected conditions like a missing optional tool
    Debug,
    /// Info level - for content the pipeline could not decode
    Info,
    /// Warning level - for transport failures worth operator attention
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Self-description of an error for logging and diagnostics.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "TRANSPORT_ERROR")
    fn error_code(&self) -> &'static str;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}
