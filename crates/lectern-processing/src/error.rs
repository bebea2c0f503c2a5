//! Extraction error types
//!
//! Every variant is recoverable inside the pipeline: the orchestrator turns a
//! stage error into "this stage contributed nothing" and moves on.

use lectern_core::{ErrorMetadata, LogLevel};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("Transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unexpected HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Tool unavailable: {0}")]
    ToolUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A failure cached for the rest of one extraction call.
    #[error(transparent)]
    Shared(Arc<ExtractionError>),
}

/// Result type for extraction stages
pub type ExtractionResult<T> = Result<T, ExtractionError>;

impl ExtractionError {
    pub(crate) fn transport(url: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            ExtractionError::Timeout(format!("request to {} timed out", url))
        } else {
            ExtractionError::Transport {
                url: url.to_string(),
                source,
            }
        }
    }

    pub(crate) fn decode(message: impl Into<String>) -> Self {
        ExtractionError::Decode(message.into())
    }
}

impl ErrorMetadata for ExtractionError {
    fn error_code(&self) -> &'static str {
        match self {
            ExtractionError::Transport { .. } => "TRANSPORT_ERROR",
            ExtractionError::HttpStatus { .. } => "HTTP_STATUS_ERROR",
            ExtractionError::Timeout(_) => "TIMEOUT",
            ExtractionError::Decode(_) => "DECODE_ERROR",
            ExtractionError::ToolUnavailable(_) => "TOOL_UNAVAILABLE",
            ExtractionError::Io(_) => "IO_ERROR",
            ExtractionError::Shared(inner) => inner.error_code(),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            ExtractionError::ToolUnavailable(_) => LogLevel::Debug,
            ExtractionError::Decode(_) => LogLevel::Info,
            ExtractionError::Transport { .. }
            | ExtractionError::HttpStatus { .. }
            | ExtractionError::Timeout(_) => LogLevel::Warn,
            ExtractionError::Io(_) => LogLevel::Error,
            ExtractionError::Shared(inner) => inner.log_level(),
        }
    }
}
