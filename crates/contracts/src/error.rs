//! Layered error definitions
//!
//! Categorized by source: config / sink / general

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Sink Errors =====
    #[error(transparent)]
    Sink(#[from] SinkError),

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Sink(SinkError::write(sink_name, message))
    }
}

/// Event sink / destination errors
#[derive(Debug, Clone, Error, PartialEq, Eq, serde::Serialize)]
pub enum SinkError {
    /// The sink was closed, the entry was not queued
    #[error("sink '{sink}' is closed")]
    Closed { sink: String },

    /// The sink stopped after a fatal write error, the entry was not queued
    #[error("sink '{sink}' failed: {message}")]
    Failed { sink: String, message: String },

    /// The destination rejected a write
    #[error("sink '{sink}' write error: {message}")]
    Write { sink: String, message: String },
}

impl SinkError {
    pub fn write(sink: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Write {
            sink: sink.into(),
            message: message.into(),
        }
    }

    pub fn closed(sink: impl Into<String>) -> Self {
        Self::Closed { sink: sink.into() }
    }

    pub fn failed(sink: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            sink: sink.into(),
            message: message.into(),
        }
    }
}
