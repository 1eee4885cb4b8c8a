//! Error types for cloudgraph.
//!
//! Library crates use [`CloudGraphError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all cloudgraph operations.
#[derive(Debug, thiserror::Error)]
pub enum CloudGraphError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while talking to a provider API.
    #[error("network error: {0}")]
    Network(String),

    /// Malformed provider payload.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (duplicate key, unknown endpoint, undeclared type, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Step registry or step execution error.
    #[error("step {step_id}: {message}")]
    Step { step_id: String, message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CloudGraphError>;

impl CloudGraphError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a step error scoped to a step ID.
    pub fn step(step_id: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Step {
            step_id: step_id.into(),
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = CloudGraphError::config("missing client secret");
        assert_eq!(err.to_string(), "config error: missing client secret");

        let err = CloudGraphError::validation("duplicate entity key /subscriptions/abc");
        assert!(err.to_string().contains("duplicate entity key"));

        let err = CloudGraphError::step("rm-keyvault-vaults", "HTTP 500");
        assert_eq!(err.to_string(), "step rm-keyvault-vaults: HTTP 500");
    }
}
