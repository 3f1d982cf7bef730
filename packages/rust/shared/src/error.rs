//! Error types for towermap.
//!
//! Library crates use [`TowerMapError`] via `thiserror`.
//! App crates (cli/tui) wrap this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all towermap operations.
#[derive(Debug, thiserror::Error)]
pub enum TowerMapError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// The input spreadsheet could not be opened, parsed, or has a malformed row.
    /// Fatal for a pipeline run.
    #[error("failed to load {path:?}: {message}")]
    Load { path: PathBuf, message: String },

    /// Transport-level failure while querying the lookup service.
    /// Non-fatal for a pipeline run: the record is skipped.
    #[error("lookup failed: {0}")]
    Lookup(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (unknown operator, bad URL, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TowerMapError>;

impl TowerMapError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a load error for the given input file.
    pub fn load(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Load {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
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

    /// Whether this error aborts a pipeline run (as opposed to skipping one record).
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Lookup(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = TowerMapError::config("missing lookup base_url");
        assert_eq!(err.to_string(), "config error: missing lookup base_url");

        let err = TowerMapError::load("towers.xlsx", "row 3: missing LAC");
        assert!(err.to_string().contains("towers.xlsx"));
        assert!(err.to_string().contains("row 3: missing LAC"));
    }

    #[test]
    fn only_lookup_failures_are_recoverable() {
        assert!(!TowerMapError::Lookup("timed out".into()).is_fatal());
        assert!(TowerMapError::load("x.xlsx", "bad").is_fatal());
        assert!(TowerMapError::validation("bad").is_fatal());
    }
}
