//! Harness Error Types
//!
//! Every failure is fatal. Nothing in the harness retries an exchange.

use std::time::Duration;

use thiserror::Error;

use crate::core_types::TableId;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("Unable to connect {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No response within {after:?}")]
    Timeout { after: Duration },

    #[error("Response is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Malformed query response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Query response is not array-like: {0}")]
    NotAnArray(String),

    #[error("Frame of {0} bytes exceeds the maximum frame length")]
    FrameTooLarge(usize),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Writer task failed to join: {0}")]
    WorkerJoin(String),

    #[error("table {table} has incorrect amount of items: expected {expected}, got {actual}")]
    CountMismatch {
        table: TableId,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, HarnessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_mismatch_names_table() {
        let err = HarnessError::CountMismatch {
            table: 42,
            expected: 200,
            actual: 199,
        };
        let msg = err.to_string();
        assert!(msg.starts_with("table 42 has incorrect amount of items"));
        assert!(msg.contains("expected 200"));
        assert!(msg.contains("got 199"));
    }

    #[test]
    fn test_parse_error_converts() {
        let json_err = serde_json::from_str::<serde_json::Value>("[1, 2").unwrap_err();
        let err: HarnessError = json_err.into();
        assert!(matches!(err, HarnessError::Parse(_)));
    }
}
