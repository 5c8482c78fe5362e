//! Error types for the parlor game and economy core
//!
//! One enum per concern, rolled up into [`ParlorError`]. Game-domain results such as
//! "not enough points" are outcomes, not errors; see `gambler::WagerOutcome`.

use thiserror::Error;

/// Root error type for all parlor operations
#[derive(Debug, Error)]
pub enum ParlorError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Wager error: {0}")]
    Wager(#[from] WagerError),

    #[error("Content error: {0}")]
    Content(#[from] ContentError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Ledger mutation failures. A failed call leaves the ledger as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("Invalid transfer: {reason}")]
    InvalidTransfer { reason: String },

    #[error("Insufficient funds: needed {needed}, available {available}")]
    InsufficientFunds { needed: u64, available: u64 },

    #[error("Balance overflow for {user}")]
    Overflow { user: String },
}

/// Malformed wager text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WagerError {
    #[error("No wager given")]
    Empty,

    #[error("Malformed wager: '{0}'")]
    Malformed(String),

    #[error("Wager must be positive")]
    NonPositive,
}

/// Prompt collection errors
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Failed to read content file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode content file {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode content: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Account snapshot persistence errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O failure on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode account snapshot: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Failed to decode account snapshot {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Input rejected at the command boundary; nothing is mutated
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Amount must be positive")]
    NonPositiveAmount,

    #[error("Cannot transfer to yourself")]
    SelfTransfer,

    #[error("Invalid username: '{0}'")]
    InvalidUsername(String),

    #[error("Guess too long: {len} characters (max {max})")]
    GuessTooLong { len: usize, max: usize },

    #[error("Win probability must be within [0, 1]")]
    InvalidProbability,
}

/// Convenience type alias for Results
pub type ParlorResult<T> = Result<T, ParlorError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err: ParlorError = ConfigError::LoadFailed("missing file".to_string()).into();

        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("missing file"));
    }

    #[test]
    fn test_insufficient_funds_details() {
        let err = LedgerError::InsufficientFunds {
            needed: 30,
            available: 20,
        };

        assert!(err.to_string().contains("needed 30"));
        assert!(err.to_string().contains("available 20"));
    }

    #[test]
    fn test_error_conversion() {
        let err: ParlorError = LedgerError::InvalidAmount.into();

        match err {
            ParlorError::Ledger(LedgerError::InvalidAmount) => {}
            other => panic!("Expected ledger error, got {:?}", other),
        }
    }

    #[test]
    fn test_error_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ParlorError = StorageError::Io {
            path: "data/user_data.json".to_string(),
            source: io,
        }
        .into();

        assert!(err.source().is_some());
    }
}
