//! Error types for the ledger fixture crate

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    InvalidBlockLinkage(String),
    InvalidProofOfWork,
    InvalidMerkleRoot,
    InvalidBlock(String),
    InvalidTransaction(String),
    DoubleSpendDetected(String),
    CryptoError(String),
    EncodeError(String),
    DecodeError(String),
    DatabaseError(String),
    BlockNotFound(String),
    ConfigError(String),
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChainError::InvalidBlockLinkage(msg) => write!(f, "Invalid block linkage: {}", msg),
            ChainError::InvalidProofOfWork => write!(f, "Invalid proof of work"),
            ChainError::InvalidMerkleRoot => write!(f, "Invalid Merkle root"),
            ChainError::InvalidBlock(msg) => write!(f, "Invalid block: {}", msg),
            ChainError::InvalidTransaction(msg) => write!(f, "Invalid transaction: {}", msg),
            ChainError::DoubleSpendDetected(msg) => write!(f, "Double spend detected: {}", msg),
            ChainError::CryptoError(msg) => write!(f, "Cryptographic error: {}", msg),
            ChainError::EncodeError(msg) => write!(f, "Encoding error: {}", msg),
            ChainError::DecodeError(msg) => write!(f, "Decoding error: {}", msg),
            ChainError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ChainError::BlockNotFound(msg) => write!(f, "Block not found: {}", msg),
            ChainError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ChainError {}

impl From<rusqlite::Error> for ChainError {
    fn from(err: rusqlite::Error) -> Self {
        ChainError::DatabaseError(err.to_string())
    }
}

impl From<toml::de::Error> for ChainError {
    fn from(err: toml::de::Error) -> Self {
        ChainError::ConfigError(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_context() {
        let err = ChainError::DecodeError("unexpected end of input".to_string());
        assert_eq!(err.to_string(), "Decoding error: unexpected end of input");
        assert_eq!(ChainError::InvalidProofOfWork.to_string(), "Invalid proof of work");
    }

    #[test]
    fn test_sqlite_error_maps_to_database_error() {
        let err: ChainError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, ChainError::DatabaseError(_)));
    }
}
