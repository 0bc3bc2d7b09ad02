//! Error types for the disbursement bot

use thiserror::Error;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the disbursement bot
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    // RPC errors
    #[error("Network error: {0}")]
    Network(String),

    // Transfer errors
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid transfer amount: {0}")]
    InvalidAmount(u128),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Transaction rejected by chain (code {code}): {log}")]
    TransferRejected { code: u32, log: String },

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

impl Error {
    /// Check if this error is transient and may clear up by the next cycle
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Network(_))
    }
}

// Conversion from Tendermint RPC errors
impl From<cosmrs::rpc::Error> for Error {
    fn from(e: cosmrs::rpc::Error) -> Self {
        Error::Network(e.to_string())
    }
}

// Conversion from protobuf decode errors
impl From<prost::DecodeError> for Error {
    fn from(e: prost::DecodeError) -> Self {
        Error::Network(format!("Malformed RPC response: {}", e))
    }
}

// Conversion from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

// Conversion from I/O errors
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}
