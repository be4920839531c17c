//! Error types for the loan assistant client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {

    // =============================
    // Transport Errors
    // =============================

    /// Request could not be sent or no response was received
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Service answered outside the 2xx range
    #[error("HTTP error! Status: {status}")]
    HttpStatus { status: u16, body: String },

    /// Body was not valid JSON
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    // =============================
    // Client Errors
    // =============================

    /// Body was valid JSON but matched neither expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Unknown form field: {0}")]
    UnknownField(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification used by the flows when surfacing failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    HttpStatus,
    Decode,
    Other,
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Network(_) => ErrorKind::Network,
            ClientError::HttpStatus { .. } => ErrorKind::HttpStatus,
            ClientError::Decode(_) | ClientError::InvalidResponse(_) => ErrorKind::Decode,
            _ => ErrorKind::Other,
        }
    }

    /// Status code for `HttpStatus` failures
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
