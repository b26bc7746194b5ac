//! Error types and handling for LeafBridge
//!
//! This module defines the error types used throughout the crate. Errors
//! raised inside a poll cycle or a command dispatch are caught and logged at
//! that operation's boundary; only pairing validation errors reach the user.

use thiserror::Error;

/// Result type alias for LeafBridge operations
pub type Result<T> = std::result::Result<T, LeafBridgeError>;

/// Main error type for LeafBridge
#[derive(Debug, Error)]
pub enum LeafBridgeError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Missing or invalid user-supplied field (pairing form, config)
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Authentication or connectivity failure against the vehicle API
    #[error("Remote session error: {message}")]
    Session { message: String },

    /// Remote payload did not have the expected shape
    #[error("Malformed payload: {message}")]
    MalformedPayload { message: String },

    /// Remote vehicle operation failed
    #[error("API error: {message}")]
    Api { message: String },

    /// Host capability store rejected or failed a write
    #[error("Capability error: {message}")]
    Capability { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Network-related errors
    #[error("Network error: {message}")]
    Network { message: String },
}

impl LeafBridgeError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        LeafBridgeError::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error naming the offending field
    pub fn validation<F: Into<String>, S: Into<String>>(field: F, message: S) -> Self {
        LeafBridgeError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new remote session error
    pub fn session<S: Into<String>>(message: S) -> Self {
        LeafBridgeError::Session {
            message: message.into(),
        }
    }

    /// Create a new malformed payload error
    pub fn malformed<S: Into<String>>(message: S) -> Self {
        LeafBridgeError::MalformedPayload {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        LeafBridgeError::Api {
            message: message.into(),
        }
    }

    /// Create a new capability store error
    pub fn capability<S: Into<String>>(message: S) -> Self {
        LeafBridgeError::Capability {
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        LeafBridgeError::Io {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        LeafBridgeError::Network {
            message: message.into(),
        }
    }

    /// Field name for validation errors
    pub fn field(&self) -> Option<&str> {
        match self {
            LeafBridgeError::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LeafBridgeError {
    fn from(err: std::io::Error) -> Self {
        LeafBridgeError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for LeafBridgeError {
    fn from(err: serde_yaml::Error) -> Self {
        LeafBridgeError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for LeafBridgeError {
    fn from(err: serde_json::Error) -> Self {
        LeafBridgeError::Serialization {
            message: err.to_string(),
        }
    }
}
