//! Error types and handling for Serre
//!
//! One error enum covers the acquisition core (transport and decode failures)
//! and the serving layer around it (configuration, authentication, storage).

use thiserror::Error;

/// Result type alias for Serre operations
pub type Result<T> = std::result::Result<T, SerreError>;

/// Main error type for Serre
#[derive(Debug, Error)]
pub enum SerreError {
    /// The field device could not be reached, reset the connection,
    /// answered with a Modbus exception or timed out
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// The device returned too few registers for a reading
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Authentication/authorization errors
    #[error("Authentication error: {message}")]
    Auth { message: String },

    /// User or history store errors
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// HTTP/Web server errors
    #[error("Web server error: {message}")]
    Web { message: String },
}

impl SerreError {
    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        SerreError::Transport {
            message: message.into(),
        }
    }

    /// Create a new decode error
    pub fn decode<S: Into<String>>(message: S) -> Self {
        SerreError::Decode {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        SerreError::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        SerreError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        SerreError::Io {
            message: message.into(),
        }
    }

    /// Create a new auth error
    pub fn auth<S: Into<String>>(message: S) -> Self {
        SerreError::Auth {
            message: message.into(),
        }
    }

    /// Create a new storage error
    pub fn storage<S: Into<String>>(message: S) -> Self {
        SerreError::Storage {
            message: message.into(),
        }
    }

    /// Create a new web error
    pub fn web<S: Into<String>>(message: S) -> Self {
        SerreError::Web {
            message: message.into(),
        }
    }

    /// Whether this error came from talking to the field device
    pub fn is_acquisition_error(&self) -> bool {
        matches!(
            self,
            SerreError::Transport { .. } | SerreError::Decode { .. }
        )
    }
}

impl From<std::io::Error> for SerreError {
    fn from(err: std::io::Error) -> Self {
        SerreError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for SerreError {
    fn from(err: serde_yaml::Error) -> Self {
        SerreError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for SerreError {
    fn from(err: serde_json::Error) -> Self {
        SerreError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for SerreError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        SerreError::auth(err.to_string())
    }
}

impl From<pwhash::error::Error> for SerreError {
    fn from(err: pwhash::error::Error) -> Self {
        SerreError::auth(format!("password hashing failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = SerreError::transport("connection refused");
        assert!(matches!(err, SerreError::Transport { .. }));
        assert!(err.is_acquisition_error());

        let err = SerreError::decode("1 word");
        assert!(matches!(err, SerreError::Decode { .. }));
        assert!(err.is_acquisition_error());

        let err = SerreError::validation("field", "test validation error");
        assert!(matches!(err, SerreError::Validation { .. }));
        assert!(!err.is_acquisition_error());
    }

    #[test]
    fn test_error_display() {
        let err = SerreError::transport("timed out");
        assert_eq!(err.to_string(), "Transport error: timed out");

        let err = SerreError::validation("device.port", "Port must be greater than 0");
        assert_eq!(
            format!("{}", err),
            "Validation error: device.port - Port must be greater than 0"
        );
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: SerreError = io.into();
        assert!(matches!(err, SerreError::Io { .. }));
    }
}
