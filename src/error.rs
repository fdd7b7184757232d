//! Error types and handling for the `TripMazer` application

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Classification of failures reported by external providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    ApiUnauthorized,
    ApiNotFound,
    ApiRateLimit,
    ApiNetworkError,
    ApiInvalidResponse,
    ApiServerError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorCode::ApiUnauthorized => "unauthorized",
            ErrorCode::ApiNotFound => "not found",
            ErrorCode::ApiRateLimit => "rate limited",
            ErrorCode::ApiNetworkError => "network error",
            ErrorCode::ApiInvalidResponse => "invalid response",
            ErrorCode::ApiServerError => "server error",
        };
        f.write_str(label)
    }
}

/// Main error type for the `TripMazer` application
#[derive(Error, Debug)]
pub enum TripMazerError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Provider communication errors
    #[error("API error ({code}): {message}")]
    Api { code: ErrorCode, message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl TripMazerError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error with an explicit classification
    pub fn api<S: Into<String>>(code: ErrorCode, message: S) -> Self {
        Self::Api {
            code,
            message: message.into(),
        }
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// Provider error code, if this is an API failure
    #[must_use]
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            TripMazerError::Api { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            TripMazerError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            TripMazerError::Api {
                code: ErrorCode::ApiUnauthorized,
                ..
            } => "A travel provider rejected the API key. Please check your credentials.".to_string(),
            TripMazerError::Api {
                code: ErrorCode::ApiRateLimit,
                ..
            } => "A travel provider is rate limiting requests. Please try again later.".to_string(),
            TripMazerError::Api { .. } => {
                "Unable to reach external travel services. Please check your internet connection."
                    .to_string()
            }
            TripMazerError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            TripMazerError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            TripMazerError::General { message } => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = TripMazerError::config("missing API key");
        assert!(matches!(config_err, TripMazerError::Config { .. }));

        let api_err = TripMazerError::api(ErrorCode::ApiNetworkError, "connection failed");
        assert_eq!(api_err.code(), Some(ErrorCode::ApiNetworkError));

        let validation_err = TripMazerError::validation("origin is required");
        assert!(matches!(validation_err, TripMazerError::Validation { .. }));
        assert_eq!(validation_err.code(), None);
    }

    #[test]
    fn test_user_messages() {
        let config_err = TripMazerError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));

        let api_err = TripMazerError::api(ErrorCode::ApiServerError, "test");
        assert!(api_err.user_message().contains("Unable to reach"));

        let auth_err = TripMazerError::api(ErrorCode::ApiUnauthorized, "bad key");
        assert!(auth_err.user_message().contains("API key"));

        let validation_err = TripMazerError::validation("test input");
        assert!(validation_err.user_message().contains("test input"));
    }

    #[test]
    fn test_display_includes_code() {
        let err = TripMazerError::api(ErrorCode::ApiRateLimit, "slow down");
        assert_eq!(err.to_string(), "API error (rate limited): slow down");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TripMazerError = io_err.into();
        assert!(matches!(err, TripMazerError::Io { .. }));
    }
}
