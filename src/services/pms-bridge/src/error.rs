//! Error handling module for the PMS Bridge Service
//!
//! This module provides the error type shared by the feed pipeline, the tenant store
//! and the HTTP layer. Lower-level components (schema validator, mapping engine) never
//! return these errors; they report failures as explicit values instead.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Error types for the PMS bridge
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Feed body was empty or whitespace
    #[error("PMS feed is required in the request body.")]
    EmptyFeed,

    /// Tenant code failed the identifier pattern
    #[error("Invalid PMS code '{code}'. Only letters, numbers, dash, and underscore are allowed.")]
    InvalidTenantCode { code: String },

    /// Feed rejected by the tenant schema
    #[error("Schema validation failed: {message}")]
    SchemaValidation { message: String },

    /// Unknown tenant
    #[error("PMS integration '{code}' not found.")]
    TenantNotFound { code: String },

    /// Request validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Tenant directory I/O errors
    #[error("Storage error: {source}")]
    Storage {
        #[from]
        source: std::io::Error,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    /// HTTP client errors
    #[error("HTTP client error: {source}")]
    HttpClient {
        #[from]
        source: reqwest::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Plugin translator failures
    #[error("Translation error for {code}: {message}")]
    Translation { code: String, message: String },

    /// Internal server errors
    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl BridgeError {
    /// Create a new invalid tenant code error
    pub fn invalid_tenant_code<S: Into<String>>(code: S) -> Self {
        Self::InvalidTenantCode { code: code.into() }
    }

    /// Create a new schema validation error
    pub fn schema_validation<S: Into<String>>(message: S) -> Self {
        Self::SchemaValidation {
            message: message.into(),
        }
    }

    /// Create a new tenant not found error
    pub fn tenant_not_found<S: Into<String>>(code: S) -> Self {
        Self::TenantNotFound { code: code.into() }
    }

    /// Create a new validation error
    pub fn validation<S1: Into<String>, S2: Into<String>>(field: S1, message: S2) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a new translation error
    pub fn translation<S1: Into<String>, S2: Into<String>>(code: S1, message: S2) -> Self {
        Self::Translation {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            BridgeError::EmptyFeed => StatusCode::BAD_REQUEST,
            BridgeError::InvalidTenantCode { .. } => StatusCode::BAD_REQUEST,
            BridgeError::SchemaValidation { .. } => StatusCode::BAD_REQUEST,
            BridgeError::Validation { .. } => StatusCode::BAD_REQUEST,
            BridgeError::TenantNotFound { .. } => StatusCode::NOT_FOUND,
            BridgeError::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            BridgeError::HttpClient { .. } => StatusCode::BAD_GATEWAY,
            BridgeError::Storage { .. }
            | BridgeError::Serialization { .. }
            | BridgeError::Translation { .. }
            | BridgeError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error (for API responses)
    pub fn error_code(&self) -> &'static str {
        match self {
            BridgeError::EmptyFeed => "EMPTY_FEED",
            BridgeError::InvalidTenantCode { .. } => "INVALID_TENANT_CODE",
            BridgeError::SchemaValidation { .. } => "SCHEMA_VALIDATION_FAILED",
            BridgeError::TenantNotFound { .. } => "NOT_FOUND",
            BridgeError::Validation { .. } => "VALIDATION_ERROR",
            BridgeError::Configuration { .. } => "CONFIGURATION_ERROR",
            BridgeError::HttpClient { .. } => "HTTP_CLIENT_ERROR",
            // Everything unexpected surfaces to callers as a generic internal error
            BridgeError::Storage { .. }
            | BridgeError::Serialization { .. }
            | BridgeError::Translation { .. }
            | BridgeError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Input errors are reported to the caller and counted, never retried
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            BridgeError::EmptyFeed
                | BridgeError::InvalidTenantCode { .. }
                | BridgeError::SchemaValidation { .. }
        )
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BridgeError::Storage { .. } | BridgeError::HttpClient { .. }
        )
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let error_code = self.error_code();
        let error_message = self.to_string();

        if status_code.is_server_error() {
            tracing::error!(
                error_code = error_code,
                error_message = %error_message,
                "PMS bridge error"
            );
        } else {
            tracing::warn!(
                error_code = error_code,
                error_message = %error_message,
                "PMS bridge request rejected"
            );
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": error_message,
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "retryable": self.is_retryable()
            }
        }));

        (status_code, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_feed_error() {
        let error = BridgeError::EmptyFeed;
        assert!(error.to_string().contains("feed is required"));
        assert_eq!(error.error_code(), "EMPTY_FEED");
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert!(error.is_input_error());
    }

    #[test]
    fn test_invalid_tenant_code_error() {
        let error = BridgeError::invalid_tenant_code("bad code!");
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(error.error_code(), "INVALID_TENANT_CODE");
        assert!(error.to_string().contains("bad code!"));
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_schema_validation_error() {
        let error = BridgeError::schema_validation("\"roomType\" is a required property");
        assert_eq!(error.error_code(), "SCHEMA_VALIDATION_FAILED");
        assert!(error.to_string().contains("roomType"));
        assert!(error.is_input_error());
    }

    #[test]
    fn test_unexpected_errors_are_internal() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error: BridgeError = io.into();
        assert_eq!(error.error_code(), "INTERNAL_ERROR");
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(error.is_retryable());
        assert!(!error.is_input_error());

        let error = BridgeError::translation("samplepms", "boom");
        assert_eq!(error.error_code(), "INTERNAL_ERROR");
        assert!(error.to_string().contains("samplepms"));
    }

    #[test]
    fn test_not_found_error() {
        let error = BridgeError::tenant_not_found("acme");
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(error.to_string(), "PMS integration 'acme' not found.");
    }
}
