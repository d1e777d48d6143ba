//! Application error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation and provide
//! clear error messages with context.

use thiserror::Error;

/// Application result type.
pub type Result<T> = std::result::Result<T, Error>;

/// JSON-RPC 2.0 error codes used on the protocol surface.
pub mod rpc_code {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
    /// Implementation-defined server error range.
    pub const RATE_LIMITED: i64 = -32000;
}

/// Main error enum for the toolgate gateway.
#[derive(Error, Debug)]
pub enum Error {
    /// Validation errors (map to JSON-RPC INVALID_PARAMS).
    #[error("validation error: {0}")]
    Validation(String),

    /// Unknown tool or resource (map to INVALID_PARAMS).
    #[error("not found: {0}")]
    NotFound(String),

    /// Unknown protocol method.
    #[error("method not found: {0}")]
    MethodNotFound(String),

    /// Admission denied by the rate limiter.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Internal errors (map to INTERNAL_ERROR).
    #[error("internal error: {0}")]
    Internal(String),

    /// Serialization/deserialization errors raised server-side. Malformed
    /// inbound JSON is answered by the transport before dispatch.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Convert to a JSON-RPC error code.
    pub fn to_rpc_code(&self) -> i64 {
        match self {
            Error::Validation(_) => rpc_code::INVALID_PARAMS,
            Error::NotFound(_) => rpc_code::INVALID_PARAMS,
            Error::MethodNotFound(_) => rpc_code::METHOD_NOT_FOUND,
            Error::RateLimited(_) => rpc_code::RATE_LIMITED,
            Error::Internal(_) | Error::Serialization(_) | Error::Io(_) => rpc_code::INTERNAL_ERROR,
        }
    }

    /// Message safe to hand to an external caller.
    ///
    /// Internal and I/O detail stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Error::Internal(_) | Error::Serialization(_) | Error::Io(_) => "internal error".to_string(),
            other => other.to_string(),
        }
    }
}

// Convenience constructors
impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::MethodNotFound(method.into())
    }

    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
