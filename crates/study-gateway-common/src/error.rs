//! Error types for the study-gateway.
//!
//! This module defines the error types using `thiserror`:
//! - [`GatewayError`]: Startup, configuration and lifecycle failures
//! - [`ResponseError`]: Misuse of a response writer by a handler
//! - [`RequestError`]: Failures while decoding a request body

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config_file::ConfigFileError;

/// Top-level gateway errors.
///
/// All of these are fatal: they abort startup or terminate the serving loop.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The listening socket could not be bound.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// The address that was requested.
        addr: SocketAddr,
        /// The underlying socket error.
        #[source]
        source: io::Error,
    },

    /// Installing an OS signal handler failed.
    #[error("Failed to install signal handler: {0}")]
    Signal(#[source] io::Error),

    /// The serving loop terminated with an I/O error.
    #[error("Server error: {0}")]
    Serve(#[source] io::Error),

    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Invalid configuration was provided.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },

    /// Two API routes were registered for the same path.
    #[error("Duplicate route: {path}")]
    DuplicateRoute {
        /// The path registered twice.
        path: String,
    },

    /// A route path that is not an absolute request path.
    #[error("Invalid route path: {path}")]
    InvalidRoute {
        /// The rejected path.
        path: String,
    },

    /// The configuration file could not be loaded.
    #[error(transparent)]
    ConfigFile(#[from] ConfigFileError),
}

/// Errors raised by a response writer when a handler violates the
/// write-once protocol.
#[derive(Error, Debug)]
pub enum ResponseError {
    /// Status or headers were changed after they were committed.
    #[error("Cannot modify response: headers already sent")]
    HeadersAlreadySent,

    /// Body data was written after the response was ended.
    #[error("Cannot write response: already finished")]
    AlreadyFinished,

    /// The JSON body could not be serialized.
    #[error("Failed to serialize response body: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors raised while decoding a request body.
#[derive(Error, Debug)]
pub enum RequestError {
    /// The body is not valid JSON for the requested type.
    #[error("Invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl GatewayError {
    /// Create a new `Bind` error.
    pub fn bind(addr: SocketAddr, source: io::Error) -> Self {
        Self::Bind { addr, source }
    }

    /// Create a new `InvalidConfig` error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create a new `DuplicateRoute` error.
    pub fn duplicate_route(path: impl Into<String>) -> Self {
        Self::DuplicateRoute { path: path.into() }
    }

    /// Create a new `InvalidRoute` error.
    pub fn invalid_route(path: impl Into<String>) -> Self {
        Self::InvalidRoute { path: path.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GatewayError::duplicate_route("/api/auth/login");
        assert_eq!(err.to_string(), "Duplicate route: /api/auth/login");

        let err = GatewayError::invalid_config("PORT must be a number");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: PORT must be a number"
        );
    }

    #[test]
    fn test_bind_error_keeps_source() {
        let addr: SocketAddr = "127.0.0.1:3000".parse().unwrap();
        let err = GatewayError::bind(addr, io::Error::from(io::ErrorKind::AddrInUse));

        assert!(err.to_string().starts_with("Failed to bind 127.0.0.1:3000"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_error_from_config_file() {
        let file_err = ConfigFileError::Parse {
            message: "expected `=`".into(),
        };
        let err: GatewayError = file_err.into();

        assert!(matches!(err, GatewayError::ConfigFile(_)));
        assert_eq!(err.to_string(), "Failed to parse config file: expected `=`");
    }

    #[test]
    fn test_response_error_display() {
        assert_eq!(
            ResponseError::HeadersAlreadySent.to_string(),
            "Cannot modify response: headers already sent"
        );
    }
}
