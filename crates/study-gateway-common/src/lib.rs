//! Common types, errors, and configuration for study-gateway.
//!
//! This crate provides shared functionality used across the study-gateway workspace:
//! - Error types using `thiserror` for type-safe error handling
//! - [`GatewayConfig`] for listener, asset root and body limits
//! - [`ConfigFile`] for loading that configuration from TOML

pub mod config;
pub mod config_file;
pub mod error;

pub use config::GatewayConfig;
pub use config_file::{ConfigFile, ConfigFileError};
pub use error::{GatewayError, RequestError, ResponseError};
