//! # SecurePay Types
//!
//! Domain types, configuration and errors for the SecurePay gateway client.
//! This crate has no IO dependencies - only data structures and validation.
//!
//! ## Layout
//!
//! - `domain/` - Credentials, environments and payment requests
//! - `config/` - Explicit client configuration loaded from the environment
//! - `error/` - Configuration error types

pub mod config;
pub mod domain;
pub mod error;

// Re-export commonly used types
pub use config::ClientConfig;
pub use domain::{
    API_VERSION, BankStatus, CHECKSUM_FIELDS, Credentials, Environment, PaymentOptions,
    PaymentRequest, Visibility,
};
pub use error::ConfigError;
