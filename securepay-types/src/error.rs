//! Error types for client configuration.

/// Configuration errors raised before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing credential: {0} must not be empty")]
    MissingCredential(&'static str),

    #[error("Unknown environment: {0} (expected sandbox or production)")]
    UnknownEnvironment(String),
}
