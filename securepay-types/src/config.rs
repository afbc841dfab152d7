//! Configuration loading from environment.

use std::env;

use crate::domain::{Credentials, Environment};
use crate::error::ConfigError;

pub const UID_VAR: &str = "SECUREPAY_UID";
pub const AUTH_TOKEN_VAR: &str = "SECUREPAY_AUTH_TOKEN";
pub const CHECKSUM_TOKEN_VAR: &str = "SECUREPAY_CHECKSUM_TOKEN";
pub const ENVIRONMENT_VAR: &str = "SECUREPAY_ENVIRONMENT";

/// Everything the client needs, read once at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub credentials: Credentials,
    pub environment: Environment,
}

impl ClientConfig {
    pub fn new(credentials: Credentials, environment: Environment) -> Self {
        Self {
            credentials,
            environment,
        }
    }

    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// A missing environment variable selects the sandbox.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credentials = Credentials::new(
            lookup(UID_VAR).unwrap_or_default(),
            lookup(AUTH_TOKEN_VAR).unwrap_or_default(),
            lookup(CHECKSUM_TOKEN_VAR).unwrap_or_default(),
        )?;

        let environment = match lookup(ENVIRONMENT_VAR) {
            Some(value) if !value.trim().is_empty() => value.parse()?,
            _ => Environment::default(),
        };

        Ok(Self {
            credentials,
            environment,
        })
    }
}
