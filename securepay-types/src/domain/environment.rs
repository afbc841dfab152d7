//! Gateway environments and endpoint resolution.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// API version segment shared by every path.
pub const API_VERSION: &str = "v1";

const SANDBOX_BASE_URL: &str = "https://sandbox.securepay.my/api";
const PRODUCTION_BASE_URL: &str = "https://securepay.my/api";

/// Which gateway deployment the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Environment {
    #[default]
    Sandbox,
    Production,
}

impl Environment {
    /// Returns the base URL of this environment, without a trailing slash.
    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Sandbox => SANDBOX_BASE_URL,
            Environment::Production => PRODUCTION_BASE_URL,
        }
    }

    /// Resolves the path prefix for a call of the given visibility.
    pub fn endpoint(&self, visibility: Visibility) -> String {
        visibility.prefix(self.base_url())
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Sandbox => write!(f, "sandbox"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sandbox" => Ok(Environment::Sandbox),
            "production" => Ok(Environment::Production),
            _ => Err(ConfigError::UnknownEnvironment(s.to_string())),
        }
    }
}

/// Path family of an operation.
///
/// Private calls live under `{base}/v1/`, public ones under `{base}/public/v1/`.
/// Both are sent with the same Basic auth header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Private,
    Public,
}

impl Visibility {
    /// Builds the path prefix (with trailing slash) under `base`.
    pub fn prefix(&self, base: &str) -> String {
        let base = base.trim_end_matches('/');
        match self {
            Visibility::Private => format!("{}/{}/", base, API_VERSION),
            Visibility::Public => format!("{}/public/{}/", base, API_VERSION),
        }
    }
}

/// Bank availability filter for bank-list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankStatus {
    Online,
    Offline,
}

impl BankStatus {
    /// Maps the optional `online` flag to a filter; `None` means unfiltered.
    pub fn from_online(online: Option<bool>) -> Option<Self> {
        online.map(|online| {
            if online {
                BankStatus::Online
            } else {
                BankStatus::Offline
            }
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BankStatus::Online => "online",
            BankStatus::Offline => "offline",
        }
    }
}

impl fmt::Display for BankStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
