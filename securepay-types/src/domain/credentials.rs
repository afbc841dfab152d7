//! Merchant credentials issued by the gateway.

use std::fmt;

use serde::Deserialize;

use crate::error::ConfigError;

/// The merchant's API credentials.
///
/// `uid` and `auth_token` authenticate every request with HTTP Basic auth;
/// `checksum_token` is the HMAC key used to sign and verify field sets.
/// Values are immutable once constructed.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawCredentials")]
pub struct Credentials {
    uid: String,
    auth_token: String,
    checksum_token: String,
}

impl Credentials {
    /// Creates credentials, rejecting any empty field.
    pub fn new(
        uid: impl Into<String>,
        auth_token: impl Into<String>,
        checksum_token: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let uid = uid.into();
        let auth_token = auth_token.into();
        let checksum_token = checksum_token.into();

        if uid.trim().is_empty() {
            return Err(ConfigError::MissingCredential("uid"));
        }
        if auth_token.trim().is_empty() {
            return Err(ConfigError::MissingCredential("auth_token"));
        }
        if checksum_token.trim().is_empty() {
            return Err(ConfigError::MissingCredential("checksum_token"));
        }

        Ok(Self {
            uid,
            auth_token,
            checksum_token,
        })
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    pub fn checksum_token(&self) -> &str {
        &self.checksum_token
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("uid", &self.uid)
            .field("auth_token", &"<redacted>")
            .field("checksum_token", &"<redacted>")
            .finish()
    }
}

#[derive(Deserialize)]
struct RawCredentials {
    uid: String,
    auth_token: String,
    checksum_token: String,
}

impl TryFrom<RawCredentials> for Credentials {
    type Error = ConfigError;

    fn try_from(raw: RawCredentials) -> Result<Self, Self::Error> {
        Self::new(raw.uid, raw.auth_token, raw.checksum_token)
    }
}
