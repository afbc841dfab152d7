//! # SecurePay Client SDK
//!
//! An async Rust client for the SecurePay payment gateway.
//!
//! Construction validates the merchant credentials against the gateway, so a
//! [`SecurePayClient`] value always holds credentials the gateway accepted.
//!
//! ```no_run
//! # async fn run() -> Result<(), securepay_client::ClientError> {
//! use securepay_client::SecurePayClient;
//! use securepay_types::{ClientConfig, PaymentRequest};
//!
//! let client = SecurePayClient::connect(ClientConfig::from_env()?).await?;
//!
//! let payment = PaymentRequest::new("ORD-1", "10.00", "Widget")
//!     .with_buyer("Alice", "alice@example.com", "0123456789");
//! let response = client.create_payment(payment.into_options()).await?;
//! println!("{}", response.text());
//! # Ok(())
//! # }
//! ```

pub mod checksum;

use std::borrow::Cow;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use securepay_types::{
    BankStatus, CHECKSUM_FIELDS, ClientConfig, ConfigError, Credentials, Environment,
    PaymentOptions, Visibility,
};

/// Error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Invalid SecurePay API credential (validation returned HTTP {status})")]
    InvalidCredential { status: u16 },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Raw status and body returned by the gateway.
///
/// No status check is applied; gateway-level failures are reported in the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl GatewayResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns the body as text, replacing invalid UTF-8.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Builder for [`SecurePayClient`].
pub struct ClientBuilder {
    config: ClientConfig,
    base_url: Option<String>,
    http: Option<Client>,
}

impl ClientBuilder {
    /// Overrides the environment's base URL (e.g. a local mock or proxy).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Uses a preconfigured HTTP client.
    pub fn with_http_client(mut self, http: Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Builds the client and validates its credentials with the gateway.
    pub async fn connect(self) -> Result<SecurePayClient, ClientError> {
        let base_url = self
            .base_url
            .unwrap_or_else(|| self.config.environment.base_url().to_string())
            .trim_end_matches('/')
            .to_string();

        let client = SecurePayClient {
            credentials: self.config.credentials,
            environment: self.config.environment,
            base_url,
            http: self.http.unwrap_or_default(),
        };

        client.validate_credentials().await?;
        Ok(client)
    }
}

/// SecurePay gateway client.
pub struct SecurePayClient {
    credentials: Credentials,
    environment: Environment,
    base_url: String,
    http: Client,
}

impl SecurePayClient {
    /// Starts building a client for the given configuration.
    pub fn builder(config: ClientConfig) -> ClientBuilder {
        ClientBuilder {
            config,
            base_url: None,
            http: None,
        }
    }

    /// Creates a client against the configured environment.
    pub async fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        Self::builder(config).connect().await
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn uid(&self) -> &str {
        self.credentials.uid()
    }

    /// Returns the path prefix used for calls of the given visibility.
    pub fn endpoint(&self, visibility: Visibility) -> String {
        visibility.prefix(&self.base_url)
    }

    /// Creates a new payment.
    ///
    /// `uid` and `token` are merged into `options` (replacing caller values),
    /// the allow-listed fields are signed, and every field plus `checksum` is
    /// posted form-encoded. The response is returned without a status check.
    #[instrument(skip(self, options))]
    pub async fn create_payment<I, K, V>(&self, options: I) -> Result<GatewayResponse, ClientError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut options: PaymentOptions = options
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        options.insert("uid".into(), self.credentials.uid().to_string());
        options.insert("token".into(), self.credentials.auth_token().to_string());

        let checksum = self.generate_checksum(
            CHECKSUM_FIELDS
                .iter()
                .filter_map(|field| options.get(*field).map(|value| (*field, value.as_str()))),
        );
        options.insert(checksum::CHECKSUM_FIELD.into(), checksum);

        debug!(
            order_number = options.get("order_number").map(String::as_str),
            fields = options.len(),
            "Creating payment"
        );

        let resp = self
            .request(Method::POST, Visibility::Private, "payments")
            .form(&options)
            .send()
            .await?;

        let status = resp.status().as_u16();
        let body = resp.bytes().await?.to_vec();
        debug!(status, "Payment response received");

        Ok(GatewayResponse { status, body })
    }

    /// Lists retail (B2C) banks, optionally filtered by online status.
    pub async fn retail_bank_list(&self, online: Option<bool>) -> Result<Value, ClientError> {
        self.bank_list("banks/b2c", online).await
    }

    /// Lists corporate (B2B) banks, optionally filtered by online status.
    pub async fn corporate_bank_list(&self, online: Option<bool>) -> Result<Value, ClientError> {
        self.bank_list("banks/b2b", online).await
    }

    /// Signs a field set with this merchant's checksum token.
    pub fn generate_checksum<I, K, V>(&self, fields: I) -> String
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        checksum::generate_checksum(fields, self.credentials.checksum_token())
    }

    /// Verifies a gateway result against the expected checksum.
    pub fn verify_checksum(&self, result: &Map<String, Value>, expected: &str) -> bool {
        checksum::verify_checksum_with_token(result, expected, self.credentials.checksum_token())
    }

    /// Verifies a callback carrying its own `checksum` field.
    pub fn verify_callback(&self, fields: &Map<String, Value>) -> bool {
        checksum::verify_callback(fields, self.credentials.checksum_token())
    }

    #[instrument(skip(self), fields(uid = %self.credentials.uid(), environment = %self.environment))]
    async fn validate_credentials(&self) -> Result<(), ClientError> {
        let resp = self
            .request(Method::POST, Visibility::Private, "merchants/validate")
            .form(&[("checksum_token", self.credentials.checksum_token())])
            .send()
            .await?;

        let status = resp.status();
        if status != StatusCode::CREATED {
            warn!(status = status.as_u16(), "Gateway rejected credentials");
            return Err(ClientError::InvalidCredential {
                status: status.as_u16(),
            });
        }

        debug!("Credentials validated");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn bank_list(&self, path: &str, online: Option<bool>) -> Result<Value, ClientError> {
        let mut req = self.request(Method::GET, Visibility::Public, path);
        if let Some(status) = BankStatus::from_online(online) {
            req = req.query(&[("status", status.as_str())]);
        }

        let resp = req.send().await?;
        let status = resp.status().as_u16();
        debug!(status, "Bank list response received");

        let body = resp.bytes().await?;
        serde_json::from_slice(&body).map_err(|err| {
            warn!(status, error = %err, "Bank list body is not JSON");
            ClientError::Api {
                status,
                message: String::from_utf8_lossy(&body).into_owned(),
            }
        })
    }

    fn request(&self, method: Method, visibility: Visibility, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.endpoint(visibility), path);
        self.http
            .request(method, url)
            .basic_auth(self.credentials.uid(), Some(self.credentials.auth_token()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(environment: Environment) -> ClientConfig {
        ClientConfig::new(
            Credentials::new("uid", "auth", "sum").unwrap(),
            environment,
        )
    }

    fn offline_client(environment: Environment, base_url: Option<&str>) -> SecurePayClient {
        SecurePayClient {
            credentials: config(environment).credentials,
            environment,
            base_url: base_url
                .unwrap_or(environment.base_url())
                .trim_end_matches('/')
                .to_string(),
            http: Client::new(),
        }
    }

    #[test]
    fn test_endpoint_follows_environment() {
        let client = offline_client(Environment::Sandbox, None);
        assert_eq!(
            client.endpoint(Visibility::Private),
            "https://sandbox.securepay.my/api/v1/"
        );

        let client = offline_client(Environment::Production, None);
        assert_eq!(
            client.endpoint(Visibility::Public),
            "https://securepay.my/api/public/v1/"
        );
    }

    #[test]
    fn test_endpoint_with_base_url_override() {
        let client = offline_client(Environment::Production, Some("http://127.0.0.1:9000/api/"));
        assert_eq!(
            client.endpoint(Visibility::Private),
            "http://127.0.0.1:9000/api/v1/"
        );
        assert_eq!(client.environment(), Environment::Production);
    }

    #[test]
    fn test_gateway_response_helpers() {
        let resp = GatewayResponse {
            status: 422,
            body: br#"{"message":"invalid amount"}"#.to_vec(),
        };
        assert!(!resp.is_success());
        assert_eq!(resp.text(), r#"{"message":"invalid amount"}"#);

        let value: Value = resp.json().unwrap();
        assert_eq!(value["message"], "invalid amount");
    }

    #[test]
    fn test_verify_checksum_uses_stored_token() {
        let client = offline_client(Environment::Sandbox, None);
        let checksum = client.generate_checksum([("order_number", "ORD-1")]);

        let mut result = Map::new();
        result.insert("order_number".into(), Value::String("ORD-1".into()));

        assert!(client.verify_checksum(&result, &checksum));
        assert!(!client.verify_checksum(&result, "deadbeef"));
    }
}
