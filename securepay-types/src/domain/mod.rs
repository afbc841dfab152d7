//! Domain models for the SecurePay gateway.

pub mod credentials;
pub mod environment;
pub mod payment;

pub use credentials::Credentials;
pub use environment::{API_VERSION, BankStatus, Environment, Visibility};
pub use payment::{CHECKSUM_FIELDS, PaymentOptions, PaymentRequest};
