//! Payment request fields.

use std::collections::BTreeMap;

/// Form fields sent to the payments endpoint.
pub type PaymentOptions = BTreeMap<String, String>;

/// Fields covered by the payment checksum.
///
/// Anything else in the request is transmitted but not signed.
pub const CHECKSUM_FIELDS: [&str; 9] = [
    "buyer_email",
    "buyer_name",
    "buyer_phone",
    "callback_url",
    "order_number",
    "product_description",
    "redirect_url",
    "transaction_amount",
    "uid",
];

/// A payment to create on the gateway.
///
/// `uid`, `token` and `checksum` are filled in by the client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentRequest {
    pub order_number: String,
    /// Amount in major units as the gateway expects it, e.g. `"10.00"`.
    pub transaction_amount: String,
    pub product_description: String,
    pub buyer_name: String,
    pub buyer_email: String,
    pub buyer_phone: String,
    pub callback_url: Option<String>,
    pub redirect_url: Option<String>,
    /// Additional gateway fields, sent unsigned.
    pub extra: BTreeMap<String, String>,
}

impl PaymentRequest {
    pub fn new(
        order_number: impl Into<String>,
        transaction_amount: impl Into<String>,
        product_description: impl Into<String>,
    ) -> Self {
        Self {
            order_number: order_number.into(),
            transaction_amount: transaction_amount.into(),
            product_description: product_description.into(),
            ..Default::default()
        }
    }

    /// Sets the buyer's contact details.
    pub fn with_buyer(
        mut self,
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        self.buyer_name = name.into();
        self.buyer_email = email.into();
        self.buyer_phone = phone.into();
        self
    }

    pub fn with_callback_url(mut self, url: impl Into<String>) -> Self {
        self.callback_url = Some(url.into());
        self
    }

    pub fn with_redirect_url(mut self, url: impl Into<String>) -> Self {
        self.redirect_url = Some(url.into());
        self
    }

    /// Adds an extra field. Extras never override the named fields.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Flattens the request into form fields.
    pub fn into_options(self) -> PaymentOptions {
        let mut options = self.extra;
        options.insert("order_number".into(), self.order_number);
        options.insert("transaction_amount".into(), self.transaction_amount);
        options.insert("product_description".into(), self.product_description);
        options.insert("buyer_name".into(), self.buyer_name);
        options.insert("buyer_email".into(), self.buyer_email);
        options.insert("buyer_phone".into(), self.buyer_phone);
        if let Some(url) = self.callback_url {
            options.insert("callback_url".into(), url);
        }
        if let Some(url) = self.redirect_url {
            options.insert("redirect_url".into(), url);
        }
        options
    }
}

impl From<PaymentRequest> for PaymentOptions {
    fn from(request: PaymentRequest) -> Self {
        request.into_options()
    }
}
