//! Payment resources and request options.
//!
//! The wire types mirror PayPal's v1 Payments API
//! (<https://developer.paypal.com/docs/api/payments/v1/>). Only the fields
//! Paywire builds or reads are typed; everything else PayPal returns is kept
//! in [`Payment::extras`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default ISO-4217 currency when neither options nor config name one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Payment method sent for every payment created here.
pub const PAYMENT_METHOD_PAYPAL: &str = "paypal";

/// How the funds are captured once the buyer approves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentIntent {
    /// Capture immediately on execution.
    #[default]
    Sale,
    /// Authorize now, capture later.
    Authorize,
    /// Create an order for later authorization.
    Order,
}

impl std::fmt::Display for PaymentIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sale => write!(f, "sale"),
            Self::Authorize => write!(f, "authorize"),
            Self::Order => write!(f, "order"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    /// Decimal string, e.g. `"10.00"`.
    pub total: String,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub amount: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payer {
    pub payment_method: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectUrls {
    pub return_url: String,
    pub cancel_url: String,
}

/// Body of `POST /v1/payments/payment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentRequest {
    pub intent: PaymentIntent,
    pub payer: Payer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_urls: Option<RedirectUrls>,
    pub transactions: Vec<Transaction>,
}

/// Body of `POST /v1/payments/payment/{id}/execute`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutePaymentRequest {
    pub payer_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transactions: Option<Vec<Transaction>>,
}

/// HATEOAS link attached to a payment (`self`, `approval_url`, `execute`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    pub rel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

/// Payment resource as returned by PayPal.
///
/// # Examples
///
/// ```
/// use paywire_core::models::Payment;
///
/// let json = r#"{
///     "id": "PAY-1AB23456CD789012EF34GHIJ",
///     "intent": "sale",
///     "state": "created",
///     "links": [
///         {"href": "https://api-m.sandbox.paypal.com/v1/payments/payment/PAY-1", "rel": "self", "method": "GET"},
///         {"href": "https://www.sandbox.paypal.com/cgi-bin/webscr?cmd=_express-checkout&token=EC-1", "rel": "approval_url", "method": "REDIRECT"}
///     ],
///     "update_time": "2024-01-01T00:00:00Z"
/// }"#;
///
/// let payment: Payment = serde_json::from_str(json).unwrap();
/// assert_eq!(payment.state.as_deref(), Some("created"));
/// assert_eq!(payment.links.len(), 2);
/// assert!(payment.link("approval_url").is_some());
/// assert!(payment.extras.contains_key("update_time"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    #[serde(default)]
    pub intent: Option<PaymentIntent>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    /// All other fields returned by PayPal (payer info, cart, failure reason, ...)
    #[serde(flatten)]
    pub extras: serde_json::Map<String, Value>,
}

impl Payment {
    /// Finds the first link with the given `rel`.
    pub fn link(&self, rel: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.rel == rel)
    }
}

/// Caller-facing options for creating a payment.
///
/// Missing fields deserialize to their defaults so that an absent `amount`
/// reaches validation as an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CreatePaymentOptions {
    pub amount: String,
    pub currency: Option<String>,
    pub description: Option<String>,
    pub intent: PaymentIntent,
    /// Overrides the configured return URL for this payment.
    pub return_url: Option<String>,
    /// Overrides the configured cancel URL for this payment.
    pub cancel_url: Option<String>,
}

impl CreatePaymentOptions {
    /// Options for a sale of `amount` with every other field defaulted.
    pub fn new(amount: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            ..Default::default()
        }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_intent(mut self, intent: PaymentIntent) -> Self {
        self.intent = intent;
        self
    }

    pub fn with_redirect_urls(
        mut self,
        return_url: impl Into<String>,
        cancel_url: impl Into<String>,
    ) -> Self {
        self.return_url = Some(return_url.into());
        self.cancel_url = Some(cancel_url.into());
        self
    }
}

/// Caller-facing options for executing an approved payment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExecutePaymentOptions {
    pub payment_id: String,
    pub payer_id: String,
    /// Final amount, when it differs from the one approved by the buyer.
    pub amount: Option<String>,
    pub currency: Option<String>,
}

impl ExecutePaymentOptions {
    pub fn new(payment_id: impl Into<String>, payer_id: impl Into<String>) -> Self {
        Self {
            payment_id: payment_id.into(),
            payer_id: payer_id.into(),
            ..Default::default()
        }
    }

    pub fn with_amount(mut self, amount: impl Into<String>) -> Self {
        self.amount = Some(amount.into());
        self
    }
}
