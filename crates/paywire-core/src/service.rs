//! Payment service: validation and payload construction in front of a gateway.
//!
//! Every operation checks its required fields first and fails with
//! [`AppError::MissingField`] without touching the gateway. Gateway results,
//! successful or not, are returned unchanged.

use tracing::{debug, info};

use crate::config::PayPalConfig;
use crate::error::AppError;
use crate::models::{
    Amount, CreatePaymentOptions, DEFAULT_CURRENCY, ExecutePaymentOptions, ExecutePaymentRequest,
    PAYMENT_METHOD_PAYPAL, Payer, Payment, PaymentRequest, RedirectUrls, Transaction,
};
use crate::traits::PaymentGateway;

/// Values applied when the caller's options leave them out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentDefaults {
    pub currency: String,
    pub return_url: Option<String>,
    pub cancel_url: Option<String>,
}

impl Default for PaymentDefaults {
    fn default() -> Self {
        Self {
            currency: DEFAULT_CURRENCY.to_string(),
            return_url: None,
            cancel_url: None,
        }
    }
}

impl From<&PayPalConfig> for PaymentDefaults {
    fn from(config: &PayPalConfig) -> Self {
        Self {
            currency: config
                .currency
                .clone()
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            return_url: config.return_url.clone(),
            cancel_url: config.cancel_url.clone(),
        }
    }
}

/// Create/execute/approve front end over a [`PaymentGateway`].
///
/// # Examples
///
/// ```ignore
/// use paywire_core::{CreatePaymentOptions, PaymentService};
///
/// let service = PaymentService::new(gateway);
/// let payment = service
///     .create_payment(&CreatePaymentOptions::new("10.00").with_redirect_urls(
///         "https://shop.example.com/return",
///         "https://shop.example.com/cancel",
///     ))
///     .await?;
/// let approve_at = service.approval_url(&payment.id).await?;
/// ```
#[derive(Clone)]
pub struct PaymentService<G: PaymentGateway> {
    gateway: G,
    defaults: PaymentDefaults,
}

impl<G: PaymentGateway> PaymentService<G> {
    /// Creates a service with USD and no default redirect URLs.
    pub fn new(gateway: G) -> Self {
        Self::with_defaults(gateway, PaymentDefaults::default())
    }

    pub fn with_defaults(gateway: G, defaults: PaymentDefaults) -> Self {
        Self { gateway, defaults }
    }

    /// Creates a payment for `options.amount`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::MissingField("amount")` if the amount is blank.
    /// Gateway errors pass through, including PayPal's rejection of a payment
    /// sent without redirect URLs.
    pub async fn create_payment(&self, options: &CreatePaymentOptions) -> Result<Payment, AppError> {
        let request = self.build_payment_request(options)?;
        debug!(
            gateway = self.gateway.name(),
            total = %request.transactions[0].amount.total,
            currency = %request.transactions[0].amount.currency,
            "Creating payment"
        );

        let payment = self.gateway.create_payment(&request).await?;
        info!(payment_id = %payment.id, "Payment created");
        Ok(payment)
    }

    /// Executes an approved payment on behalf of `options.payer_id`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::MissingField` for a blank `payment_id` or `payer_id`
    /// (checked in that order). Gateway errors pass through.
    pub async fn execute_payment(
        &self,
        options: &ExecutePaymentOptions,
    ) -> Result<Payment, AppError> {
        let payment_id = require(&options.payment_id, "payment_id")?;
        let request = self.build_execute_request(options)?;
        debug!(gateway = self.gateway.name(), payment_id, "Executing payment");

        let payment = self.gateway.execute_payment(payment_id, &request).await?;
        info!(payment_id = %payment.id, state = ?payment.state, "Payment executed");
        Ok(payment)
    }

    /// Returns the `href` of the first link on the payment.
    ///
    /// For a freshly created PayPal payment the links are `self`, `approval_url`
    /// and `execute`; callers that need a specific rel can use
    /// [`Payment::link`] on the result of [`get_payment`](Self::get_payment).
    ///
    /// # Errors
    ///
    /// Returns `AppError::MissingField("payment_id")` for a blank id and
    /// `AppError::MissingApprovalUrl` if the payment has no links.
    pub async fn approval_url(&self, payment_id: &str) -> Result<String, AppError> {
        let payment = self.get_payment(payment_id).await?;
        payment
            .links
            .into_iter()
            .next()
            .map(|link| link.href)
            .ok_or(AppError::MissingApprovalUrl(payment.id))
    }

    /// Fetches a payment by id.
    pub async fn get_payment(&self, payment_id: &str) -> Result<Payment, AppError> {
        let payment_id = require(payment_id, "payment_id")?;
        debug!(gateway = self.gateway.name(), payment_id, "Fetching payment");
        self.gateway.get_payment(payment_id).await
    }

    /// Builds the create-payment body without sending it.
    pub fn build_payment_request(
        &self,
        options: &CreatePaymentOptions,
    ) -> Result<PaymentRequest, AppError> {
        let total = require(&options.amount, "amount")?;
        // Sent only when both ends are known
        let redirect_urls = pick(&options.return_url, &self.defaults.return_url)
            .zip(pick(&options.cancel_url, &self.defaults.cancel_url))
            .map(|(return_url, cancel_url)| RedirectUrls {
                return_url,
                cancel_url,
            });

        Ok(PaymentRequest {
            intent: options.intent,
            payer: Payer {
                payment_method: PAYMENT_METHOD_PAYPAL.to_string(),
            },
            redirect_urls,
            transactions: vec![Transaction {
                amount: Amount {
                    total: total.to_string(),
                    currency: self.currency_or_default(&options.currency),
                },
                description: options.description.clone(),
            }],
        })
    }

    /// Builds the execute body without sending it.
    pub fn build_execute_request(
        &self,
        options: &ExecutePaymentOptions,
    ) -> Result<ExecutePaymentRequest, AppError> {
        let payer_id = require(&options.payer_id, "payer_id")?;
        let transactions = options
            .amount
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(|total| {
                vec![Transaction {
                    amount: Amount {
                        total: total.to_string(),
                        currency: self.currency_or_default(&options.currency),
                    },
                    description: None,
                }]
            });

        Ok(ExecutePaymentRequest {
            payer_id: payer_id.to_string(),
            transactions,
        })
    }

    fn currency_or_default(&self, currency: &Option<String>) -> String {
        currency
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_uppercase)
            .unwrap_or_else(|| self.defaults.currency.clone())
    }
}

/// Trims `value`, failing with `MissingField(field)` if nothing is left.
fn require<'a>(value: &'a str, field: &'static str) -> Result<&'a str, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::MissingField(field));
    }
    Ok(trimmed)
}

/// First non-blank of `value` and `fallback`, trimmed.
fn pick(value: &Option<String>, fallback: &Option<String>) -> Option<String> {
    [value, fallback]
        .into_iter()
        .filter_map(|v| v.as_deref().map(str::trim))
        .find(|v| !v.is_empty())
        .map(str::to_string)
}
