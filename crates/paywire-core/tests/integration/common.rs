//! Test utilities and a recording mock gateway.

use std::sync::{Arc, Mutex};

use paywire_core::models::{ExecutePaymentRequest, Link, Payment, PaymentRequest};
use paywire_core::traits::PaymentGateway;
use paywire_core::{AppError, PayPalErrorDetails};

/// A call received by [`MockGateway`].
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    Create(PaymentRequest),
    Execute(String, ExecutePaymentRequest),
    Get(String),
}

/// Gateway that records calls and answers with a canned payment or error.
#[derive(Clone)]
pub struct MockGateway {
    calls: Arc<Mutex<Vec<GatewayCall>>>,
    links: Vec<Link>,
    failure: Option<PayPalErrorDetails>,
}

impl MockGateway {
    /// Answers every call with a payment carrying the usual three links.
    pub fn new() -> Self {
        Self::with_links(vec![
            link("https://api-m.sandbox.paypal.com/v1/payments/payment/PAY-TEST", "self"),
            link(
                "https://www.sandbox.paypal.com/cgi-bin/webscr?cmd=_express-checkout&token=EC-TEST",
                "approval_url",
            ),
            link(
                "https://api-m.sandbox.paypal.com/v1/payments/payment/PAY-TEST/execute",
                "execute",
            ),
        ])
    }

    pub fn with_links(links: Vec<Link>) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            links,
            failure: None,
        }
    }

    /// Answers every call with `AppError::PayPalError(details)`.
    pub fn failing(details: PayPalErrorDetails) -> Self {
        Self {
            failure: Some(details),
            ..Self::new()
        }
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }

    fn respond(&self, call: GatewayCall, id: &str, state: &str) -> Result<Payment, AppError> {
        self.calls.lock().unwrap().push(call);
        if let Some(details) = &self.failure {
            return Err(AppError::PayPalError(details.clone()));
        }
        Ok(Payment {
            id: id.to_string(),
            intent: None,
            state: Some(state.to_string()),
            create_time: None,
            links: self.links.clone(),
            transactions: Vec::new(),
            extras: serde_json::Map::new(),
        })
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentGateway for MockGateway {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn create_payment(&self, request: &PaymentRequest) -> Result<Payment, AppError> {
        self.respond(GatewayCall::Create(request.clone()), "PAY-TEST", "created")
    }

    async fn execute_payment(
        &self,
        payment_id: &str,
        request: &ExecutePaymentRequest,
    ) -> Result<Payment, AppError> {
        self.respond(
            GatewayCall::Execute(payment_id.to_string(), request.clone()),
            payment_id,
            "approved",
        )
    }

    async fn get_payment(&self, payment_id: &str) -> Result<Payment, AppError> {
        self.respond(GatewayCall::Get(payment_id.to_string()), payment_id, "created")
    }
}

pub fn link(href: &str, rel: &str) -> Link {
    Link {
        href: href.to_string(),
        rel: rel.to_string(),
        method: None,
    }
}
