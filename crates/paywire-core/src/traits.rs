//! Trait definitions for the payment processor boundary.
//!
//! [`PaymentService`](crate::PaymentService) only talks to a [`PaymentGateway`],
//! so tests can swap the PayPal HTTP client for an in-memory implementation.
//!
//! # Example
//!
//! ```
//! use paywire_core::traits::PaymentGateway;
//! use paywire_core::{AppError, Payment};
//!
//! async fn state_of<G: PaymentGateway>(gateway: &G, id: &str) -> Result<Option<String>, AppError> {
//!     let payment: Payment = gateway.get_payment(id).await?;
//!     Ok(payment.state)
//! }
//! ```

use std::future::Future;

use crate::models::{ExecutePaymentRequest, Payment, PaymentRequest};
use crate::AppError;

/// Remote payment processor.
///
/// Implementations perform the HTTP calls, authentication and retries.
/// Results are returned as-is; callers do not reinterpret them.
pub trait PaymentGateway: Send + Sync + Clone {
    /// Short identifier used in logs (e.g. `"paypal"`).
    fn name(&self) -> &'static str;

    /// Creates a payment and returns the resource, including its links.
    fn create_payment(
        &self,
        request: &PaymentRequest,
    ) -> impl Future<Output = Result<Payment, AppError>> + Send;

    /// Executes a payment the buyer has approved.
    ///
    /// # Arguments
    ///
    /// * `payment_id` - The id returned by `create_payment`
    /// * `request` - Carries the `payer_id` from the approval redirect
    fn execute_payment(
        &self,
        payment_id: &str,
        request: &ExecutePaymentRequest,
    ) -> impl Future<Output = Result<Payment, AppError>> + Send;

    /// Looks up a payment by id.
    fn get_payment(
        &self,
        payment_id: &str,
    ) -> impl Future<Output = Result<Payment, AppError>> + Send;
}
