//! Paywire Client - HTTP client for the PayPal REST API
//!
//! This crate provides [`PayPalClient`], the [`PaymentGateway`] implementation
//! used by the CLI. It handles OAuth2 authentication, request building,
//! response parsing, retries and error classification.
//!
//! [`PaymentGateway`]: paywire_core::traits::PaymentGateway

pub mod paypal;

// Re-export main client types
pub use paypal::{PayPalClient, classify_paypal_error, parse_error_body};
