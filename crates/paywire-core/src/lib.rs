//! Paywire Core - Domain types, configuration, and the payment service.
//!
//! This crate provides:
//!
//! - **Domain models**: [`Payment`], [`PaymentRequest`], [`CreatePaymentOptions`], etc.
//! - **Service**: [`PaymentService`] validates options and builds payloads
//! - **Traits**: [`PaymentGateway`] abstracts the remote payment processor
//! - **Configuration**: [`PayPalConfig`], [`HttpConfig`], layered [`PaywireSettings`]
//!
//! # Architecture
//!
//! The service is generic over the gateway. `paywire-client` provides the
//! PayPal HTTP implementation; tests use in-memory gateways.
//!
//! # Example
//!
//! ```ignore
//! use paywire_client::PayPalClient;
//! use paywire_core::{CreatePaymentOptions, Mode, PayPalConfig, PaymentDefaults, PaymentService};
//!
//! let config = PayPalConfig::new(Mode::Sandbox, "client-id", "client-secret");
//! let gateway = PayPalClient::new(&config)?;
//! let service = PaymentService::with_defaults(gateway, PaymentDefaults::from(&config));
//!
//! let options = CreatePaymentOptions::new("10.00")
//!     .with_redirect_urls("https://shop.example.com/return", "https://shop.example.com/cancel");
//! let payment = service.create_payment(&options).await?;
//! println!("Approve at {}", service.approval_url(&payment.id).await?);
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod traits;

// Configuration
pub use config::{
    HttpConfig, Mode, PayPalConfig, PaywireSettings, default_config_path, load_settings,
};

// Error handling
pub use error::{AppError, PayPalErrorDetails, PayPalErrorKind};

// Domain models
pub use models::{
    Amount, CreatePaymentOptions, ExecutePaymentOptions, ExecutePaymentRequest, Link, Payer,
    Payment, PaymentIntent, PaymentRequest, RedirectUrls, Transaction,
};

// Service
pub use service::{PaymentDefaults, PaymentService};

// Traits for dependency injection
pub use traits::PaymentGateway;
