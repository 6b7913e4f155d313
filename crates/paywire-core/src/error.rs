use thiserror::Error;

/// PayPal API error classification.
///
/// PayPal reports failures with an HTTP status plus a machine-readable `name`
/// (e.g. `VALIDATION_ERROR`, `INSTRUMENT_DECLINED`). Both are used to pick a kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayPalErrorKind {
    /// Authentication failure (401, bad client id/secret or expired token)
    Authentication,
    /// Request payload rejected (400 `VALIDATION_ERROR`, `MALFORMED_REQUEST`)
    Validation,
    /// Unknown payment id (404 `INVALID_RESOURCE_ID`)
    NotFound,
    /// Payment could not be completed (declined, already done, not approved)
    PaymentDeclined,
    /// Rate limit exceeded (429)
    RateLimit,
    /// Server error (5xx)
    ServerError,
    /// Unknown or unclassified error
    Unknown,
}

/// Structured error details from the PayPal API
#[derive(Debug, Clone)]
pub struct PayPalErrorDetails {
    /// The specific error category
    pub kind: PayPalErrorKind,
    /// PayPal error name, e.g. `VALIDATION_ERROR`
    pub name: Option<String>,
    /// Human-readable error message from the API
    pub message: String,
    /// Correlation id to quote when contacting PayPal support
    pub debug_id: Option<String>,
    /// HTTP status code
    pub status_code: u16,
}

impl PayPalErrorDetails {
    /// Create a new PayPalErrorDetails without name or debug id
    pub fn new(kind: PayPalErrorKind, message: String, status_code: u16) -> Self {
        Self {
            kind,
            name: None,
            message,
            debug_id: None,
            status_code,
        }
    }
}

impl std::fmt::Display for PayPalErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(
                f,
                "PayPal API error (HTTP {}, {}): {}",
                self.status_code, name, self.message
            )?,
            None => write!(
                f,
                "PayPal API error (HTTP {}): {}",
                self.status_code, self.message
            )?,
        }
        if let Some(debug_id) = &self.debug_id {
            write!(f, " [debug_id: {}]", debug_id)?;
        }
        Ok(())
    }
}

/// Error type shared by all Paywire crates.
///
/// Validation errors (`MissingField`) are raised locally before any network
/// call. Everything else comes from the gateway and is returned to the caller
/// unchanged.
///
/// # Examples
///
/// ```
/// use paywire_core::error::AppError;
///
/// let err = AppError::MissingField("amount");
/// assert_eq!(err.to_string(), "Missing required field: amount");
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// A required request field was absent or blank.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// The payment carries no links, so there is no approval URL to return.
    #[error("No approval URL found for payment {0}")]
    MissingApprovalUrl(String),

    /// PayPal API call failed.
    ///
    /// Contains structured error information parsed from PayPal's error body.
    #[error("PayPal error: {0}")]
    PayPalError(PayPalErrorDetails),

    /// HTTP client request failed.
    ///
    /// This error occurs when HTTP requests fail for reasons other than
    /// timeouts or connection problems, or when a response cannot be parsed.
    #[error("API Client error: {0}")]
    ClientError(String),

    /// JSON serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// API response contained no data.
    #[error("Empty response from API")]
    EmptyResponse,

    /// Network or connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Request timeout.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Rate limit exceeded after all retries.
    #[error("Rate limit exceeded. Please wait and try again.")]
    RateLimitExceeded,

    /// Configuration error (missing credentials, malformed config file, bad mode).
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic application error for cases not covered by specific variants.
    #[error("Error: {0}")]
    Generic(String),
}

impl AppError {
    /// Returns a user-friendly error message suitable for CLI output.
    pub fn user_message(&self) -> String {
        match self {
            AppError::MissingField(field) => {
                format!("Missing required field: {}\n   Provide a non-empty value.", field)
            }
            AppError::MissingApprovalUrl(id) => {
                format!(
                    "Payment {} has no links.\n   It may already be approved or executed.",
                    id
                )
            }
            AppError::PayPalError(details) => match details.kind {
                PayPalErrorKind::Authentication => {
                    "PayPal rejected the credentials.\n   Check PAYPAL_CLIENT_ID, PAYPAL_CLIENT_SECRET and PAYPAL_MODE."
                        .to_string()
                }
                PayPalErrorKind::Validation => {
                    format!("PayPal rejected the request: {}", details.message)
                }
                PayPalErrorKind::NotFound => {
                    "Payment not found.\n   Check the payment id and that it belongs to this mode (sandbox/live)."
                        .to_string()
                }
                PayPalErrorKind::PaymentDeclined => {
                    format!("Payment could not be completed: {}", details.message)
                }
                PayPalErrorKind::RateLimit => {
                    "PayPal rate limit reached.\n   Wait a moment and try again.".to_string()
                }
                PayPalErrorKind::ServerError => {
                    format!(
                        "PayPal server error (HTTP {}).\n   Please try again later.",
                        details.status_code
                    )
                }
                PayPalErrorKind::Unknown => format!("PayPal error: {}", details.message),
            },
            AppError::NetworkError(msg) => {
                format!("Network error: {}\n   Check your internet connection.", msg)
            }
            AppError::Timeout(secs) => {
                format!(
                    "Request timed out after {} seconds.\n   PayPal may be slow. Try again later.",
                    secs
                )
            }
            AppError::RateLimitExceeded => {
                "Too many requests. Please wait a moment and try again.".to_string()
            }
            AppError::EmptyResponse => "PayPal returned no data.".to_string(),
            AppError::ConfigError(msg) => {
                format!(
                    "Configuration error: {}\n   Check your configuration file and environment.",
                    msg
                )
            }
            _ => self.to_string(),
        }
    }

    /// Returns true if this error is retryable.
    ///
    /// # Examples
    ///
    /// ```
    /// use paywire_core::error::AppError;
    ///
    /// assert!(AppError::NetworkError("connection reset".to_string()).is_retryable());
    /// assert!(AppError::RateLimitExceeded.is_retryable());
    /// assert!(!AppError::MissingField("amount").is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::NetworkError(_) | AppError::Timeout(_) | AppError::RateLimitExceeded => true,
            AppError::PayPalError(details) => matches!(
                details.kind,
                PayPalErrorKind::RateLimit | PayPalErrorKind::ServerError
            ),
            _ => false,
        }
    }
}
