//! PayPal REST client for the v1 Payments API.
//!
//! Authenticates with OAuth2 client credentials, caches the access token until
//! shortly before it expires and retries transient failures.
//!
//! # Examples
//!
//! ```no_run
//! use paywire_client::PayPalClient;
//! use paywire_core::traits::PaymentGateway;
//! use paywire_core::{Mode, PayPalConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PayPalConfig::new(Mode::Sandbox, "client-id", "client-secret");
//! let client = PayPalClient::new(&config)?;
//! let payment = client.get_payment("PAY-1AB23456CD789012EF34GHIJ").await?;
//! println!("{:?}", payment.state);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use paywire_core::error::{AppError, PayPalErrorDetails, PayPalErrorKind};
use paywire_core::models::{ExecutePaymentRequest, Payment, PaymentRequest};
use paywire_core::{HttpConfig, PayPalConfig};
use reqwest::header::{ACCEPT, HeaderMap, RETRY_AFTER};
use reqwest::{Client, Method, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Header PayPal uses to deduplicate retried POSTs.
pub const REQUEST_ID_HEADER: &str = "PayPal-Request-Id";

/// OAuth2 token response
#[derive(Deserialize, Debug)]
struct TokenResponse {
    access_token: String,
    /// Lifetime in seconds
    expires_in: u64,
}

/// Error body of the payments API
#[derive(Deserialize, Debug)]
struct PayPalErrorBody {
    name: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    debug_id: Option<String>,
    #[serde(default)]
    details: Vec<PayPalErrorField>,
}

#[derive(Deserialize, Debug)]
struct PayPalErrorField {
    #[serde(default)]
    field: Option<String>,
    #[serde(default)]
    issue: Option<String>,
}

/// Error body of the OAuth2 token endpoint
#[derive(Deserialize, Debug)]
struct OAuthErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    fn new(value: String, expires_in: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + expires_in,
        }
    }

    fn is_fresh(&self, now: Instant) -> bool {
        now + PayPalClient::TOKEN_REFRESH_MARGIN < self.expires_at
    }
}

/// Classify a PayPal error from its status code and error name.
pub fn classify_paypal_error(status_code: u16, name: Option<&str>) -> PayPalErrorKind {
    match status_code {
        401 => PayPalErrorKind::Authentication,
        404 => PayPalErrorKind::NotFound,
        429 => PayPalErrorKind::RateLimit,
        500..=599 => PayPalErrorKind::ServerError,
        _ => match name {
            Some("AUTHENTICATION_FAILURE" | "invalid_client" | "invalid_token") => {
                PayPalErrorKind::Authentication
            }
            Some("INVALID_RESOURCE_ID") => PayPalErrorKind::NotFound,
            Some("RATE_LIMIT_REACHED") => PayPalErrorKind::RateLimit,
            Some(
                "INSTRUMENT_DECLINED"
                | "CREDIT_CARD_REFUSED"
                | "TRANSACTION_REFUSED"
                | "PAYER_CANNOT_PAY"
                | "PAYMENT_ALREADY_DONE"
                | "PAYMENT_NOT_APPROVED_FOR_EXECUTION"
                | "PAYMENT_STATE_INVALID"
                | "PAYMENT_EXPIRED",
            ) => PayPalErrorKind::PaymentDeclined,
            Some("VALIDATION_ERROR" | "MALFORMED_REQUEST" | "INVALID_REQUEST") => {
                PayPalErrorKind::Validation
            }
            _ if status_code == 400 || status_code == 422 => PayPalErrorKind::Validation,
            _ => PayPalErrorKind::Unknown,
        },
    }
}

/// Turn a non-success response body into structured error details.
///
/// Understands both the payments error shape (`name`/`message`/`debug_id`)
/// and the OAuth2 shape (`error`/`error_description`).
pub fn parse_error_body(status_code: u16, body: &str) -> PayPalErrorDetails {
    if let Ok(err) = serde_json::from_str::<PayPalErrorBody>(body) {
        let mut message = err.message.unwrap_or_else(|| err.name.clone());
        let issues: Vec<String> = err
            .details
            .iter()
            .filter_map(|d| match (&d.field, &d.issue) {
                (Some(field), Some(issue)) => Some(format!("{}: {}", field, issue)),
                (None, Some(issue)) => Some(issue.clone()),
                _ => None,
            })
            .collect();
        if !issues.is_empty() {
            message = format!("{} ({})", message, issues.join("; "));
        }
        return PayPalErrorDetails {
            kind: classify_paypal_error(status_code, Some(err.name.as_str())),
            name: Some(err.name),
            message,
            debug_id: err.debug_id,
            status_code,
        };
    }

    if let Ok(err) = serde_json::from_str::<OAuthErrorBody>(body) {
        return PayPalErrorDetails {
            kind: classify_paypal_error(status_code, Some(err.error.as_str())),
            message: err.error_description.unwrap_or_else(|| err.error.clone()),
            name: Some(err.error),
            debug_id: None,
            status_code,
        };
    }

    PayPalErrorDetails::new(
        classify_paypal_error(status_code, None),
        format!("HTTP {}: {}", status_code, body),
        status_code,
    )
}

/// `Retry-After` in seconds, capped at the client's maximum backoff.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(|secs| Duration::from_secs(secs).min(PayPalClient::MAX_RETRY_DELAY))
}

/// HTTP client for the PayPal REST API.
///
/// Cloning is cheap; clones share the HTTP connection pool and the cached
/// access token.
#[derive(Clone)]
pub struct PayPalClient {
    client: Client,
    base_url: Url,
    client_id: String,
    client_secret: String,
    http_config: HttpConfig,
    token: Arc<Mutex<Option<AccessToken>>>,
}

impl PayPalClient {
    /// A token is refreshed this long before PayPal says it expires.
    const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

    /// Maximum backoff delay for rate-limited retries.
    const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

    /// Maximum attempts when PayPal answers 429.
    const RATE_LIMIT_MAX_RETRIES: u32 = 5;

    /// Creates a client for the configured mode (or `api_base` override).
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidUrl` if the base URL cannot be parsed.
    /// Returns `AppError::ClientError` if the HTTP client cannot be built.
    pub fn new(config: &PayPalConfig) -> Result<Self, AppError> {
        Self::with_http_config(config, HttpConfig::default())
    }

    /// Creates a client with custom timeout and retry settings.
    pub fn with_http_config(
        config: &PayPalConfig,
        http_config: HttpConfig,
    ) -> Result<Self, AppError> {
        let base_url = Url::parse(config.api_base())
            .map_err(|e| AppError::InvalidUrl(format!("{}: {}", config.api_base(), e)))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::InvalidUrl(config.api_base().to_string()));
        }

        let client = Client::builder()
            .user_agent(concat!("Paywire/", env!("CARGO_PKG_VERSION")))
            .timeout(http_config.timeout)
            .build()
            .map_err(|e| AppError::ClientError(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            http_config,
            token: Arc::new(Mutex::new(None)),
        })
    }

    /// Returns the API base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Builds an endpoint URL from path segments; each segment is percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, AppError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Returns a cached access token, fetching a new one when needed.
    ///
    /// Concurrent callers wait on the same lock, so only one token request
    /// is in flight at a time.
    pub async fn access_token(&self) -> Result<String, AppError> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref().filter(|t| t.is_fresh(Instant::now())) {
            return Ok(token.value.clone());
        }

        let token = self.fetch_token().await?;
        let value = token.value.clone();
        *guard = Some(token);
        Ok(value)
    }

    /// Drops the cached token so the next request fetches a new one.
    pub async fn invalidate_token(&self) {
        self.token.lock().await.take();
    }

    async fn fetch_token(&self) -> Result<AccessToken, AppError> {
        let url = self.endpoint(&["v1", "oauth2", "token"])?;
        debug!(url = %url, "Requesting PayPal access token");

        let response = self
            .client
            .post(url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .header(ACCEPT, "application/json")
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::PayPalError(parse_error_body(
                status.as_u16(),
                &body,
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            AppError::ClientError(format!("Failed to parse PayPal token response: {}", e))
        })?;

        info!(expires_in = token.expires_in, "Obtained PayPal access token");
        Ok(AccessToken::new(
            token.access_token,
            Duration::from_secs(token.expires_in),
        ))
    }

    fn map_send_error(&self, e: reqwest::Error) -> AppError {
        if e.is_timeout() {
            AppError::Timeout(self.http_config.timeout.as_secs())
        } else if e.is_connect() {
            AppError::NetworkError(format!("Cannot connect to PayPal: {}", e))
        } else {
            AppError::ClientError(e.to_string())
        }
    }

    /// Sends an authenticated JSON request, retrying transient failures.
    ///
    /// - 401: the cached token is dropped and the request is retried once.
    /// - 429: waits for `Retry-After`, or backs off exponentially (capped).
    /// - 5xx, timeouts, connect errors: linear backoff up to `max_retries`.
    ///
    /// POSTs carry one `PayPal-Request-Id` for all attempts so a retried
    /// create or execute is not applied twice.
    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
    ) -> Result<T, AppError> {
        let max_retries = self.http_config.max_retries.max(1);
        let base_delay = self.http_config.retry_base_delay;
        let effective_max = Self::RATE_LIMIT_MAX_RETRIES.max(max_retries);
        let request_id = (method == Method::POST).then(|| Uuid::new_v4().to_string());
        let mut token_refreshed = false;
        let mut attempt: u32 = 1;

        loop {
            let token = self.access_token().await?;

            let mut builder = self
                .client
                .request(method.clone(), url.clone())
                .bearer_auth(&token)
                .header(ACCEPT, "application/json");
            if let Some(id) = &request_id {
                builder = builder.header(REQUEST_ID_HEADER, id);
            }
            if let Some(body) = body {
                builder = builder.json(body);
            }

            debug!(method = %method, url = %url, attempt, "Sending PayPal request");

            match builder.send().await {
                Ok(resp) => {
                    let status = resp.status();

                    if status.is_success() {
                        let text = resp.text().await.map_err(|e| {
                            AppError::ClientError(format!("Failed to read PayPal response: {}", e))
                        })?;
                        if text.trim().is_empty() {
                            return Err(AppError::EmptyResponse);
                        }
                        return serde_json::from_str(&text).map_err(|e| {
                            AppError::ClientError(format!(
                                "Failed to parse PayPal response: {}",
                                e
                            ))
                        });
                    }

                    // The refresh is not a retry; `attempt` stays put.
                    if status == StatusCode::UNAUTHORIZED && !token_refreshed {
                        warn!("PayPal rejected the access token, refreshing");
                        self.invalidate_token().await;
                        token_refreshed = true;
                        continue;
                    }

                    if status == StatusCode::TOO_MANY_REQUESTS && attempt < effective_max {
                        let delay = retry_after(resp.headers())
                            .unwrap_or_else(|| Self::backoff_delay(base_delay, attempt));
                        warn!(attempt, delay_ms = delay.as_millis() as u64, "PayPal rate limit hit, backing off");
                        sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    if status.is_server_error() && attempt < max_retries {
                        let delay = base_delay * attempt;
                        warn!(
                            attempt,
                            status = status.as_u16(),
                            delay_ms = delay.as_millis() as u64,
                            "PayPal server error, retrying"
                        );
                        sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    let body = resp.text().await.unwrap_or_default();
                    let details = parse_error_body(status.as_u16(), &body);
                    debug!(error = %details, "PayPal request failed");
                    return Err(AppError::PayPalError(details));
                }
                Err(e) => {
                    let transient = e.is_timeout() || e.is_connect();
                    let err = self.map_send_error(e);

                    if transient && attempt < max_retries {
                        let delay = base_delay * attempt;
                        warn!(attempt, error = %err, "PayPal request failed, retrying");
                        sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(err);
                }
            }
        }
    }

    /// Exponential backoff for 429s without `Retry-After`, capped.
    fn backoff_delay(base_delay: Duration, attempt: u32) -> Duration {
        base_delay
            .saturating_mul(2_u32.saturating_pow(attempt))
            .min(Self::MAX_RETRY_DELAY)
    }

    /// `POST /v1/payments/payment`
    pub async fn create_payment(&self, request: &PaymentRequest) -> Result<Payment, AppError> {
        let url = self.endpoint(&["v1", "payments", "payment"])?;
        let body = serde_json::to_value(request)?;
        self.send_json(Method::POST, url, Some(&body)).await
    }

    /// `POST /v1/payments/payment/{id}/execute`
    pub async fn execute_payment(
        &self,
        payment_id: &str,
        request: &ExecutePaymentRequest,
    ) -> Result<Payment, AppError> {
        let url = self.endpoint(&["v1", "payments", "payment", payment_id, "execute"])?;
        let body = serde_json::to_value(request)?;
        self.send_json(Method::POST, url, Some(&body)).await
    }

    /// `GET /v1/payments/payment/{id}`
    pub async fn get_payment(&self, payment_id: &str) -> Result<Payment, AppError> {
        let url = self.endpoint(&["v1", "payments", "payment", payment_id])?;
        self.send_json(Method::GET, url, None).await
    }
}

// =============================================================================
// Trait Implementation: PaymentGateway
// =============================================================================

impl paywire_core::traits::PaymentGateway for PayPalClient {
    fn name(&self) -> &'static str {
        "paypal"
    }

    async fn create_payment(&self, request: &PaymentRequest) -> Result<Payment, AppError> {
        PayPalClient::create_payment(self, request).await
    }

    async fn execute_payment(
        &self,
        payment_id: &str,
        request: &ExecutePaymentRequest,
    ) -> Result<Payment, AppError> {
        PayPalClient::execute_payment(self, payment_id, request).await
    }

    async fn get_payment(&self, payment_id: &str) -> Result<Payment, AppError> {
        PayPalClient::get_payment(self, payment_id).await
    }
}
