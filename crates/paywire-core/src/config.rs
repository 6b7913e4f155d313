//! Configuration types for Paywire components.
//!
//! Settings are layered: config file, then environment variables and CLI flags.
//! Each layer is a [`PaywireSettings`] with every field optional; the merged
//! result is validated into a [`PayPalConfig`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;

/// PayPal environment.
///
/// Determines which API host requests go to. Sandbox and live credentials
/// are not interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Test environment at `api-m.sandbox.paypal.com`.
    #[default]
    Sandbox,
    /// Production environment at `api-m.paypal.com`.
    Live,
}

impl Mode {
    /// REST API base URL for this environment.
    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Sandbox => "https://api-m.sandbox.paypal.com",
            Self::Live => "https://api-m.paypal.com",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sandbox => write!(f, "sandbox"),
            Self::Live => write!(f, "live"),
        }
    }
}

impl FromStr for Mode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sandbox" => Ok(Self::Sandbox),
            "live" => Ok(Self::Live),
            _ => Err(AppError::ConfigError(format!(
                "Unknown PayPal mode: '{}'. Valid options: sandbox, live",
                s
            ))),
        }
    }
}

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_base_delay: Duration::from_millis(500),
        }
    }
}

/// Validated PayPal client configuration.
#[derive(Clone)]
pub struct PayPalConfig {
    pub mode: Mode,
    pub client_id: String,
    pub client_secret: String,
    /// Overrides the mode's base URL (proxies, test servers).
    pub api_base: Option<String>,
    pub return_url: Option<String>,
    pub cancel_url: Option<String>,
    pub currency: Option<String>,
}

impl PayPalConfig {
    /// Creates a config with credentials only.
    pub fn new(mode: Mode, client_id: &str, client_secret: &str) -> Self {
        Self {
            mode,
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            api_base: None,
            return_url: None,
            cancel_url: None,
            currency: None,
        }
    }

    /// Points the client at a different host than the mode's default.
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = Some(api_base.to_string());
        self
    }

    /// Base URL requests are sent to.
    pub fn api_base(&self) -> &str {
        self.api_base.as_deref().unwrap_or(self.mode.base_url())
    }
}

// The secret never reaches logs.
impl fmt::Debug for PayPalConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayPalConfig")
            .field("mode", &self.mode)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("return_url", &self.return_url)
            .field("cancel_url", &self.cancel_url)
            .field("currency", &self.currency)
            .finish()
    }
}

/// One configuration layer, every field optional.
///
/// Deserialized from `paywire.toml`:
///
/// ```toml
/// mode = "sandbox"
/// client_id = "AXXXX"
/// client_secret = "EXXXX"
/// return_url = "https://shop.example.com/paypal/return"
/// cancel_url = "https://shop.example.com/paypal/cancel"
/// currency = "EUR"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaywireSettings {
    pub mode: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub api_base: Option<String>,
    pub return_url: Option<String>,
    pub cancel_url: Option<String>,
    pub currency: Option<String>,
}

impl PaywireSettings {
    /// Layers `other` on top of `self`; values set in `other` win.
    pub fn merge(self, other: PaywireSettings) -> Self {
        Self {
            mode: other.mode.or(self.mode),
            client_id: other.client_id.or(self.client_id),
            client_secret: other.client_secret.or(self.client_secret),
            api_base: other.api_base.or(self.api_base),
            return_url: other.return_url.or(self.return_url),
            cancel_url: other.cancel_url.or(self.cancel_url),
            currency: other.currency.or(self.currency),
        }
    }

    /// Validates the merged settings.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if the client id or secret is missing or
    /// blank, or if `mode` is not `sandbox`/`live`.
    pub fn into_config(self) -> Result<PayPalConfig, AppError> {
        let mode = match self.mode.as_deref() {
            Some(m) => m.parse()?,
            None => Mode::default(),
        };
        let client_id = non_blank(self.client_id).ok_or_else(|| {
            AppError::ConfigError(
                "PayPal client id is required (PAYPAL_CLIENT_ID or client_id in config)"
                    .to_string(),
            )
        })?;
        let client_secret = non_blank(self.client_secret).ok_or_else(|| {
            AppError::ConfigError(
                "PayPal client secret is required (PAYPAL_CLIENT_SECRET or client_secret in config)"
                    .to_string(),
            )
        })?;

        Ok(PayPalConfig {
            mode,
            client_id,
            client_secret,
            api_base: non_blank(self.api_base),
            return_url: non_blank(self.return_url),
            cancel_url: non_blank(self.cancel_url),
            currency: non_blank(self.currency),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

const CONFIG_DIR_NAME: &str = "paywire";
const CONFIG_FILE_NAME: &str = "paywire.toml";

/// Returns the default configuration directory path.
///
/// Path: `~/.config/paywire/`
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(CONFIG_DIR_NAME))
}

/// Returns the default configuration file path.
///
/// Path: `~/.config/paywire/paywire.toml`
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|p| p.join(CONFIG_FILE_NAME))
}

/// Loads settings from a TOML file.
///
/// With `None`, the default path is used and a missing file yields `Ok(None)`.
/// An explicit path that does not exist is an error.
pub fn load_settings(path: Option<PathBuf>) -> Result<Option<PaywireSettings>, AppError> {
    let using_default_path = path.is_none();
    let config_path = match path {
        Some(p) => p,
        None => match default_config_path() {
            Some(p) => p,
            None => return Ok(None),
        },
    };

    if !config_path.exists() {
        if using_default_path {
            tracing::debug!("No config file at {}", config_path.display());
            return Ok(None);
        }
        return Err(AppError::ConfigError(format!(
            "Config file not found: {}",
            config_path.display()
        )));
    }

    read_settings(&config_path).map(Some)
}

fn read_settings(path: &Path) -> Result<PaywireSettings, AppError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        AppError::ConfigError(format!(
            "Failed to read config file '{}': {}",
            path.display(),
            e
        ))
    })?;

    let settings: PaywireSettings = toml::from_str(&content).map_err(|e| {
        AppError::ConfigError(format!("Invalid TOML in '{}': {}", path.display(), e))
    })?;

    tracing::debug!("Loaded config from {}", path.display());
    Ok(settings)
}
