use clap::{Parser, Subcommand, ValueEnum};
use paywire_core::{PaymentIntent, PaywireSettings};
use std::path::PathBuf;
use std::sync::LazyLock;

static VERSION_INFO: LazyLock<String> = LazyLock::new(|| {
    let version = env!("CARGO_PKG_VERSION");

    let commit = option_env!("VERGEN_GIT_SHA")
        .map(|s| s.chars().take(7).collect::<String>())
        .unwrap_or_else(|| "unknown".to_string());

    let built = option_env!("VERGEN_BUILD_DATE").unwrap_or("unknown");
    let target = option_env!("VERGEN_CARGO_TARGET_TRIPLE").unwrap_or("unknown");
    let rustc = option_env!("VERGEN_RUSTC_SEMVER").unwrap_or("unknown");

    format!("{version}\ncommit: {commit}\nbuilt: {built}\ntarget: {target}\nrustc: {rustc}")
});

pub fn version_info() -> &'static str {
    &VERSION_INFO
}

/// CLI configuration parsed from command line arguments and environment variables
#[derive(Parser, Debug)]
#[command(name = "paywire")]
#[command(
    author,
    version = version_info(),
    about = "Create, approve and execute PayPal payments"
)]
#[command(after_help = "Examples:
  paywire create --amount 10.00 --description \"Order #42\"
  paywire approval-url PAY-1AB23456CD789012EF34GHIJ
  paywire execute PAY-1AB23456CD789012EF34GHIJ PAYERID123
  paywire show PAY-1AB23456CD789012EF34GHIJ

Settings are read from ~/.config/paywire/paywire.toml (or --config),
then overridden by environment variables and flags.")]
pub struct Config {
    /// Custom path to paywire.toml
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// PayPal environment: sandbox (default) or live
    #[arg(long, env = "PAYPAL_MODE")]
    pub mode: Option<String>,

    /// PayPal REST app client id
    #[arg(long, env = "PAYPAL_CLIENT_ID")]
    pub client_id: Option<String>,

    /// PayPal REST app client secret
    #[arg(long, env = "PAYPAL_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Override the API host (e.g. a proxy)
    #[arg(long, env = "PAYPAL_API_BASE")]
    pub api_base: Option<String>,

    /// Where PayPal sends the buyer after approval
    #[arg(long, env = "PAYPAL_RETURN_URL")]
    pub return_url: Option<String>,

    /// Where PayPal sends the buyer after cancelling
    #[arg(long, env = "PAYPAL_CANCEL_URL")]
    pub cancel_url: Option<String>,

    /// Currency used when a command does not name one (default USD)
    #[arg(long, env = "PAYPAL_CURRENCY")]
    pub default_currency: Option<String>,

    /// Log requests and retries
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Config {
    /// Settings given on the command line or through the environment.
    pub fn settings(&self) -> PaywireSettings {
        PaywireSettings {
            mode: self.mode.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            api_base: self.api_base.clone(),
            return_url: self.return_url.clone(),
            cancel_url: self.cancel_url.clone(),
            currency: self.default_currency.clone(),
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a payment and print it
    #[command(after_help = "Example: paywire create --amount 25.00 --currency EUR")]
    Create {
        /// Total to charge, as a decimal string
        #[arg(short, long)]
        amount: String,
        /// ISO-4217 currency code
        #[arg(long)]
        currency: Option<String>,
        /// Transaction description shown to the buyer
        #[arg(short, long)]
        description: Option<String>,
        /// Capture mode
        #[arg(short, long, default_value = "sale")]
        intent: IntentArg,
    },
    /// Execute a payment the buyer has approved
    Execute {
        /// Payment id returned by `create`
        payment_id: String,
        /// Payer id from the approval redirect
        payer_id: String,
        /// Final amount, if it differs from the approved one
        #[arg(short, long)]
        amount: Option<String>,
        /// Currency for --amount
        #[arg(long, requires = "amount")]
        currency: Option<String>,
    },
    /// Print the approval URL of a payment
    ApprovalUrl {
        payment_id: String,
    },
    /// Print a payment
    Show {
        payment_id: String,
    },
}

/// Payment intents accepted on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum IntentArg {
    /// Capture on execution
    Sale,
    /// Authorize now, capture later
    Authorize,
    /// Create an order
    Order,
}

impl From<IntentArg> for PaymentIntent {
    fn from(arg: IntentArg) -> Self {
        match arg {
            IntentArg::Sale => PaymentIntent::Sale,
            IntentArg::Authorize => PaymentIntent::Authorize,
            IntentArg::Order => PaymentIntent::Order,
        }
    }
}
