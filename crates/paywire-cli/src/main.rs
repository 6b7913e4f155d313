mod config;

use clap::Parser;
use dotenvy::dotenv;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use paywire_client::PayPalClient;
use paywire_core::{
    AppError, CreatePaymentOptions, ExecutePaymentOptions, Payment, PaymentDefaults,
    PaymentService, load_settings,
};

use crate::config::{Command, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::parse();

    let level = if config.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    run(config)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))
}

async fn run(config: Config) -> Result<(), AppError> {
    // File first, then env/flags on top
    let settings = load_settings(config.config.clone())?
        .unwrap_or_default()
        .merge(config.settings());
    let paypal_config = settings.into_config()?;

    info!(
        "Using PayPal {} ({})",
        paypal_config.mode,
        paypal_config.api_base()
    );

    let client = PayPalClient::new(&paypal_config)?;
    let service = PaymentService::with_defaults(client, PaymentDefaults::from(&paypal_config));

    match config.command {
        Command::Create {
            amount,
            currency,
            description,
            intent,
        } => {
            let options = CreatePaymentOptions {
                amount,
                currency,
                description,
                intent: intent.into(),
                ..Default::default()
            };
            let payment = service.create_payment(&options).await?;
            if let Some(link) = payment.link("approval_url") {
                info!("Buyer approval link: {}", link.href);
            }
            print_payment(&payment)?;
        }
        Command::Execute {
            payment_id,
            payer_id,
            amount,
            currency,
        } => {
            let options = ExecutePaymentOptions {
                payment_id,
                payer_id,
                amount,
                currency,
            };
            let payment = service.execute_payment(&options).await?;
            print_payment(&payment)?;
        }
        Command::ApprovalUrl { payment_id } => {
            let url = service.approval_url(&payment_id).await?;
            println!("{}", url);
        }
        Command::Show { payment_id } => {
            let payment = service.get_payment(&payment_id).await?;
            print_payment(&payment)?;
        }
    }

    Ok(())
}

fn print_payment(payment: &Payment) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(payment)?);
    Ok(())
}
