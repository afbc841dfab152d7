//! SecurePay CLI
//!
//! Command-line interface for the SecurePay gateway.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{Form, extract::State, http::StatusCode, response::IntoResponse};
use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use securepay_client::{SecurePayClient, checksum};
use securepay_types::{ClientConfig, Credentials, Environment, PaymentRequest};

#[derive(Parser)]
#[command(name = "securepay")]
#[command(author, version, about = "SecurePay gateway CLI client", long_about = None)]
struct Cli {
    /// Merchant UID
    #[arg(long, env = "SECUREPAY_UID", default_value = "")]
    uid: String,

    /// API auth token
    #[arg(long, env = "SECUREPAY_AUTH_TOKEN", default_value = "", hide_env_values = true)]
    auth_token: String,

    /// Checksum token used to sign and verify field sets
    #[arg(long, env = "SECUREPAY_CHECKSUM_TOKEN", hide_env_values = true)]
    checksum_token: String,

    /// Gateway environment (sandbox or production)
    #[arg(long, env = "SECUREPAY_ENVIRONMENT", default_value = "sandbox")]
    environment: Environment,

    /// Override the environment's base URL
    #[arg(long, env = "SECUREPAY_BASE_URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the gateway accepts the configured credentials
    Validate,
    /// Payment operations
    Payment {
        #[command(subcommand)]
        action: PaymentCommands,
    },
    /// Bank list lookups
    Banks {
        #[command(subcommand)]
        action: BankCommands,
    },
    /// Offline checksum tools (no credential validation)
    Checksum {
        #[command(subcommand)]
        action: ChecksumCommands,
    },
    /// Gateway callback tools
    Callback {
        #[command(subcommand)]
        action: CallbackCommands,
    },
}

#[derive(Subcommand)]
enum PaymentCommands {
    /// Create a new payment and print the gateway response
    Create {
        #[arg(long)]
        order_number: String,
        /// Amount in major units, e.g. 10.00
        #[arg(long)]
        amount: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        buyer_name: String,
        #[arg(long)]
        buyer_email: String,
        #[arg(long)]
        buyer_phone: String,
        #[arg(long)]
        callback_url: Option<String>,
        #[arg(long)]
        redirect_url: Option<String>,
        /// Extra gateway fields as key=value (repeatable, sent unsigned)
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
}

#[derive(Subcommand)]
enum BankCommands {
    /// List retail (B2C) banks
    Retail(BankFilter),
    /// List corporate (B2B) banks
    Corporate(BankFilter),
}

#[derive(Args)]
struct BankFilter {
    /// Only banks currently online
    #[arg(long, conflicts_with = "offline")]
    online: bool,
    /// Only banks currently offline
    #[arg(long)]
    offline: bool,
}

impl BankFilter {
    fn online(&self) -> Option<bool> {
        match (self.online, self.offline) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[derive(Subcommand)]
enum ChecksumCommands {
    /// Print the checksum of the given fields
    Sign {
        /// Fields as key=value
        #[arg(value_parser = parse_field, required = true)]
        fields: Vec<(String, String)>,
    },
    /// Verify a gateway result against an expected checksum
    Verify {
        #[arg(long)]
        checksum: String,
        /// Result fields as a JSON object
        #[arg(long)]
        json: String,
    },
}

#[derive(Subcommand)]
enum CallbackCommands {
    /// Start a local listener that verifies incoming callbacks
    Listen {
        /// Port to listen on
        #[arg(long, default_value = "3000")]
        port: u16,
    },
}

fn parse_field(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("Invalid field: {} (expected key=value)", s))
}

fn parse_object(json: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str(json).context("Invalid JSON")? {
        Value::Object(map) => Ok(map),
        _ => anyhow::bail!("Expected a JSON object"),
    }
}

impl Cli {
    async fn connect(&self) -> Result<SecurePayClient> {
        let credentials =
            Credentials::new(&self.uid, &self.auth_token, &self.checksum_token)?;
        let mut builder =
            SecurePayClient::builder(ClientConfig::new(credentials, self.environment));
        if let Some(base_url) = &self.base_url {
            builder = builder.with_base_url(base_url);
        }
        Ok(builder.connect().await?)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,securepay_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Validate => {
            cli.connect().await?;
            println!("✓ Credentials accepted by {}", cli.environment);
        }

        Commands::Payment { action } => match action {
            PaymentCommands::Create {
                order_number,
                amount,
                description,
                buyer_name,
                buyer_email,
                buyer_phone,
                callback_url,
                redirect_url,
                fields,
            } => {
                let mut payment = PaymentRequest::new(order_number, amount, description)
                    .with_buyer(buyer_name, buyer_email, buyer_phone);
                if let Some(url) = callback_url {
                    payment = payment.with_callback_url(url);
                }
                if let Some(url) = redirect_url {
                    payment = payment.with_redirect_url(url);
                }
                for (key, value) in fields {
                    payment = payment.with_field(key, value);
                }

                let client = cli.connect().await?;
                let response = client.create_payment(payment.into_options()).await?;
                if !response.is_success() {
                    eprintln!("Gateway returned HTTP {}", response.status);
                }
                println!("{}", response.text());
            }
        },

        Commands::Banks { action } => {
            let client = cli.connect().await?;
            let banks = match action {
                BankCommands::Retail(filter) => client.retail_bank_list(filter.online()).await?,
                BankCommands::Corporate(filter) => {
                    client.corporate_bank_list(filter.online()).await?
                }
            };
            println!("{}", serde_json::to_string_pretty(&banks)?);
        }

        Commands::Checksum { action } => match action {
            ChecksumCommands::Sign { fields } => {
                println!(
                    "{}",
                    checksum::generate_checksum(fields.iter().cloned(), &cli.checksum_token)
                );
            }
            ChecksumCommands::Verify {
                checksum: expected,
                json,
            } => {
                let result = parse_object(json)?;
                if checksum::verify_checksum_with_token(&result, expected, &cli.checksum_token) {
                    println!("✓ Checksum matches");
                } else {
                    println!("✗ Checksum mismatch");
                    std::process::exit(1);
                }
            }
        },

        Commands::Callback { action } => match action {
            CallbackCommands::Listen { port } => {
                let token = Arc::new(cli.checksum_token.clone());
                let app = axum::Router::new()
                    .route("/callback", axum::routing::post(handle_callback))
                    .with_state(token);
                let addr = std::net::SocketAddr::from(([127, 0, 0, 1], *port));
                println!("Listening for callbacks on http://{}/callback", addr);
                let listener = tokio::net::TcpListener::bind(&addr).await?;
                axum::serve(listener, app).await?;
            }
        },
    }

    Ok(())
}

async fn handle_callback(
    State(token): State<Arc<String>>,
    Form(fields): Form<Vec<(String, String)>>,
) -> impl IntoResponse {
    let fields: Map<String, Value> = fields
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect();
    let verified = checksum::verify_callback(&fields, &token);

    println!("POST /callback");
    println!("{}", Value::Object(fields.clone()));
    println!(
        "checksum: {}",
        if verified { "✓ verified" } else { "✗ mismatch" }
    );
    println!("----------------------------------------");
    tracing::info!(verified, "Callback received");
    StatusCode::OK
}
