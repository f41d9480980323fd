//! Currency CLI
//!
//! Command-line interface for the Currency API.

use anyhow::Result;
use clap::{Parser, Subcommand};

use currency_client::CurrencyClient;

#[derive(Parser)]
#[command(name = "currency")]
#[command(author, version, about = "Currency API CLI client", long_about = None)]
struct Cli {
    /// Base URL of the Currency API
    #[arg(
        long,
        env = "CURRENCY_API_URL",
        default_value = "http://localhost:8080"
    )]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rate operations
    Rate {
        #[command(subcommand)]
        action: RateCommands,
    },
    /// Wallet operations
    Wallet {
        #[command(subcommand)]
        action: WalletCommands,
    },
    /// Check API health
    Health,
}

#[derive(Subcommand)]
enum RateCommands {
    /// Record a new rate observation
    Record {
        /// Rate value (must be positive)
        value: f64,
    },
    /// Average of the most recent rates
    Average {
        /// How many recent rates to average
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },
}

#[derive(Subcommand)]
enum WalletCommands {
    /// Create a wallet or apply a signed balance delta
    Balance {
        /// Wallet number (exactly 7 digits)
        #[arg(long)]
        number: String,
        /// Signed delta: positive = deposit, negative = withdrawal
        #[arg(long, allow_hyphen_values = true)]
        amount: f64,
    },
    /// List all wallets
    List,
    /// Convert at the latest rate and deduct from a wallet
    Convert {
        /// Source wallet number (exactly 7 digits)
        #[arg(long)]
        number: String,
        /// Quantity to convert (must be positive)
        #[arg(long)]
        amount: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let client = CurrencyClient::new(&cli.api_url);

    match cli.command {
        Commands::Health => {
            let healthy = client.health().await?;
            if healthy {
                println!("API is healthy");
            } else {
                println!("API is not healthy");
                std::process::exit(1);
            }
        }

        Commands::Rate { action } => match action {
            RateCommands::Record { value } => {
                let response = client.record_rate(value).await?;
                println!("{}", serde_json::to_string_pretty(&response)?);
            }
            RateCommands::Average { limit } => {
                let response = client.average_rate(limit).await?;
                println!("{}", serde_json::to_string_pretty(&response)?);
            }
        },

        Commands::Wallet { action } => match action {
            WalletCommands::Balance { number, amount } => {
                let response = client.update_balance(&number, amount).await?;
                println!("{}", serde_json::to_string_pretty(&response)?);
            }
            WalletCommands::List => {
                let response = client.list_wallets().await?;
                println!("{}", serde_json::to_string_pretty(&response)?);
            }
            WalletCommands::Convert { number, amount } => {
                let response = client.convert(&number, amount).await?;
                println!("{}", serde_json::to_string_pretty(&response)?);
            }
        },
    }

    Ok(())
}
