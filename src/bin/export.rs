//! `cgd-export` - exports CGD account data as newline-delimited JSON.
//!
//! example:
//!   cgd-export -v transactions 123456 678901 >transactions.json
//!   cgd-export -v documents    123456 678901 >documents.json

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use cgd_archiver::{export, logging};
use cgd_archiver_core::client::DEFAULT_BASE_URL;
use cgd_archiver_core::{model, CgdClient};

/// Exports all available transactions or documents from a CGD account
#[derive(Parser, Debug)]
#[command(name = "cgd-export")]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level. Specify multiple times to increase logging.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Provider API base URL
    #[arg(long, default_value = DEFAULT_BASE_URL, global = true)]
    pub api_url: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export all available transactions
    Transactions {
        /// Account username
        username: String,
        /// Account password
        password: String,
    },

    /// Export all available documents
    Documents {
        /// Account username
        username: String,
        /// Account password
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let (Commands::Transactions { username, password }
    | Commands::Documents { username, password }) = &cli.command;
    let client = CgdClient::login(&cli.api_url, username, password).await?;

    // Balances are informational only; skip the call when nothing would log.
    if tracing::enabled!(tracing::Level::INFO) {
        let balance = client.account_balance().await?;
        for entry in &balance.account_balances_list {
            info!(
                "account balance {} {}",
                model::format_minor_units(entry.book_balance),
                entry.currency
            );
        }
    }

    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Commands::Transactions { .. } => {
            export::write_transactions(client.transactions(), &mut stdout).await?;
        }
        Commands::Documents { .. } => {
            export::write_documents(client.documents(), &mut stdout).await?;
        }
    }

    client.logout().await?;
    Ok(())
}
