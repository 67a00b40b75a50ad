//! `cgd-import` - loads exported NDJSON files into the document store.
//!
//! example:
//!   cgd-import -v transactions
//!   cgd-import -v documents

use std::path::Path;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use cgd_archiver::{import, logging};
use cgd_archiver_core::StoreClient;

/// Imports exported NDJSON files into Elasticsearch
#[derive(Parser, Debug)]
#[command(name = "cgd-import")]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level. Specify multiple times to increase logging.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Document store base URL
    #[arg(long, default_value = "http://localhost:9200", global = true)]
    pub store_url: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import transactions.json
    Transactions,

    /// Import documents.json
    Documents,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let profile = match cli.command {
        Commands::Transactions => &import::TRANSACTIONS,
        Commands::Documents => &import::DOCUMENTS,
    };

    let store = StoreClient::new(&cli.store_url)?;
    let imported = import::import_file(&store, profile, Path::new(profile.file)).await?;
    info!("imported {imported} records into {}", profile.index);
    Ok(())
}
