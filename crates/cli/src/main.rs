//! Dorodango CLI - Database migrations and catalog maintenance.
//!
//! # Usage
//!
//! ```bash
//! # Create the storefront schema and the cart session table
//! doro-cli migrate
//!
//! # Upload the default catalog to an empty remote store (once)
//! doro-cli catalog migrate
//!
//! # Merge the remote catalog into the local cache
//! doro-cli catalog sync
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "doro-cli")]
#[command(author, version, about = "Dorodango storefront CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations and create the session table
    Migrate,
    /// Maintain the product catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Upload the default products if the remote store is empty
    Migrate,
    /// Load the local cache and merge the remote collection into it
    Sync,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Catalog { action } => match action {
            CatalogAction::Migrate => commands::catalog::migrate().await?,
            CatalogAction::Sync => commands::catalog::sync().await?,
        },
    }
    Ok(())
}
