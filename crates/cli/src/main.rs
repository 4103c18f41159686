//! Tabletop Re-Boxing CLI - Catalog maintenance tools.
//!
//! # Usage
//!
//! ```bash
//! # Validate the catalog JSON before deploying
//! trb-cli catalog validate
//!
//! # Validate a catalog in another directory
//! trb-cli catalog validate --dir path/to/catalog
//!
//! # Print catalog statistics
//! trb-cli catalog stats
//! ```
//!
//! # Commands
//!
//! - `catalog validate` - Check the catalog for data errors
//! - `catalog stats` - Print per-category counts and the price range

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "trb-cli")]
#[command(author, version, about = "Tabletop Re-Boxing CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and validate the product catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Check the catalog for data errors (duplicate ids, dangling
    /// categories, bad prices)
    Validate {
        /// Catalog directory holding products.json and categories.json
        #[arg(short, long, default_value = "crates/storefront/catalog")]
        dir: PathBuf,
    },
    /// Print per-category product counts and the price range
    Stats {
        /// Catalog directory holding products.json and categories.json
        #[arg(short, long, default_value = "crates/storefront/catalog")]
        dir: PathBuf,
    },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli);

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Catalog { action } => match action {
            CatalogAction::Validate { dir } => commands::catalog::validate(&dir)?,
            CatalogAction::Stats { dir } => commands::catalog::stats(&dir)?,
        },
    }
    Ok(())
}
