//! Beelivery CLI - The storefront widget from a terminal.
//!
//! Every invocation is one browsing context on the file-backed store in
//! `BEELIVERY_DATA_DIR`. Several shells on the same directory behave like
//! several tabs: `bee-cli watch` in one re-renders whenever another changes
//! the cart or theme.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! bee-cli catalog --query bolo --category bolos
//! bee-cli product p2
//!
//! # Manage the cart
//! bee-cli cart add p1
//! bee-cli cart dec p1
//! bee-cli cart show
//!
//! # Toggle light/dark
//! bee-cli theme toggle
//!
//! # Follow changes made by other processes
//! bee-cli watch
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use beelivery_core::{CategoryFilter, QuantityChange};
use beelivery_storefront::StorefrontConfig;
use clap::{Parser, Subcommand};

mod commands;

use commands::Storefront;

#[derive(Parser)]
#[command(name = "bee-cli")]
#[command(author, version, about = "Beelivery storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List catalog products
    Catalog {
        /// Case-insensitive name search
        #[arg(short, long, default_value = "")]
        query: String,

        /// Category (`all`, `cupcakes`, `bolos`, `doces`)
        #[arg(short, long, default_value = "all")]
        category: CategoryFilter,
    },
    /// Show one product's name and price
    Product { id: String },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the theme preference
    Theme {
        #[command(subcommand)]
        action: ThemeAction,
    },
    /// Re-render whenever another process changes the store
    Watch,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart contents and total
    Show,
    /// Add one unit of a product
    Add { id: String },
    /// Increase a line's quantity by one
    Inc { id: String },
    /// Decrease a line's quantity by one, removing it at zero
    Dec { id: String },
    /// Remove a line
    Remove { id: String },
    /// Remove every line
    Clear,
    /// Empty the cart and print the checkout link
    Checkout,
}

#[derive(Subcommand)]
enum ThemeAction {
    /// Show the current theme
    Show,
    /// Switch between light and dark
    Toggle,
}

#[tokio::main]
async fn main() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "beelivery_cli=info,beelivery_storefront=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = StorefrontConfig::from_env()?;
    let app = Storefront::open(config)?;

    match cli.command {
        Commands::Catalog { query, category } => commands::catalog::list(&app, &query, category),
        Commands::Product { id } => commands::catalog::show(&app, &id)?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&app),
            CartAction::Add { id } => commands::cart::add(&app, &id)?,
            CartAction::Inc { id } => {
                commands::cart::change(&app, &id, QuantityChange::Increment)?;
            }
            CartAction::Dec { id } => {
                commands::cart::change(&app, &id, QuantityChange::Decrement)?;
            }
            CartAction::Remove { id } => commands::cart::change(&app, &id, QuantityChange::Remove)?,
            CartAction::Clear => commands::cart::clear(&app),
            CartAction::Checkout => commands::cart::checkout(&app),
        },
        Commands::Theme { action } => match action {
            ThemeAction::Show => commands::theme::show(&app),
            ThemeAction::Toggle => commands::theme::toggle(&app),
        },
        Commands::Watch => commands::watch::run(&app).await?,
    }
    Ok(())
}
