//! CoralCart CLI - drive the storefront from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! coral products list --category marine --sort price-asc
//!
//! # Work with the cart (guest carts persist in the data directory)
//! coral cart add <product-id> --quantity 2
//! coral cart show
//!
//! # Sign in (the cart switches to the server-backed store)
//! coral auth login -e sam@example.com -p hunter22
//!
//! # Place an order
//! coral checkout --first-name Sam --last-name Tester -e sam@example.com \
//!     --address "1 Pier Way" --city Portland --state OR --zip 97201 \
//!     --card-number "4242 4242 4242 4242" --expiry 12/30 --cvv 123 \
//!     --card-name "Sam Tester"
//!
//! # Admin console (requires an admin account)
//! coral admin orders list
//! ```
//!
//! # Configuration
//!
//! - `CORALCART_API_URL` - gateway base URL (required)
//! - `CORALCART_DATA_DIR` - client state directory (default `.coralcart`)
//! - `CORALCART_SERVER_CART` - prefer the server cart (default `true`)

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::print_stdout)]

use clap::{Parser, Subcommand};

use coralcart_storefront::Storefront;
use coralcart_storefront::config::StorefrontConfig;

mod commands;

#[derive(Parser)]
#[command(name = "coral")]
#[command(author, version, about = "CoralCart storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the product catalog
    Products {
        #[command(subcommand)]
        action: commands::products::ProductsAction,
    },
    /// Inspect and edit the shopping cart
    Cart {
        #[command(subcommand)]
        action: commands::cart::CartAction,
    },
    /// Log in, register, or log out
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
    /// Place an order from the current cart
    Checkout(commands::checkout::CheckoutArgs),
    /// View your orders
    Orders {
        #[command(subcommand)]
        action: commands::orders::OrdersAction,
    },
    /// Shipping rates and tracking
    Shipping {
        #[command(subcommand)]
        action: commands::shipping::ShippingAction,
    },
    /// Administration console (requires an admin account)
    Admin {
        #[command(subcommand)]
        action: commands::admin::AdminAction,
    },
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
    let config = StorefrontConfig::from_env()?;
    let mut shop = Storefront::new(&config)?;
    shop.start().await;

    match cli.command {
        Commands::Products { action } => commands::products::run(&mut shop, action).await?,
        Commands::Cart { action } => commands::cart::run(&mut shop, action).await?,
        Commands::Auth { action } => commands::auth::run(&mut shop, action).await?,
        Commands::Checkout(args) => commands::checkout::run(&mut shop, args).await?,
        Commands::Orders { action } => commands::orders::run(&shop, action).await?,
        Commands::Shipping { action } => commands::shipping::run(&mut shop, action).await?,
        Commands::Admin { action } => commands::admin::run(&shop, action).await?,
    }

    Ok(())
}
