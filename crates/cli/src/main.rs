//! Mercado CLI - cart operations against the commerce API.
//!
//! # Usage
//!
//! ```bash
//! # Create a cart
//! mercado-cli cart create
//!
//! # Add two units of an item (creates a cart when --cart is omitted)
//! mercado-cli cart add ITEM-1 --qty 2 --cart CART-1
//!
//! # Add a compound item with extra materials
//! mercado-cli cart add CAKE-1 --kind compound --material FROSTING --total 349.00
//!
//! # Toggle fulfillment
//! mercado-cli cart delivery CART-1
//! mercado-cli cart pickup CART-1
//!
//! # Resolve a postal code
//! mercado-cli postal 44100
//! ```
//!
//! # Environment Variables
//!
//! - `COMMERCE_API_URL` - Commerce REST API base URL (required)
//! - `COMMERCE_API_TOKEN` - Optional service token
//! - `DELIVERY_ITEM_ID` / `DELIVERY_ITEM_PRICE` - Default delivery charge
//! - `POSTAL_API_URL` - Postal-code lookup base URL

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use url::Url;

mod commands;

#[derive(Parser)]
#[command(name = "mercado-cli")]
#[command(author, version, about = "Mercado CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and modify carts
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Resolve a postal code to states, cities and suburbs
    Postal {
        /// Five-digit postal code
        code: String,

        /// Postal-code lookup base URL
        #[arg(long, env = "POSTAL_API_URL")]
        api_url: Url,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Create an empty cart
    Create,
    /// Show a cart
    Show {
        /// Cart ID
        cart: String,
    },
    /// Add an item to a cart
    Add {
        /// Item ID (variant ID for group products)
        item: String,

        /// Cart ID; a new cart is created when omitted
        #[arg(short, long)]
        cart: Option<String>,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1)]
        qty: u32,

        /// Product kind (`simple`, `group`, `compound`)
        #[arg(short, long, default_value = "simple")]
        kind: String,

        /// Extra material item IDs (compound only, repeatable)
        #[arg(short, long = "material")]
        materials: Vec<String>,

        /// Unit price including materials (compound only)
        #[arg(short, long)]
        total: Option<String>,
    },
    /// Switch a cart to delivery
    Delivery {
        /// Cart ID
        cart: String,
    },
    /// Switch a cart to pickup
    Pickup {
        /// Cart ID
        cart: String,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "mercado_cli=info,mercado_storefront=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Create => commands::cart::create().await,
            CartAction::Show { cart } => commands::cart::show(&cart).await,
            CartAction::Add {
                item,
                cart,
                qty,
                kind,
                materials,
                total,
            } => {
                let request = commands::cart::build_request(
                    &item,
                    qty,
                    &kind,
                    materials,
                    total.as_deref(),
                )?;
                commands::cart::add(cart.as_deref(), &request).await
            }
            CartAction::Delivery { cart } => commands::cart::delivery(&cart).await,
            CartAction::Pickup { cart } => commands::cart::pickup(&cart).await,
        },
        Commands::Postal { code, api_url } => commands::postal::lookup(api_url, &code).await,
    }
}
