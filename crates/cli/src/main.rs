//! PocketShop CLI - terminal storefront.
//!
//! # Usage
//!
//! ```bash
//! # Browse
//! pocketshop products --search laptop
//! pocketshop product PR001
//!
//! # Account
//! pocketshop login -e amina@example.com -p hunter22
//! pocketshop whoami
//!
//! # Cart and checkout
//! pocketshop cart add PR001 -q 2
//! pocketshop cart show
//! pocketshop checkout --address "12 Rue des Fleurs, Rabat"
//!
//! # Order history
//! pocketshop orders list
//! pocketshop orders cancel o-1
//! ```
//!
//! Configuration comes from `POCKETSHOP_*` environment variables (or a
//! `.env` file); see `pocketshop_storefront::config`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::Write;

use clap::{Parser, Subcommand};
use pocketshop_storefront::{AppState, ClientConfig};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod render;

use commands::CommandError;

#[derive(Parser)]
#[command(name = "pocketshop")]
#[command(author, version, about = "PocketShop terminal storefront")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products
    Products {
        /// Filter by name or category
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show one product
    Product {
        /// Product ID
        id: String,
    },
    /// Log in with email and password
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "POCKETSHOP_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and log in
    Register(commands::account::RegisterArgs),
    /// Log out
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order for the cart contents
    Checkout {
        /// Shipping address (defaults to the profile address)
        #[arg(short, long)]
        address: Option<String>,
    },
    /// Order history
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Favorite products
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart contents
    Show,
    /// Add a product
    Add {
        /// Product ID
        product_id: String,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set the quantity of a cart item (0 removes it)
    Set {
        /// Cart item ID
        item_id: String,

        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a cart item
    Remove {
        /// Cart item ID
        item_id: String,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List orders, newest first
    List,
    /// Cancel a pending order
    Cancel {
        /// Order ID
        order_id: String,
    },
    /// Order the same items again
    Reorder {
        /// Order ID
        order_id: String,
    },
}

#[derive(Subcommand)]
enum FavoritesAction {
    /// List favorites
    List,
    /// Add a product to favorites
    Add {
        /// Product ID
        product_id: String,
    },
    /// Remove a favorite
    Remove {
        /// Favorite ID
        favorite_id: String,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::debug!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        tracing::Level::TRACE => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    // Logs go to stderr so command output stays pipeable
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pocketshop_storefront=warn,pocketshop_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            let _ = writeln!(std::io::stderr(), "Configuration error: {e}");
            std::process::exit(2);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    if let Err(e) = run(cli, config).await {
        match &e {
            CommandError::Client(err) => {
                err.report();
                let _ = writeln!(std::io::stderr(), "Error: {}", err.user_message());
            }
            // Already rendered to stdout
            CommandError::View(message) => tracing::debug!(%message, "Command ended in error state"),
            CommandError::Io(err) => {
                let _ = writeln!(std::io::stderr(), "Error: {err}");
            }
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: ClientConfig) -> Result<(), CommandError> {
    let currency = config.currency;
    let state = AppState::from_config(config).await?;
    let mut out = std::io::stdout().lock();

    match cli.command {
        Commands::Products { search } => {
            commands::catalog::list(&state, search.as_deref(), currency, &mut out).await?;
        }
        Commands::Product { id } => commands::catalog::show(&state, &id, currency, &mut out).await?,
        Commands::Login { email, password } => {
            commands::account::login(&state, &email, &password, &mut out).await?;
        }
        Commands::Register(args) => commands::account::register(&state, args, &mut out).await?,
        Commands::Logout => commands::account::logout(&state, &mut out).await?,
        Commands::Whoami => commands::account::whoami(&state, &mut out)?,
        Commands::Cart { action } => {
            let intent = match action {
                CartAction::Show => None,
                CartAction::Add {
                    product_id,
                    quantity,
                } => Some(commands::cart::add_intent(&state, &product_id, quantity).await?),
                CartAction::Set { item_id, quantity } => {
                    Some(commands::cart::set_intent(&item_id, quantity))
                }
                CartAction::Remove { item_id } => Some(commands::cart::remove_intent(&item_id)),
                CartAction::Clear => Some(commands::cart::clear_intent()),
            };
            commands::cart::run(&state, intent, currency, &mut out).await?;
        }
        Commands::Checkout { address } => {
            commands::cart::checkout(&state, address, currency, &mut out).await?;
        }
        Commands::Orders { action } => {
            let intent = match action {
                OrdersAction::List => None,
                OrdersAction::Cancel { order_id } => Some(commands::orders::cancel_intent(&order_id)),
                OrdersAction::Reorder { order_id } => {
                    Some(commands::orders::reorder_intent(&order_id))
                }
            };
            commands::orders::run(&state, intent, currency, &mut out).await?;
        }
        Commands::Favorites { action } => match action {
            FavoritesAction::List => commands::favorites::list(&state, &mut out).await?,
            FavoritesAction::Add { product_id } => {
                commands::favorites::add(&state, &product_id, &mut out).await?;
            }
            FavoritesAction::Remove { favorite_id } => {
                commands::favorites::remove(&state, &favorite_id, &mut out).await?;
            }
        },
    }

    Ok(())
}
