//! BBHCBazaar CLI - Browse the marketplace and manage a bag from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (the session is kept under BAZAAR_STATE_DIR)
//! bazaar login -e customer@example.com
//! bazaar register -e new@example.com --first-name Ravi
//!
//! # Browse
//! bazaar catalog --search "cotton kurta" --max-price 1500
//! bazaar product 42
//!
//! # Wishlist and bag
//! bazaar wishlist toggle 42
//! bazaar bag add 42 --quantity 2 --size M
//! bazaar bag show
//!
//! # Place QR pickup orders for everything in the bag
//! bazaar checkout --pickup "Main gate"
//!
//! # Stream live catalog updates
//! bazaar watch
//! ```
//!
//! # Commands
//!
//! - `login` / `register` / `logout` / `whoami` - Session management
//! - `catalog` / `product` / `categories` - Browsing
//! - `wishlist` - Show or toggle wishlisted products
//! - `bag` - Show and edit the bag
//! - `rate` - Rate a product
//! - `checkout` / `orders` - QR pickup orders
//! - `listings` - Seller and master listing management
//! - `watch` - Print realtime catalog events

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::Write;
use std::process::ExitCode;

use bazaar_core::{BagItemId, ProductId};
use bazaar_storefront::AppState;
use bazaar_storefront::api::Registration;
use bazaar_storefront::config::StorefrontConfig;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use secrecy::SecretString;

mod commands;
mod error;
mod output;

use error::CliError;

#[derive(Parser)]
#[command(name = "bazaar")]
#[command(author, version, about = "BBHCBazaar storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and remember the session
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "BAZAAR_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create a customer account and sign in
    Register {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "BAZAAR_PASSWORD", hide_env_values = true)]
        password: String,

        /// Public username; defaults to the email's local part
        #[arg(short, long)]
        username: Option<String>,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List approved products
    Catalog {
        /// Words that must all appear in the product
        #[arg(short, long)]
        search: Option<String>,

        /// Category name or ID
        #[arg(short, long)]
        category: Option<String>,

        /// Lowest customer price
        #[arg(long)]
        min_price: Option<Decimal>,

        /// Highest customer price
        #[arg(long)]
        max_price: Option<Decimal>,

        /// Ignore cached data
        #[arg(long)]
        refresh: bool,
    },
    /// Show one product with its rating
    Product {
        id: String,
    },
    /// List categories and commission rates
    Categories,
    /// Show or edit the wishlist
    Wishlist {
        #[command(subcommand)]
        action: Option<WishlistAction>,
    },
    /// Show or edit the bag
    Bag {
        #[command(subcommand)]
        action: Option<BagAction>,
    },
    /// Rate a product from 1 to 5 stars
    Rate {
        product_id: String,

        #[arg(value_parser = clap::value_parser!(u8).range(1..=5))]
        stars: u8,

        /// Optional review text
        #[arg(short, long)]
        review: Option<String>,
    },
    /// Place QR pickup orders for the whole bag
    Checkout {
        /// Where the order will be collected
        #[arg(short, long)]
        pickup: Option<String>,
    },
    /// List your orders
    Orders,
    /// Seller and master listing management
    Listings {
        #[command(subcommand)]
        action: ListingAction,
    },
    /// Print realtime catalog events until interrupted
    Watch,
}

#[derive(Subcommand)]
enum WishlistAction {
    /// List wishlisted products
    Show,
    /// Add the product if missing, remove it otherwise
    Toggle { product_id: String },
}

#[derive(Subcommand)]
enum BagAction {
    /// List bag lines and totals
    Show,
    /// Add a product
    Add {
        product_id: String,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        #[arg(long)]
        size: Option<String>,

        #[arg(long)]
        color: Option<String>,
    },
    /// Add one unit to a line
    Inc { bag_item_id: String },
    /// Remove one unit from a line; the last unit removes the line
    Dec { bag_item_id: String },
    /// Set a line's quantity; zero removes it
    Set { bag_item_id: String, quantity: u32 },
    /// Remove a line
    Remove { bag_item_id: String },
    /// Empty the bag
    Clear,
}

#[derive(Subcommand)]
enum ListingAction {
    /// Listings awaiting review (master)
    Pending,
    /// Create a listing (seller or master)
    Create {
        #[arg(short, long)]
        name: String,

        #[arg(long)]
        selling_price: Decimal,

        #[arg(long)]
        max_price: Decimal,

        #[arg(short, long)]
        quantity: Option<u32>,

        #[arg(short, long)]
        specification: Option<String>,

        /// Highlight bullet point; repeatable
        #[arg(long = "highlight")]
        highlights: Vec<String>,

        /// Category name; repeatable
        #[arg(short, long = "category")]
        categories: Vec<String>,
    },
    /// Delete a listing
    Delete { product_id: String },
    /// Approve a pending listing (master)
    Approve { product_id: String },
    /// Reject a pending listing (master)
    Reject {
        product_id: String,

        #[arg(short, long)]
        reason: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Defaults to warnings only so command output stays readable
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bazaar_storefront=warn,bazaar_cli=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            e.report();
            tracing::error!("Command failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = StorefrontConfig::from_env()?;
    let state = AppState::new(config)?;
    let mut out = std::io::stdout();

    // Login and register start fresh; everything else resumes the stored
    // session.
    if !matches!(cli.command, Commands::Login { .. } | Commands::Register { .. }) {
        state.auth().restore().await?;
    }

    match cli.command {
        Commands::Login { email, password } => {
            commands::auth::login(&state, &mut out, &email, &SecretString::from(password)).await?;
        }
        Commands::Register {
            email,
            password,
            username,
            first_name,
            last_name,
        } => {
            let registration = Registration {
                email,
                password: SecretString::from(password),
                username,
                first_name,
                last_name,
            };
            commands::auth::register(&state, &mut out, &registration).await?;
        }
        Commands::Logout => commands::auth::logout(&state, &mut out)?,
        Commands::Whoami => commands::auth::whoami(&state, &mut out)?,
        Commands::Catalog {
            search,
            category,
            min_price,
            max_price,
            refresh,
        } => {
            let filter = commands::catalog::CatalogFilter {
                search,
                category,
                min_price: min_price.map(Into::into),
                max_price: max_price.map(Into::into),
            };
            commands::catalog::list(&state, &mut out, &filter, refresh).await?;
        }
        Commands::Product { id } => {
            commands::catalog::show(&state, &mut out, &ProductId::new(id)).await?;
        }
        Commands::Categories => commands::catalog::categories(&state, &mut out).await?,
        Commands::Wishlist { action } => match action.unwrap_or(WishlistAction::Show) {
            WishlistAction::Show => commands::wishlist::show(&state, &mut out).await?,
            WishlistAction::Toggle { product_id } => {
                commands::wishlist::toggle(&state, &mut out, &ProductId::new(product_id)).await?;
            }
        },
        Commands::Bag { action } => {
            run_bag(&state, &mut out, action.unwrap_or(BagAction::Show)).await?;
        }
        Commands::Rate {
            product_id,
            stars,
            review,
        } => {
            commands::orders::rate(
                &state,
                &mut out,
                &ProductId::new(product_id),
                stars,
                review.as_deref(),
            )
            .await?;
        }
        Commands::Checkout { pickup } => commands::orders::checkout(&state, &mut out, pickup).await?,
        Commands::Orders => commands::orders::list(&state, &mut out).await?,
        Commands::Listings { action } => run_listings(&state, &mut out, action).await?,
        Commands::Watch => commands::watch::run(&state, &mut out).await?,
    }

    out.flush()?;
    Ok(())
}

async fn run_bag(state: &AppState, out: &mut impl Write, action: BagAction) -> Result<(), CliError> {
    use commands::bag::{self, LineChange};

    match action {
        BagAction::Show => bag::show(state, out).await,
        BagAction::Add {
            product_id,
            quantity,
            size,
            color,
        } => bag::add(state, out, ProductId::new(product_id), quantity, size, color).await,
        BagAction::Inc { bag_item_id } => {
            bag::change(state, out, &BagItemId::new(bag_item_id), LineChange::Increment).await
        }
        BagAction::Dec { bag_item_id } => {
            bag::change(state, out, &BagItemId::new(bag_item_id), LineChange::Decrement).await
        }
        BagAction::Set {
            bag_item_id,
            quantity,
        } => bag::change(state, out, &BagItemId::new(bag_item_id), LineChange::Set(quantity)).await,
        BagAction::Remove { bag_item_id } => {
            bag::change(state, out, &BagItemId::new(bag_item_id), LineChange::Remove).await
        }
        BagAction::Clear => bag::clear(state, out).await,
    }
}

async fn run_listings(
    state: &AppState,
    out: &mut impl Write,
    action: ListingAction,
) -> Result<(), CliError> {
    use commands::listings;

    match action {
        ListingAction::Pending => listings::pending(state, out).await,
        ListingAction::Create {
            name,
            selling_price,
            max_price,
            quantity,
            specification,
            highlights,
            categories,
        } => {
            let draft = bazaar_storefront::api::ProductDraft {
                name,
                specification: specification.unwrap_or_default(),
                highlights,
                selling_price: selling_price.into(),
                max_price: max_price.into(),
                quantity,
                thumbnail: None,
                gallery: Vec::new(),
                categories,
            };
            listings::create(state, out, &draft).await
        }
        ListingAction::Delete { product_id } => {
            listings::delete(state, out, &ProductId::new(product_id)).await
        }
        ListingAction::Approve { product_id } => {
            listings::approve(state, out, &ProductId::new(product_id)).await
        }
        ListingAction::Reject { product_id, reason } => {
            listings::reject(state, out, &ProductId::new(product_id), reason.as_deref()).await
        }
    }
}
