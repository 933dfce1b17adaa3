//! Furnistore CLI - cart, checkout and order history from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in and print a token to export as FURNISTORE_TOKEN
//! furnistore login -u demo -p password123
//!
//! # Browse the catalog
//! furnistore products
//! furnistore product 3
//!
//! # Show and edit the cart
//! furnistore cart
//! furnistore add 3 --quantity 2
//! furnistore update 2 4
//! furnistore remove 2
//!
//! # Check out with the sandbox test card
//! furnistore checkout --test-card
//!
//! # Pay with another method (no card step)
//! furnistore checkout --method alipay_hk
//!
//! # Order history, newest first
//! furnistore orders
//! ```
//!
//! Every command accepts `--username`/`--password` to sign in first instead
//! of relying on `FURNISTORE_TOKEN`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Args, Parser, Subcommand};
use furnistore_core::{CartItemId, PaymentMethod, ProductId};
use furnistore_storefront::StorefrontConfig;
use secrecy::ExposeSecret;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "furnistore")]
#[command(author, version, about = "Furnistore storefront from the terminal")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command.
#[derive(Args)]
pub struct GlobalArgs {
    /// Backend API base URL (overrides `FURNISTORE_API_URL`)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Message language, `en` or `zh` (overrides `FURNISTORE_LANGUAGE`)
    #[arg(long, global = true)]
    pub lang: Option<String>,

    /// Sign in with this username before running the command
    #[arg(short, long, global = true)]
    pub username: Option<String>,

    /// Password for `--username`
    #[arg(short, long, global = true)]
    pub password: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with `--username`/`--password` and print the session token
    Login,
    /// List the catalog
    Products,
    /// Show one product
    Product {
        /// Product ID
        product_id: i64,
    },
    /// Show the cart
    Cart,
    /// Add a product to the cart
    Add {
        /// Product ID
        product_id: i64,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set the quantity of a cart line
    Update {
        /// Cart line ID
        item_id: i64,

        /// New quantity (at least 1)
        quantity: u32,
    },
    /// Remove a cart line
    Remove {
        /// Cart line ID
        item_id: i64,
    },
    /// Place an order for the cart and pay for it
    Checkout(CheckoutArgs),
    /// List past orders, newest first
    Orders,
}

/// Checkout form values. Blank fields are pre-filled from the profile.
#[derive(Args)]
pub struct CheckoutArgs {
    /// Payment method (`credit_card`, `wechat_pay`, `alipay_hk`)
    #[arg(short, long, default_value = "credit_card")]
    pub method: PaymentMethod,

    /// Fill the card fields with the sandbox test card
    #[arg(long)]
    pub test_card: bool,

    /// Contact person
    #[arg(long)]
    pub contact: Option<String>,

    /// Contact phone
    #[arg(long)]
    pub phone: Option<String>,

    /// Contact email
    #[arg(long)]
    pub email: Option<String>,

    /// Shipping address
    #[arg(long)]
    pub shipping: Option<String>,

    /// Billing address (defaults to the shipping address)
    #[arg(long)]
    pub billing: Option<String>,

    /// Card number
    #[arg(long)]
    pub card_number: Option<String>,

    /// Card expiry, MM/YY
    #[arg(long)]
    pub expiry: Option<String>,

    /// Card security code
    #[arg(long)]
    pub cvc: Option<String>,

    /// Name on the card
    #[arg(long)]
    pub cardholder: Option<String>,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.expose_secret(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
#[allow(clippy::print_stderr)]
async fn main() {
    let cli = Cli::parse();

    let config = match commands::load_config(&cli.global) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Quiet by default; progress goes to stdout, diagnostics to RUST_LOG
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "furnistore_storefront=warn,furnistore_cli=warn".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, config).await {
        if e.is_reported() {
            tracing::debug!("Command failed: {e}");
        } else {
            tracing::error!("Command failed: {e}");
            eprintln!("{e}");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), CliError> {
    let shop = commands::Shop::connect(&config, &cli.global).await?;
    match cli.command {
        Commands::Login => commands::account::login(&shop)?,
        Commands::Products => commands::products::list(&shop).await?,
        Commands::Product { product_id } => {
            commands::products::show(&shop, ProductId::new(product_id)).await?;
        }
        Commands::Cart => commands::cart::show(&shop).await?,
        Commands::Add {
            product_id,
            quantity,
        } => commands::cart::add(&shop, ProductId::new(product_id), quantity).await?,
        Commands::Update { item_id, quantity } => {
            commands::cart::update(&shop, CartItemId::new(item_id), quantity).await?;
        }
        Commands::Remove { item_id } => {
            commands::cart::remove(&shop, CartItemId::new(item_id)).await?;
        }
        Commands::Checkout(args) => commands::checkout::run(&shop, &args).await?,
        Commands::Orders => commands::orders::list(&shop).await?,
    }
    Ok(())
}
