//! Preciosa Modas CLI - a terminal front-end for the storefront core.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! preciosa catalog list --category vestidos
//! preciosa catalog show P003
//!
//! # Build a cart
//! preciosa cart add P001 --qty 2
//! preciosa cart add P003 --tier varejo
//! preciosa cart show
//!
//! # Log in and check out through WhatsApp
//! preciosa login ana@example.com --password "$PASSWORD"
//! preciosa checkout --payment pix
//! ```
//!
//! # Environment Variables
//!
//! - `PRECIOSA_BACKEND_URL` - backend base URL (required)
//! - `PRECIOSA_DATA_DIR` - where the cart and session are stored
//! - `PRECIOSA_PRICE_GATING` - hide prices until login
//! - `SENTRY_DSN` - error tracking
//!
//! See `StorefrontConfig` for the full list.

#![cfg_attr(not(test), forbid(unsafe_code))]
// Terminal output is this binary's interface
#![allow(clippy::print_stdout)]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use preciosa_core::{Category, PaymentMethod, PriceTier};
use preciosa_storefront::AppState;
use preciosa_storefront::config::StorefrontConfig;

mod commands;
mod platform;

#[derive(Parser)]
#[command(name = "preciosa")]
#[command(author, version, about = "Preciosa Modas storefront")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse products
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Inspect and edit the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Log in with e-mail or CPF/CNPJ
    Login {
        /// E-mail address or CPF/CNPJ
        login: String,

        #[arg(long, env = "PRECIOSA_PASSWORD", hide_env_values = true)]
        password: String,

        /// Contact phone, kept on the profile
        #[arg(long)]
        phone: Option<String>,
    },
    /// Create an account
    Register {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(long, env = "PRECIOSA_PASSWORD", hide_env_values = true)]
        password: String,

        /// CPF or CNPJ
        #[arg(long)]
        document: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        /// Preferred tier (`atacado` or `varejo`)
        #[arg(long, default_value = "atacado")]
        tier: PriceTier,
    },
    /// End the session (the cart is kept)
    Logout,
    /// Show the current session
    Whoami,
    /// Send the cart as an order through WhatsApp
    Checkout {
        /// `pix`, `cartao` or `boleto`
        #[arg(long, default_value = "pix")]
        payment: PaymentMethod,
    },
    /// List submitted orders
    Orders {
        /// Ask the backend instead of the local history
        #[arg(long)]
        remote: bool,
    },
    /// Copy a product caption to the clipboard
    Caption {
        id: String,

        #[arg(long)]
        tier: Option<PriceTier>,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List products
    List {
        #[arg(short, long)]
        category: Option<Category>,

        /// Only featured products
        #[arg(long)]
        featured: bool,
    },
    /// Show one product
    Show { id: String },
}

#[derive(Subcommand)]
enum CartAction {
    /// Add a product
    Add {
        id: String,

        /// Defaults to the account's preferred tier
        #[arg(short, long)]
        tier: Option<PriceTier>,

        #[arg(short, long, default_value_t = 1)]
        qty: u32,
    },
    /// Add one unit to a line
    Inc {
        id: String,
        #[arg(short, long, default_value = "atacado")]
        tier: PriceTier,
    },
    /// Remove one unit from a line
    Dec {
        id: String,
        #[arg(short, long, default_value = "atacado")]
        tier: PriceTier,
    },
    /// Delete a line
    Remove {
        id: String,
        #[arg(short, long, default_value = "atacado")]
        tier: PriceTier,
    },
    /// Print the cart
    Show,
    /// Empty the cart
    Clear,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
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
        tracing::Level::TRACE => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            println!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "preciosa_storefront=info,preciosa_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut state = AppState::open(config)?;

    match cli.command {
        Commands::Catalog { action } => match action {
            CatalogAction::List { category, featured } => {
                commands::catalog::list(&state, category, featured).await?;
            }
            CatalogAction::Show { id } => commands::catalog::show(&state, &id).await?,
        },
        Commands::Cart { action } => match action {
            CartAction::Add { id, tier, qty } => {
                commands::cart::add(&mut state, &id, tier, qty).await?;
            }
            CartAction::Inc { id, tier } => commands::cart::increment(&mut state, &id, tier)?,
            CartAction::Dec { id, tier } => commands::cart::decrement(&mut state, &id, tier)?,
            CartAction::Remove { id, tier } => commands::cart::remove(&mut state, &id, tier)?,
            CartAction::Show => commands::cart::show(&state),
            CartAction::Clear => commands::cart::clear(&mut state)?,
        },
        Commands::Login {
            login,
            password,
            phone,
        } => commands::account::login(&mut state, &login, password, phone.as_deref()).await?,
        Commands::Register {
            name,
            email,
            password,
            document,
            phone,
            tier,
        } => {
            let form = commands::account::RegisterForm {
                name,
                email,
                password,
                document,
                phone,
                tier,
            };
            commands::account::register(&mut state, form).await?;
        }
        Commands::Logout => commands::account::logout(&mut state)?,
        Commands::Whoami => commands::account::whoami(&state),
        Commands::Checkout { payment } => commands::orders::checkout(&mut state, payment).await?,
        Commands::Orders { remote } => commands::orders::list(&state, remote).await?,
        Commands::Caption { id, tier } => commands::orders::caption(&state, &id, tier).await?,
    }
    Ok(())
}
