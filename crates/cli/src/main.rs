//! Mercadito CLI - Headless storefront and order-management tool.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! mercadito catalog categories
//! mercadito catalog products --page 1 --limit 12 --search coffee
//! mercadito catalog show <product-id>
//!
//! # Manage the local cart
//! mercadito cart add <product-id> --quantity 2
//! mercadito cart list
//! mercadito cart set <product-id> 3
//! mercadito cart clear
//!
//! # Checkout and orders
//! mercadito checkout --city <city-id> --name "Ada" --email ada@example.com
//! mercadito orders list --status PENDING
//! mercadito orders approve <order-id> --note "payment verified"
//!
//! # Session
//! mercadito auth login --email ada@example.com --password ...
//! mercadito auth logout
//! ```
//!
//! # Commands
//!
//! - `catalog` - Browse categories, subcategories, and products
//! - `cart` - Mutate and inspect the locally persisted cart
//! - `checkout` - Submit the cart as an order
//! - `orders` - Order history and the admin approval flow
//! - `auth` - Login, registration, and session management

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use mercadito_client::{ClientConfig, Storefront};

mod commands;

#[derive(Parser)]
#[command(name = "mercadito")]
#[command(author, version, about = "Mercadito storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse categories, subcategories, and products
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Mutate and inspect the locally persisted cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Submit the current cart as an order
    Checkout {
        /// Delivery city id
        #[arg(long)]
        city: String,

        /// Customer name
        #[arg(long)]
        name: String,

        /// Customer email
        #[arg(long)]
        email: String,

        /// Customer phone
        #[arg(long)]
        phone: Option<String>,

        /// Delivery address
        #[arg(long)]
        address: Option<String>,

        /// Optional note for the approver
        #[arg(long)]
        note: Option<String>,
    },
    /// Order history and the admin approval flow
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Login, registration, and session management
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List active categories
    Categories,
    /// List subcategories, optionally for one category
    Subcategories {
        /// Restrict to one category id
        #[arg(long)]
        category: Option<String>,
    },
    /// List available products
    Products {
        /// Page number (1-based)
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Page size
        #[arg(long, default_value_t = 12)]
        limit: u32,

        /// Filter by category id
        #[arg(long)]
        category: Option<String>,

        /// Free-text search
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one product
    Show {
        /// Product id
        id: String,
    },
    /// List delivery cities
    Cities,
}

#[derive(Subcommand)]
enum CartAction {
    /// Add a product to the cart
    Add {
        /// Product id
        product_id: String,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Show the cart contents and totals
    List,
    /// Set the quantity of a cart line
    Set {
        /// Product id
        product_id: String,

        /// New quantity (clamped to 1..=stock)
        quantity: u32,
    },
    /// Remove a product from the cart
    Remove {
        /// Product id
        product_id: String,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List orders, optionally filtered by status
    List {
        /// Filter by status (`PENDING`, `APPROVED`, `REJECTED`, `CANCELLED`)
        #[arg(long)]
        status: Option<String>,
    },
    /// Show one order with its lines
    Show {
        /// Order id
        id: String,
    },
    /// Approve a pending order (admin/manager)
    Approve {
        /// Order id
        id: String,

        /// Optional approval note
        #[arg(long)]
        note: Option<String>,
    },
    /// Reject a pending order (admin/manager)
    Reject {
        /// Order id
        id: String,

        /// Rejection reason
        #[arg(long)]
        reason: String,
    },
    /// Delete an unapproved order (admin/manager)
    Delete {
        /// Order id
        id: String,

        /// Optional reason
        #[arg(long)]
        reason: Option<String>,
    },
    /// Aggregate order statistics
    Stats,
}

#[derive(Subcommand)]
enum AuthAction {
    /// Sign in
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Create an account
    Register {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Home city id
        #[arg(short, long)]
        city: String,
    },
    /// Drop the local session
    Logout,
    /// Show the signed-in user
    Whoami,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;
    let storefront = Storefront::new(&config)?;

    match cli.command {
        Commands::Catalog { action } => match action {
            CatalogAction::Categories => commands::catalog::categories(&storefront).await?,
            CatalogAction::Subcategories { category } => {
                commands::catalog::subcategories(&storefront, category.as_deref()).await?;
            }
            CatalogAction::Products {
                page,
                limit,
                category,
                search,
            } => {
                commands::catalog::products(&storefront, page, limit, category, search).await?;
            }
            CatalogAction::Show { id } => commands::catalog::show(&storefront, &id).await?,
            CatalogAction::Cities => commands::catalog::cities(&storefront).await?,
        },
        Commands::Cart { action } => match action {
            CartAction::Add {
                product_id,
                quantity,
            } => commands::cart::add(&storefront, &product_id, quantity).await?,
            CartAction::List => commands::cart::list(&storefront),
            CartAction::Set {
                product_id,
                quantity,
            } => commands::cart::set(&storefront, &product_id, quantity),
            CartAction::Remove { product_id } => commands::cart::remove(&storefront, &product_id),
            CartAction::Clear => commands::cart::clear(&storefront),
        },
        Commands::Checkout {
            city,
            name,
            email,
            phone,
            address,
            note,
        } => {
            commands::orders::checkout(&storefront, city, name, email, phone, address, note)
                .await?;
        }
        Commands::Orders { action } => match action {
            OrdersAction::List { status } => {
                commands::orders::list(&storefront, status.as_deref()).await?;
            }
            OrdersAction::Show { id } => commands::orders::show(&storefront, &id).await?,
            OrdersAction::Approve { id, note } => {
                commands::orders::approve(&storefront, &id, note.as_deref()).await?;
            }
            OrdersAction::Reject { id, reason } => {
                commands::orders::reject(&storefront, &id, &reason).await?;
            }
            OrdersAction::Delete { id, reason } => {
                commands::orders::delete(&storefront, &id, reason.as_deref()).await?;
            }
            OrdersAction::Stats => commands::orders::stats(&storefront).await?,
        },
        Commands::Auth { action } => match action {
            AuthAction::Login { email, password } => {
                commands::auth::login(&storefront, email, password).await?;
            }
            AuthAction::Register {
                email,
                password,
                name,
                city,
            } => commands::auth::register(&storefront, email, password, name, city).await?,
            AuthAction::Logout => commands::auth::logout(&storefront),
            AuthAction::Whoami => commands::auth::whoami(&storefront),
        },
    }
    Ok(())
}
