//! Mercato CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! mercato migrate
//!
//! # Promote an existing user to admin
//! mercato user promote -e admin@example.com
//!
//! # Issue a 20% coupon valid for 30 days
//! mercato coupon issue -e buyer@example.com -c WELCOME20 -d 20 --days 30
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mercato")]
#[command(author, version, about = "Mercato CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Manage coupons
    Coupon {
        #[command(subcommand)]
        action: CouponAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Grant the admin role to an existing user
    Promote {
        /// User email address
        #[arg(short, long)]
        email: String,
    },
}

#[derive(Subcommand)]
enum CouponAction {
    /// Issue a coupon to a user who has no active coupon
    Issue {
        /// Email address of the coupon holder
        #[arg(short, long)]
        email: String,

        /// Coupon code
        #[arg(short, long)]
        code: String,

        /// Discount percentage (0-100)
        #[arg(short, long)]
        discount: i64,

        /// Days until the coupon expires
        #[arg(long, default_value_t = 30)]
        days: u32,
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
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::User { action } => match action {
            UserAction::Promote { email } => commands::user::promote(&email).await?,
        },
        Commands::Coupon { action } => match action {
            CouponAction::Issue {
                email,
                code,
                discount,
                days,
            } => commands::coupon::issue(&email, &code, discount, days).await?,
        },
    }
    Ok(())
}
