//! Bookstore CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Create the schema and the session table
//! bookstore-cli migrate
//!
//! # Load sample categories and books
//! bookstore-cli seed
//!
//! # Grant or revoke the ADMIN role
//! bookstore-cli user grant-admin -e admin@example.com
//! bookstore-cli user revoke-admin -e admin@example.com
//! ```
//!
//! All commands read `BOOKSTORE_DATABASE_URL` (or `DATABASE_URL`), loading a
//! `.env` file if present.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bookstore-cli")]
#[command(author, version, about = "Online bookstore CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the catalog with sample data
    Seed,
    /// Manage user roles
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Grant the ADMIN role to a registered user
    GrantAdmin {
        /// User email address
        #[arg(short, long)]
        email: String,
    },
    /// Revoke the ADMIN role from a user
    RevokeAdmin {
        /// User email address
        #[arg(short, long)]
        email: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed => commands::seed::run().await?,
        Commands::User { action } => match action {
            UserAction::GrantAdmin { email } => commands::user::grant_admin(&email).await?,
            UserAction::RevokeAdmin { email } => commands::user::revoke_admin(&email).await?,
        },
    }
    Ok(())
}
