//! Cartline CLI - Database migrations and account provisioning.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! cartline migrate
//!
//! # Create a shopper account
//! cartline account create -e shopper@example.com -p 'correct horse'
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `account create` - Create storefront accounts

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "cartline")]
#[command(author, version, about = "Cartline CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Manage storefront accounts
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
}

#[derive(Subcommand)]
enum AccountAction {
    /// Create a new account
    Create {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password (at least 6 characters)
        #[arg(short, long)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Account { action } => match action {
            AccountAction::Create { email, password } => {
                commands::account::create(&email, &password).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_account_create() {
        let cli = Cli::try_parse_from([
            "cartline", "account", "create", "-e", "a@b.co", "-p", "secret1",
        ])
        .unwrap_or_else(|e| panic!("{e}"));

        match cli.command {
            Commands::Account {
                action: AccountAction::Create { email, password },
            } => {
                assert_eq!(email, "a@b.co");
                assert_eq!(password, "secret1");
            }
            Commands::Migrate => panic!("expected account create"),
        }
    }
}
