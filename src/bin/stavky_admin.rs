//! Stavky operator CLI
//!
//! Account and company maintenance without going through the HTTP API.
//!
//! Usage:
//!   cargo run --bin stavky-admin -- create-user --username jana --password secret --role customer
//!   cargo run --bin stavky-admin -- activate --username jana --days 30
//!   cargo run --bin stavky-admin -- set-betting-role --username jana
//!   cargo run --bin stavky-admin -- add-company --name Tipsport
//!   cargo run --bin stavky-admin -- balance --pretty

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};

use stavky_backend::{
    auth::{UserRole, UserStore},
    balance::BalanceEngine,
    clock::system_clock,
    config::{load_env, parse_starting_balance, resolve_data_path},
    storage::TipStore,
};

/// Stavky operator CLI
#[derive(Parser, Debug)]
#[command(name = "stavky-admin")]
#[command(about = "Manage Stavky users, betting companies and balance reports")]
struct Cli {
    /// Tips database (defaults to DB_PATH)
    #[arg(long, env = "DB_PATH")]
    db_path: Option<String>,

    /// Users database (defaults to AUTH_DB_PATH)
    #[arg(long, env = "AUTH_DB_PATH")]
    auth_db_path: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a user account
    CreateUser {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: String,

        /// betting or customer
        #[arg(short, long, default_value = "customer")]
        role: String,
    },

    /// Extend a customer's subscription
    Activate {
        #[arg(short, long)]
        username: String,

        /// Explicit end of the subscription (RFC3339)
        #[arg(long, conflicts_with = "days")]
        until: Option<String>,

        /// Days from now
        #[arg(short, long, default_value = "365")]
        days: i64,
    },

    /// Promote a user to the betting role
    SetBettingRole {
        #[arg(short, long)]
        username: String,
    },

    /// Register a betting company
    AddCompany {
        #[arg(short, long)]
        name: String,
    },

    /// Print the balance history JSON
    Balance {
        /// Notional starting balance per company
        #[arg(
            long,
            env = "STARTING_BALANCE",
            default_value = "1000",
            value_parser = starting_balance_arg
        )]
        starting_balance: f64,

        #[arg(long)]
        pretty: bool,
    },
}

fn starting_balance_arg(raw: &str) -> Result<f64, String> {
    parse_starting_balance(raw).map_err(|e| format!("{e:#}"))
}

fn main() -> Result<()> {
    load_env();
    let cli = Cli::parse();

    let db_path = resolve_data_path(cli.db_path, "stavky.db");
    let auth_db_path = resolve_data_path(cli.auth_db_path, "stavky_auth.db");

    match cli.command {
        Commands::CreateUser {
            username,
            password,
            role,
        } => {
            let role = UserRole::from_str(&role)
                .with_context(|| format!("Unknown role: {role} (expected betting or customer)"))?;
            let store = UserStore::new(&auth_db_path)?;
            let user = store.create_user(&username, &password, role)?;
            println!("Created {} ({})", user.username, user.role.label());
        }
        Commands::Activate {
            username,
            until,
            days,
        } => {
            let until = match until {
                Some(raw) => DateTime::parse_from_rfc3339(&raw)
                    .with_context(|| format!("Invalid timestamp: {raw}"))?
                    .with_timezone(&Utc),
                None => Utc::now() + Duration::days(days),
            };
            let store = UserStore::new(&auth_db_path)?;
            match store.set_active_until(&username, &until.to_rfc3339())? {
                Some(user) => println!(
                    "{} active until {}",
                    user.username,
                    user.account_active_until.unwrap_or_default()
                ),
                None => bail!("User not found: {username}"),
            }
        }
        Commands::SetBettingRole { username } => {
            let store = UserStore::new(&auth_db_path)?;
            match store.set_role(&username, UserRole::Betting)? {
                Some(user) => println!("{} is now {}", user.username, user.role.label()),
                None => bail!("User not found: {username}"),
            }
        }
        Commands::AddCompany { name } => {
            let store = TipStore::new(&db_path)?;
            if store.find_company_by_name(&name)?.is_some() {
                bail!("Betting company already exists: {name}");
            }
            let company = store.create_company(&name)?;
            println!("{} {}", company.id, company.name);
        }
        Commands::Balance {
            starting_balance,
            pretty,
        } => {
            let store = TipStore::new(&db_path)?;
            let engine = BalanceEngine::new(starting_balance, system_clock());
            let history = engine.compute(&store.fetch_wagers()?);
            let out = if pretty {
                serde_json::to_string_pretty(&history)?
            } else {
                serde_json::to_string(&history)?
            };
            println!("{out}");
        }
    }

    Ok(())
}
