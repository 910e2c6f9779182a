//! Stavky Backend Library
//!
//! Betting tips, subscriptions and the balance history engine.
//! Shared by the `stavky` server, the `stavky-admin` CLI and the integration tests.

pub mod api;
pub mod auth;
pub mod balance;
pub mod clock;
pub mod config;
pub mod history;
pub mod middleware;
pub mod models;
pub mod storage;

pub use api::{create_router, AppState};
pub use balance::{BalanceEngine, BalanceHistory};
pub use config::Config;
