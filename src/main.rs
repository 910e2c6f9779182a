//! Stavky - betting tips backend
//! Serves tips, subscriptions and balance history over HTTP

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stavky_backend::{
    auth::{AuthState, JwtHandler, UserStore},
    clock::system_clock,
    config::{load_env, Config},
    create_router,
    storage::TipStore,
    AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing();

    info!("🚀 Stavky backend starting");

    let config = Config::from_env().context("Invalid configuration")?;

    let clock = system_clock();

    let user_store = Arc::new(UserStore::new(&config.auth_db_path)?);
    let jwt_handler = Arc::new(
        JwtHandler::new(&config.jwt_secret, clock.clone())
            .with_expiration_hours(config.jwt_expiration_hours),
    );
    info!("🔐 Authentication initialized at: {}", config.auth_db_path);

    let tip_store = Arc::new(TipStore::new(&config.db_path)?);
    info!("💾 Existing tips in database: {}", tip_store.count_tips()?);

    let auth_state = AuthState {
        user_store,
        jwt_handler,
        clock,
        default_activation_days: config.default_activation_days,
    };
    let state = AppState::new(
        tip_store,
        auth_state,
        config.starting_balance,
        config.history_months,
    );

    let app = create_router(state);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("🎯 API server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stavky_backend=debug,stavky=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
