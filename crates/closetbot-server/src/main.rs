mod api;
mod dispatch;
mod executor;
mod middleware;
mod orchestrator;
mod scheduler;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::api::{build_app, default_rate_limit_state, AppState};
use crate::dispatch::Dispatcher;
use crate::middleware::AuthState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(closetbot_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = closetbot_db::PoolConfig::from_app_config(&config);
    let pool = closetbot_db::connect_pool(&config.database_url, pool_config).await?;
    closetbot_db::run_migrations(&pool).await?;
    closetbot_db::seed_category_taxonomy_if_empty(&pool).await?;

    let _scheduler = scheduler::build_scheduler(pool.clone(), Arc::clone(&config)).await?;

    let discovery = Arc::new(closetbot_discovery::Discovery::new(&config, pool.clone())?);
    let dispatcher = Dispatcher::new(pool.clone(), Arc::clone(&discovery), Arc::clone(&config));

    let auth = AuthState::from_env(matches!(config.env, closetbot_core::Environment::Development))?;
    let state = AppState { pool, discovery, config: Arc::clone(&config), dispatcher };
    let app = build_app(state, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
