//! Backend entry-point: loads settings, prepares storage and serves the API.

mod server;

use actix_web::web;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use chatroom_backend::config::{AppSettings, ConfigError, Environment};
use chatroom_backend::inbound::http::health::HealthState;
use chatroom_backend::outbound::persistence::{DbPool, run_pending_migrations};
use server::{ServerConfig, create_server};

fn init_tracing(environment: Environment) {
    let default_level = if environment.is_production() {
        "info"
    } else {
        "debug"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = fmt().with_env_filter(filter);
    let result = if environment.is_production() {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
    if let Err(e) = result {
        warn!(error = %e, "tracing init failed");
    }
}

fn config_error(err: ConfigError) -> std::io::Error {
    std::io::Error::other(format!("invalid configuration: {err}"))
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let settings = AppSettings::load_from_args(std::env::args_os()).map_err(config_error)?;
    let environment = settings.environment().map_err(config_error)?;
    init_tracing(environment);

    let bind_addr = settings.bind_addr().map_err(config_error)?;
    let cors_policy = settings.cors_policy().map_err(config_error)?;
    let resolver = settings.username_resolver().map_err(config_error)?;
    let pool_config = settings.pool_config().map_err(config_error)?;
    info!(%environment, %bind_addr, "starting chatroom backend");

    let database_url = pool_config.database_url().to_owned();
    web::block(move || run_pending_migrations(&database_url))
        .await
        .map_err(std::io::Error::other)?
        .map_err(|e| std::io::Error::other(format!("database migration failed: {e}")))?;

    let db_pool = DbPool::new(pool_config)
        .await
        .map_err(|e| std::io::Error::other(format!("database pool setup failed: {e}")))?;

    let health_state = web::Data::new(HealthState::new());
    let config = ServerConfig::new(bind_addr, cors_policy, resolver, db_pool);
    create_server(health_state, config)?.await
}
