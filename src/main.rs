/// Eletro Rápida - component inventory backend
///
/// JWT sessions, email-based password reset, component search with search
/// logging, a stock dashboard and a persistent error log.

mod account;
mod api;
mod auth;
mod catalog;
mod config;
mod context;
mod dashboard;
mod db;
mod error;
mod logs;
mod mailer;
mod metrics;
mod reset;
mod server;

use config::{LoggingConfig, ServerConfig};
use context::AppContext;
use error::InventoryResult;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> InventoryResult<()> {
    let config = ServerConfig::from_env()?;

    init_tracing(&config.logging);

    tracing::info!(
        "Starting Eletro Rápida inventory service v{}",
        env!("CARGO_PKG_VERSION")
    );

    let ctx = AppContext::new(config).await?;

    server::serve(ctx).await?;

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level)
        .unwrap_or_else(|_| EnvFilter::new("eletro_rapida=debug,tower_http=debug"));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
