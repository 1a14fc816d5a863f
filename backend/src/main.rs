//! Fare service entry-point: configuration, logging, and server startup.

use mockable::DefaultEnv;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use backend::config::AppConfig;

mod server;

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let config = AppConfig::from_env(&DefaultEnv::new()).map_err(std::io::Error::other)?;
    server::run(config).await
}
