#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]

use anyhow::Result;
use tokio::net::TcpListener;
use tracing_subscriber::prelude::*;

use urldoc::Config;
use urldoc::graceful_shutdown;
use urldoc::setup_app;

const DEFAULT_RUST_LOG: &str = "urldoc=debug,tower_http=debug";

#[tokio::main]
async fn main() -> Result<()> {
    setup_environment();
    setup_tracing();

    let config = Config::from_env()?;
    let address = config.address;

    let (app, connection) = setup_app(config).await?;

    let listener = TcpListener::bind(address).await?;
    tracing::info!("Listening on {}", address);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(graceful_shutdown::handler())
        .await;

    connection.close().await;

    served?;

    Ok(())
}

fn setup_environment() {
    dotenvy::dotenv().ok();
}

fn setup_tracing() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::registry;

    registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_RUST_LOG.into()),
        ))
        .with(fmt::layer())
        .init();
}
