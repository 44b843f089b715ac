use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use regiostat::config::load_config;
use regiostat::error::AppError;
use regiostat::source::AnyDataSource;
use regiostat::web::{self, AppState};

#[derive(Debug, Parser)]
#[command(name = "regiostat", about = "Regional statistics data API")]
struct Args {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config/config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let args = Args::parse();
    let config = load_config(&args.config)?;

    // RUST_LOG wins over the configured level.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.app.log_level.clone()));
    fmt::Subscriber::builder().with_env_filter(filter).init();
    info!(config = %args.config.display(), "startup");

    let data_source = AnyDataSource::from_config(&config.data_source)?;
    info!(kind = %config.data_source.kind, "data source ready");

    let state = Arc::new(AppState { data_source });
    let app = web::router(state);

    let addr = format!("{}:{}", config.app.host, config.app.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
