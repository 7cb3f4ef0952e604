use crate::api::{router, AppState};
use crate::media::FsMediaStorage;
use crate::store::SqliteStore;
use clap::Parser;
use common::config::Config;
use std::error::Error;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to config file
    #[arg(short, long, default_value = "config/server.yaml")]
    pub config: String,
}

pub fn initialize_executable() -> Result<Config, Box<dyn Error + Send + Sync>> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    println!("Loading config from: {}", args.config);
    let config = Config::load(&args.config)?;
    Ok(config)
}

pub fn initialize_tracing(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

pub async fn run_server(config: Config) -> Result<(), Box<dyn Error + Send + Sync>> {
    let store = Arc::new(SqliteStore::connect(&config.common.database_url).await?);
    store.initialize_schema().await?;
    let media = Arc::new(FsMediaStorage::new(
        &config.media.media_root,
        &config.media.public_base_url,
    ));

    let state = AppState {
        products: store.clone(),
        orders: store,
        media,
    };
    let app = router(state);

    tracing::info!(
        "Starting {} backend at {}",
        config.common.project_name,
        config.server.server_address
    );
    let listener = tokio::net::TcpListener::bind(&config.server.server_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
