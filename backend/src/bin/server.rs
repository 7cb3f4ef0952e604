use backend::executable::{initialize_executable, initialize_tracing, run_server};
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    println!("Starting backend...");
    let config = initialize_executable()?;
    initialize_tracing(&config.server.log_level);
    run_server(config).await
}
