mod config;
mod data;
mod decompose;
mod error;
mod memory;
mod ordering;
mod report;
mod server;
mod solver;
mod store;

use config::ServerConfig;
use log::info;
use memory::{CatalogSnapshot, InMemoryCatalog};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from_env()?;
    let snapshot = match &config.catalog_path {
        Some(path) => {
            info!("Loading catalog from {path}");
            CatalogSnapshot::from_json_file(path)?
        }
        None => {
            info!("No TIMETABLE_CATALOG set, starting with an empty catalog");
            CatalogSnapshot::default()
        }
    };

    let state = Arc::new(server::AppState::new(
        InMemoryCatalog::new(snapshot),
        config.generation,
    ));
    server::run_server(config.bind_addr, state).await?;

    Ok(())
}
