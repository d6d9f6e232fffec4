mod config;
mod domains;
mod error;
mod handler;
mod http;
mod json;
mod repositories;
mod server;

use std::{process, sync::Arc};

use repositories::{memory::MemoryDinosaurRepository, DinosaurRepository};
use server::Server;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = match config::Config::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(%err, "invalid configuration");
            process::exit(1);
        }
    };
    tracing::debug!(?config, "configuration loaded");

    let state = AppState {
        repository: Arc::new(MemoryDinosaurRepository::default()),
    };

    let server = Server::new(state, handler::route_request, &config);

    if let Err(err) = server.bind(config.server_address.as_str()).await {
        tracing::error!(%err, "server failed");
        process::exit(1);
    }
}

#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn DinosaurRepository + Send + Sync>,
}
