// src/main.rs
use chrono::Duration;
use env_logger::Builder;
use log::{error, info};
use scrooge_capital::api;
use scrooge_capital::auth::TokenSigner;
use scrooge_capital::config::{Config, StoreBackend};
use scrooge_capital::seed;
use scrooge_capital::store::{MemoryStore, ScyllaStore, Store};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            return;
        }
    };

    Builder::new()
        .filter_level(config.log_level)
        .parse_default_env()
        .format_timestamp_secs()
        .init();

    let store: Arc<dyn Store> = match config.store {
        StoreBackend::Memory => {
            info!("Using the in-memory store; data is lost on shutdown.");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::Scylla => match ScyllaStore::connect(&config.scylla_node).await {
            Ok(store) => {
                info!("Connected to database at {}...", config.scylla_node);
                Arc::new(store)
            }
            Err(e) => {
                error!("Failed to initialize database: {}", e);
                return;
            }
        },
    };

    if let Some(path) = &config.seed_file {
        let seeded = match seed::load(path) {
            Ok(catalogue) => seed::apply(store.as_ref(), catalogue).await,
            Err(e) => Err(e),
        };
        match seeded {
            Ok(added) => info!("Seeded {} stocks from {}", added, path.display()),
            Err(e) => {
                error!("Failed to seed stocks from {}: {}", path.display(), e);
                return;
            }
        }
    }

    let signer = Arc::new(TokenSigner::new(
        config.jwt_secret.clone(),
        Duration::seconds(config.session_ttl_secs),
    ));
    let routes = api::routes(store, signer);

    info!("Server running on http://{}", config.bind_addr);
    warp::serve(routes).run(config.bind_addr).await;
}
