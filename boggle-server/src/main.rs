use std::sync::Arc;

use tokio::signal;
use tracing::info;

use boggle_core::Dictionary;
use boggle_persistence::connection::connect_and_migrate;
use boggle_server::{config::Config, create_routes, registry::SessionRegistry};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting Boggle server...");

    let config = Config::new();

    // Load the legality dictionary
    info!("Loading dictionary from: {}", config.dictionary_path);
    let word_list = match std::fs::read_to_string(&config.dictionary_path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::error!(
                "Failed to read dictionary file '{}': {}",
                config.dictionary_path,
                e
            );
            tracing::error!("The server requires a word list to score submissions.");
            tracing::error!("Set DICTIONARY_PATH to point to a newline-separated word list.");
            std::process::exit(1);
        }
    };
    let dictionary = Dictionary::new(&word_list);
    info!("Loaded {} dictionary words", dictionary.len());

    // Initialize database connection and run migrations
    let db = match connect_and_migrate().await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Failed to connect to database and run migrations: {}", e);
            std::process::exit(1);
        }
    };

    let registry = Arc::new(SessionRegistry::new(db, dictionary));
    let routes = create_routes(registry);

    info!("Server starting on {}:{}", config.host, config.port);

    let addr = (
        config.host.parse::<std::net::IpAddr>().unwrap(),
        config.port,
    );

    let (addr, server) = warp::serve(routes).bind_with_graceful_shutdown(addr, async {
        // Wait for SIGINT (Ctrl+C) or SIGTERM
        #[cfg(unix)]
        {
            let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt()).unwrap();
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate()).unwrap();

            tokio::select! {
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully...");
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            signal::ctrl_c().await.expect("Failed to listen for ctrl+c");
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    });

    info!(
        "Server started successfully on {}. Press Ctrl+C to stop.",
        addr
    );
    server.await;
    info!("Server shutdown complete.");
}
