// src/main.rs

//! The main entry point for the CitrineDB server application.

use anyhow::Result;
use citrinedb::config::Config;
use citrinedb::server;
use std::env;
use tracing::{error, info};
use tracing_subscriber::filter::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    // Parse flags before logging is up; a bad invocation prints to stderr.
    let config = match Config::from_args(env::args().skip(1)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            eprintln!(
                "Usage: citrinedb [--port <port>] [--replicaof \"<host> <port>\"] [--dir <path>] [--dbfilename <name>]"
            );
            std::process::exit(2);
        }
    };

    // `RUST_LOG` wins over the configured default level.
    let log_level = env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level))
        .compact()
        .with_ansi(true)
        .init();

    let role = if config.is_master() { "master" } else { "replica" };
    info!(
        "Starting CitrineDB {} on port {} as {}.",
        VERSION, config.port, role
    );

    if let Err(e) = server::run(config).await {
        error!("Server runtime error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
