//! Hub File Tools - Entry Point
//!
//! HTTP endpoints over a home-automation hub's configuration directory and
//! REST API.

use env_logger::Env;
use log::{error, info};
use std::process::ExitCode;

use hub_file_tools::Server;
use hub_file_tools::config::ServerConfig;
use hub_file_tools::error::ServerError;

#[tokio::main]
async fn main() -> ExitCode {
    // RUST_LOG overrides the default level
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("Launching hub file tools...");

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), ServerError> {
    let config = ServerConfig::load()?;
    let server = Server::new(config).await?;
    server.start().await
}
