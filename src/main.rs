//! RAX File Broker - Entry Point
//!
//! Serves granted tokens over TCP and reads share commands from stdin.

use log::{error, info};
use std::process;
use std::sync::Arc;
use tokio::io::BufReader;

use rax_file_broker::access::GrantTable;
use rax_file_broker::broker::AccessBroker;
use rax_file_broker::config::BrokerConfig;
use rax_file_broker::server::{Server, run_console};

#[tokio::main]
async fn main() {
    // Initialize the logger (env_logger picks up RUST_LOG environment variable)
    env_logger::init();

    info!("Launching file broker...");

    let config = match BrokerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            process::exit(1);
        }
    };
    let (startup, runtime) = config.split();

    let broker = match AccessBroker::from_config(&startup) {
        Ok(broker) => Arc::new(broker),
        Err(e) => {
            error!("Cannot build storage roots: {}", e);
            process::exit(1);
        }
    };
    let grants = Arc::new(GrantTable::new());

    let server = match Server::bind(
        startup,
        Arc::clone(&runtime),
        Arc::clone(&broker),
        Arc::clone(&grants),
    )
    .await
    {
        Ok(server) => server,
        Err(e) => {
            error!("Server startup failed: {}", e);
            process::exit(1);
        }
    };

    tokio::spawn(async move {
        let stdin = BufReader::new(tokio::io::stdin());
        if let Err(e) = run_console(stdin, tokio::io::stdout(), &broker, &grants, &runtime).await {
            error!("Console failed: {}", e);
        }
    });

    server.start().await;
}
