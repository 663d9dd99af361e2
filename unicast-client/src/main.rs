//! Unicast alert client - terminal front-end
//!
//! Registers this device with the Unicast alert service, polls it for alerts
//! and prints them. Type commands on stdin:
//! - `lang <code>` change the alert language
//! - `page <about|rights>` show a static page in the current language
//! - `quit` stop the client

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use unicast_client::config::ClientConfig;
use unicast_client::identity::{FileStore, IdentityStore};
use unicast_client::poller::PollSchedule;
use unicast_client::remote::HttpAlertService;
use unicast_client::render::TerminalDisplay;
use unicast_client::runtime::{ClientRuntime, Command};

const HELP: &str = "Commands: lang <code> | page <about|rights> | quit";

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();

    let first_run = !ClientConfig::config_file_path()?.exists();
    let config = ClientConfig::load().await.context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Unicast alert client v{} starting...", env!("CARGO_PKG_VERSION"));

    if first_run {
        match config.save().await {
            Ok(path) => info!("Wrote default configuration to {}", path.display()),
            Err(e) => warn!("Could not write default configuration: {}", e),
        }
    }

    let identity_path = config.identity_file_path()?;
    let identity = IdentityStore::new(FileStore::open(&identity_path));

    let service = HttpAlertService::new(&config.service).context("Failed to create alert service client")?;
    info!("Using alert service at {}", service.base_url());

    let runtime = ClientRuntime::new(
        identity,
        Arc::new(service),
        Arc::new(TerminalDisplay),
        PollSchedule::from_config(&config.polling),
    );

    let (command_tx, command_rx) = mpsc::channel(16);
    spawn_stdin_reader(command_tx.clone());
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = command_tx.send(Command::Quit).await;
        }
    });

    println!("{HELP}");
    let session = runtime.run(command_rx).await;
    info!("Device {} stopped (language {})", session.token, session.language);
    Ok(())
}

/// Forwards parsed stdin lines; EOF asks the loop to stop
fn spawn_stdin_reader(commands: mpsc::Sender<Command>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => {}
                Ok(Some(line)) => match Command::parse(&line) {
                    Some(command) => {
                        if commands.send(command).await.is_err() {
                            break;
                        }
                    }
                    None => println!("{HELP}"),
                },
                Ok(None) => {
                    let _ = commands.send(Command::Quit).await;
                    break;
                }
                Err(e) => {
                    warn!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });
}
