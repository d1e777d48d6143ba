//! Toolgate server - main entry point.
//!
//! Loads the built-in capabilities and serves JSON-RPC over stdin/stdout.
//! Logs go to stderr.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;

use toolgate_core::protocol::{Gateway, Server};
use toolgate_core::tools::CapabilityLoader;
use toolgate_core::Config;

#[derive(Debug, Parser)]
#[command(name = "toolgate-server", version, about = "Governed capability gateway over stdio")]
struct Args {
    /// JSON configuration file; defaults apply when omitted.
    #[arg(long, env = "TOOLGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON.
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if args.json_logs {
        config.observability.json_logs = true;
    }
    config.validate()?;

    // Initialize observability
    toolgate_core::observability::init_tracing(&config.observability);

    let (registry, report) = CapabilityLoader::builtin(config.loader.clone()).load().await;
    tracing::info!(
        "{} {} starting: {} tools loaded, {} modules skipped",
        config.server.name,
        config.server.version,
        report.loaded.len(),
        report.skipped.len(),
    );

    let gateway = Arc::new(Gateway::from_config(&config, registry));
    let server = Arc::new(Server::new(gateway));

    let shutdown = server.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received");
            shutdown.cancel();
        }
    });

    server
        .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;

    Ok(())
}
