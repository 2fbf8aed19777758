use anyhow::Result;
use clap::Parser;
use log::info;
use std::sync::Arc;

use dvrouted::config::FabricConfig;
use dvrouted::control_server::ControlServer;
use dvrouted::fabric::Fabric;

#[derive(Parser)]
#[command(name = "dvrouted", about = "Distance-vector routing fabric daemon")]
struct Cli {
    /// Optional JSON configuration file.
    #[arg(long)]
    config: Option<String>,

    /// TCP port for the control server.
    #[arg(long)]
    control_port: Option<u16>,

    /// Host part of router addresses created by this process.
    #[arg(long)]
    host: Option<String>,

    /// Seconds between periodic refresh broadcasts.
    #[arg(long)]
    tick_interval: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => FabricConfig::load(path)?,
        None => FabricConfig::default(),
    };
    if let Some(port) = cli.control_port {
        config.control_port = port;
    }
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(secs) = cli.tick_interval {
        config.tick_interval_secs = secs;
    }

    let bind = format!("127.0.0.1:{}", config.control_port);
    let fabric = Arc::new(Fabric::new(config));
    let server = ControlServer::new(fabric.clone());

    tokio::select! {
        result = server.serve(&bind) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
            fabric.shutdown().await;
        }
    }

    Ok(())
}
