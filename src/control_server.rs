//! TCP control surface for the fabric.
//!
//! Clients send one JSON command per line and receive one JSON response
//! per line. All semantics live in [`Fabric`]; this is translation only.

use log::{error, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use crate::error::FabricError;
use crate::fabric::{Fabric, NeighborSpec};

#[derive(Debug, Deserialize)]
pub struct ControlCommand {
    pub command: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct ControlResponse {
    pub success: bool,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

impl ControlResponse {
    fn success(message: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StartArgs {
    port: i64,
    #[serde(default)]
    neighbors: Vec<NeighborSpec>,
}

#[derive(Debug, Deserialize)]
struct PortArgs {
    port: i64,
}

#[derive(Debug, Deserialize)]
struct ConnectArgs {
    port1: i64,
    port2: i64,
    cost: i64,
}

pub struct ControlServer {
    fabric: Arc<Fabric>,
}

impl ControlServer {
    pub fn new(fabric: Arc<Fabric>) -> Self {
        Self { fabric }
    }

    pub async fn serve(&self, bind: &str) -> Result<(), FabricError> {
        let listener = TcpListener::bind(bind)
            .await
            .map_err(|source| FabricError::Bind {
                addr: bind.to_string(),
                source,
            })?;
        info!("control server listening on {bind}");

        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    let fabric = self.fabric.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_client(stream, fabric).await {
                            error!("control client {peer}: {e}");
                        }
                    });
                }
                Err(e) => error!("failed to accept control connection: {e}"),
            }
        }
    }
}

async fn handle_client(mut stream: TcpStream, fabric: Arc<Fabric>) -> Result<(), FabricError> {
    let (reader, mut writer) = stream.split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => break,
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let response = match serde_json::from_str::<ControlCommand>(trimmed) {
                    Ok(command) => dispatch(command, &fabric).await,
                    Err(e) => ControlResponse::failure(format!("invalid command: {e}")),
                };
                let encoded = serde_json::to_string(&response)?;
                writer.write_all(encoded.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
            Err(e) => {
                error!("error reading from control client: {e}");
                break;
            }
        }
    }

    Ok(())
}

async fn dispatch(command: ControlCommand, fabric: &Fabric) -> ControlResponse {
    match command.command.as_str() {
        "start" => start(command.args, fabric).await,
        "stop" => stop(command.args, fabric).await,
        "connect" => connect(command.args, fabric).await,
        "routes" => routes(command.args, fabric).await,
        "help" => help(),
        other => ControlResponse::failure(format!("unknown command: {other}")),
    }
}

async fn start(args: serde_json::Value, fabric: &Fabric) -> ControlResponse {
    let args: StartArgs = match serde_json::from_value(args) {
        Ok(args) => args,
        Err(e) => return ControlResponse::failure(format!("start: {e}")),
    };
    match fabric.start_router(args.port, args.neighbors).await {
        Ok(()) => ControlResponse::success(format!("router started on port {}", args.port), None),
        Err(e) => ControlResponse::failure(e.to_string()),
    }
}

async fn stop(args: serde_json::Value, fabric: &Fabric) -> ControlResponse {
    let args: PortArgs = match serde_json::from_value(args) {
        Ok(args) => args,
        Err(e) => return ControlResponse::failure(format!("stop: {e}")),
    };
    match fabric.stop_router(args.port).await {
        Ok(()) => ControlResponse::success(format!("router on port {} stopped", args.port), None),
        Err(e) => ControlResponse::failure(e.to_string()),
    }
}

async fn connect(args: serde_json::Value, fabric: &Fabric) -> ControlResponse {
    let args: ConnectArgs = match serde_json::from_value(args) {
        Ok(args) => args,
        Err(e) => return ControlResponse::failure(format!("connect: {e}")),
    };
    match fabric.connect(args.port1, args.port2, args.cost).await {
        Ok(()) => ControlResponse::success("routers connected", None),
        Err(e) => ControlResponse::failure(e.to_string()),
    }
}

async fn routes(args: serde_json::Value, fabric: &Fabric) -> ControlResponse {
    let args: PortArgs = match serde_json::from_value(args) {
        Ok(args) => args,
        Err(e) => return ControlResponse::failure(format!("routes: {e}")),
    };
    match fabric.routes(args.port).await {
        Ok(table) => match serde_json::to_value(&table) {
            Ok(data) => ControlResponse::success(
                format!("retrieved {} routes", table.len()),
                Some(data),
            ),
            Err(e) => ControlResponse::failure(format!("routes: {e}")),
        },
        Err(e) => ControlResponse::failure(e.to_string()),
    }
}

fn help() -> ControlResponse {
    let commands = vec![
        ("start", "Start a router: {port, neighbors: [{address, cost}]}"),
        ("stop", "Stop a router: {port}"),
        ("connect", "Link two routers: {port1, port2, cost}"),
        ("routes", "Get a routing table snapshot: {port}"),
        ("help", "Show this help message"),
    ];
    ControlResponse::success(
        "available commands",
        serde_json::to_value(commands).ok(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FabricConfig;

    fn fabric() -> Arc<Fabric> {
        Arc::new(Fabric::new(FabricConfig {
            tick_interval_secs: 1,
            ..FabricConfig::default()
        }))
    }

    fn command(raw: &str) -> ControlCommand {
        serde_json::from_str(raw).unwrap()
    }

    #[tokio::test]
    async fn start_routes_stop_through_dispatch() {
        let fabric = fabric();

        let response = dispatch(
            command(r#"{"command":"start","args":{"port":47301,"neighbors":[]}}"#),
            &fabric,
        )
        .await;
        assert!(response.success, "{}", response.message);

        let response = dispatch(
            command(r#"{"command":"routes","args":{"port":47301}}"#),
            &fabric,
        )
        .await;
        assert!(response.success, "{}", response.message);
        let data = response.data.unwrap();
        assert_eq!(data["localhost:47301"]["cost"], 0);
        assert_eq!(data["localhost:47301"]["next_hop"], "localhost:47301");

        let response = dispatch(
            command(r#"{"command":"stop","args":{"port":47301}}"#),
            &fabric,
        )
        .await;
        assert!(response.success, "{}", response.message);

        let response = dispatch(
            command(r#"{"command":"routes","args":{"port":47301}}"#),
            &fabric,
        )
        .await;
        assert!(!response.success);
    }

    #[tokio::test]
    async fn unknown_command_fails() {
        let fabric = fabric();
        let response = dispatch(command(r#"{"command":"bogus"}"#), &fabric).await;
        assert!(!response.success);
        assert!(response.message.contains("unknown command"));
    }

    #[tokio::test]
    async fn malformed_args_fail_without_side_effects() {
        let fabric = fabric();
        let response = dispatch(
            command(r#"{"command":"start","args":{"port":"nine thousand"}}"#),
            &fabric,
        )
        .await;
        assert!(!response.success);
    }
}
