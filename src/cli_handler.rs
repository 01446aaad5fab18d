//! One-shot command handling for netview.
//!
//! Each subcommand connects once, issues a single request, disposes the
//! channel and exits. No reconnect or polling is involved.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::debug;

use crate::cli::Commands;
use crate::config::Config;
use crate::control::{Channel, Connect};
use crate::orchestrator::connector_from_config;

/// Upper bound on connect plus one round-trip.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle a one-shot subcommand.
pub fn handle_command(command: Commands, config: &Config) -> Result<()> {
    let connector = connector_from_config(config)?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    let output = rt.block_on(async {
        tokio::time::timeout(COMMAND_TIMEOUT, execute(&connector, &command))
            .await
            .context("Timed out waiting for the capture server")?
    })?;

    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}

/// Run `command` over a fresh connection and return what to print.
pub async fn execute<C: Connect>(connector: &C, command: &Commands) -> Result<String> {
    let transport = connector
        .connect()
        .await
        .context("Failed to connect to capture server")?;
    let channel = Channel::new(transport);
    debug!("Connected, running {:?}", command);

    let result = match command {
        Commands::Interfaces => channel
            .get_interfaces()
            .await
            .map(|interfaces| interfaces.join("\n"))
            .context("Failed to list interfaces"),
        Commands::Listen { name } => channel
            .listen_interface(name)
            .await
            .map(|()| format!("Listening on {}", name))
            .with_context(|| format!("Failed to listen on {}", name)),
        Commands::Unlisten { name } => channel
            .not_listen_interface(name)
            .await
            .map(|()| format!("Stopped listening on {}", name))
            .with_context(|| format!("Failed to stop listening on {}", name)),
        Commands::Clear { name } => channel
            .clear_interface(name)
            .await
            .map(|()| format!("Cleared {}", name))
            .with_context(|| format!("Failed to clear {}", name)),
    };

    channel.dispose();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::socket::{create_transport_pair, SocketError, SocketResult, Transport};
    use serde_json::{json, Value};
    use std::sync::Mutex;

    struct OnceConnector(Mutex<Option<Transport>>);

    impl Connect for OnceConnector {
        async fn connect(&self) -> SocketResult<Transport> {
            let transport = self.0.lock().unwrap().take();
            transport.ok_or(SocketError::ConnectionClosed)
        }
    }

    /// Reply to one request with `response` and report the request seen.
    fn connector_answering(response: Value) -> (OnceConnector, tokio::task::JoinHandle<Value>) {
        let (client, mut server) = create_transport_pair();
        let handle = tokio::spawn(async move {
            let frame = server.inbound.recv().await.unwrap();
            let request: Value = serde_json::from_str(&frame).unwrap();
            let reply = json!({"tag": request["tag"], "response": response}).to_string();
            server.outbound.send(reply).await.unwrap();
            request["request"].clone()
        });
        (OnceConnector(Mutex::new(Some(client))), handle)
    }

    #[tokio::test]
    async fn test_interfaces_command() {
        let (connector, server) = connector_answering(json!(["eth0", "lo"]));

        let output = execute(&connector, &Commands::Interfaces).await.unwrap();
        assert_eq!(output, "eth0\nlo");
        assert_eq!(server.await.unwrap(), json!("get_interfaces"));
    }

    #[tokio::test]
    async fn test_listen_command() {
        let (connector, server) = connector_answering(json!(null));

        let command = Commands::Listen { name: "eth0".to_string() };
        let output = execute(&connector, &command).await.unwrap();
        assert_eq!(output, "Listening on eth0");
        assert_eq!(server.await.unwrap(), json!({"listen_interfaces": "eth0"}));
    }

    #[tokio::test]
    async fn test_clear_command() {
        let (connector, server) = connector_answering(json!(null));

        let command = Commands::Clear { name: "eth0".to_string() };
        execute(&connector, &command).await.unwrap();
        assert_eq!(server.await.unwrap(), json!({"clear_interfaces": "eth0"}));
    }

    #[tokio::test]
    async fn test_interfaces_without_data_is_error() {
        let (connector, _server) = connector_answering(json!(null));

        let err = execute(&connector, &Commands::Interfaces).await.unwrap_err();
        assert!(err.to_string().contains("Failed to list interfaces"));
    }

    #[tokio::test]
    async fn test_listen_without_ack_is_error() {
        let (client, server) = create_transport_pair();
        tokio::spawn(async move {
            // Move the whole transport in so both halves drop with the task.
            let mut server = server;
            // Read the request, then drop the connection unanswered.
            server.inbound.recv().await.unwrap();
        });
        let connector = OnceConnector(Mutex::new(Some(client)));

        let command = Commands::Listen { name: "eth0".to_string() };
        let err = execute(&connector, &command).await.unwrap_err();
        assert!(err.to_string().contains("Failed to listen on eth0"));
    }

    #[tokio::test]
    async fn test_connect_failure() {
        let connector = OnceConnector(Mutex::new(None));
        let err = execute(&connector, &Commands::Interfaces).await.unwrap_err();
        assert!(err.to_string().contains("Failed to connect"));
    }
}
