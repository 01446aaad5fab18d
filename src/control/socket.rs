//! WebSocket transport for the capture server channel.
//!
//! The socket is split into two tasks that bridge to in-process queues of
//! text frames, so the [`Channel`](super::channel::Channel) never touches the
//! socket directly.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐               ┌────────────────────────────┐
//! │  Channel             │   outbound    │  writer task               │
//! │   Transport.outbound ├──────────────►│   Message::Text ─► socket  │
//! │                      │               └────────────────────────────┘
//! │                      │   inbound     ┌────────────────────────────┐
//! │   Transport.inbound  │◄──────────────┤  reader task               │
//! │                      │               │   socket ─► Message::Text  │
//! └──────────────────────┘               └────────────────────────────┘
//! ```
//!
//! Dropping the outbound sender makes the writer send a close frame. The
//! inbound receiver ends when the server closes or the socket fails.

use super::reconnect::Connect;
use super::tls::create_client_config;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use rustls::ClientConfig;
use std::io;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async_tls_with_config, Connector, WebSocketStream};
use tracing::{debug, error, info, trace};
use url::Url;

/// Errors from transport operations.
#[derive(Debug, Error)]
pub enum SocketError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// WebSocket protocol or handshake error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
    /// TLS configuration error.
    #[error("TLS error: {0}")]
    Tls(String),
    /// URL is not a WebSocket URL.
    #[error("Unsupported URL scheme '{0}' (expected ws or wss)")]
    UnsupportedScheme(String),
    /// Connection closed.
    #[error("Connection closed")]
    ConnectionClosed,
}

/// Result type for transport operations.
pub type SocketResult<T> = Result<T, SocketError>;

/// Default frame queue size in each direction.
pub const DEFAULT_FRAME_BUFFER: usize = 64;

/// One end of a duplex text-frame transport.
#[derive(Debug)]
pub struct Transport {
    /// Frames to send to the peer.
    pub outbound: mpsc::Sender<String>,
    /// Frames received from the peer.
    pub inbound: mpsc::Receiver<String>,
}

/// Create two connected in-process transport ends.
///
/// Returns `(client, server)`. Useful for driving a channel without a socket.
#[inline]
pub fn create_transport_pair() -> (Transport, Transport) {
    create_transport_pair_with_size(DEFAULT_FRAME_BUFFER)
}

/// Create two connected in-process transport ends with a custom buffer size.
pub fn create_transport_pair_with_size(size: usize) -> (Transport, Transport) {
    let (client_tx, server_rx) = mpsc::channel(size);
    let (server_tx, client_rx) = mpsc::channel(size);

    let client = Transport {
        outbound: client_tx,
        inbound: client_rx,
    };
    let server = Transport {
        outbound: server_tx,
        inbound: server_rx,
    };

    (client, server)
}

/// Bridge an established WebSocket stream to a [`Transport`].
///
/// Spawns the reader and writer tasks; must be called inside a tokio runtime.
pub fn spawn_transport<S>(stream: WebSocketStream<S>) -> Transport
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (sink, source) = stream.split();
    let (outbound_tx, outbound_rx) = mpsc::channel(DEFAULT_FRAME_BUFFER);
    let (inbound_tx, inbound_rx) = mpsc::channel(DEFAULT_FRAME_BUFFER);

    tokio::spawn(async move {
        if let Err(e) = socket_reader(source, inbound_tx).await
            && !is_closed(&e) {
                error!("Socket reader error: {}", e);
            }
        debug!("Socket reader task finished");
    });

    tokio::spawn(async move {
        if let Err(e) = socket_writer(sink, outbound_rx).await
            && !is_closed(&e) {
                error!("Socket writer error: {}", e);
            }
        debug!("Socket writer task finished");
    });

    Transport {
        outbound: outbound_tx,
        inbound: inbound_rx,
    }
}

fn is_closed(e: &SocketError) -> bool {
    matches!(
        e,
        SocketError::ConnectionClosed
            | SocketError::WebSocket(tungstenite::Error::ConnectionClosed)
            | SocketError::WebSocket(tungstenite::Error::AlreadyClosed)
    )
}

/// Reads text frames from the socket into the inbound queue.
async fn socket_reader<S>(
    mut source: SplitStream<WebSocketStream<S>>,
    tx: mpsc::Sender<String>,
) -> SocketResult<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    while let Some(message) = source.next().await {
        match message? {
            Message::Text(text) => {
                trace!("Received frame ({} bytes)", text.len());
                if tx.send(text).await.is_err() {
                    // Channel gone, stop reading
                    break;
                }
            }
            Message::Close(frame) => {
                debug!("Server closed connection: {:?}", frame);
                return Err(SocketError::ConnectionClosed);
            }
            // Pings are answered by tungstenite; binary frames are not part of the protocol.
            other => trace!("Ignoring non-text frame: {:?}", other),
        }
    }
    Ok(())
}

/// Writes frames from the outbound queue to the socket.
async fn socket_writer<S>(
    mut sink: SplitSink<WebSocketStream<S>, Message>,
    mut rx: mpsc::Receiver<String>,
) -> SocketResult<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    while let Some(frame) = rx.recv().await {
        trace!("Sending frame ({} bytes)", frame.len());
        sink.send(Message::Text(frame)).await?;
    }
    debug!("Outbound queue closed, closing socket");
    sink.close().await?;
    Ok(())
}

/// Connects to the capture server over `ws://` or `wss://`.
#[derive(Clone)]
pub struct WsConnector {
    url: Url,
    tls: Option<Arc<ClientConfig>>,
}

impl WsConnector {
    /// Create a connector for the given URL.
    ///
    /// For `wss://` URLs the TLS configuration is built up front from the
    /// system roots plus `ca_cert`, if given.
    pub fn new(url: Url, ca_cert: Option<&Path>) -> SocketResult<Self> {
        let tls = match url.scheme() {
            "ws" => None,
            "wss" => Some(create_client_config(ca_cert)?),
            other => return Err(SocketError::UnsupportedScheme(other.to_string())),
        };
        Ok(Self { url, tls })
    }

    /// Server URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Perform the handshake and spawn the transport tasks.
    pub async fn connect(&self) -> SocketResult<Transport> {
        let connector = self.tls.clone().map(Connector::Rustls);
        let (stream, response) =
            connect_async_tls_with_config(self.url.as_str(), None, false, connector).await?;
        info!("Connected to {} (HTTP {})", self.url, response.status());
        Ok(spawn_transport(stream))
    }
}

impl Connect for WsConnector {
    async fn connect(&self) -> SocketResult<Transport> {
        WsConnector::connect(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    #[tokio::test]
    async fn test_transport_pair() {
        let (client, mut server) = create_transport_pair();
        client.outbound.send("ping".to_string()).await.unwrap();
        assert_eq!(server.inbound.recv().await.unwrap(), "ping");

        let Transport { mut inbound, .. } = client;
        server.outbound.send("pong".to_string()).await.unwrap();
        assert_eq!(inbound.recv().await.unwrap(), "pong");
    }

    #[test]
    fn test_connector_rejects_http_scheme() {
        let url = Url::parse("http://localhost:8080").unwrap();
        match WsConnector::new(url, None) {
            Err(SocketError::UnsupportedScheme(scheme)) => assert_eq!(scheme, "http"),
            _ => unreachable!("Expected UnsupportedScheme"),
        }
    }

    #[tokio::test]
    async fn test_websocket_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Echo server
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let ws = accept_async(stream).await.unwrap();
            let (mut sink, mut source) = ws.split();
            while let Some(Ok(message)) = source.next().await {
                if message.is_text() && sink.send(message).await.is_err() {
                    break;
                }
            }
        });

        let url = Url::parse(&format!("ws://{}", addr)).unwrap();
        let connector = WsConnector::new(url, None).unwrap();
        let mut transport = connector.connect().await.unwrap();

        transport.outbound.send("hello".to_string()).await.unwrap();
        assert_eq!(transport.inbound.recv().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_inbound_ends_when_server_closes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            ws.close(None).await.unwrap();
        });

        let url = Url::parse(&format!("ws://{}", addr)).unwrap();
        let mut transport = WsConnector::new(url, None).unwrap().connect().await.unwrap();
        assert!(transport.inbound.recv().await.is_none());
    }
}
