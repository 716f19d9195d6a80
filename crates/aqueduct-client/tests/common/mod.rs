/*
[INPUT]:  Test scenarios needing a relayer socket
[OUTPUT]: Local websocket server, recording transport, payload fixtures
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for aqueduct-client tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use aqueduct_client::{Result, Transport};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

pub const WAIT: Duration = Duration::from_secs(5);

/// Transport that records every frame instead of sending it
#[derive(Debug, Default)]
pub struct RecordingTransport {
    frames: Mutex<Vec<String>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn frames(&self) -> Vec<String> {
        self.frames.lock().expect("frames lock").clone()
    }
}

impl Transport for RecordingTransport {
    fn send(&self, frame: String) -> Result<()> {
        self.frames.lock().expect("frames lock").push(frame);
        Ok(())
    }
}

pub enum ServerCommand {
    Text(String),
    Close,
}

/// One accepted client connection on the test server
pub struct ServerConnection {
    pub id: usize,
    frames: mpsc::UnboundedReceiver<String>,
    commands: mpsc::UnboundedSender<ServerCommand>,
}

impl ServerConnection {
    /// Next text frame the client sent on this connection
    pub async fn next_frame(&mut self) -> String {
        tokio::time::timeout(WAIT, self.frames.recv())
            .await
            .expect("timed out waiting for client frame")
            .expect("connection closed before frame arrived")
    }

    pub fn send_text(&self, text: impl Into<String>) {
        self.commands
            .send(ServerCommand::Text(text.into()))
            .expect("server connection gone");
    }

    pub fn close(&self) {
        let _ = self.commands.send(ServerCommand::Close);
    }
}

/// Local websocket server handing out accepted connections
pub struct TestServer {
    pub url: String,
    connections: mpsc::UnboundedReceiver<ServerConnection>,
}

impl TestServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test server");
        let addr = listener.local_addr().expect("test server addr");
        let (conn_tx, connections) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut next_id = 0;
            while let Ok((stream, _)) = listener.accept().await {
                let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
                    continue;
                };
                next_id += 1;

                let (frames_tx, frames) = mpsc::unbounded_channel();
                let (commands, mut command_rx) = mpsc::unbounded_channel();
                let connection = ServerConnection {
                    id: next_id,
                    frames,
                    commands,
                };
                if conn_tx.send(connection).is_err() {
                    break;
                }

                tokio::spawn(async move {
                    let (mut write, mut read) = ws.split();
                    loop {
                        tokio::select! {
                            command = command_rx.recv() => match command {
                                Some(ServerCommand::Text(text)) => {
                                    if write.send(Message::Text(text.into())).await.is_err() {
                                        break;
                                    }
                                }
                                Some(ServerCommand::Close) | None => {
                                    let _ = write.send(Message::Close(None)).await;
                                    break;
                                }
                            },
                            incoming = read.next() => match incoming {
                                Some(Ok(Message::Text(text))) => {
                                    let _ = frames_tx.send(text.to_string());
                                }
                                Some(Ok(_)) => {}
                                Some(Err(_)) | None => break,
                            },
                        }
                    }
                });
            }
        });

        Self {
            url: format!("ws://{addr}"),
            connections,
        }
    }

    pub async fn accept(&mut self) -> ServerConnection {
        tokio::time::timeout(WAIT, self.connections.recv())
            .await
            .expect("timed out waiting for client connection")
            .expect("test server stopped")
    }
}

pub fn event_frame(channel: &str, data: serde_json::Value) -> String {
    serde_json::json!({ "channel": channel, "data": data }).to_string()
}

pub fn order_fixture(maker: &str) -> serde_json::Value {
    serde_json::json!({
        "id": 11,
        "dateCreated": "2018-03-01T12:00:00Z",
        "dateUpdated": "2018-03-01T12:01:00Z",
        "networkId": 1,
        "exchangeContractAddress": "0x12459c951127e0c374ff9105dda097662a027093",
        "expirationUnixTimestampSec": 1520000000,
        "feeRecipient": "0x0000000000000000000000000000000000000000",
        "maker": maker,
        "makerFee": "0",
        "makerTokenAddress": "0xe41d2489571d322189246dafa5ebde1f4699f498",
        "makerTokenAmount": "1000000000000000000",
        "salt": "42",
        "serializedEcSignature": "{}",
        "taker": "0x0000000000000000000000000000000000000000",
        "takerFee": "0",
        "takerTokenAddress": "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2",
        "takerTokenAmount": "2000000000000000",
        "remainingTakerTokenAmount": "0",
        "orderHash": "0xorder",
        "state": 2,
        "source": "api"
    })
}
