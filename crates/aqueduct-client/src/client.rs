/*
[INPUT]:  ClientConfig (host, API key id, socket/reconnect/retry settings)
[OUTPUT]: Initialized client owning its subscription manager and socket
[POS]:    Client entry point - the one required setup call
[UPDATE]: When changing initialization or what the client exposes
*/

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::ws::{AqueductSocket, ConnectionState, SocketTransport, SubscriptionManager};

/// Aqueduct client instance.
///
/// Each instance owns its own channel map and socket, so several clients
/// can coexist in one process.
#[derive(Debug)]
pub struct Aqueduct {
    config: ClientConfig,
    events: SubscriptionManager,
    socket: Option<AqueductSocket>,
}

impl Aqueduct {
    /// Initialize the client. Required before subscribing.
    ///
    /// Without a tokio runtime no socket is started and every subscribe
    /// fails with `TransportNotInitialized`.
    pub fn initialize(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        if tokio::runtime::Handle::try_current().is_err() {
            warn!("no tokio runtime found; subscriptions will not be configured");
            return Ok(Self {
                config,
                events: SubscriptionManager::new(),
                socket: None,
            });
        }

        let socket_url = config.socket_url()?;
        let transport = SocketTransport::new(config.send_retry.clone());
        let events = SubscriptionManager::with_transport(Arc::new(transport.clone()));
        let socket = AqueductSocket::spawn(
            socket_url.clone(),
            config.reconnect.clone(),
            transport,
            events.clone(),
        )?;

        info!(
            host = %config.host,
            socket_url = %socket_url,
            api_key = config.api_key_id.is_some(),
            "aqueduct client initialized"
        );

        Ok(Self {
            config,
            events,
            socket: Some(socket),
        })
    }

    /// Initialize from `AQUEDUCT_HOST` / `AQUEDUCT_API_KEY_ID`
    pub fn from_env() -> Result<Self> {
        Self::initialize(ClientConfig::from_env())
    }

    /// Socket event subscriptions
    pub fn events(&self) -> &SubscriptionManager {
        &self.events
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api_key_id(&self) -> Option<&str> {
        self.config.api_key_id.as_deref()
    }

    pub fn base_api_url(&self) -> Result<Url> {
        self.config.base_api_url()
    }

    pub fn socket_url(&self) -> Result<Url> {
        self.config.socket_url()
    }

    /// Connection state updates; `None` when no socket was started
    pub fn connection_state(&self) -> Option<watch::Receiver<ConnectionState>> {
        self.socket.as_ref().map(AqueductSocket::connection_state)
    }

    /// Stop the socket; registered callbacks stay in place but receive nothing further
    pub fn shutdown(&self) {
        if let Some(socket) = &self.socket {
            socket.shutdown();
        }
    }

    /// Shut down and wait for the socket loop to exit
    pub async fn close(mut self) {
        if let Some(socket) = self.socket.take() {
            socket.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AqueductError;

    #[test]
    fn test_initialize_without_runtime() {
        let client = Aqueduct::initialize(ClientConfig::default().with_api_key_id("key-1"))
            .expect("initialize");

        assert!(!client.events().has_transport());
        assert!(client.connection_state().is_none());
        assert_eq!(client.api_key_id(), Some("key-1"));
        assert_eq!(
            client.base_api_url().expect("base url").as_str(),
            "https://api.ercdex.com/"
        );

        let err = client
            .events()
            .subscribe("ticker", |_data: &serde_json::Value| {})
            .expect_err("no transport");
        assert!(matches!(err, AqueductError::TransportNotInitialized));
    }

    #[test]
    fn test_initialize_rejects_invalid_config() {
        let err = Aqueduct::initialize(ClientConfig::default().with_host(""))
            .expect_err("empty host");
        assert!(matches!(err, AqueductError::Config(_)));
    }

    #[tokio::test]
    async fn test_initialize_with_runtime_starts_socket() {
        let config = ClientConfig::default().with_socket_url("ws://127.0.0.1:9");
        let client = Aqueduct::initialize(config).expect("initialize");

        assert!(client.events().has_transport());
        assert!(client.connection_state().is_some());
        client.close().await;
    }
}
