/*
[INPUT]:  Host, API key id, socket overrides, reconnect/retry timings, environment
[OUTPUT]: Validated client configuration and derived endpoint URLs
[POS]:    Configuration layer - shared by client entry point and socket transport
[UPDATE]: When adding connection options or changing defaults
*/

use std::time::Duration;

use url::Url;

use crate::error::{AqueductError, Result};

/// Default relayer host
pub const DEFAULT_HOST: &str = "api.ercdex.com";

const HOST_ENV: &str = "AQUEDUCT_HOST";
const API_KEY_ID_ENV: &str = "AQUEDUCT_API_KEY_ID";

/// Reconnect backoff for the socket connection loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectConfig {
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl ReconnectConfig {
    /// Delay before the given reconnect attempt (0-based), doubling up to `max_delay`
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.min(16));
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// Bounded retry for frames sent while the socket has no live writer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRetryConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for SendRetryConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(250),
            max_attempts: 20,
        }
    }
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub api_key_id: Option<String>,
    /// Full socket URL, replaces the `wss://{host}` default when set
    pub socket_url: Option<String>,
    pub reconnect: ReconnectConfig,
    pub send_retry: SendRetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            api_key_id: None,
            socket_url: None,
            reconnect: ReconnectConfig::default(),
            send_retry: SendRetryConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `AQUEDUCT_HOST` / `AQUEDUCT_API_KEY_ID`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(host) = lookup(HOST_ENV).filter(|value| !value.trim().is_empty()) {
            config.host = host.trim().to_string();
        }
        config.api_key_id = lookup(API_KEY_ID_ENV).filter(|value| !value.trim().is_empty());
        config
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_api_key_id(mut self, api_key_id: impl Into<String>) -> Self {
        self.api_key_id = Some(api_key_id.into());
        self
    }

    pub fn with_socket_url(mut self, socket_url: impl Into<String>) -> Self {
        self.socket_url = Some(socket_url.into());
        self
    }

    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }

    pub fn with_send_retry(mut self, send_retry: SendRetryConfig) -> Self {
        self.send_retry = send_retry;
        self
    }

    /// Check host, URLs and timings before anything connects
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(AqueductError::Config("host must not be empty".to_string()));
        }
        if self.host.contains("://") {
            return Err(AqueductError::Config(format!(
                "host must not include a scheme: {}",
                self.host
            )));
        }
        if self.send_retry.max_attempts == 0 {
            return Err(AqueductError::Config(
                "send_retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.reconnect.initial_delay > self.reconnect.max_delay {
            return Err(AqueductError::Config(
                "reconnect.initial_delay exceeds reconnect.max_delay".to_string(),
            ));
        }
        self.base_api_url()?;
        self.socket_url()?;
        Ok(())
    }

    /// REST base URL (`https://{host}`)
    pub fn base_api_url(&self) -> Result<Url> {
        Ok(Url::parse(&format!("https://{}", self.host))?)
    }

    /// Socket URL (`wss://{host}` unless overridden)
    pub fn socket_url(&self) -> Result<Url> {
        let url = match &self.socket_url {
            Some(url) => Url::parse(url)?,
            None => Url::parse(&format!("wss://{}", self.host))?,
        };

        match url.scheme() {
            "ws" | "wss" => Ok(url),
            other => Err(AqueductError::Config(format!(
                "socket url must use ws or wss, got {other}"
            ))),
        }
    }
}
