/*
[INPUT]:  YAML watch file and command line overrides
[OUTPUT]: Validated watch configuration and client configuration
[POS]:    Configuration layer - what to subscribe to and where
[UPDATE]: When adding new watch targets or configuration options
*/

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use aqueduct_client::{
    AccountNotification, AccountOrderChange, AccountParams, AccountTakerEvent, Channel,
    ClientConfig, PairOrderChange, PairParams, PairTakerEvent, SocketEvent, TickerSubscription,
};

/// Top-level configuration for the watcher
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct WatchConfig {
    /// Relayer host, e.g. "api.ercdex.com"
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub api_key_id: Option<String>,
    /// Full socket URL, overrides the one derived from host
    #[serde(default)]
    pub socket_url: Option<String>,
    /// Channels to watch
    #[serde(default)]
    pub subscriptions: Vec<WatchTarget>,
}

/// One channel to watch
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum WatchTarget {
    AccountOrderChange {
        account: String,
    },
    AccountNotification {
        account: String,
    },
    AccountTakerEvent {
        account: String,
    },
    PairOrderChange {
        maker_token_address: String,
        taker_token_address: String,
    },
    PairTakerEvent {
        maker_token_address: String,
        taker_token_address: String,
    },
    Ticker,
}

impl WatchTarget {
    /// Every account-scoped channel for one address
    pub fn for_account(account: &str) -> Vec<WatchTarget> {
        vec![
            WatchTarget::AccountOrderChange {
                account: account.to_string(),
            },
            WatchTarget::AccountNotification {
                account: account.to_string(),
            },
            WatchTarget::AccountTakerEvent {
                account: account.to_string(),
            },
        ]
    }

    /// Every pair-scoped channel for one maker/taker pair
    pub fn for_pair(maker_token_address: &str, taker_token_address: &str) -> Vec<WatchTarget> {
        vec![
            WatchTarget::PairOrderChange {
                maker_token_address: maker_token_address.to_string(),
                taker_token_address: taker_token_address.to_string(),
            },
            WatchTarget::PairTakerEvent {
                maker_token_address: maker_token_address.to_string(),
                taker_token_address: taker_token_address.to_string(),
            },
        ]
    }

    pub fn channel(&self) -> Channel {
        match self {
            WatchTarget::AccountOrderChange { account } => {
                AccountOrderChange::channel(&AccountParams::new(account.as_str()))
            }
            WatchTarget::AccountNotification { account } => {
                AccountNotification::channel(&AccountParams::new(account.as_str()))
            }
            WatchTarget::AccountTakerEvent { account } => {
                AccountTakerEvent::channel(&AccountParams::new(account.as_str()))
            }
            WatchTarget::PairOrderChange {
                maker_token_address,
                taker_token_address,
            } => PairOrderChange::channel(&PairParams::new(
                maker_token_address.as_str(),
                taker_token_address.as_str(),
            )),
            WatchTarget::PairTakerEvent {
                maker_token_address,
                taker_token_address,
            } => PairTakerEvent::channel(&PairParams::new(
                maker_token_address.as_str(),
                taker_token_address.as_str(),
            )),
            WatchTarget::Ticker => TickerSubscription::channel(&()),
        }
    }

    fn validate(&self) -> Result<()> {
        let addresses: Vec<&str> = match self {
            WatchTarget::AccountOrderChange { account }
            | WatchTarget::AccountNotification { account }
            | WatchTarget::AccountTakerEvent { account } => vec![account],
            WatchTarget::PairOrderChange {
                maker_token_address,
                taker_token_address,
            }
            | WatchTarget::PairTakerEvent {
                maker_token_address,
                taker_token_address,
            } => vec![maker_token_address, taker_token_address],
            WatchTarget::Ticker => Vec::new(),
        };

        for address in addresses {
            if address.trim().is_empty() || address.contains('/') {
                bail!("invalid address {address:?} in {} subscription", self.channel());
            }
        }
        Ok(())
    }
}

/// Command line values layered over the YAML file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub api_key_id: Option<String>,
    pub socket_url: Option<String>,
    pub accounts: Vec<String>,
    pub pairs: Vec<String>,
    pub ticker: bool,
}

impl WatchConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_context(|| format!("read {path}"))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content).context("parse watch config")?;
        Ok(config)
    }

    /// Apply command line overrides; targets are appended without duplicates
    pub fn merge(mut self, overrides: Overrides) -> Result<Self> {
        if overrides.host.is_some() {
            self.host = overrides.host;
        }
        if overrides.api_key_id.is_some() {
            self.api_key_id = overrides.api_key_id;
        }
        if overrides.socket_url.is_some() {
            self.socket_url = overrides.socket_url;
        }

        let mut targets = Vec::new();
        for account in &overrides.accounts {
            targets.extend(WatchTarget::for_account(account));
        }
        for pair in &overrides.pairs {
            let (maker, taker) = parse_pair(pair)?;
            targets.extend(WatchTarget::for_pair(&maker, &taker));
        }
        if overrides.ticker {
            targets.push(WatchTarget::Ticker);
        }

        for target in targets {
            if !self.subscriptions.contains(&target) {
                self.subscriptions.push(target);
            }
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.subscriptions.is_empty() {
            bail!("nothing to watch: add subscriptions to the config or pass --account/--pair/--ticker");
        }
        for target in &self.subscriptions {
            target.validate()?;
        }
        self.client_config(ClientConfig::default())
            .validate()
            .context("invalid client settings")?;
        Ok(())
    }

    /// Client configuration layered over `base` (usually `ClientConfig::from_env()`)
    pub fn client_config(&self, base: ClientConfig) -> ClientConfig {
        let mut config = base;
        if let Some(host) = &self.host {
            config = config.with_host(host.as_str());
        }
        if let Some(api_key_id) = &self.api_key_id {
            config = config.with_api_key_id(api_key_id.as_str());
        }
        if let Some(socket_url) = &self.socket_url {
            config = config.with_socket_url(socket_url.as_str());
        }
        config
    }
}

/// Parse `MAKER:TAKER` into token addresses
pub fn parse_pair(value: &str) -> Result<(String, String)> {
    match value.split_once(':') {
        Some((maker, taker)) if !maker.trim().is_empty() && !taker.trim().is_empty() => {
            Ok((maker.trim().to_string(), taker.trim().to_string()))
        }
        _ => bail!("pair must look like MAKER_TOKEN:TAKER_TOKEN, got {value:?}"),
    }
}
