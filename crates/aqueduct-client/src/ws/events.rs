/*
[INPUT]:  Typed subscription params per event kind
[OUTPUT]: Resolved channel names and payload types for each socket event
[POS]:    WebSocket layer - typed channel builders
[UPDATE]: When adding event kinds or changing channel paths
*/

use std::borrow::Borrow;
use std::fmt;

use serde::de::DeserializeOwned;

use crate::types::{
    AccountNotificationEventData, AccountParams, OrderChangeEventData, PairParams,
    TakerEventEventData, TickerSubscriptionData,
};

/// Fully resolved channel name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Channel(String);

impl Channel {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Channel {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Channel {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Channel {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A kind of socket event: how its channel is named and what it delivers
pub trait SocketEvent {
    type Params;
    type Data: DeserializeOwned + Send + 'static;

    /// Event key as named by the relayer
    const KEY: &'static str;

    fn channel(params: &Self::Params) -> Channel;
}

fn account_channel(key: &str, params: &AccountParams) -> Channel {
    Channel(format!("{key}/{}", params.account))
}

fn pair_channel(key: &str, params: &PairParams) -> Channel {
    Channel(format!(
        "{key}/{}/{}",
        params.maker_token_address, params.taker_token_address
    ))
}

/// Order changes relating to a token pair
#[derive(Debug, Clone, Copy, Default)]
pub struct PairOrderChange;

impl SocketEvent for PairOrderChange {
    type Params = PairParams;
    type Data = OrderChangeEventData;
    const KEY: &'static str = "pair-order-change";

    fn channel(params: &PairParams) -> Channel {
        pair_channel(Self::KEY, params)
    }
}

/// Order changes related to an account address
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountOrderChange;

impl SocketEvent for AccountOrderChange {
    type Params = AccountParams;
    type Data = OrderChangeEventData;
    const KEY: &'static str = "account-order-change";

    fn channel(params: &AccountParams) -> Channel {
        account_channel(Self::KEY, params)
    }
}

/// Notifications related to an account address
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountNotification;

impl SocketEvent for AccountNotification {
    type Params = AccountParams;
    type Data = AccountNotificationEventData;
    const KEY: &'static str = "account-notification";

    fn channel(params: &AccountParams) -> Channel {
        account_channel(Self::KEY, params)
    }
}

/// Taker events related to a token pair
#[derive(Debug, Clone, Copy, Default)]
pub struct PairTakerEvent;

impl SocketEvent for PairTakerEvent {
    type Params = PairParams;
    type Data = TakerEventEventData;
    const KEY: &'static str = "pair-taker-event";

    fn channel(params: &PairParams) -> Channel {
        pair_channel(Self::KEY, params)
    }
}

/// Taker events related to an address
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountTakerEvent;

impl SocketEvent for AccountTakerEvent {
    type Params = AccountParams;
    type Data = TakerEventEventData;
    const KEY: &'static str = "account-taker-event";

    fn channel(params: &AccountParams) -> Channel {
        account_channel(Self::KEY, params)
    }
}

/// Price ticker updates
#[derive(Debug, Clone, Copy, Default)]
pub struct TickerSubscription;

impl SocketEvent for TickerSubscription {
    type Params = ();
    type Data = TickerSubscriptionData;
    const KEY: &'static str = "ticker";

    fn channel(_params: &()) -> Channel {
        Channel(Self::KEY.to_string())
    }
}
