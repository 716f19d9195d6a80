/*
[INPUT]:  Socket event schemas (subscription params and event data)
[OUTPUT]: Typed params for channel builders and decoded event payloads
[POS]:    Data layer - socket event params/data
[UPDATE]: When adding event kinds or changing payload shape
*/

use serde::{Deserialize, Serialize};

use super::enums::{OrderChangeEventType, TakerEventType};
use super::models::{Notification, Order, TakerEvent, TokenTicker};

/// Params for channels scoped to one account address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountParams {
    pub account: String,
}

impl AccountParams {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
        }
    }
}

/// Params for channels scoped to a maker/taker token pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairParams {
    pub maker_token_address: String,
    pub taker_token_address: String,
}

impl PairParams {
    pub fn new(maker_token_address: impl Into<String>, taker_token_address: impl Into<String>) -> Self {
        Self {
            maker_token_address: maker_token_address.into(),
            taker_token_address: taker_token_address.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderChangeEventData {
    pub order: Order,
    pub event_type: OrderChangeEventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountNotificationEventData {
    pub notification: Notification,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TakerEventEventData {
    pub taker_event: TakerEvent,
    pub event_type: TakerEventType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerSubscriptionData {
    pub tickers: Vec<TokenTicker>,
}
