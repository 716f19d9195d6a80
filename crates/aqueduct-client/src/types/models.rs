/*
[INPUT]:  Relayer entity schema (orders, taker events, notifications, tickers)
[OUTPUT]: Typed Rust structs with serialization support
[POS]:    Data layer - entities carried inside socket event payloads
[UPDATE]: When entity schema changes or new fields added
*/

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An order recorded on the relayer order book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: u64,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_closed: Option<DateTime<Utc>>,
    pub network_id: u64,
    pub exchange_contract_address: String,
    pub expiration_unix_timestamp_sec: u64,
    pub fee_recipient: String,
    pub maker: String,
    // Token amounts are base-unit integers and can exceed Decimal precision
    pub maker_fee: String,
    pub maker_token_address: String,
    pub maker_token_amount: String,
    pub salt: String,
    pub serialized_ec_signature: String,
    pub taker: String,
    pub taker_fee: String,
    pub taker_token_address: String,
    pub taker_token_amount: String,
    pub remaining_taker_token_amount: String,
    pub order_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<u64>,
    pub state: u32,
    pub source: String,
    #[serde(default)]
    pub taker_events: Vec<TakerEvent>,
}

/// A fill attempt by a taker against an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TakerEvent {
    pub id: u64,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
    pub order_id: u64,
    pub taker_amount: String,
    pub taker: String,
    pub tx_hash: String,
    pub state: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<Box<Order>>,
}

/// A notification meant for consumption by clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: u64,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
    /// Hex address of the account the notification belongs to
    pub account: String,
    pub label: String,
    pub expiration_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTicker {
    pub id: String,
    pub name: String,
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub usd_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub btc_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub price_eth: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub hourly_percentage_change: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub daily_percentage_change: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub weekly_percentage_change: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub daily_volume: Decimal,
}
