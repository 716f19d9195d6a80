/*
[INPUT]:  Watch targets and a subscription manager
[OUTPUT]: Live subscriptions that log or print every event
[POS]:    Watch layer - turns configured targets into subscriptions
[UPDATE]: When adding new targets or output formats
*/

use serde_json::{Value, json};
use tracing::{info, warn};

use aqueduct_client::ws::events;
use aqueduct_client::{
    AccountParams, OrderChangeEventData, PairParams, Result, SubscriptionHandle,
    SubscriptionManager, TakerEventEventData,
};

use crate::config::WatchTarget;

/// How received events are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Output {
    /// Structured tracing events with the decoded fields
    #[default]
    Log,
    /// One `{"channel", "data"}` JSON line per event on stdout
    Json,
}

/// Subscribe every target; stops at the first failure
pub fn subscribe_all(
    manager: &SubscriptionManager,
    targets: &[WatchTarget],
    output: Output,
) -> Result<Vec<SubscriptionHandle>> {
    let mut handles = Vec::with_capacity(targets.len());
    for target in targets {
        let handle = match output {
            Output::Log => subscribe_logged(manager, target)?,
            Output::Json => subscribe_json(manager, target)?,
        };
        info!(channel = %handle.channel(), id = %handle.id(), "watching");
        handles.push(handle);
    }
    Ok(handles)
}

/// Unsubscribe everything, logging failures instead of stopping
pub fn unsubscribe_all(handles: Vec<SubscriptionHandle>) -> usize {
    let mut failed = 0;
    for handle in handles {
        if let Err(err) = handle.unsubscribe() {
            failed += 1;
            warn!(channel = %handle.channel(), error = %err, "unsubscribe failed");
        }
    }
    failed
}

fn subscribe_json(manager: &SubscriptionManager, target: &WatchTarget) -> Result<SubscriptionHandle> {
    let channel = target.channel();
    let label = channel.to_string();
    manager.subscribe(channel, move |data: &Value| {
        println!("{}", json!({ "channel": label, "data": data }));
    })
}

fn subscribe_logged(
    manager: &SubscriptionManager,
    target: &WatchTarget,
) -> Result<SubscriptionHandle> {
    match target {
        WatchTarget::AccountOrderChange { account } => manager
            .subscribe_event::<events::AccountOrderChange, _>(
                &AccountParams::new(account.as_str()),
                |data| log_order_change("account", &data),
            ),
        WatchTarget::AccountNotification { account } => manager
            .subscribe_event::<events::AccountNotification, _>(
                &AccountParams::new(account.as_str()),
                |data| {
                    let notification = data.notification;
                    info!(
                        account = %notification.account,
                        label = %notification.label,
                        expires = %notification.expiration_date,
                        "notification"
                    );
                },
            ),
        WatchTarget::AccountTakerEvent { account } => manager
            .subscribe_event::<events::AccountTakerEvent, _>(
                &AccountParams::new(account.as_str()),
                |data| log_taker_event("account", &data),
            ),
        WatchTarget::PairOrderChange {
            maker_token_address,
            taker_token_address,
        } => manager.subscribe_event::<events::PairOrderChange, _>(
            &PairParams::new(maker_token_address.as_str(), taker_token_address.as_str()),
            |data| log_order_change("pair", &data),
        ),
        WatchTarget::PairTakerEvent {
            maker_token_address,
            taker_token_address,
        } => manager.subscribe_event::<events::PairTakerEvent, _>(
            &PairParams::new(maker_token_address.as_str(), taker_token_address.as_str()),
            |data| log_taker_event("pair", &data),
        ),
        WatchTarget::Ticker => {
            manager.subscribe_event::<events::TickerSubscription, _>(&(), |data| {
                for ticker in data.tickers {
                    info!(
                        symbol = %ticker.symbol,
                        usd = %ticker.usd_price,
                        eth = %ticker.price_eth,
                        daily_change = %ticker.daily_percentage_change,
                        "ticker"
                    );
                }
            })
        }
    }
}

fn log_order_change(scope: &str, data: &OrderChangeEventData) {
    let order = &data.order;
    info!(
        scope,
        event = ?data.event_type,
        order_hash = %order.order_hash,
        maker = %order.maker,
        remaining = %order.remaining_taker_token_amount,
        reason = data.reason.as_deref().unwrap_or(""),
        "order change"
    );
}

fn log_taker_event(scope: &str, data: &TakerEventEventData) {
    let taker_event = &data.taker_event;
    info!(
        scope,
        event = ?data.event_type,
        tx_hash = %taker_event.tx_hash,
        taker = %taker_event.taker,
        amount = %taker_event.taker_amount,
        "taker event"
    );
}
