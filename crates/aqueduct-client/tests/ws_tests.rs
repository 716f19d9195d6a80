/*
[INPUT]:  Subscription scenarios against a recording transport
[OUTPUT]: Test results for the subscription manager public API
[POS]:    Integration tests - subscription bookkeeping
[UPDATE]: When subscription manager behavior changes
*/

mod common;

use std::sync::{Arc, Mutex};

use aqueduct_client::{
    AccountNotification, AccountParams, AqueductError, Dispatch, OrderChangeEventType,
    PairOrderChange, PairParams, SubscriptionManager, TickerSubscription,
};
use common::{RecordingTransport, event_frame, order_fixture};
use serde_json::{Value, json};
use tokio_test::assert_ok;

#[test]
fn test_same_channel_callbacks_receive_identical_payload_in_order() {
    let transport = RecordingTransport::new();
    let manager = SubscriptionManager::with_transport(transport.clone());
    let received: Arc<Mutex<Vec<(&'static str, Value)>>> = Arc::new(Mutex::new(Vec::new()));

    let sink = received.clone();
    manager
        .subscribe("account-order-change:0xABC", move |data: &Value| {
            sink.lock().expect("sink").push(("A", data.clone()));
        })
        .expect("subscribe A");
    let sink = received.clone();
    manager
        .subscribe("account-order-change:0xABC", move |data: &Value| {
            sink.lock().expect("sink").push(("B", data.clone()));
        })
        .expect("subscribe B");

    let payload = json!({"order": {"orderHash": "0x1"}, "eventType": "filled"});
    let outcome = manager.dispatch(&event_frame("account-order-change:0xABC", payload.clone()));

    assert_eq!(outcome, Dispatch::Delivered { delivered: 2, failed: 0 });
    let received = received.lock().expect("received");
    assert_eq!(received.len(), 2);
    assert_eq!(received[0], ("A", payload.clone()));
    assert_eq!(received[1], ("B", payload));
}

#[test]
fn test_typed_pair_subscription_lifecycle() {
    let transport = RecordingTransport::new();
    let manager = SubscriptionManager::with_transport(transport.clone());
    manager.on_transport_open();

    let params = PairParams::new("0xmaker", "0xtaker");
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let handle = manager
        .subscribe_event::<PairOrderChange, _>(&params, move |data| {
            sink.lock().expect("sink").push((data.order.order_hash, data.event_type));
        })
        .expect("subscribe");

    manager.dispatch(&event_frame(
        "pair-order-change/0xmaker/0xtaker",
        json!({"order": order_fixture("0xabc"), "eventType": "partially-filled"}),
    ));
    handle.unsubscribe().expect("unsubscribe");
    manager.dispatch(&event_frame(
        "pair-order-change/0xmaker/0xtaker",
        json!({"order": order_fixture("0xabc"), "eventType": "filled"}),
    ));

    assert_eq!(
        *events.lock().expect("events"),
        vec![("0xorder".to_string(), OrderChangeEventType::PartiallyFilled)]
    );
    assert_eq!(
        transport.frames(),
        vec![
            "sub:pair-order-change/0xmaker/0xtaker",
            "unsub:pair-order-change/0xmaker/0xtaker"
        ]
    );
}

#[test]
fn test_independent_managers_do_not_share_state() {
    let first = SubscriptionManager::with_transport(RecordingTransport::new());
    let second = SubscriptionManager::with_transport(RecordingTransport::new());

    first
        .subscribe_event::<TickerSubscription, _>(&(), |_data| {})
        .expect("subscribe");
    first.on_transport_open();

    assert_eq!(first.channel_count(), 1);
    assert_eq!(second.channel_count(), 0);
    assert!(first.is_connected());
    assert!(!second.is_connected());
    assert_eq!(second.dispatch(&event_frame("ticker", json!({"tickers": []}))), Dispatch::NoSubscribers);
}

#[test]
fn test_manager_without_transport_rejects_typed_subscribe() {
    let manager = SubscriptionManager::default();
    let err = manager
        .subscribe_event::<AccountNotification, _>(&AccountParams::new("0xabc"), |_data| {})
        .expect_err("no transport");
    assert!(matches!(err, AqueductError::TransportNotInitialized));
}

#[test]
fn test_churn_leaves_no_records() {
    let transport = RecordingTransport::new();
    let manager = SubscriptionManager::with_transport(transport.clone());
    manager.on_transport_open();

    for index in 0..50 {
        let channel = format!("account-notification/0x{index:x}");
        let handle = assert_ok!(manager.subscribe(channel.as_str(), |_data: &Value| {}));
        assert_ok!(handle.unsubscribe());
    }

    assert_eq!(manager.channel_count(), 0);
    assert_eq!(transport.frames().len(), 100);
}
