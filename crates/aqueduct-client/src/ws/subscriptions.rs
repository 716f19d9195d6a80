/*
[INPUT]:  Channel subscriptions, inbound socket frames, transport open/close events
[OUTPUT]: Per-channel callback delivery and resubscribe frames after reconnects
[POS]:    WebSocket layer - multiplexes logical channels over one transport
[UPDATE]: When changing record lifecycle, dispatch isolation or resubscribe rules
*/

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{AqueductError, Result};
use crate::ws::events::{Channel, SocketEvent};
use crate::ws::message::{ControlFrame, EventEnvelope};
use crate::ws::transport::Transport;

const MALFORMED_LOG_LIMIT: usize = 3;
const RAW_LOG_MAX_BYTES: usize = 256;

static MALFORMED_LOG_COUNT: AtomicUsize = AtomicUsize::new(0);

type Callback = Arc<dyn Fn(&Value) -> std::result::Result<(), String> + Send + Sync>;

/// Identifies one callback registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Outcome of handling one inbound frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Frame was not a `{channel, data}` envelope and was dropped
    Malformed,
    /// No callbacks registered for the frame's channel
    NoSubscribers,
    /// Callbacks that returned normally and callbacks that panicked or failed to decode
    Delivered { delivered: usize, failed: usize },
}

struct Registration {
    id: SubscriptionId,
    callback: Callback,
}

struct Record {
    callbacks: Vec<Registration>,
    resubscribe: ControlFrame,
    sub_active: bool,
}

#[derive(Default)]
struct State {
    connected: bool,
    records: BTreeMap<Channel, Record>,
}

struct Inner {
    state: Mutex<State>,
    transport: Option<Arc<dyn Transport>>,
}

/// Maps channels to callbacks and keeps them subscribed across reconnects.
///
/// A record exists for a channel only while at least one callback is
/// registered on it. Control frames are sent while the lock is held, so
/// frames for a channel reach the transport in the order the record changed.
/// Callbacks run outside the lock and may subscribe and unsubscribe freely.
#[derive(Clone)]
pub struct SubscriptionManager {
    inner: Arc<Inner>,
}

impl SubscriptionManager {
    /// Manager without a transport; subscribing fails until one is supplied
    pub fn new() -> Self {
        Self::build(None)
    }

    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self::build(Some(transport))
    }

    fn build(transport: Option<Arc<dyn Transport>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                transport,
            }),
        }
    }

    pub fn has_transport(&self) -> bool {
        self.inner.transport.is_some()
    }

    pub fn is_connected(&self) -> bool {
        self.lock().connected
    }

    /// Number of channels with at least one callback
    pub fn channel_count(&self) -> usize {
        self.lock().records.len()
    }

    pub fn channels(&self) -> Vec<Channel> {
        self.lock().records.keys().cloned().collect()
    }

    pub fn callback_count(&self, channel: &str) -> usize {
        self.lock()
            .records
            .get(channel)
            .map_or(0, |record| record.callbacks.len())
    }

    /// Whether a subscribe frame for the channel went out on the current connection
    pub fn is_active(&self, channel: &str) -> bool {
        self.lock()
            .records
            .get(channel)
            .is_some_and(|record| record.sub_active)
    }

    /// Register a raw callback for a resolved channel name
    pub fn subscribe<F>(&self, channel: impl Into<Channel>, callback: F) -> Result<SubscriptionHandle>
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.register(
            channel.into(),
            Arc::new(move |data: &Value| -> std::result::Result<(), String> {
                callback(data);
                Ok(())
            }),
        )
    }

    /// Register a typed callback; payloads that fail to decode count as callback failures
    pub fn subscribe_event<E, F>(&self, params: &E::Params, callback: F) -> Result<SubscriptionHandle>
    where
        E: SocketEvent + 'static,
        F: Fn(E::Data) + Send + Sync + 'static,
    {
        self.register(
            E::channel(params),
            Arc::new(move |data: &Value| -> std::result::Result<(), String> {
                let decoded = E::Data::deserialize(data)
                    .map_err(|err| format!("{} payload decode failed: {err}", E::KEY))?;
                callback(decoded);
                Ok(())
            }),
        )
    }

    fn register(&self, channel: Channel, callback: Callback) -> Result<SubscriptionHandle> {
        let transport = self.transport()?;
        let id = SubscriptionId::new();

        {
            let mut state = self.lock();
            let connected = state.connected;
            let record = state
                .records
                .entry(channel.clone())
                .or_insert_with(|| Record {
                    callbacks: Vec::new(),
                    resubscribe: ControlFrame::Subscribe(channel.clone()),
                    sub_active: false,
                });
            record.callbacks.push(Registration { id, callback });

            if connected && !record.sub_active {
                match transport.send(record.resubscribe.encode()) {
                    Ok(()) => record.sub_active = true,
                    Err(err) => {
                        warn!(%channel, error = %err, "subscribe send failed; deferring to next open");
                    }
                }
            } else {
                debug!(%channel, "subscribe frame deferred or already active");
            }
        }

        Ok(SubscriptionHandle {
            id,
            channel,
            manager: Arc::downgrade(&self.inner),
        })
    }

    /// Remove exactly the handle's callback.
    ///
    /// The channel's record is pruned with its last callback, and only then
    /// is an unsubscribe frame sent, so other callbacks keep receiving.
    pub fn unsubscribe(&self, handle: &SubscriptionHandle) -> Result<()> {
        let transport = self.transport()?;

        let mut state = self.lock();
        let connected = state.connected;
        let Some(record) = state.records.get_mut(&handle.channel) else {
            return Ok(());
        };

        let before = record.callbacks.len();
        record.callbacks.retain(|registration| registration.id != handle.id);
        if record.callbacks.len() == before {
            return Ok(());
        }

        if record.callbacks.is_empty() {
            let was_active = record.sub_active;
            state.records.remove(&handle.channel);
            if connected && was_active {
                transport.send(ControlFrame::Unsubscribe(handle.channel.clone()).encode())?;
            }
        }
        drop(state);

        debug!(channel = %handle.channel, id = %handle.id, "callback unsubscribed");
        Ok(())
    }

    /// Deliver one inbound frame to its channel's callbacks, in registration order
    pub fn dispatch(&self, raw: &str) -> Dispatch {
        let envelope = match EventEnvelope::parse(raw) {
            Ok(envelope) => envelope,
            Err(err) => {
                log_malformed_once(&err, raw);
                return Dispatch::Malformed;
            }
        };

        let callbacks: Vec<Callback> = {
            let state = self.lock();
            match state.records.get(&envelope.channel) {
                Some(record) => record
                    .callbacks
                    .iter()
                    .map(|registration| registration.callback.clone())
                    .collect(),
                None => {
                    debug!(channel = %envelope.channel, "event for channel without subscribers");
                    return Dispatch::NoSubscribers;
                }
            }
        };

        let mut failed = 0;
        for callback in &callbacks {
            let outcome = catch_unwind(AssertUnwindSafe(|| callback(&envelope.data)))
                .unwrap_or_else(|panic| Err(panic_message(panic.as_ref())));
            if let Err(reason) = outcome {
                failed += 1;
                let err = AqueductError::CallbackFailure {
                    channel: envelope.channel.to_string(),
                    reason,
                };
                error!(error = %err, "subscription callback failed");
            }
        }

        Dispatch::Delivered {
            delivered: callbacks.len() - failed,
            failed,
        }
    }

    /// Transport opened: resend one subscribe frame per inactive channel.
    ///
    /// Returns how many channels were resubscribed.
    pub fn on_transport_open(&self) -> usize {
        let mut state = self.lock();
        state.connected = true;

        let Some(transport) = self.inner.transport.as_ref() else {
            return 0;
        };

        let mut sent = 0;
        for (channel, record) in state.records.iter_mut().filter(|(_, record)| !record.sub_active) {
            match transport.send(record.resubscribe.encode()) {
                Ok(()) => {
                    record.sub_active = true;
                    sent += 1;
                }
                Err(err) => warn!(%channel, error = %err, "resubscribe send failed"),
            }
        }

        if sent > 0 {
            info!(channels = sent, "resubscribed after transport open");
        }
        sent
    }

    /// Transport closed: every channel must be resubscribed on the next open
    pub fn on_transport_close(&self) {
        let mut state = self.lock();
        state.connected = false;
        for record in state.records.values_mut() {
            record.sub_active = false;
        }
        debug!(channels = state.records.len(), "transport closed; subscriptions parked");
    }

    fn transport(&self) -> Result<&Arc<dyn Transport>> {
        self.inner
            .transport
            .as_ref()
            .ok_or(AqueductError::TransportNotInitialized)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SubscriptionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("SubscriptionManager")
            .field("connected", &state.connected)
            .field("channels", &state.records.len())
            .field("has_transport", &self.inner.transport.is_some())
            .finish()
    }
}

/// Registration returned by subscribe; does not unsubscribe on drop
#[derive(Debug)]
pub struct SubscriptionHandle {
    id: SubscriptionId,
    channel: Channel,
    manager: Weak<Inner>,
}

impl SubscriptionHandle {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// No-op once the owning manager is gone
    pub fn unsubscribe(&self) -> Result<()> {
        match self.manager.upgrade() {
            Some(inner) => SubscriptionManager { inner }.unsubscribe(self),
            None => Ok(()),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "callback panicked".to_string()
    }
}

fn log_malformed_once(err: &AqueductError, raw: &str) {
    let count = MALFORMED_LOG_COUNT.fetch_add(1, Ordering::Relaxed);
    if count < MALFORMED_LOG_LIMIT {
        let preview = truncate_for_log(raw, RAW_LOG_MAX_BYTES);
        debug!(
            sample_index = count + 1,
            sample_limit = MALFORMED_LOG_LIMIT,
            error = %err,
            bytes = raw.len(),
            message = %preview,
            "ws frame dropped"
        );
    }
}

fn truncate_for_log(value: &str, max_len: usize) -> String {
    if value.len() <= max_len {
        return value.to_string();
    }
    let mut end = max_len;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &value[..end])
}
