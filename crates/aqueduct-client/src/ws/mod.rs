/*
[INPUT]:  Socket configuration, channel subscriptions, inbound frames
[OUTPUT]: Real-time order, notification, taker and ticker events
[POS]:    WebSocket layer - real-time event streams
[UPDATE]: When adding new channels or changing connection logic
*/

pub mod client;
pub mod events;
pub mod message;
pub mod subscriptions;
pub mod transport;

pub use client::{AqueductSocket, ConnectionState, SocketTransport};
pub use events::{
    AccountNotification, AccountOrderChange, AccountTakerEvent, Channel, PairOrderChange,
    PairTakerEvent, SocketEvent, TickerSubscription,
};
pub use message::{ControlFrame, EventEnvelope};
pub use subscriptions::{Dispatch, SubscriptionHandle, SubscriptionId, SubscriptionManager};
pub use transport::Transport;
