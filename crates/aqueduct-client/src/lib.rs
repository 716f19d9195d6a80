/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public Aqueduct client crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod client;
pub mod config;
pub mod error;
pub mod types;
pub mod ws;

pub use client::Aqueduct;

pub use config::{ClientConfig, ReconnectConfig, SendRetryConfig, DEFAULT_HOST};

pub use error::{AqueductError, Result};

// Re-export all types
pub use types::*;

// Re-export commonly used types from ws
pub use ws::{
    AccountNotification,
    AccountOrderChange,
    AccountTakerEvent,
    AqueductSocket,
    Channel,
    ConnectionState,
    ControlFrame,
    Dispatch,
    EventEnvelope,
    PairOrderChange,
    PairTakerEvent,
    SocketEvent,
    SocketTransport,
    SubscriptionHandle,
    SubscriptionId,
    SubscriptionManager,
    TickerSubscription,
    Transport,
};
