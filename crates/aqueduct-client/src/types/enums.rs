/*
[INPUT]:  Event schema definitions and serde requirements
[OUTPUT]: Typed Rust enums with serialization support
[POS]:    Data layer - type definitions for socket event payloads
[UPDATE]: When event schema changes or new event types added
*/

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderChangeEventType {
    #[serde(alias = "cancelled")]
    Canceled,
    Created,
    Expired,
    Filled,
    PartiallyFilled,
    PendingCancellation,
    PendingFilled,
    PendingPartiallyFilled,
    Removed,
}

impl OrderChangeEventType {
    /// Order no longer rests on the book after this event
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderChangeEventType::Canceled
                | OrderChangeEventType::Expired
                | OrderChangeEventType::Filled
                | OrderChangeEventType::Removed
        )
    }

    /// Change has not been confirmed on chain yet
    pub fn is_pending(self) -> bool {
        matches!(
            self,
            OrderChangeEventType::PendingCancellation
                | OrderChangeEventType::PendingFilled
                | OrderChangeEventType::PendingPartiallyFilled
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TakerEventType {
    Created,
    Removed,
    Updated,
}
