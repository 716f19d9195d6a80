/*
[INPUT]:  Raw socket text frames and subscription intents
[OUTPUT]: Parsed event envelopes and encoded control frames
[POS]:    WebSocket layer - wire format (sub:/unsub: control, {channel,data} events)
[UPDATE]: When the relayer protocol version changes
*/

use serde::Deserialize;

use crate::error::{AqueductError, Result};
use crate::ws::events::Channel;

const SUBSCRIBE_PREFIX: &str = "sub:";
const UNSUBSCRIBE_PREFIX: &str = "unsub:";

/// Client to server control frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlFrame {
    Subscribe(Channel),
    Unsubscribe(Channel),
}

impl ControlFrame {
    pub fn encode(&self) -> String {
        match self {
            ControlFrame::Subscribe(channel) => format!("{SUBSCRIBE_PREFIX}{channel}"),
            ControlFrame::Unsubscribe(channel) => format!("{UNSUBSCRIBE_PREFIX}{channel}"),
        }
    }
}

/// Server to client event delivery
#[derive(Debug, Clone, PartialEq)]
pub struct EventEnvelope {
    pub channel: Channel,
    pub data: serde_json::Value,
}

#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    data: serde_json::Value,
}

impl EventEnvelope {
    /// Decode a text frame; missing `data` decodes as null
    pub fn parse(raw: &str) -> Result<Self> {
        let envelope: RawEnvelope = serde_json::from_str(raw)?;
        match envelope.channel {
            Some(channel) if !channel.is_empty() => Ok(Self {
                channel: Channel::new(channel),
                data: envelope.data,
            }),
            _ => Err(AqueductError::MalformedMessage(
                "envelope has no channel".to_string(),
            )),
        }
    }
}
