/*
[INPUT]:  Encoded control frames from the subscription manager
[OUTPUT]: Best-effort delivery onto the physical connection
[POS]:    WebSocket layer - transport seam (real socket or test double)
[UPDATE]: When the transport contract changes
*/

use crate::error::Result;

/// Outbound half of a duplex connection.
///
/// `send` is called while the manager holds its lock, so it must not block
/// or call back into the manager. The inbound half drives the manager
/// through `on_transport_open`, `on_transport_close` and `dispatch`.
pub trait Transport: Send + Sync {
    fn send(&self, frame: String) -> Result<()>;
}
