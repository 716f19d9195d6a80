/*
[INPUT]:  Event schema definitions and serde requirements
[OUTPUT]: Typed Rust structs/enums with serialization support
[POS]:    Data layer - type definitions for socket event payloads
[UPDATE]: When event schema changes or new types added
*/

pub mod enums;
pub mod events;
pub mod models;

pub use enums::*;
pub use events::*;
pub use models::*;
