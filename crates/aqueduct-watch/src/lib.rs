/*
[INPUT]:  Public API exports for aqueduct-watch crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod config;
pub mod watch;

pub use config::{Overrides, WatchConfig, WatchTarget};
pub use watch::{Output, subscribe_all, unsubscribe_all};
