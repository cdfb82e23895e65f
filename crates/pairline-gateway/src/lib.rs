//! pairline gateway library entry.
//!
//! Two-peer signaling relay: the relay core (registry + engine), the liveness
//! monitor, the WebSocket transport adapter, and the HTTP surface around them.
//! Consumed by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod liveness;
pub mod ops;
pub mod proxy;
pub mod relay;
pub mod router;
pub mod transport;
