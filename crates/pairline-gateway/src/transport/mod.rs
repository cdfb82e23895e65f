//! Transport adapter (WebSocket).
//!
//! Owns the sockets. Feeds lifecycle events into the relay engine and drains
//! each connection's egress queue onto the wire.

pub mod clients;
pub mod codec;
pub mod ws;

pub use clients::Clients;
