//! Room-based relay core.
//!
//! - `connection`: per-channel handle (egress queue, open/liveness flags)
//! - `registry`: room membership bookkeeping, capacity two
//! - `engine`: signal routing and the single idempotent disconnect path

mod connection;
mod engine;
mod registry;

pub use connection::{ConnId, Connection, Egress};
pub use engine::RelayEngine;
pub use registry::{Admission, JoinOutcome, Registry, Vacated, ROOM_CAPACITY};
