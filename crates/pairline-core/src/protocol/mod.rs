//! Signaling wire protocol.
//!
//! Every frame is one self-contained JSON record with a `type` discriminator.
//! Inbound records decode into a tagged [`signal::Signal`]; outbound records are
//! built from [`signal::Notice`]. Decoding is panic-free: anything structurally
//! wrong is reported as `PairlineError::Malformed`.

pub mod signal;

pub use signal::{decode, Notice, RelayKind, Signal};
