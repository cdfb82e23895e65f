//! pairline core: transport-agnostic signaling protocol and error types.
//!
//! This crate defines the wire-level contract shared by the relay gateway and
//! its tests: the inbound signal decoder, the outbound notices, and the error
//! surface. It carries no transport or runtime dependencies.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Malformed client input always surfaces as `PairlineError::Malformed` so a
//! hostile peer cannot take the relay down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{PairlineError, Result};
