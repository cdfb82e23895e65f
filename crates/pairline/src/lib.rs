//! Top-level facade crate for pairline.
//!
//! Re-exports the wire protocol and the relay gateway so users can depend on a single crate.

pub mod core {
    pub use pairline_core::*;
}

pub mod gateway {
    pub use pairline_gateway::*;
}
