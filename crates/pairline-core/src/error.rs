//! Shared error type across pairline crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Unparsable or structurally invalid message.
    Malformed,
    /// `join` without a room id.
    MissingRoomId,
    /// `join` to a room that already holds two peers.
    RoomFull,
    /// A third-party service failed or timed out.
    Upstream,
    /// Invalid configuration.
    Config,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in logs and JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::Malformed => "MALFORMED",
            ClientCode::MissingRoomId => "MISSING_ROOM_ID",
            ClientCode::RoomFull => "ROOM_FULL",
            ClientCode::Upstream => "UPSTREAM",
            ClientCode::Config => "CONFIG",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, PairlineError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum PairlineError {
    #[error("malformed message: {0}")]
    Malformed(String),
    #[error("roomId required")]
    MissingRoomId,
    #[error("room is full")]
    RoomFull,
    #[error("upstream: {0}")]
    Upstream(String),
    #[error("config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl PairlineError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            PairlineError::Malformed(_) => ClientCode::Malformed,
            PairlineError::MissingRoomId => ClientCode::MissingRoomId,
            PairlineError::RoomFull => ClientCode::RoomFull,
            PairlineError::Upstream(_) => ClientCode::Upstream,
            PairlineError::Config(_) => ClientCode::Config,
            PairlineError::Internal(_) => ClientCode::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_errors_render_client_text() {
        assert_eq!(PairlineError::MissingRoomId.to_string(), "roomId required");
        assert_eq!(PairlineError::RoomFull.to_string(), "room is full");
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(PairlineError::RoomFull.client_code().as_str(), "ROOM_FULL");
        assert_eq!(
            PairlineError::Malformed("x".into()).client_code().as_str(),
            "MALFORMED"
        );
    }
}
