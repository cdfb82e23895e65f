//! Signaling frames (JSON text).
//!
//! Inbound wire shape: `{ type, roomId?, role?, payload? }`. Extra fields are
//! tolerated because relayed frames are forwarded verbatim and peers may carry
//! their own metadata. `payload` stays a `RawValue` so the relay never has to
//! look inside an SDP or candidate blob.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::Value;

use crate::error::{PairlineError, Result};

/// Role recorded when a `join` does not declare one.
pub const DEFAULT_ROLE: &str = "unknown";

/// Message kinds forwarded verbatim to the other room member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayKind {
    Offer,
    Answer,
    IceCandidate,
    Subtitle,
    LanguageUpdate,
}

impl RelayKind {
    pub fn from_type(t: &str) -> Option<Self> {
        match t {
            "offer" => Some(RelayKind::Offer),
            "answer" => Some(RelayKind::Answer),
            "ice-candidate" => Some(RelayKind::IceCandidate),
            "subtitle" => Some(RelayKind::Subtitle),
            "language-update" => Some(RelayKind::LanguageUpdate),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RelayKind::Offer => "offer",
            RelayKind::Answer => "answer",
            RelayKind::IceCandidate => "ice-candidate",
            RelayKind::Subtitle => "subtitle",
            RelayKind::LanguageUpdate => "language-update",
        }
    }
}

/// Decoded inbound signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// Enter a room. An empty `roomId` decodes as `None`.
    Join {
        room_id: Option<String>,
        role: Option<String>,
    },
    /// Forward the original frame to the other member.
    Relay(RelayKind),
    /// End the call for everyone else in the room.
    HangUp,
    /// Well-formed frame with a `type` the relay does not handle.
    Unknown(String),
}

#[derive(Debug, Deserialize)]
struct Envelope<'a> {
    #[serde(rename = "type")]
    msg_type: String,
    #[serde(rename = "roomId", default)]
    room_id: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default, borrow)]
    payload: Option<&'a RawValue>,
}

/// Decode one inbound text frame.
pub fn decode(raw: &str) -> Result<Signal> {
    // serde would also accept a positional array for the struct
    if !raw.trim_start().starts_with('{') {
        return Err(PairlineError::Malformed("expected a JSON object".into()));
    }
    let env: Envelope<'_> = serde_json::from_str(raw)
        .map_err(|e| PairlineError::Malformed(format!("invalid envelope json: {e}")))?;

    if let Some(kind) = RelayKind::from_type(&env.msg_type) {
        return Ok(Signal::Relay(kind));
    }

    match env.msg_type.as_str() {
        "join" => {
            let room_id = env.room_id.filter(|r| !r.is_empty());
            let role = env.role.or_else(|| env.payload.and_then(payload_role));
            Ok(Signal::Join { room_id, role })
        }
        "hang-up" => Ok(Signal::HangUp),
        _ => Ok(Signal::Unknown(env.msg_type)),
    }
}

/// `payload.role` when the payload is an object carrying a string role.
/// Any other payload shape is not an error; the role just stays unset.
fn payload_role(payload: &RawValue) -> Option<String> {
    match serde_json::from_str::<Value>(payload.get()) {
        Ok(Value::Object(mut map)) => match map.remove("role") {
            Some(Value::String(role)) => Some(role),
            _ => None,
        },
        _ => None,
    }
}

/// Outbound notice generated by the relay itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Notice {
    Joined {
        #[serde(rename = "roomId")]
        room_id: String,
        participants: usize,
    },
    PeerJoined {
        role: String,
    },
    PeerLeft,
    HangUp,
    Error {
        message: String,
    },
}

impl Notice {
    pub fn error(err: &PairlineError) -> Self {
        Notice::Error {
            message: err.to_string(),
        }
    }

    /// Serialize once; the result can be fanned out to several peers.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| PairlineError::Internal(format!("json encode failed: {e}")))
    }
}
