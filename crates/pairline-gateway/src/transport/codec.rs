//! Frame codec between axum WebSocket messages and the relay.
//!
//! - Text frames (and binary frames holding UTF-8) => raw JSON text
//! - Pong => liveness acknowledgement
//! - Close => end of session
//! - Oversized frames are rejected here, before any JSON parsing

use axum::extract::ws::Message;

use crate::relay::Egress;

#[derive(Debug, PartialEq, Eq)]
pub enum Inbound {
    Text(String),
    Pong,
    Close,
    /// Client ping; the websocket layer already answers it.
    Ping,
    Oversized(usize),
    NotUtf8,
}

fn frame_len(msg: &Message) -> usize {
    match msg {
        Message::Text(s) => s.len(),
        Message::Binary(b) => b.len(),
        Message::Ping(v) => v.len(),
        Message::Pong(v) => v.len(),
        Message::Close(_) => 0,
    }
}

pub fn decode(msg: Message, max_frame_bytes: usize) -> Inbound {
    let bytes_len = frame_len(&msg);
    match msg {
        Message::Text(_) | Message::Binary(_) if bytes_len > max_frame_bytes => {
            Inbound::Oversized(bytes_len)
        }
        Message::Text(s) => Inbound::Text(s),
        Message::Binary(b) => match String::from_utf8(b) {
            Ok(s) => Inbound::Text(s),
            Err(_) => Inbound::NotUtf8,
        },
        Message::Ping(_) => Inbound::Ping,
        Message::Pong(_) => Inbound::Pong,
        Message::Close(_) => Inbound::Close,
    }
}

pub fn encode(out: Egress) -> Message {
    match out {
        Egress::Text(s) => Message::Text(s.to_string()),
        Egress::Ping => Message::Ping(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_utf8_is_treated_as_text() {
        let m = Message::Binary(br#"{"type":"hang-up"}"#.to_vec());
        assert_eq!(decode(m, 1024), Inbound::Text(r#"{"type":"hang-up"}"#.into()));
    }

    #[test]
    fn oversized_text_is_rejected() {
        let m = Message::Text("x".repeat(300));
        assert_eq!(decode(m, 256), Inbound::Oversized(300));
    }

    #[test]
    fn invalid_utf8_binary() {
        assert_eq!(decode(Message::Binary(vec![0xff, 0xfe]), 1024), Inbound::NotUtf8);
    }

    #[test]
    fn control_frames() {
        assert_eq!(decode(Message::Pong(vec![]), 16), Inbound::Pong);
        assert_eq!(decode(Message::Close(None), 16), Inbound::Close);
        assert_eq!(encode(Egress::Ping), Message::Ping(Vec::new()));
    }
}
