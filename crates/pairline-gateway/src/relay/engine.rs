use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use pairline_core::error::{PairlineError, Result};
use pairline_core::protocol::signal::{decode, Notice, RelayKind, Signal, DEFAULT_ROLE};

use super::connection::{ConnId, Connection, Egress};
use super::registry::{Admission, Registry, Vacated};

/// RelayEngine: interprets inbound signals and routes them inside a room.
///
/// Every mutation and every send runs under the single registry lock. Sends
/// are non-blocking enqueues, so holding the lock across them is cheap and it
/// guarantees no relay can target a connection whose disconnect was already
/// processed.
pub struct RelayEngine {
    registry: Mutex<Registry>,
    seq: AtomicU64,
}

impl Default for RelayEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayEngine {
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(Registry::new()),
            seq: AtomicU64::new(1),
        }
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        // Registry methods never panic mid-update, so a poisoned guard still
        // holds consistent state.
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new transport channel with no room assignment.
    pub fn open(&self, tx: mpsc::Sender<Egress>) -> Arc<Connection> {
        let id = self.seq.fetch_add(1, Ordering::Relaxed);
        let conn = Arc::new(Connection::new(id, tx));
        self.registry().register(Arc::clone(&conn));
        conn
    }

    /// Entry point for one inbound text frame.
    pub fn handle_text(&self, id: ConnId, raw: &str) {
        let signal = match decode(raw) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(conn = id, error = %e, "dropping malformed frame");
                return;
            }
        };

        match signal {
            Signal::Join { room_id, role } => {
                let role = role.as_deref().unwrap_or(DEFAULT_ROLE);
                // a refusal was already sent back as an `error` notice
                if let Err(e) = self.join(id, room_id.as_deref(), role) {
                    tracing::debug!(conn = id, code = e.client_code().as_str(), "join not applied");
                }
            }
            Signal::Relay(kind) => {
                self.relay(id, kind, raw);
            }
            Signal::HangUp => {
                self.hang_up(id);
            }
            Signal::Unknown(msg_type) => {
                tracing::info!(conn = id, %msg_type, "ignoring unknown message type");
            }
        }
    }

    /// Join `room_id`, leaving any current room first.
    ///
    /// On refusal the sender gets an `error` notice and nobody else hears about
    /// it. Returns the room's new member count.
    pub fn join(&self, id: ConnId, room_id: Option<&str>, role: &str) -> Result<usize> {
        let mut reg = self.registry();

        let outcome = match reg.join(id, room_id.unwrap_or_default(), role) {
            Ok(o) => o,
            Err(e) => {
                tracing::warn!(conn = id, error = %e, "join refused");
                reply(&reg, id, &Notice::error(&e));
                return Err(e);
            }
        };

        if let Some(vacated) = &outcome.vacated {
            announce_departure(id, vacated);
        }

        match outcome.admission {
            Admission::Full => {
                let e = PairlineError::RoomFull;
                tracing::warn!(conn = id, room = room_id.unwrap_or_default(), "join refused: room full");
                reply(&reg, id, &Notice::error(&e));
                Err(e)
            }
            Admission::Joined { participants } => {
                let room_id = room_id.unwrap_or_default();
                tracing::info!(conn = id, room = room_id, role, participants, "peer joined room");

                reply(
                    &reg,
                    id,
                    &Notice::Joined {
                        room_id: room_id.to_string(),
                        participants,
                    },
                );
                let others = reg.members_except(room_id, id);
                broadcast(
                    &others,
                    &Notice::PeerJoined {
                        role: role.to_string(),
                    },
                );
                Ok(participants)
            }
        }
    }

    /// Forward `raw` unchanged to the other member of the sender's room.
    /// Returns the number of peers it was handed to.
    pub fn relay(&self, id: ConnId, kind: RelayKind, raw: &str) -> usize {
        let reg = self.registry();
        let Some(room_id) = reg.room_of(id) else {
            tracing::debug!(conn = id, kind = kind.as_str(), "sender not in a room; dropping");
            return 0;
        };

        let text: Arc<str> = Arc::from(raw);
        deliver(&reg.members_except(room_id, id), &text)
    }

    /// Tell the other member the call is over. Membership is unchanged.
    pub fn hang_up(&self, id: ConnId) -> usize {
        let reg = self.registry();
        let Some(room_id) = reg.room_of(id) else {
            tracing::debug!(conn = id, "hang-up outside a room; dropping");
            return 0;
        };
        tracing::info!(conn = id, room = room_id, "hang-up");
        broadcast(&reg.members_except(room_id, id), &Notice::HangUp)
    }

    /// Leave the current room and notify whoever is left. Safe to call any
    /// number of times; only the call that actually removed the connection
    /// notifies. Returns whether that happened.
    pub fn disconnect(&self, id: ConnId) -> bool {
        let mut reg = self.registry();
        match reg.leave(id) {
            Some(vacated) => {
                announce_departure(id, &vacated);
                true
            }
            None => false,
        }
    }

    /// Transport reported close or error: disconnect and drop the handle.
    pub fn close(&self, id: ConnId) {
        let mut reg = self.registry();
        if let Some(conn) = reg.connection(id) {
            conn.mark_closed();
        }
        if let Some(vacated) = reg.unregister(id) {
            announce_departure(id, &vacated);
        }
    }

    pub fn room_count(&self) -> usize {
        self.registry().room_count()
    }

    /// Read-only view of the registry, for status reporting and tests.
    pub fn inspect<R>(&self, f: impl FnOnce(&Registry) -> R) -> R {
        f(&self.registry())
    }
}

fn announce_departure(id: ConnId, vacated: &Vacated) {
    tracing::info!(conn = id, room = %vacated.room_id, remaining = vacated.remaining.len(), "peer left room");
    if vacated.room_deleted() {
        tracing::info!(room = %vacated.room_id, "room deleted");
    }
    broadcast(&vacated.remaining, &Notice::PeerLeft);
}

fn reply(reg: &Registry, id: ConnId, notice: &Notice) {
    if let Some(conn) = reg.connection(id) {
        broadcast(std::slice::from_ref(&conn), notice);
    }
}

fn broadcast(targets: &[Arc<Connection>], notice: &Notice) -> usize {
    if targets.is_empty() {
        return 0;
    }
    match notice.to_json() {
        Ok(s) => deliver(targets, &Arc::from(s)),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode notice");
            0
        }
    }
}

fn deliver(targets: &[Arc<Connection>], text: &Arc<str>) -> usize {
    targets.iter().filter(|c| c.send_text(text)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connect(engine: &RelayEngine) -> (Arc<Connection>, mpsc::Receiver<Egress>) {
        let (tx, rx) = mpsc::channel(16);
        (engine.open(tx), rx)
    }

    fn texts(rx: &mut mpsc::Receiver<Egress>) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(e) = rx.try_recv() {
            if let Egress::Text(t) = e {
                out.push(t.to_string());
            }
        }
        out
    }

    #[test]
    fn ids_are_unique() {
        let engine = RelayEngine::new();
        let (a, _ra) = connect(&engine);
        let (b, _rb) = connect(&engine);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn default_role_is_unknown() {
        let engine = RelayEngine::new();
        let (a, mut ra) = connect(&engine);
        let (b, _rb) = connect(&engine);
        engine.handle_text(b.id(), r#"{"type":"join","roomId":"r"}"#);
        engine.handle_text(a.id(), r#"{"type":"join","roomId":"r"}"#);
        assert_eq!(engine.inspect(|r| r.role_of(a.id()).map(str::to_owned)), Some("unknown".into()));
        assert_eq!(texts(&mut ra), vec![r#"{"type":"joined","roomId":"r","participants":2}"#]);
    }

    #[test]
    fn join_with_non_object_payload_is_admitted_as_unknown() {
        for frame in [
            r#"{"type":"join","roomId":"r","payload":"caller"}"#,
            r#"{"type":"join","roomId":"r","payload":{"role":5}}"#,
            r#"{"type":"join","roomId":"r","payload":[1]}"#,
        ] {
            let engine = RelayEngine::new();
            let (a, mut ra) = connect(&engine);
            engine.handle_text(a.id(), frame);
            assert_eq!(
                texts(&mut ra),
                vec![r#"{"type":"joined","roomId":"r","participants":1}"#],
                "{frame}"
            );
            assert_eq!(engine.room_count(), 1);
            assert_eq!(engine.inspect(|r| r.role_of(a.id()).map(str::to_owned)), Some("unknown".into()));
        }
    }

    #[test]
    fn malformed_frame_changes_nothing() {
        let engine = RelayEngine::new();
        let (a, mut ra) = connect(&engine);
        engine.handle_text(a.id(), "{not json");
        assert!(texts(&mut ra).is_empty());
        assert_eq!(engine.room_count(), 0);
    }

    #[test]
    fn missing_room_id_replies_error() {
        let engine = RelayEngine::new();
        let (a, mut ra) = connect(&engine);
        engine.handle_text(a.id(), r#"{"type":"join"}"#);
        assert_eq!(texts(&mut ra), vec![r#"{"type":"error","message":"roomId required"}"#]);
        assert_eq!(engine.room_count(), 0);
    }

    #[test]
    fn relay_outside_room_is_dropped() {
        let engine = RelayEngine::new();
        let (a, _ra) = connect(&engine);
        assert_eq!(engine.relay(a.id(), RelayKind::Offer, "{}"), 0);
        assert_eq!(engine.hang_up(a.id()), 0);
    }

    #[test]
    fn close_marks_connection_closed() {
        let engine = RelayEngine::new();
        let (a, _ra) = connect(&engine);
        engine.close(a.id());
        assert!(!a.is_open());
        assert_eq!(engine.inspect(Registry::connection_count), 0);
    }
}
