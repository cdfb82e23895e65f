use std::collections::HashMap;
use std::sync::Arc;

use pairline_core::error::{PairlineError, Result};

use super::connection::{ConnId, Connection};

/// Maximum members per room.
pub const ROOM_CAPACITY: usize = 2;

/// What was left behind when a connection left its room.
#[derive(Debug)]
pub struct Vacated {
    pub room_id: String,
    /// Members still in the room; empty when the room was deleted.
    pub remaining: Vec<Arc<Connection>>,
}

impl Vacated {
    pub fn room_deleted(&self) -> bool {
        self.remaining.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Joined { participants: usize },
    Full,
}

#[derive(Debug)]
pub struct JoinOutcome {
    /// Previous room, if the join had to leave one first.
    pub vacated: Option<Vacated>,
    pub admission: Admission,
}

#[derive(Debug)]
struct Member {
    room_id: String,
    role: String,
}

/// Room bookkeeping:
/// - `conn_id -> Connection` for every registered connection
/// - `room_id -> [conn_id]` (1..=2 entries; empty rooms are removed)
/// - `conn_id -> (room_id, role)` for connections that are in a room
///
/// Pure in-memory state with no interior locking; the owner serializes access.
#[derive(Debug, Default)]
pub struct Registry {
    connections: HashMap<ConnId, Arc<Connection>>,
    rooms: HashMap<String, Vec<ConnId>>,
    membership: HashMap<ConnId, Member>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, conn: Arc<Connection>) {
        self.connections.insert(conn.id(), conn);
    }

    /// Leave any room and forget the connection.
    pub fn unregister(&mut self, id: ConnId) -> Option<Vacated> {
        let vacated = self.leave(id);
        self.connections.remove(&id);
        vacated
    }

    pub fn connection(&self, id: ConnId) -> Option<Arc<Connection>> {
        self.connections.get(&id).cloned()
    }

    /// Place `id` in `room_id`, leaving its current room first.
    ///
    /// A full room is reported through [`Admission::Full`] rather than an error
    /// because the implicit leave has already happened and must be announced.
    pub fn join(&mut self, id: ConnId, room_id: &str, role: &str) -> Result<JoinOutcome> {
        if room_id.is_empty() {
            return Err(PairlineError::MissingRoomId);
        }
        if !self.connections.contains_key(&id) {
            return Err(PairlineError::Internal(format!("connection {id} is not registered")));
        }

        let vacated = self.leave(id);

        let occupied = self.rooms.get(room_id).map(Vec::len).unwrap_or(0);
        if occupied >= ROOM_CAPACITY {
            return Ok(JoinOutcome {
                vacated,
                admission: Admission::Full,
            });
        }

        let members = self.rooms.entry(room_id.to_string()).or_default();
        members.push(id);
        let participants = members.len();
        self.membership.insert(
            id,
            Member {
                room_id: room_id.to_string(),
                role: role.to_string(),
            },
        );

        Ok(JoinOutcome {
            vacated,
            admission: Admission::Joined { participants },
        })
    }

    /// Remove `id` from its room. `None` means it was not in any room.
    pub fn leave(&mut self, id: ConnId) -> Option<Vacated> {
        let member = self.membership.remove(&id)?;

        let remaining_ids = match self.rooms.get_mut(&member.room_id) {
            Some(members) => {
                members.retain(|m| *m != id);
                members.clone()
            }
            None => Vec::new(),
        };
        if remaining_ids.is_empty() {
            self.rooms.remove(&member.room_id);
        }

        let remaining = remaining_ids
            .iter()
            .filter_map(|m| self.connections.get(m).cloned())
            .collect();

        Some(Vacated {
            room_id: member.room_id,
            remaining,
        })
    }

    /// Other members of `room_id`; empty if the room does not exist.
    pub fn members_except(&self, room_id: &str, id: ConnId) -> Vec<Arc<Connection>> {
        self.rooms
            .get(room_id)
            .map(|members| {
                members
                    .iter()
                    .filter(|m| **m != id)
                    .filter_map(|m| self.connections.get(m).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn room_of(&self, id: ConnId) -> Option<&str> {
        self.membership.get(&id).map(|m| m.room_id.as_str())
    }

    pub fn role_of(&self, id: ConnId) -> Option<&str> {
        self.membership.get(&id).map(|m| m.role.as_str())
    }

    pub fn members(&self, room_id: &str) -> Vec<ConnId> {
        self.rooms.get(room_id).cloned().unwrap_or_default()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Both directions of the membership mapping agree, every room holds
    /// 1..=ROOM_CAPACITY registered connections, and nobody is listed twice.
    pub fn is_consistent(&self) -> bool {
        let rooms_ok = self.rooms.iter().all(|(room_id, members)| {
            !members.is_empty()
                && members.len() <= ROOM_CAPACITY
                && members.iter().enumerate().all(|(i, m)| {
                    !members[i + 1..].contains(m)
                        && self.connections.contains_key(m)
                        && self.room_of(*m) == Some(room_id.as_str())
                })
        });
        let members_ok = self.membership.iter().all(|(id, member)| {
            self.rooms
                .get(&member.room_id)
                .is_some_and(|members| members.contains(id))
        });
        rooms_ok && members_ok
    }
}
