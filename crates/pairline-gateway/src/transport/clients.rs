use std::sync::Arc;

use dashmap::DashMap;

use crate::relay::{ConnId, Connection};

/// Every socket currently held by the transport, keyed by connection id.
///
/// This is the set the liveness monitor walks; it is independent of room
/// membership so connections that never joined are still probed.
#[derive(Default)]
pub struct Clients {
    map: DashMap<ConnId, Arc<Connection>>,
}

impl Clients {
    pub fn new() -> Self {
        Self { map: DashMap::new() }
    }

    pub fn insert(&self, conn: Arc<Connection>) {
        self.map.insert(conn.id(), conn);
    }

    pub fn remove(&self, id: ConnId) -> Option<Arc<Connection>> {
        self.map.remove(&id).map(|(_, c)| c)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Clone the handles out so callers never hold a shard lock while acting.
    pub fn snapshot(&self) -> Vec<Arc<Connection>> {
        self.map.iter().map(|e| Arc::clone(e.value())).collect()
    }
}
