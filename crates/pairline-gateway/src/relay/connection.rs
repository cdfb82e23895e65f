use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Notify};

/// Process-unique connection id.
pub type ConnId = u64;

/// Frames queued for a connection's writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Egress {
    /// Serialized JSON, shared when the same frame fans out to several peers.
    Text(Arc<str>),
    /// Liveness probe.
    Ping,
}

/// Non-owning handle to one transport channel.
///
/// The transport task owns the socket; the relay only ever enqueues onto `tx`
/// and flips flags, so nothing here blocks.
pub struct Connection {
    id: ConnId,
    tx: mpsc::Sender<Egress>,
    open: AtomicBool,
    alive: AtomicBool,
    terminate: Notify,
    dropped: AtomicU64,
}

impl Connection {
    pub fn new(id: ConnId, tx: mpsc::Sender<Egress>) -> Self {
        Self {
            id,
            tx,
            open: AtomicBool::new(true),
            alive: AtomicBool::new(true),
            terminate: Notify::new(),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> ConnId {
        self.id
    }

    /// Open until the transport reports close or the monitor terminates it.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire) && !self.tx.is_closed()
    }

    /// Fire-and-forget send. Returns `false` when the target is stale
    /// (closing, closed, or its queue is full).
    pub fn send_text(&self, text: &Arc<str>) -> bool {
        if !self.is_open() {
            tracing::debug!(conn = self.id, "skipping send to closed connection");
            return false;
        }
        match self.tx.try_send(Egress::Text(Arc::clone(text))) {
            Ok(()) => true,
            Err(e) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(conn = self.id, error = %e, "egress queue rejected frame");
                false
            }
        }
    }

    /// Enqueue a ping. The transport calls [`Connection::mark_alive`] on the pong.
    pub fn probe(&self) -> bool {
        self.is_open() && self.tx.try_send(Egress::Ping).is_ok()
    }

    pub fn mark_alive(&self) {
        self.alive.store(true, Ordering::Relaxed);
    }

    /// Read and clear the liveness flag. Returns whether the peer answered
    /// since the previous call.
    pub fn check_alive(&self) -> bool {
        self.alive.swap(false, Ordering::Relaxed)
    }

    /// Stop accepting sends. Called by the transport once the socket is gone.
    pub fn mark_closed(&self) {
        self.open.store(false, Ordering::Release);
    }

    /// Forcibly close: no further sends, and the owning transport task is
    /// woken to drop the socket without a close handshake.
    pub fn terminate(&self) {
        self.mark_closed();
        self.terminate.notify_one();
    }

    /// Resolves once [`Connection::terminate`] has been called.
    pub async fn terminated(&self) {
        self.terminate.notified().await;
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("open", &self.open.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_connection(cap: usize) -> (Connection, mpsc::Receiver<Egress>) {
        let (tx, rx) = mpsc::channel(cap);
        (Connection::new(7, tx), rx)
    }

    #[test]
    fn send_enqueues_shared_text() {
        let (conn, mut rx) = make_connection(4);
        let text: Arc<str> = Arc::from("{\"type\":\"peer-left\"}");
        assert!(conn.send_text(&text));
        assert_eq!(rx.try_recv().unwrap(), Egress::Text(text));
    }

    #[test]
    fn closed_connection_is_skipped() {
        let (conn, mut rx) = make_connection(4);
        conn.mark_closed();
        assert!(!conn.send_text(&Arc::from("x")));
        assert!(rx.try_recv().is_err());
        assert_eq!(conn.dropped_count(), 0);
    }

    #[test]
    fn full_queue_counts_a_drop() {
        let (conn, _rx) = make_connection(1);
        let text: Arc<str> = Arc::from("x");
        assert!(conn.send_text(&text));
        assert!(!conn.send_text(&text));
        assert_eq!(conn.dropped_count(), 1);
    }

    #[test]
    fn dropped_receiver_means_not_open() {
        let (conn, rx) = make_connection(1);
        drop(rx);
        assert!(!conn.is_open());
    }

    #[test]
    fn liveness_flag_cycle() {
        let (conn, mut rx) = make_connection(4);
        assert!(conn.check_alive());
        assert!(!conn.check_alive());
        assert!(conn.probe());
        assert_eq!(rx.try_recv().unwrap(), Egress::Ping);
        conn.mark_alive();
        assert!(conn.check_alive());
    }

    #[tokio::test]
    async fn terminate_wakes_the_owner() {
        let (conn, _rx) = make_connection(1);
        conn.terminate();
        // permit is stored even though nobody was waiting yet
        tokio::time::timeout(std::time::Duration::from_secs(1), conn.terminated())
            .await
            .unwrap();
        assert!(!conn.is_open());
    }
}
