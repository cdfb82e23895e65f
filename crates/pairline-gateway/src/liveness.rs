//! Liveness monitor.
//!
//! One fixed-period timer for the whole process. Each sweep walks every open
//! socket: a connection whose flag is still cleared from the previous sweep
//! never answered that probe and is evicted; everyone else gets their flag
//! cleared and a fresh probe. The pong handler in the transport sets it back.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::relay::RelayEngine;
use crate::transport::Clients;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub probed: usize,
    pub evicted: usize,
}

pub struct LivenessMonitor {
    engine: Arc<RelayEngine>,
    clients: Arc<Clients>,
    interval: Duration,
}

impl LivenessMonitor {
    pub fn new(engine: Arc<RelayEngine>, clients: Arc<Clients>, interval: Duration) -> Self {
        Self {
            engine,
            clients,
            interval,
        }
    }

    /// One scan over every open connection.
    pub fn sweep(&self) -> SweepReport {
        let mut report = SweepReport::default();

        for conn in self.clients.snapshot() {
            if conn.check_alive() {
                conn.probe();
                report.probed += 1;
                continue;
            }

            tracing::warn!(conn = conn.id(), "no pong since last probe; evicting");
            self.engine.disconnect(conn.id());
            conn.terminate();
            self.clients.remove(conn.id());
            report.evicted += 1;
        }

        report
    }

    /// Run sweeps until the returned handle is aborted.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(self.interval);
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // the first tick completes immediately
            tick.tick().await;

            loop {
                tick.tick().await;
                let report = self.sweep();
                if report.evicted > 0 {
                    tracing::info!(probed = report.probed, evicted = report.evicted, "liveness sweep");
                } else {
                    tracing::debug!(probed = report.probed, "liveness sweep");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    use crate::relay::Egress;

    fn setup() -> (LivenessMonitor, Arc<RelayEngine>, Arc<Clients>) {
        let engine = Arc::new(RelayEngine::new());
        let clients = Arc::new(Clients::new());
        let monitor = LivenessMonitor::new(
            Arc::clone(&engine),
            Arc::clone(&clients),
            Duration::from_secs(30),
        );
        (monitor, engine, clients)
    }

    #[test]
    fn responsive_connection_survives() {
        let (monitor, engine, clients) = setup();
        let (tx, mut rx) = mpsc::channel(8);
        let conn = engine.open(tx);
        clients.insert(Arc::clone(&conn));

        for _ in 0..3 {
            assert_eq!(monitor.sweep(), SweepReport { probed: 1, evicted: 0 });
            assert_eq!(rx.try_recv().unwrap(), Egress::Ping);
            conn.mark_alive();
        }
        assert!(conn.is_open());
    }

    #[test]
    fn silent_connection_is_evicted_on_second_sweep() {
        let (monitor, engine, clients) = setup();
        let (tx, _rx) = mpsc::channel(8);
        let conn = engine.open(tx);
        clients.insert(Arc::clone(&conn));

        assert_eq!(monitor.sweep().probed, 1);
        assert_eq!(monitor.sweep().evicted, 1);
        assert!(!conn.is_open());
        assert!(clients.is_empty());
        assert_eq!(monitor.sweep(), SweepReport::default());
    }
}
