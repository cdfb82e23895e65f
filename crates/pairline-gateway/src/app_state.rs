//! Shared application state for the relay gateway.
//!
//! Wires the relay engine, the transport's client table and the optional
//! proxy upstreams. Startup errors are returned, never panicked.

use std::sync::Arc;
use std::time::Duration;

use pairline_core::error::Result;

use crate::config::RelayConfig;
use crate::liveness::LivenessMonitor;
use crate::proxy::ProxyRoutes;
use crate::relay::RelayEngine;
use crate::transport::Clients;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    engine: Arc<RelayEngine>,
    clients: Arc<Clients>,
}

struct AppStateInner {
    cfg: RelayConfig,
    proxy: ProxyRoutes,
}

impl AppState {
    /// Build application state, resolving proxy upstreams from config.
    pub fn new(cfg: RelayConfig) -> Result<Self> {
        let proxy = ProxyRoutes::from_config(&cfg.proxy)?;
        Ok(Self::with_proxy(cfg, proxy))
    }

    /// Build with explicit upstreams (tests, embedding).
    pub fn with_proxy(cfg: RelayConfig, proxy: ProxyRoutes) -> Self {
        Self {
            inner: Arc::new(AppStateInner { cfg, proxy }),
            engine: Arc::new(RelayEngine::new()),
            clients: Arc::new(Clients::new()),
        }
    }

    pub fn cfg(&self) -> &RelayConfig {
        &self.inner.cfg
    }

    pub fn proxy(&self) -> &ProxyRoutes {
        &self.inner.proxy
    }

    pub fn engine(&self) -> Arc<RelayEngine> {
        Arc::clone(&self.engine)
    }

    pub fn clients(&self) -> Arc<Clients> {
        Arc::clone(&self.clients)
    }

    pub fn liveness_monitor(&self) -> LivenessMonitor {
        LivenessMonitor::new(
            self.engine(),
            self.clients(),
            Duration::from_millis(self.cfg().gateway.heartbeat_interval_ms),
        )
    }
}
