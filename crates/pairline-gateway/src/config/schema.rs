use std::net::SocketAddr;

use serde::Deserialize;
use pairline_core::error::{PairlineError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub proxy: ProxySection,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            version: 1,
            gateway: GatewaySection::default(),
            proxy: ProxySection::default(),
        }
    }
}

impl RelayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(PairlineError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        self.gateway.validate()?;   // Verify the scope of value
        self.proxy.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Liveness probe period. A peer that misses one full period is evicted.
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,

    /// Per-connection egress queue depth.
    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,

    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            outbound_queue: default_outbound_queue(),
            max_frame_bytes: default_max_frame_bytes(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        if !(1000..=600000).contains(&self.heartbeat_interval_ms) {
            return Err(PairlineError::Config(
                "gateway.heartbeat_interval_ms must be between 1000 and 600000".into(),
            ));
        }
        if !(1..=65536).contains(&self.outbound_queue) {
            return Err(PairlineError::Config(
                "gateway.outbound_queue must be between 1 and 65536".into(),
            ));
        }
        if self.max_frame_bytes < 256 {
            return Err(PairlineError::Config(
                "gateway.max_frame_bytes must be at least 256".into(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            PairlineError::Config(format!("gateway.listen must be a valid SocketAddr: {e}"))
        })
    }
}

fn default_listen() -> String {
    "0.0.0.0:3000".into()
}
fn default_heartbeat_interval_ms() -> u64 {
    30000
}
fn default_outbound_queue() -> usize {
    256
}
fn default_max_frame_bytes() -> usize {
    64 * 1024
}

/// Optional third-party endpoints. Each one is mounted only when present.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProxySection {
    #[serde(default)]
    pub token: Option<UpstreamConfig>,
    #[serde(default)]
    pub translate: Option<UpstreamConfig>,
}

impl ProxySection {
    pub fn validate(&self) -> Result<()> {
        for (name, up) in [("token", &self.token), ("translate", &self.translate)] {
            if let Some(up) = up {
                up.validate(name)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamConfig {
    pub url: String,

    /// Name of the environment variable holding a bearer key.
    #[serde(default)]
    pub api_key_env: Option<String>,

    #[serde(default = "default_upstream_timeout_ms")]
    pub timeout_ms: u64,
}

impl UpstreamConfig {
    fn validate(&self, name: &str) -> Result<()> {
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(PairlineError::Config(format!(
                "proxy.{name}.url must be an http(s) URL"
            )));
        }
        if !(100..=120000).contains(&self.timeout_ms) {
            return Err(PairlineError::Config(format!(
                "proxy.{name}.timeout_ms must be between 100 and 120000"
            )));
        }
        Ok(())
    }
}

fn default_upstream_timeout_ms() -> u64 {
    10000
}
