//! Relay config loader (strict parsing).
//!
//! Lookup order: `PAIRLINE_CONFIG` (default `pairline.yaml`); a missing file
//! means built-in defaults. `PORT` then overrides the listen port.

pub mod schema;

use std::fs;
use std::io::ErrorKind;

use pairline_core::error::{PairlineError, Result};

pub use schema::{GatewaySection, ProxySection, RelayConfig, UpstreamConfig};

pub const CONFIG_ENV: &str = "PAIRLINE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "pairline.yaml";

pub fn load() -> Result<RelayConfig> {
    let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut cfg = match load_from_file(&path)? {
        Some(cfg) => cfg,
        None => {
            tracing::info!(%path, "no config file, using defaults");
            RelayConfig::default()
        }
    };
    apply_port_override(&mut cfg, std::env::var("PORT").ok().as_deref())?;
    Ok(cfg)
}

/// Parse `path`. `Ok(None)` when the file does not exist.
pub fn load_from_file(path: &str) -> Result<Option<RelayConfig>> {
    match fs::read_to_string(path) {
        Ok(s) => load_from_str(&s).map(Some),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(PairlineError::Config(format!("read {path} failed: {e}"))),
    }
}

pub fn load_from_str(s: &str) -> Result<RelayConfig> {
    let cfg: RelayConfig = serde_yaml::from_str(s)
        .map_err(|e| PairlineError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Replace the port of `gateway.listen`, keeping its host.
pub fn apply_port_override(cfg: &mut RelayConfig, port: Option<&str>) -> Result<()> {
    let Some(port) = port else { return Ok(()) };
    let port: u16 = port
        .trim()
        .parse()
        .map_err(|e| PairlineError::Config(format!("PORT must be a port number: {e}")))?;
    let mut addr = cfg.gateway.listen_addr()?;
    addr.set_port(port);
    cfg.gateway.listen = addr.to_string();
    Ok(())
}
