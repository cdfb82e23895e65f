//! Upstream proxy collaborator.
//!
//! Forwards a JSON body to a third-party service (token issuer, translator)
//! and hands back its JSON answer. Holds no room or connection state.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};

use pairline_core::error::{PairlineError, Result};

use crate::config::{ProxySection, UpstreamConfig};

/// A remote service called once per request.
#[async_trait]
pub trait Upstream: Send + Sync {
    fn name(&self) -> &'static str;
    async fn call(&self, body: Value) -> Result<Value>;
}

/// JSON-over-HTTP upstream (POST, optional bearer key).
pub struct HttpUpstream {
    name: &'static str,
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpUpstream {
    pub fn from_config(name: &'static str, cfg: &UpstreamConfig, client: reqwest::Client) -> Result<Self> {
        let api_key = match &cfg.api_key_env {
            Some(var) => Some(std::env::var(var).map_err(|_| {
                PairlineError::Config(format!("proxy.{name}: environment variable {var} is not set"))
            })?),
            None => None,
        };
        Ok(Self {
            name,
            client,
            url: cfg.url.clone(),
            api_key,
            timeout: Duration::from_millis(cfg.timeout_ms),
        })
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn call(&self, body: Value) -> Result<Value> {
        let mut req = self.client.post(&self.url).timeout(self.timeout).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| PairlineError::Upstream(format!("{} request failed: {e}", self.name)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(PairlineError::Upstream(format!("{} returned {status}", self.name)));
        }

        resp.json::<Value>()
            .await
            .map_err(|e| PairlineError::Upstream(format!("{} sent invalid json: {e}", self.name)))
    }
}

/// Configured upstreams; `None` means the route is not mounted.
#[derive(Clone, Default)]
pub struct ProxyRoutes {
    pub token: Option<Arc<dyn Upstream>>,
    pub translate: Option<Arc<dyn Upstream>>,
}

impl ProxyRoutes {
    pub fn from_config(cfg: &ProxySection) -> Result<Self> {
        if cfg.token.is_none() && cfg.translate.is_none() {
            return Ok(Self::default());
        }

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| PairlineError::Config(format!("http client init failed: {e}")))?;

        let build = |name: &'static str, up: &Option<UpstreamConfig>| -> Result<Option<Arc<dyn Upstream>>> {
            match up {
                Some(c) => {
                    let up: Arc<dyn Upstream> =
                        Arc::new(HttpUpstream::from_config(name, c, client.clone())?);
                    Ok(Some(up))
                }
                None => Ok(None),
            }
        };

        Ok(Self {
            token: build("token", &cfg.token)?,
            translate: build("translate", &cfg.translate)?,
        })
    }

    /// Routes for every configured upstream, ready to merge into the app.
    pub fn router(&self) -> Router {
        let mut router = Router::new();
        if let Some(up) = &self.token {
            router = router.merge(route("/api/token", Arc::clone(up)));
        }
        if let Some(up) = &self.translate {
            router = router.merge(route("/api/translate", Arc::clone(up)));
        }
        router
    }
}

fn route(path: &str, up: Arc<dyn Upstream>) -> Router {
    Router::new().route(path, post(forward)).with_state(up)
}

async fn forward(State(up): State<Arc<dyn Upstream>>, Json(body): Json<Value>) -> Response {
    match up.call(body).await {
        Ok(v) => (StatusCode::OK, Json(v)).into_response(),
        Err(e) => {
            tracing::warn!(upstream = up.name(), error = %e, "proxy call failed");
            (StatusCode::BAD_GATEWAY, Json(json!({ "error": e.to_string() }))).into_response()
        }
    }
}
