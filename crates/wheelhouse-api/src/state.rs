//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! The state holds no artifact data. Every request rescans the store
//! through [`IndexService`], so the index always reflects the directory
//! as it is at request time.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use wheelhouse_store::{ArtifactStore, DEFAULT_DIST_DIR};

use crate::service::{IndexService, ScanPolicy};

/// Server configuration, resolved once at startup.
#[derive(Clone)]
pub struct AppConfig {
    /// Address to bind the HTTP listener to.
    pub bind: IpAddr,
    /// Port to bind the HTTP listener to.
    pub port: u16,
    /// Root of the artifact store.
    pub artifact_root: PathBuf,
    /// Per-family subdirectory holding wheels.
    pub dist_dir: String,
    /// Treatment of unparseable artifact filenames.
    pub scan_policy: ScanPolicy,
    /// Whether request metrics are recorded and exposed.
    pub metrics_enabled: bool,
}

impl AppConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind", &self.bind)
            .field("port", &self.port)
            .field("artifact_root", &self.artifact_root.display())
            .field("dist_dir", &self.dist_dir)
            .field("scan_policy", &self.scan_policy)
            .field("metrics_enabled", &self.metrics_enabled)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            artifact_root: PathBuf::from("."),
            dist_dir: DEFAULT_DIST_DIR.to_string(),
            scan_policy: ScanPolicy::Strict,
            metrics_enabled: true,
        }
    }
}

/// Shared application state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub service: IndexService,
    /// Prometheus render handle. `None` disables `/_/metrics`.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Build state from configuration without a metrics exporter.
    pub fn new(config: AppConfig) -> Self {
        let store = ArtifactStore::with_dist_dir(&config.artifact_root, config.dist_dir.clone());
        let service = IndexService::new(store, config.scan_policy);
        Self {
            config: Arc::new(config),
            service,
            metrics: None,
        }
    }

    /// Attach the handle that renders `/_/metrics`.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("metrics", &self.metrics.as_ref().map(|_| "prometheus"))
            .finish_non_exhaustive()
    }
}
