use crate::application::MetalsService;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub metals_service: Arc<MetalsService>,
    /// Present when a Prometheus recorder was installed at startup
    pub metrics: Option<PrometheusHandle>,
}
