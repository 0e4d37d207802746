use axum::{routing::get, Router};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

use crate::error::DetectError;
use crate::verdict::Label;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder once per process; later calls reuse it.
    pub fn init() -> anyhow::Result<Self> {
        let handle = HANDLE
            .get_or_try_init(|| PrometheusBuilder::new().install_recorder())?
            .clone();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

pub fn record_prediction(label: Label, duration_ms: f64) {
    counter!("fakejob_predictions_total", "label" => label.as_str()).increment(1);
    histogram!("fakejob_predict_duration_ms").record(duration_ms);
}

pub fn record_batch(rows: usize, flagged: usize) {
    counter!("fakejob_batch_rows_total").increment(rows as u64);
    counter!("fakejob_batch_flagged_total").increment(flagged as u64);
}

pub fn record_error(err: &DetectError) {
    counter!("fakejob_errors_total", "kind" => err.kind()).increment(1);
}

pub fn set_model_loaded(loaded: bool) {
    gauge!("fakejob_model_loaded").set(if loaded { 1.0 } else { 0.0 });
}
