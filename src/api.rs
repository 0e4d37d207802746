//! HTTP surface for the review UI.
//!
//! - `GET  /health`   liveness
//! - `GET  /model`    model status (loaded, name, explainable)
//! - `POST /predict`  one `JobPost` → verdict + highlighted HTML
//! - `POST /batch`    table or list of records → same rows + `prob_fake`/`pred_fake`
//! - `GET  /metrics`  Prometheus exposition (when enabled)

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::batch::{run_batch_with, BatchResult, Table};
use crate::config::Settings;
use crate::engine::classify_with_lexicon;
use crate::error::DetectError;
use crate::highlight::highlight;
use crate::lexicon::Lexicon;
use crate::metrics::{self as m, Metrics};
use crate::model::{start_hot_reload_thread, DynModel, ModelHandle};
use crate::post::JobPost;
use crate::verdict::Verdict;

#[derive(Clone)]
pub struct AppState {
    pub model: ModelHandle,
    pub lexicon: Arc<Lexicon>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(model: Option<DynModel>, lexicon: Lexicon, settings: Settings) -> Self {
        Self {
            model: ModelHandle::new(model),
            lexicon: Arc::new(lexicon),
            settings: Arc::new(settings),
        }
    }

    /// Load model and lexicon as the settings describe. A missing model is
    /// not fatal: the service starts and answers 503 until one is loaded.
    pub fn from_settings(settings: Settings) -> Self {
        let model = ModelHandle::load_or_empty(&settings.model_path);
        let lexicon = Lexicon::load_or_builtin(settings.lexicon_path.as_deref());
        Self {
            model,
            lexicon: Arc::new(lexicon),
            settings: Arc::new(settings),
        }
    }

    /// Start the polling reload thread for the configured model path.
    pub fn watch_model(&self) {
        start_hot_reload_thread(self.model.clone(), self.settings.model_path.clone());
    }
}

/// Build the router. `/metrics` is attached when enabled in settings.
pub fn router(state: AppState) -> Router {
    let with_metrics = state.settings.metrics;
    let model = state.model.clone();

    let mut app = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/model", get(model_status))
        .route("/predict", post(predict))
        .route("/batch", post(batch))
        .with_state(state);

    if with_metrics {
        match Metrics::init() {
            Ok(metrics) => {
                // Anything written before the recorder existed was dropped.
                m::set_model_loaded(model.is_loaded());
                app = app.merge(metrics.router());
            }
            Err(e) => warn!(error = %e, "metrics recorder unavailable, /metrics disabled"),
        }
    }

    app.layer(CorsLayer::very_permissive())
}

/// Build everything from `Settings::load()`.
pub fn router_from_env() -> anyhow::Result<Router> {
    let settings = Settings::load()?;
    let state = AppState::from_settings(settings);
    state.watch_model();
    Ok(router(state))
}

// ---------- errors ----------

pub enum ApiError {
    Detect(DetectError),
    /// Body that is not JSON or does not fit the request shape.
    Body(JsonRejection),
}

impl From<DetectError> for ApiError {
    fn from(e: DetectError) -> Self {
        Self::Detect(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(r: JsonRejection) -> Self {
        Self::Body(r)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = match self {
            ApiError::Detect(e) => e,
            ApiError::Body(rejection) => {
                let body = ErrorBody {
                    error: "invalid_body",
                    message: rejection.body_text(),
                };
                return (rejection.status(), Json(body)).into_response();
            }
        };
        let status = match &err {
            DetectError::EmptyInput => StatusCode::UNPROCESSABLE_ENTITY,
            DetectError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            DetectError::Schema { .. }
            | DetectError::RaggedRow { .. }
            | DetectError::InvalidThreshold(_) => StatusCode::BAD_REQUEST,
            DetectError::BatchTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            DetectError::InvalidScore(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        m::record_error(&err);
        let body = ErrorBody {
            error: err.kind(),
            message: err.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

// ---------- /model ----------

#[derive(Serialize, Deserialize)]
pub struct ModelStatus {
    pub loaded: bool,
    pub name: Option<String>,
    pub explainable: bool,
}

async fn model_status(State(state): State<AppState>) -> Json<ModelStatus> {
    let current = state.model.current();
    Json(ModelStatus {
        loaded: current.is_some(),
        name: current.as_ref().map(|model| model.name().to_string()),
        explainable: current
            .as_ref()
            .map(|model| model.as_linear().is_some())
            .unwrap_or(false),
    })
}

// ---------- /predict ----------

#[derive(Deserialize)]
pub struct PredictReq {
    #[serde(flatten)]
    pub post: JobPost,
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub top_n: Option<usize>,
}

#[derive(Serialize, Deserialize)]
pub struct PredictResp {
    pub verdict: Verdict,
    pub caption: String,
    pub highlighted_html: String,
}

async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictReq>, JsonRejection>,
) -> Result<Json<PredictResp>, ApiError> {
    let Json(req) = payload?;
    let started = Instant::now();
    let mut opts = state.settings.classify_options();
    if let Some(t) = req.threshold {
        opts = opts.with_threshold(t);
    }
    if let Some(n) = req.top_n {
        opts = opts.with_top_n(n);
    }
    let model = state.model.current();
    let verdict =
        classify_with_lexicon(&req.post, model.as_deref(), state.lexicon.as_ref(), &opts)?;

    let highlighted_html = highlight(&req.post.model_text(), &verdict.matched_keywords);
    m::record_prediction(verdict.label, started.elapsed().as_secs_f64() * 1000.0);

    Ok(Json(PredictResp {
        caption: verdict.label.caption().to_string(),
        verdict,
        highlighted_html,
    }))
}

// ---------- /batch ----------

#[derive(Deserialize)]
#[serde(untagged)]
pub enum BatchBody {
    Table(Table),
    Records(Vec<Map<String, Value>>),
}

#[derive(Deserialize, Default)]
pub struct BatchQuery {
    pub threshold: Option<f64>,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum BatchResp {
    Table {
        #[serde(flatten)]
        result: BatchResult,
        summary: BatchSummary,
    },
    Records {
        records: Vec<Map<String, Value>>,
        summary: BatchSummary,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub rows: usize,
    pub flagged: usize,
}

async fn batch(
    State(state): State<AppState>,
    Query(q): Query<BatchQuery>,
    payload: Result<Json<BatchBody>, JsonRejection>,
) -> Result<Json<BatchResp>, ApiError> {
    let Json(body) = payload?;
    let (table, as_records) = match body {
        BatchBody::Table(t) => (t, false),
        BatchBody::Records(r) => (Table::from_records(&r), true),
    };
    let mut opts = state.settings.batch_options();
    if let Some(t) = q.threshold {
        opts.threshold = t;
    }
    let model = state.model.current();

    // Scoring is CPU-bound; keep it off the async workers.
    let result = tokio::task::spawn_blocking(move || {
        run_batch_with(&table, model.as_deref(), &opts)
    })
    .await
    .map_err(|e| DetectError::ModelUnavailable(format!("batch worker failed: {e}")))??;

    let summary = BatchSummary {
        rows: result.table.len(),
        flagged: result.flagged(),
    };
    m::record_batch(summary.rows, summary.flagged);
    info!(rows = summary.rows, flagged = summary.flagged, "batch request done");

    let resp = if as_records {
        BatchResp::Records {
            records: result.to_records(),
            summary,
        }
    } else {
        BatchResp::Table { result, summary }
    };
    Ok(Json(resp))
}
