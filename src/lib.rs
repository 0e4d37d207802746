// src/lib.rs
//! Fake job posting detector.
//!
//! Core (pure, synchronous, model passed explicitly):
//! - [`lexicon`]  suspicious-phrase matching
//! - [`explain`]  signed token contributions for linear models
//! - [`engine`]   single-post classification → [`Verdict`]
//! - [`batch`]    table scoring with `prob_fake` / `pred_fake`
//!
//! Around it: the model boundary ([`model`]), settings ([`config`]), HTML
//! highlighting ([`highlight`]), the Axum service ([`api`]) and metrics.

pub mod api;
pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod explain;
pub mod highlight;
pub mod lexicon;
pub mod metrics;
pub mod model;
pub mod post;
pub mod telemetry;
pub mod verdict;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::batch::{run_batch, BatchResult, Table};
pub use crate::engine::{classify, ClassifyOptions};
pub use crate::error::{DetectError, DetectResult};
pub use crate::explain::{top_contributions, Contribution};
pub use crate::lexicon::find_matches;
pub use crate::model::{LinearExplainer, LinearTextPipeline, ProbabilityScorer};
pub use crate::post::JobPost;
pub use crate::verdict::{Label, Verdict};

/// Full in-process app built from settings + env, as the binary runs it.
pub async fn app() -> anyhow::Result<axum::Router> {
    api::router_from_env()
}
