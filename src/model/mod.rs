// src/model/mod.rs
//! Model boundary: capability traits the core consumes, plus the bundled
//! TF-IDF + logistic regression implementation.
//!
//! Every model is a `ProbabilityScorer`. Models that can explain themselves
//! linearly also expose a `LinearExplainer` through `as_linear()`; callers
//! check for it instead of assuming it.

pub mod classifier;
pub mod handle;
pub mod pipeline;
pub mod tfidf;

use serde::Serialize;
use std::sync::Arc;

pub use classifier::Classifier;
pub use handle::{start_hot_reload_thread, ModelHandle};
pub use pipeline::{load_model, LinearTextPipeline, ModelArtifact};
pub use tfidf::{Norm, TfidfVectorizer};

/// Class probabilities for one text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Probabilities {
    pub real: f64,
    pub fake: f64,
}

impl Probabilities {
    /// Build from P(fake); P(real) is the complement.
    pub fn from_fake(fake: f64) -> Self {
        Self {
            real: 1.0 - fake,
            fake,
        }
    }
}

/// Sparse feature vector: `(feature index, value)` pairs sorted by index,
/// zero values omitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    pub dim: usize,
    pub entries: Vec<(usize, f64)>,
}

impl SparseVector {
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// Dense copy, mostly for tests and debugging.
    pub fn to_dense(&self) -> Vec<f64> {
        let mut out = vec![0.0; self.dim];
        for &(i, v) in &self.entries {
            out[i] = v;
        }
        out
    }
}

/// Always-present capability: text in, class probabilities out.
pub trait ProbabilityScorer: Send + Sync {
    fn predict_proba(&self, text: &str) -> Probabilities;

    /// Vectorized scoring. `None` means the model has no batch path and
    /// callers should score row by row.
    fn predict_proba_batch(&self, _texts: &[String]) -> Option<Vec<Probabilities>> {
        None
    }

    /// Linear explainability, when the model has it.
    fn as_linear(&self) -> Option<&dyn LinearExplainer> {
        None
    }

    /// Short name for diagnostics.
    fn name(&self) -> &str;
}

/// Optional capability: the feature transform and per-feature coefficients
/// the probability was computed from.
///
/// Invariant: `coefficients().len() == feature_names().len()` and every
/// `transform` result has that dimension.
pub trait LinearExplainer {
    fn transform(&self, text: &str) -> SparseVector;
    fn coefficients(&self) -> &[f64];
    fn feature_names(&self) -> &[String];
}

/// Shared model reference used across the service.
pub type DynModel = Arc<dyn ProbabilityScorer>;
