//! # Inference Engine
//! Pure, testable logic that maps `(JobPost, model, options)` → `Verdict`.
//! No I/O; the model is passed in by the caller on every call.
//!
//! Order: join fields → empty check → model check → P(fake) → threshold →
//! lexicon hits → token contributions.

use tracing::debug;

use crate::error::{DetectError, DetectResult};
use crate::explain::{top_contributions, DEFAULT_TOP_N};
use crate::lexicon::Lexicon;
use crate::model::ProbabilityScorer;
use crate::post::JobPost;
use crate::verdict::{Label, Verdict};

pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Call-time knobs for `classify`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifyOptions {
    pub threshold: f64,
    pub top_n: usize,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl ClassifyOptions {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }
}

/// Threshold must be finite and within [0, 1].
pub fn check_threshold(threshold: f64) -> DetectResult<f64> {
    if threshold.is_finite() && (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(DetectError::InvalidThreshold(threshold))
    }
}

/// P(fake) for already-joined text, clamped into [0, 1].
pub fn score_text(model: &dyn ProbabilityScorer, text: &str) -> DetectResult<f64> {
    clamp_probability(model.predict_proba(text).fake)
}

pub(crate) fn clamp_probability(p: f64) -> DetectResult<f64> {
    if p.is_finite() {
        Ok(p.clamp(0.0, 1.0))
    } else {
        Err(DetectError::InvalidScore(p))
    }
}

/// Classify with the built-in lexicon.
pub fn classify(
    post: &JobPost,
    model: Option<&dyn ProbabilityScorer>,
    opts: &ClassifyOptions,
) -> DetectResult<Verdict> {
    classify_with_lexicon(post, model, Lexicon::builtin(), opts)
}

pub fn classify_with_lexicon(
    post: &JobPost,
    model: Option<&dyn ProbabilityScorer>,
    lexicon: &Lexicon,
    opts: &ClassifyOptions,
) -> DetectResult<Verdict> {
    let threshold = check_threshold(opts.threshold)?;

    let text = post.model_text();
    if text.is_empty() {
        return Err(DetectError::EmptyInput);
    }
    let model = model.ok_or_else(|| DetectError::ModelUnavailable("no model loaded".into()))?;

    let probability = score_text(model, &text)?;
    let label = Label::from_probability(probability, threshold);
    let matched_keywords = lexicon.find_matches(&text);
    let contributions = top_contributions(&text, model, opts.top_n);

    debug!(
        id = %crate::telemetry::anon_hash(&text),
        model = model.name(),
        probability,
        threshold,
        label = label.as_str(),
        keywords = matched_keywords.len(),
        contributions = contributions.len(),
        "classified post"
    );

    Ok(Verdict {
        probability,
        label,
        matched_keywords,
        contributions,
    })
}
