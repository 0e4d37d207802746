//! Token-level attribution for linear models.
//!
//! contribution(token) = feature value × coefficient, using the model's own
//! transform so the weighting matches what the coefficients were fit on.
//!
//! Ranking runs over the full vocabulary-length contribution vector and
//! zeros are dropped afterwards. Absent tokens (zero) therefore rank above
//! negative contributions, which only surface when fewer than `top_n`
//! non-negative entries exist. Ties keep vocabulary order.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::model::{LinearExplainer, ProbabilityScorer};

pub const DEFAULT_TOP_N: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub token: String,
    pub weight: f64,
}

/// Top `top_n` token contributions for `text`, or an empty list when the
/// model has no linear explanation.
pub fn top_contributions(
    text: &str,
    model: &dyn ProbabilityScorer,
    top_n: usize,
) -> Vec<Contribution> {
    match model.as_linear() {
        Some(linear) => linear_contributions(text, linear, top_n),
        None => Vec::new(),
    }
}

pub fn linear_contributions(
    text: &str,
    model: &dyn LinearExplainer,
    top_n: usize,
) -> Vec<Contribution> {
    let coef = model.coefficients();
    let names = model.feature_names();
    if top_n == 0 || coef.is_empty() || coef.len() != names.len() {
        return Vec::new();
    }

    let x = model.transform(text);

    let mut positive: Vec<(usize, f64)> = Vec::new();
    let mut negative: Vec<(usize, f64)> = Vec::new();
    for &(idx, value) in &x.entries {
        let Some(&w) = coef.get(idx) else { continue };
        let c = value * w;
        if c > 0.0 {
            positive.push((idx, c));
        } else if c < 0.0 {
            negative.push((idx, c));
        }
    }
    let zeros = coef
        .len()
        .saturating_sub(positive.len() + negative.len());

    positive.sort_by(by_value_desc);
    negative.sort_by(by_value_desc);

    let mut picked: Vec<(usize, f64)> = positive.into_iter().take(top_n).collect();
    // Slots left after the positives are taken by zero entries first.
    let remaining = top_n - picked.len();
    let for_negatives = remaining.saturating_sub(zeros);
    picked.extend(negative.into_iter().take(for_negatives));

    picked
        .into_iter()
        .map(|(idx, weight)| Contribution {
            token: names[idx].clone(),
            weight,
        })
        .collect()
}

fn by_value_desc(a: &(usize, f64), b: &(usize, f64)) -> Ordering {
    b.1.partial_cmp(&a.1)
        .unwrap_or(Ordering::Equal)
        .then(a.0.cmp(&b.0))
}
