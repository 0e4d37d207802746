//! Classifier heads that turn a feature vector into P(fake).

use serde::{Deserialize, Serialize};

use super::SparseVector;
use crate::error::{DetectError, DetectResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classifier {
    /// Binary logistic regression; `coef` is aligned with the vocabulary.
    Logistic { coef: Vec<f64>, intercept: f64 },
    /// Fixed prior; has no coefficients, so it cannot be explained.
    Constant { prob_fake: f64 },
}

impl Classifier {
    pub fn validate(&self, vocabulary_size: usize) -> DetectResult<()> {
        match self {
            Classifier::Logistic { coef, intercept } => {
                if coef.len() != vocabulary_size {
                    return Err(DetectError::ModelUnavailable(format!(
                        "classifier has {} coefficients for {} features",
                        coef.len(),
                        vocabulary_size
                    )));
                }
                if !intercept.is_finite() || coef.iter().any(|c| !c.is_finite()) {
                    return Err(DetectError::ModelUnavailable(
                        "classifier coefficients must be finite".into(),
                    ));
                }
                Ok(())
            }
            Classifier::Constant { prob_fake } => {
                if !(0.0..=1.0).contains(prob_fake) {
                    return Err(DetectError::ModelUnavailable(format!(
                        "constant prob_fake must be within [0, 1], got {prob_fake}"
                    )));
                }
                Ok(())
            }
        }
    }

    pub fn coefficients(&self) -> Option<&[f64]> {
        match self {
            Classifier::Logistic { coef, .. } => Some(coef.as_slice()),
            Classifier::Constant { .. } => None,
        }
    }

    /// P(fake) for an already transformed text.
    pub fn prob_fake(&self, x: &SparseVector) -> f64 {
        match self {
            Classifier::Logistic { coef, intercept } => {
                let z = x
                    .entries
                    .iter()
                    .fold(*intercept, |acc, &(i, v)| acc + v * coef[i]);
                sigmoid(z)
            }
            Classifier::Constant { prob_fake } => *prob_fake,
        }
    }
}

/// Numerically stable logistic function.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_is_bounded_and_centered() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(800.0) <= 1.0);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!(sigmoid(2.0) > 0.5);
    }

    #[test]
    fn logistic_uses_intercept_and_weights() {
        let c = Classifier::Logistic {
            coef: vec![2.0, -1.0],
            intercept: -1.0,
        };
        let x = SparseVector {
            dim: 2,
            entries: vec![(0, 1.0)],
        };
        assert!((c.prob_fake(&x) - sigmoid(1.0)).abs() < 1e-12);
        let empty = SparseVector {
            dim: 2,
            entries: vec![],
        };
        assert!((c.prob_fake(&empty) - sigmoid(-1.0)).abs() < 1e-12);
    }

    #[test]
    fn validation_catches_length_mismatch() {
        let c = Classifier::Logistic {
            coef: vec![1.0],
            intercept: 0.0,
        };
        assert!(c.validate(2).is_err());
        assert!(c.validate(1).is_ok());
        assert!(Classifier::Constant { prob_fake: 1.5 }.validate(0).is_err());
    }

    #[test]
    fn deserializes_tagged_kinds() {
        let c: Classifier =
            serde_json::from_str(r#"{"kind":"constant","prob_fake":0.2}"#).unwrap();
        assert_eq!(c, Classifier::Constant { prob_fake: 0.2 });
        assert!(c.coefficients().is_none());
    }
}
