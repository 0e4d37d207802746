//! Output of a single classification: probability, label,
//! matched keywords and token contributions.

use serde::{Deserialize, Serialize};

use crate::explain::Contribution;

/// Binary decision derived from the probability and the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Label {
    LikelyReal,
    Suspicious,
}

impl Label {
    /// `Suspicious` iff `probability >= threshold`.
    pub fn from_probability(probability: f64, threshold: f64) -> Self {
        if probability >= threshold {
            Label::Suspicious
        } else {
            Label::LikelyReal
        }
    }

    /// 0/1 encoding used in batch output (`pred_fake`).
    pub fn as_flag(self) -> u8 {
        match self {
            Label::LikelyReal => 0,
            Label::Suspicious => 1,
        }
    }

    /// Human-facing caption.
    pub fn caption(self) -> &'static str {
        match self {
            Label::LikelyReal => "Likely Real",
            Label::Suspicious => "Suspicious / Fake",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Label::LikelyReal => "LIKELY_REAL",
            Label::Suspicious => "SUSPICIOUS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// P(fake) in [0, 1].
    pub probability: f64,
    pub label: Label,
    /// Lexicon hits, unique, in lexicon order.
    #[serde(default)]
    pub matched_keywords: Vec<String>,
    /// Signed token contributions, descending. Empty when the model cannot
    /// be explained.
    #[serde(default)]
    pub contributions: Vec<Contribution>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn threshold_is_inclusive() {
        assert_eq!(Label::from_probability(0.5, 0.5), Label::Suspicious);
        assert_eq!(Label::from_probability(0.4999, 0.5), Label::LikelyReal);
        assert_eq!(Label::from_probability(0.0, 0.0), Label::Suspicious);
        assert_eq!(Label::Suspicious.as_flag(), 1);
    }

    #[test]
    fn serialized_shape() {
        let v = Verdict {
            probability: 0.82,
            label: Label::Suspicious,
            matched_keywords: vec!["pay".into()],
            contributions: vec![Contribution {
                token: "registration".into(),
                weight: 0.4,
            }],
        };
        let j = serde_json::to_value(&v).unwrap();
        assert_eq!(j["label"], json!("SUSPICIOUS"));
        assert_eq!(j["matched_keywords"], json!(["pay"]));
        assert_eq!(j["contributions"][0]["token"], json!("registration"));
        let conf = j["probability"].as_f64().unwrap();
        assert!((conf - 0.82).abs() < 1e-12);
    }
}
