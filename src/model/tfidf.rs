//! Pre-fitted TF-IDF vectorizer (inference only).
//!
//! Tokens are runs of two or more word characters, optionally lower-cased;
//! n-grams are joined with a single space. Per text: raw counts (or
//! `1 + ln(count)` when sublinear) times idf, then optional L2 normalization.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::SparseVector;
use crate::error::{DetectError, DetectResult};

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?u)\b\w\w+\b").expect("token regex"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    #[default]
    L2,
    None,
}

#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    feature_names: Vec<String>,
    index: HashMap<String, usize>,
    idf: Vec<f64>,
    lowercase: bool,
    ngram_range: (usize, usize),
    sublinear_tf: bool,
    norm: Norm,
}

impl TfidfVectorizer {
    /// Build from a fitted vocabulary (feature order) and aligned idf weights.
    pub fn new(
        vocabulary: Vec<String>,
        idf: Vec<f64>,
        lowercase: bool,
        ngram_range: (usize, usize),
        sublinear_tf: bool,
        norm: Norm,
    ) -> DetectResult<Self> {
        if vocabulary.len() != idf.len() {
            return Err(DetectError::ModelUnavailable(format!(
                "vectorizer vocabulary has {} terms but idf has {} values",
                vocabulary.len(),
                idf.len()
            )));
        }
        let (lo, hi) = ngram_range;
        if lo == 0 || lo > hi {
            return Err(DetectError::ModelUnavailable(format!(
                "invalid ngram_range ({lo}, {hi})"
            )));
        }
        if let Some(bad) = idf.iter().find(|v| !v.is_finite()) {
            return Err(DetectError::ModelUnavailable(format!(
                "idf contains a non-finite value: {bad}"
            )));
        }

        let mut index = HashMap::with_capacity(vocabulary.len());
        for (i, term) in vocabulary.iter().enumerate() {
            if index.insert(term.clone(), i).is_some() {
                return Err(DetectError::ModelUnavailable(format!(
                    "vocabulary term `{term}` appears twice"
                )));
            }
        }

        Ok(Self {
            feature_names: vocabulary,
            index,
            idf,
            lowercase,
            ngram_range,
            sublinear_tf,
            norm,
        })
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn vocabulary_size(&self) -> usize {
        self.feature_names.len()
    }

    /// Word tokens of `text` as the vectorizer sees them.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let source = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        TOKEN_RE
            .find_iter(&source)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Map `text` into feature space.
    pub fn transform(&self, text: &str) -> SparseVector {
        let tokens = self.tokenize(text);
        let (lo, hi) = self.ngram_range;

        // BTreeMap keeps entries ordered by feature index.
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for n in lo..=hi {
            if n > tokens.len() {
                break;
            }
            for window in tokens.windows(n) {
                let gram = window.join(" ");
                if let Some(&idx) = self.index.get(&gram) {
                    *counts.entry(idx).or_insert(0.0) += 1.0;
                }
            }
        }

        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(idx, tf)| {
                let tf = if self.sublinear_tf { 1.0 + tf.ln() } else { tf };
                (idx, tf * self.idf[idx])
            })
            .filter(|&(_, v)| v != 0.0)
            .collect();

        if self.norm == Norm::L2 {
            let len = entries.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
            if len > 0.0 {
                for (_, v) in entries.iter_mut() {
                    *v /= len;
                }
            }
        }

        SparseVector {
            dim: self.feature_names.len(),
            entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(terms: &[&str]) -> Vec<String> {
        terms.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn single_char_tokens_are_ignored() {
        let v = TfidfVectorizer::new(vocab(&["pay"]), vec![1.0], true, (1, 1), false, Norm::L2)
            .unwrap();
        assert_eq!(v.tokenize("I pay a fee, OK?"), vec!["pay", "fee", "ok"]);
    }

    #[test]
    fn l2_normalized_counts_times_idf() {
        let v = TfidfVectorizer::new(
            vocab(&["pay", "registration", "python"]),
            vec![1.0, 2.0, 1.0],
            true,
            (1, 1),
            false,
            Norm::L2,
        )
        .unwrap();
        let x = v.transform("Pay registration PAY");
        // raw: pay=2*1, registration=1*2 -> both 2, normalized to 1/sqrt(2)
        let d = x.to_dense();
        let expect = 1.0 / 2f64.sqrt();
        assert!((d[0] - expect).abs() < 1e-12);
        assert!((d[1] - expect).abs() < 1e-12);
        assert_eq!(d[2], 0.0);
        assert_eq!(x.nnz(), 2);
    }

    #[test]
    fn bigrams_and_sublinear_tf() {
        let v = TfidfVectorizer::new(
            vocab(&["pay 999", "pay"]),
            vec![1.0, 1.0],
            true,
            (1, 2),
            true,
            Norm::None,
        )
        .unwrap();
        let x = v.transform("pay 999 now, pay 999 again");
        let d = x.to_dense();
        let expect = 1.0 + 2f64.ln();
        assert!((d[0] - expect).abs() < 1e-12);
        assert!((d[1] - expect).abs() < 1e-12);
    }

    #[test]
    fn mismatched_idf_is_rejected() {
        let err = TfidfVectorizer::new(vocab(&["a1", "b2"]), vec![1.0], true, (1, 1), false, Norm::L2)
            .unwrap_err();
        assert_eq!(err.kind(), "model_unavailable");
    }

    #[test]
    fn empty_text_maps_to_zero_vector() {
        let v = TfidfVectorizer::new(vocab(&["pay"]), vec![1.0], true, (1, 1), false, Norm::L2)
            .unwrap();
        let x = v.transform("");
        assert_eq!(x.dim, 1);
        assert_eq!(x.nnz(), 0);
    }
}
