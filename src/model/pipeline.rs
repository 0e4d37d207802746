//! `LinearTextPipeline`: TF-IDF vectorizer followed by a classifier head,
//! loaded from a JSON artifact.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use super::classifier::Classifier;
use super::tfidf::{Norm, TfidfVectorizer};
use super::{LinearExplainer, Probabilities, ProbabilityScorer, SparseVector};
use crate::error::{DetectError, DetectResult};

pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

fn default_true() -> bool {
    true
}
fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

/// On-disk shape of a trained model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    #[serde(default)]
    pub name: Option<String>,
    pub vectorizer: VectorizerArtifact,
    pub classifier: Classifier,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorizerArtifact {
    pub vocabulary: Vec<String>,
    pub idf: Vec<f64>,
    #[serde(default = "default_true")]
    pub lowercase: bool,
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
    #[serde(default)]
    pub sublinear_tf: bool,
    #[serde(default)]
    pub norm: Norm,
}

#[derive(Debug, Clone)]
pub struct LinearTextPipeline {
    name: String,
    vectorizer: TfidfVectorizer,
    classifier: Classifier,
}

impl LinearTextPipeline {
    pub fn new(
        name: impl Into<String>,
        vectorizer: TfidfVectorizer,
        classifier: Classifier,
    ) -> DetectResult<Self> {
        classifier.validate(vectorizer.vocabulary_size())?;
        Ok(Self {
            name: name.into(),
            vectorizer,
            classifier,
        })
    }

    pub fn from_artifact(artifact: ModelArtifact) -> DetectResult<Self> {
        if artifact.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(DetectError::ModelUnavailable(format!(
                "unsupported artifact format_version {} (expected {})",
                artifact.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }
        let v = artifact.vectorizer;
        let vectorizer = TfidfVectorizer::new(
            v.vocabulary,
            v.idf,
            v.lowercase,
            v.ngram_range,
            v.sublinear_tf,
            v.norm,
        )?;
        let name = artifact
            .name
            .unwrap_or_else(|| "tfidf-logistic".to_string());
        Self::new(name, vectorizer, artifact.classifier)
    }

    pub fn from_json_str(s: &str) -> DetectResult<Self> {
        let artifact: ModelArtifact = serde_json::from_str(s)
            .map_err(|e| DetectError::ModelUnavailable(format!("invalid model artifact: {e}")))?;
        Self::from_artifact(artifact)
    }
}

/// Load and validate a model artifact from disk.
pub fn load_model(path: &Path) -> DetectResult<LinearTextPipeline> {
    let content = fs::read_to_string(path).map_err(|e| {
        DetectError::ModelUnavailable(format!("could not read {}: {e}", path.display()))
    })?;
    let model = LinearTextPipeline::from_json_str(&content)?;
    info!(
        path = %path.display(),
        name = %model.name,
        features = model.vectorizer.vocabulary_size(),
        explainable = model.classifier.coefficients().is_some(),
        "model loaded"
    );
    Ok(model)
}

impl ProbabilityScorer for LinearTextPipeline {
    fn predict_proba(&self, text: &str) -> Probabilities {
        let x = self.vectorizer.transform(text);
        Probabilities::from_fake(self.classifier.prob_fake(&x))
    }

    fn predict_proba_batch(&self, texts: &[String]) -> Option<Vec<Probabilities>> {
        Some(texts.iter().map(|t| self.predict_proba(t)).collect())
    }

    fn as_linear(&self) -> Option<&dyn LinearExplainer> {
        match self.classifier {
            Classifier::Logistic { .. } => Some(self as &dyn LinearExplainer),
            Classifier::Constant { .. } => None,
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl LinearExplainer for LinearTextPipeline {
    fn transform(&self, text: &str) -> SparseVector {
        self.vectorizer.transform(text)
    }

    fn coefficients(&self) -> &[f64] {
        self.classifier.coefficients().unwrap_or(&[])
    }

    fn feature_names(&self) -> &[String] {
        self.vectorizer.feature_names()
    }
}
