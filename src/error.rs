//! Error taxonomy for the detection core.
//!
//! Required-input failures surface to the caller as `DetectError`. Missing
//! explainability is not an error: contribution scoring degrades to an empty
//! list instead.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectError {
    /// The concatenated post text is empty after trimming.
    #[error("nothing to classify: title, description and salary text are all empty")]
    EmptyInput,

    /// No model is loaded, or the artifact could not be loaded.
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    /// Batch input lacks required columns.
    #[error("batch input is missing required column(s): {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    /// A batch row has more cells than the header declares.
    #[error("row {row} has {len} cells, header declares {expected}")]
    RaggedRow {
        row: usize,
        len: usize,
        expected: usize,
    },

    /// Batch exceeds the configured row cap.
    #[error("batch has {rows} rows, limit is {limit}")]
    BatchTooLarge { rows: usize, limit: usize },

    /// Threshold must be a finite value in [0, 1].
    #[error("threshold must be within [0, 1], got {0}")]
    InvalidThreshold(f64),

    /// The model produced a non-finite probability.
    #[error("model returned a non-finite probability: {0}")]
    InvalidScore(f64),
}

impl DetectError {
    /// Stable snake_case identifier (API error bodies, metric labels).
    pub fn kind(&self) -> &'static str {
        match self {
            DetectError::EmptyInput => "empty_input",
            DetectError::ModelUnavailable(_) => "model_unavailable",
            DetectError::Schema { .. } => "schema",
            DetectError::RaggedRow { .. } => "ragged_row",
            DetectError::BatchTooLarge { .. } => "batch_too_large",
            DetectError::InvalidThreshold(_) => "invalid_threshold",
            DetectError::InvalidScore(_) => "invalid_score",
        }
    }
}

pub type DetectResult<T> = Result<T, DetectError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_message_lists_missing_columns() {
        let e = DetectError::Schema {
            missing: vec!["title".into(), "description".into()],
        };
        assert_eq!(
            e.to_string(),
            "batch input is missing required column(s): title, description"
        );
        assert_eq!(e.kind(), "schema");
    }

    #[test]
    fn empty_input_and_model_unavailable_are_distinct() {
        let a = DetectError::EmptyInput;
        let b = DetectError::ModelUnavailable("not loaded".into());
        assert_ne!(a.kind(), b.kind());
        assert_ne!(a, b);
    }
}
