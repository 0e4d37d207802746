//! Batch Runner: scores a table of postings and appends `prob_fake` /
//! `pred_fake` columns.
//!
//! Tables are header + rows of JSON cells. Only string cells carry text;
//! anything else (null, numbers, booleans, nested values, missing cells) is
//! read as an empty string, the same default `JobPost` uses.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::engine::{check_threshold, clamp_probability, score_text, DEFAULT_THRESHOLD};
use crate::error::{DetectError, DetectResult};
use crate::model::ProbabilityScorer;
use crate::post::join_fields;
use crate::verdict::Label;

pub const COL_TITLE: &str = "title";
pub const COL_DESCRIPTION: &str = "description";
pub const COL_SALARY: &str = "salary_text";
pub const COL_PROB: &str = "prob_fake";
pub const COL_PRED: &str = "pred_fake";

const REQUIRED: [&str; 2] = [COL_TITLE, COL_DESCRIPTION];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// Build from JSON objects. Columns follow first-seen key order across
    /// all records; absent keys become null.
    pub fn from_records(records: &[Map<String, Value>]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for rec in records {
            for k in rec.keys() {
                if !columns.iter().any(|c| c == k) {
                    columns.push(k.clone());
                }
            }
        }
        let rows = records
            .iter()
            .map(|rec| {
                columns
                    .iter()
                    .map(|c| rec.get(c).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();
        Self { columns, rows }
    }

    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .enumerate()
                    .map(|(i, c)| (c.clone(), row.get(i).cloned().unwrap_or(Value::Null)))
                    .collect()
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Text cell at `(row, col)`; non-strings and missing cells read as "".
    fn text_at(&self, row: usize, col: Option<usize>) -> &str {
        col.and_then(|c| self.rows[row].get(c))
            .and_then(Value::as_str)
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchOptions {
    pub threshold: f64,
    /// Reject batches above this many rows before scoring anything.
    pub max_rows: Option<usize>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            max_rows: None,
        }
    }
}

/// Input table plus the two prediction columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchResult {
    pub table: Table,
}

impl BatchResult {
    pub fn probabilities(&self) -> Vec<f64> {
        self.column_values(COL_PROB)
            .map(|v| v.as_f64().unwrap_or(0.0))
            .collect()
    }

    pub fn predictions(&self) -> Vec<u8> {
        self.column_values(COL_PRED)
            .map(|v| v.as_u64().unwrap_or(0) as u8)
            .collect()
    }

    /// Rows as JSON objects, the inverse of `Table::from_records`.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.table.to_records()
    }

    pub fn flagged(&self) -> usize {
        self.predictions().iter().filter(|&&p| p == 1).count()
    }

    fn column_values<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Value> + 'a {
        let idx = self.table.column_index(name);
        self.table
            .rows
            .iter()
            .filter_map(move |r| idx.and_then(|i| r.get(i)))
    }
}

/// Missing required columns, in declaration order.
pub fn missing_columns(table: &Table) -> Vec<String> {
    REQUIRED
        .iter()
        .filter(|c| table.column_index(c).is_none())
        .map(|c| c.to_string())
        .collect()
}

pub fn run_batch(
    table: &Table,
    model: Option<&dyn ProbabilityScorer>,
    threshold: f64,
) -> DetectResult<BatchResult> {
    let opts = BatchOptions {
        threshold,
        ..BatchOptions::default()
    };
    run_batch_with(table, model, &opts)
}

pub fn run_batch_with(
    table: &Table,
    model: Option<&dyn ProbabilityScorer>,
    opts: &BatchOptions,
) -> DetectResult<BatchResult> {
    let threshold = check_threshold(opts.threshold)?;

    let missing = missing_columns(table);
    if !missing.is_empty() {
        return Err(DetectError::Schema { missing });
    }
    let width = table.columns.len();
    if let Some((row, r)) = table.rows.iter().enumerate().find(|(_, r)| r.len() > width) {
        return Err(DetectError::RaggedRow {
            row,
            len: r.len(),
            expected: width,
        });
    }
    if let Some(limit) = opts.max_rows {
        if table.len() > limit {
            return Err(DetectError::BatchTooLarge {
                rows: table.len(),
                limit,
            });
        }
    }
    let model = model.ok_or_else(|| DetectError::ModelUnavailable("no model loaded".into()))?;

    let texts = batch_texts(table);
    let probs = score_all(model, &texts)?;

    let mut out = table.clone();
    for row in out.rows.iter_mut() {
        row.resize(width, Value::Null);
    }
    let prob_col = ensure_column(&mut out, COL_PROB);
    let pred_col = ensure_column(&mut out, COL_PRED);
    for (row, p) in out.rows.iter_mut().zip(&probs) {
        let pred = Label::from_probability(*p, threshold).as_flag();
        row[prob_col] = Value::from(*p);
        row[pred_col] = Value::from(pred);
    }

    let result = BatchResult { table: out };
    debug!(
        rows = texts.len(),
        flagged = result.flagged(),
        model = model.name(),
        threshold,
        "batch scored"
    );
    Ok(result)
}

/// Model text per row, joined exactly like `JobPost::model_text`.
pub fn batch_texts(table: &Table) -> Vec<String> {
    let t = table.column_index(COL_TITLE);
    let d = table.column_index(COL_DESCRIPTION);
    let s = table.column_index(COL_SALARY);
    (0..table.len())
        .map(|i| join_fields(table.text_at(i, t), table.text_at(i, d), table.text_at(i, s)))
        .collect()
}

/// One vectorized call when the model offers it, row by row otherwise.
fn score_all(model: &dyn ProbabilityScorer, texts: &[String]) -> DetectResult<Vec<f64>> {
    if let Some(batch) = model.predict_proba_batch(texts) {
        if batch.len() == texts.len() {
            return batch
                .into_iter()
                .map(|p| clamp_probability(p.fake))
                .collect();
        }
        warn!(
            expected = texts.len(),
            got = batch.len(),
            "batch scoring returned wrong length, falling back to per-row"
        );
    }
    texts.iter().map(|t| score_text(model, t)).collect()
}

/// Index of `name`, appending the column (null-filled) if absent.
fn ensure_column(table: &mut Table, name: &str) -> usize {
    if let Some(i) = table.column_index(name) {
        return i;
    }
    table.columns.push(name.to_string());
    for row in table.rows.iter_mut() {
        row.push(Value::Null);
    }
    table.columns.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Probabilities;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// P(fake) = 0.9 if the text mentions "pay", else 0.2.
    #[derive(Default)]
    struct PayModel {
        batched: bool,
        batch_calls: AtomicUsize,
        single_calls: AtomicUsize,
    }

    impl ProbabilityScorer for PayModel {
        fn predict_proba(&self, text: &str) -> Probabilities {
            self.single_calls.fetch_add(1, Ordering::SeqCst);
            let fake = if text.to_lowercase().contains("pay") {
                0.9
            } else {
                0.2
            };
            Probabilities::from_fake(fake)
        }
        fn predict_proba_batch(&self, texts: &[String]) -> Option<Vec<Probabilities>> {
            if !self.batched {
                return None;
            }
            self.batch_calls.fetch_add(1, Ordering::SeqCst);
            Some(
                texts
                    .iter()
                    .map(|t| {
                        Probabilities::from_fake(if t.to_lowercase().contains("pay") {
                            0.9
                        } else {
                            0.2
                        })
                    })
                    .collect(),
            )
        }
        fn name(&self) -> &str {
            "pay"
        }
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn sample() -> Table {
        Table::new(
            cols(&["id", "title", "description"]),
            vec![
                vec![json!(1), json!("Data entry"), json!("Pay 499 to start")],
                vec![json!(2), json!("Backend engineer"), json!("Rust, Postgres")],
                vec![json!(3), json!(null), json!(42)],
            ],
        )
    }

    #[test]
    fn appends_columns_and_preserves_rows() {
        let model = PayModel {
            batched: true,
            ..Default::default()
        };
        let out = run_batch(&sample(), Some(&model), 0.5).unwrap();
        assert_eq!(
            out.table.columns,
            cols(&["id", "title", "description", "prob_fake", "pred_fake"])
        );
        assert_eq!(out.table.len(), 3);
        assert_eq!(out.table.rows[1][0], json!(2));
        assert_eq!(out.predictions(), vec![1, 0, 0]);
        assert_eq!(out.flagged(), 1);
        for (p, f) in out.probabilities().iter().zip(out.predictions()) {
            assert_eq!(f == 1, *p >= 0.5);
        }
        assert_eq!(model.batch_calls.load(Ordering::SeqCst), 1);
        assert_eq!(model.single_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn falls_back_to_row_by_row() {
        let model = PayModel::default();
        let out = run_batch(&sample(), Some(&model), 0.5).unwrap();
        assert_eq!(out.predictions(), vec![1, 0, 0]);
        assert_eq!(model.single_calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn missing_description_is_schema_error() {
        let model = PayModel::default();
        let t = Table::new(cols(&["title", "salary_text"]), vec![vec![json!("x"), json!("y")]]);
        let err = run_batch(&t, Some(&model), 0.5).unwrap_err();
        assert_eq!(
            err,
            DetectError::Schema {
                missing: vec!["description".into()]
            }
        );
        assert_eq!(model.single_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn schema_is_checked_before_model() {
        let t = Table::new(cols(&["title"]), vec![]);
        assert!(matches!(run_batch(&t, None, 0.5), Err(DetectError::Schema { .. })));
        assert!(matches!(
            run_batch(&sample(), None, 0.5),
            Err(DetectError::ModelUnavailable(_))
        ));
    }

    #[test]
    fn salary_text_and_non_strings_feed_the_text() {
        let t = Table::new(
            cols(&["title", "description", "salary_text"]),
            vec![
                vec![json!("  Clerk"), json!(true), json!("pay weekly ")],
                vec![json!("Clerk")],
            ],
        );
        assert_eq!(batch_texts(&t), vec!["Clerk  pay weekly", "Clerk"]);
        let out = run_batch(&t, Some(&PayModel::default()), 0.5).unwrap();
        // Short rows are padded to the header width first.
        assert_eq!(out.table.rows[1].len(), 5);
        assert_eq!(out.predictions(), vec![1, 0]);
    }

    #[test]
    fn existing_prediction_columns_are_overwritten_in_place() {
        let t = Table::new(
            cols(&["prob_fake", "title", "description"]),
            vec![vec![json!("stale"), json!("Pay now"), json!("")]],
        );
        let out = run_batch(&t, Some(&PayModel::default()), 0.5).unwrap();
        assert_eq!(
            out.table.columns,
            cols(&["prob_fake", "title", "description", "pred_fake"])
        );
        assert_eq!(out.table.rows[0][0], json!(0.9));
    }

    #[test]
    fn ragged_and_oversized_batches_are_rejected() {
        let model = PayModel::default();
        let ragged = Table::new(
            cols(&["title", "description"]),
            vec![vec![json!("a"), json!("b"), json!("c")]],
        );
        assert!(matches!(
            run_batch(&ragged, Some(&model), 0.5),
            Err(DetectError::RaggedRow { row: 0, len: 3, expected: 2 })
        ));

        let opts = BatchOptions {
            threshold: 0.5,
            max_rows: Some(2),
        };
        assert_eq!(
            run_batch_with(&sample(), Some(&model), &opts),
            Err(DetectError::BatchTooLarge { rows: 3, limit: 2 })
        );
    }

    #[test]
    fn empty_table_yields_empty_result() {
        let t = Table::new(cols(&["title", "description"]), vec![]);
        let out = run_batch(&t, Some(&PayModel::default()), 0.5).unwrap();
        assert!(out.table.is_empty());
        assert_eq!(out.table.columns.len(), 4);
    }

    #[test]
    fn records_roundtrip_keeps_first_seen_columns() {
        let recs: Vec<Map<String, Value>> = vec![
            serde_json::from_value(json!({"title": "A", "description": "B"})).unwrap(),
            serde_json::from_value(json!({"description": "D", "salary_text": "S"})).unwrap(),
        ];
        let t = Table::from_records(&recs);
        assert_eq!(t.columns, cols(&["title", "description", "salary_text"]));
        assert_eq!(t.rows[1][0], Value::Null);
        let back = t.to_records();
        assert_eq!(back[0]["title"], json!("A"));
        assert_eq!(back[1]["salary_text"], json!("S"));
    }
}
