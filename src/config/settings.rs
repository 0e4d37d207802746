// src/config/settings.rs
//! Service settings from `config/detector.toml`, with env overrides.
//!
//! Resolution: `$FAKEJOB_CONFIG_PATH` (must exist) → `config/detector.toml`
//! (optional) → built-in defaults. Then `FAKEJOB_MODEL_PATH`,
//! `FAKEJOB_THRESHOLD` and `FAKEJOB_BIND` override single fields.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::batch::BatchOptions;
use crate::engine::{ClassifyOptions, DEFAULT_THRESHOLD};

pub const DEFAULT_CONFIG_PATH: &str = "config/detector.toml";
pub const DEFAULT_MODEL_PATH: &str = "models/fake_job_model.json";

pub const ENV_CONFIG_PATH: &str = "FAKEJOB_CONFIG_PATH";
pub const ENV_MODEL_PATH: &str = "FAKEJOB_MODEL_PATH";
pub const ENV_THRESHOLD: &str = "FAKEJOB_THRESHOLD";
pub const ENV_BIND: &str = "FAKEJOB_BIND";

fn default_model_path() -> PathBuf {
    PathBuf::from(DEFAULT_MODEL_PATH)
}
fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}
fn default_api_top_n() -> usize {
    10
}
fn default_max_batch_rows() -> Option<usize> {
    Some(10_000)
}
fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Contributions returned by `/predict` (what the review UI lists).
    #[serde(default = "default_api_top_n")]
    pub api_top_n: usize,
    #[serde(default = "default_max_batch_rows")]
    pub max_batch_rows: Option<usize>,
    #[serde(default)]
    pub lexicon_path: Option<PathBuf>,
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_true")]
    pub metrics: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            threshold: default_threshold(),
            api_top_n: default_api_top_n(),
            max_batch_rows: default_max_batch_rows(),
            lexicon_path: None,
            bind: default_bind(),
            metrics: true,
        }
    }
}

impl Settings {
    /// Resolve settings from file + env (see module docs).
    pub fn load() -> Result<Self> {
        let mut s = match std::env::var(ENV_CONFIG_PATH) {
            Ok(p) => {
                let path = PathBuf::from(p);
                if !path.exists() {
                    return Err(anyhow!(
                        "{ENV_CONFIG_PATH} points to non-existent path {}",
                        path.display()
                    ));
                }
                Self::load_from(&path)?
            }
            Err(_) => {
                let path = Path::new(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    Self::load_from(path)?
                } else {
                    Self::default()
                }
            }
        };
        s.apply_env();
        Ok(s)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing settings at {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: Settings = toml::from_str(s)?;
        cfg.sanitize();
        Ok(cfg)
    }

    fn apply_env(&mut self) {
        if let Ok(p) = std::env::var(ENV_MODEL_PATH) {
            if !p.trim().is_empty() {
                self.model_path = PathBuf::from(p.trim());
            }
        }
        if let Some(t) = parse_threshold_env(std::env::var(ENV_THRESHOLD).ok()) {
            self.threshold = t;
        }
        if let Ok(b) = std::env::var(ENV_BIND) {
            if !b.trim().is_empty() {
                self.bind = b.trim().to_string();
            }
        }
    }

    /// Keep odd file values from reaching the engine.
    fn sanitize(&mut self) {
        if !self.threshold.is_finite() {
            warn!(threshold = self.threshold, "non-finite threshold in settings, using default");
            self.threshold = DEFAULT_THRESHOLD;
        }
        self.threshold = self.threshold.clamp(0.0, 1.0);
        if self.max_batch_rows == Some(0) {
            self.max_batch_rows = None;
        }
    }

    /// Service defaults for `/predict`; request fields override them.
    pub fn classify_options(&self) -> ClassifyOptions {
        ClassifyOptions {
            threshold: self.threshold,
            top_n: self.api_top_n,
        }
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            threshold: self.threshold,
            max_rows: self.max_batch_rows,
        }
    }
}

// parse optional float env and clamp to <0.0..=1.0>
fn parse_threshold_env(raw: Option<String>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .map(|v| v.clamp(0.0, 1.0))
}
