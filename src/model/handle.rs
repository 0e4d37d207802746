// src/model/handle.rs
//! Swappable model slot shared by the HTTP layer, with an optional polling
//! hot-reload thread. The core never sees the handle: callers take a
//! snapshot (`current()`) and pass the model explicitly.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::{Duration, SystemTime};
use tracing::{info, warn};

use super::{load_model, DynModel};
use crate::error::DetectError;

pub const ENV_HOT_RELOAD: &str = "FAKEJOB_HOT_RELOAD";

#[derive(Clone, Default)]
pub struct ModelHandle {
    inner: Arc<RwLock<Option<DynModel>>>,
}

impl ModelHandle {
    pub fn new(model: Option<DynModel>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(model)),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Load from `path`; a failed load leaves the slot empty and logs why.
    pub fn load_or_empty(path: &Path) -> Self {
        match load_model(path) {
            Ok(m) => Self::new(Some(Arc::new(m))),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "starting without a model");
                Self::empty()
            }
        }
    }

    /// Snapshot of the current model. The lock is released before the
    /// caller scores anything.
    pub fn current(&self) -> Option<DynModel> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.current().is_some()
    }

    /// Swap the slot and publish `fakejob_model_loaded`. A poisoned lock
    /// still holds a whole value and is recovered.
    pub fn replace(&self, model: Option<DynModel>) {
        let loaded = model.is_some();
        *self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = model;
        crate::metrics::set_model_loaded(loaded);
    }

    /// Reload from disk. On failure the previous model stays in place.
    pub fn reload_from(&self, path: &Path) -> Result<(), DetectError> {
        let fresh = load_model(path)?;
        self.replace(Some(Arc::new(fresh)));
        Ok(())
    }
}

/// Hot reload is opt-in (`FAKEJOB_HOT_RELOAD=1`) and only honored in debug
/// builds or when `FAKEJOB_ENV` is local/dev.
fn hot_reload_enabled() -> bool {
    let want = std::env::var(ENV_HOT_RELOAD)
        .ok()
        .map(|v| v == "1")
        .unwrap_or(false);
    if !want {
        return false;
    }
    if cfg!(debug_assertions) {
        return true;
    }
    matches!(
        std::env::var("FAKEJOB_ENV")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

/// Poll `path` every 2s and swap the model in when its mtime moves forward.
pub fn start_hot_reload_thread(handle: ModelHandle, path: PathBuf) {
    if !hot_reload_enabled() {
        return;
    }

    thread::spawn(move || {
        let poll = Duration::from_secs(2);
        let mut last_mtime: Option<SystemTime> = None;

        loop {
            match fs::metadata(&path).and_then(|m| m.modified()) {
                Ok(mtime) => {
                    let changed = match last_mtime {
                        // First sighting: load it if startup came up empty.
                        None => {
                            last_mtime = Some(mtime);
                            !handle.is_loaded()
                        }
                        Some(prev) => mtime > prev,
                    };
                    if changed {
                        match handle.reload_from(&path) {
                            Ok(()) => info!(path = %path.display(), "model hot-reloaded"),
                            Err(e) => warn!(error = %e, "model reload failed, keeping previous"),
                        }
                        last_mtime = Some(mtime);
                    }
                }
                Err(_) => {
                    // File missing: keep the current model and keep polling.
                }
            }
            thread::sleep(poll);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Probabilities, ProbabilityScorer};

    struct Fixed(f64);

    impl ProbabilityScorer for Fixed {
        fn predict_proba(&self, _text: &str) -> Probabilities {
            Probabilities::from_fake(self.0)
        }
        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[test]
    fn empty_handle_has_no_model() {
        let h = ModelHandle::empty();
        assert!(!h.is_loaded());
        assert!(h.current().is_none());
    }

    #[test]
    fn replace_swaps_for_all_clones() {
        let h = ModelHandle::empty();
        let h2 = h.clone();
        h.replace(Some(Arc::new(Fixed(0.9))));
        let m = h2.current().expect("model visible through clone");
        assert_eq!(m.name(), "fixed");
    }

    #[test]
    fn poisoned_lock_still_serves_and_swaps() {
        let h = ModelHandle::new(Some(Arc::new(Fixed(0.3))));
        let inner = h.inner.clone();
        let _ = thread::spawn(move || {
            let _guard = inner.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();
        assert!(h.inner.is_poisoned());

        assert_eq!(h.current().map(|m| m.name().to_string()), Some("fixed".into()));
        h.replace(None);
        assert!(!h.is_loaded());
    }

    #[test]
    fn failed_reload_keeps_previous_model() {
        let h = ModelHandle::new(Some(Arc::new(Fixed(0.1))));
        let err = h.reload_from(Path::new("no/such/model.json")).unwrap_err();
        assert_eq!(err.kind(), "model_unavailable");
        assert!(h.is_loaded());
    }
}
