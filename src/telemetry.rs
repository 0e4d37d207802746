// src/telemetry.rs
//! Tracing setup and log-safe identifiers.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const ENV_LOG_JSON: &str = "FAKEJOB_LOG_JSON";
const DEFAULT_FILTER: &str = "fake_job_detector=info,warn";

/// Short anonymized id for a posting text. Raw text never goes to logs.
pub fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Install the global subscriber: `RUST_LOG` filter (default
/// `fake_job_detector=info,warn`), compact output, or JSON lines when
/// `FAKEJOB_LOG_JSON=1`. Safe to call twice; the second call is a no-op.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let json = std::env::var(ENV_LOG_JSON).ok().as_deref() == Some("1");
    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
}
