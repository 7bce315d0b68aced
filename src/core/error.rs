use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Central error type for the runtime discovery engine.
///
/// Every variant is contained at the smallest unit that produced it (one
/// registry key, one candidate, one network call). The public entry points
/// turn these into "no result" after logging them.
#[derive(Debug, Error)]
pub enum GuardError {
    // ── Version parsing ─────────────────────────────────
    #[error("Malformed Java version string {input:?}: {reason}")]
    MalformedVersion { input: String, reason: &'static str },

    // ── Discovery ───────────────────────────────────────
    #[error("Discovery failed at {path:?}: {source}")]
    DiscoveryIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Registry lookup failed for {key}: {message}")]
    Registry { key: String, message: String },

    // ── Validation ──────────────────────────────────────
    #[error("Failed to spawn {path:?}: {source}")]
    ValidationSpawn {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Probe of {path:?} timed out after {timeout:?}")]
    ProbeTimeout { path: PathBuf, timeout: Duration },

    // ── Remote lookup ───────────────────────────────────
    #[error("Remote runtime lookup failed: {0}")]
    RemoteLookup(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type GuardResult<T> = Result<T, GuardError>;

impl GuardError {
    pub(crate) fn malformed(input: &str, reason: &'static str) -> Self {
        GuardError::MalformedVersion {
            input: input.to_string(),
            reason,
        }
    }
}
