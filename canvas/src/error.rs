//! Error types for paint admission, session lifecycle and configuration.
//!
//! Nothing here is fatal to the page: every failure is scoped to the board
//! session that produced it.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

/// Why the admission authority refused (or never received) a paint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaintError {
    /// The authority is throttling this participant.
    #[error("rate limited{}", retry_suffix(.retry_after_ms))]
    RateLimited { retry_after_ms: Option<u64> },
    /// The request was well-formed but refused (bad cell, bad color, closed board).
    #[error("paint rejected: {0}")]
    Validation(String),
    /// The request never got an answer.
    #[error("network error: {0}")]
    Network(String),
    /// The participant is not allowed to paint.
    #[error("not authorized: {0}")]
    Unauthorized(String),
}

impl PaintError {
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

#[allow(clippy::ref_option)]
fn retry_suffix(retry_after_ms: &Option<u64>) -> String {
    retry_after_ms.map(|ms| format!(" (retry in {ms} ms)")).unwrap_or_default()
}

/// Failures of the sync session itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The initial snapshot could not be loaded; the board cannot be shown.
    #[error("failed to load board snapshot: {0}")]
    Snapshot(String),
    /// A live channel could not be opened.
    #[error("failed to subscribe to {channel}: {reason}")]
    Subscribe { channel: &'static str, reason: String },
    /// The session was already closed.
    #[error("session closed")]
    Closed,
}

/// Invalid engine configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid engine config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("grid must be at least 1x1, got {width}x{height}")]
    EmptyGrid { width: u32, height: u32 },
}
