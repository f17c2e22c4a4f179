//! Mining error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mining error types.
///
/// Cancellation is not an error; it is reported as an outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", content = "detail", rename_all = "snake_case")]
pub enum MiningError {
    /// The job exceeded the safety bound without meeting its target.
    #[error("mining timed out before reaching the target difficulty")]
    Timeout,

    #[error("internal mining error: {0}")]
    Internal(String),

    #[error("invalid mining request: {0}")]
    InvalidRequest(String),

    /// The mining context could not be started or has gone away.
    #[error("mining context unavailable: {0}")]
    ContextUnavailable(String),
}
