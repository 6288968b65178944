//! Error types.
//!
//! `EvaluationError` describes why a scoring script run produced no usable
//! output. It is defined in `dojo-core` so the aggregator can turn each case
//! into a failed `ScoreResult` without string matching.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when invoking the external scoring script.
#[derive(Debug, Error)]
pub enum EvaluationError {
    /// The scoring script does not exist; nothing was launched.
    #[error("Scoring script not found: {}", .0.display())]
    ScriptNotFound(PathBuf),

    /// The script ran longer than the allowed wall-clock time and was killed.
    #[error("Scoring script timed out after {0:?}")]
    TimedOut(Duration),

    /// The script could not be started or its output could not be collected.
    #[error("failed to run scoring script: {0}")]
    Launch(String),

    /// The script exited unsuccessfully without printing any score lines.
    #[error("scoring script exited with status {code}: {stderr}")]
    Failed { code: i32, stderr: String },
}

/// Errors from session operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// A flag toggle was requested without a question id.
    #[error("missing question_id")]
    MissingQuestionId,
}

impl EvaluationError {
    /// Returns `true` if the script was never launched.
    pub fn is_missing_script(&self) -> bool {
        matches!(self, EvaluationError::ScriptNotFound(_))
    }

    /// Returns `true` if the run was cut off by the timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, EvaluationError::TimedOut(_))
    }
}
