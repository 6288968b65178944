//! The scoring-script seam.
//!
//! `dojo-runner` implements this trait by launching the real script; tests
//! plug in canned output.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EvaluationError;

/// Something that can run an exam's evaluation and hand back its output.
#[async_trait]
pub trait ScoreRunner: Send + Sync {
    /// Run the evaluation for `exam_id` (or the script's own default when `None`).
    async fn evaluate(&self, exam_id: Option<&str>) -> Result<EvaluationOutput, EvaluationError>;
}

/// Captured result of one evaluation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, or `None` if the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
}

impl EvaluationOutput {
    /// Output of a run that exited cleanly.
    pub fn from_stdout(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            exit_code: Some(0),
            ..Default::default()
        }
    }

    pub fn exited_cleanly(&self) -> bool {
        self.exit_code == Some(0)
    }
}
