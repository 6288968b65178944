//! dojo-runner: Scoring script execution.
//!
//! Launches the exam's scoring script through `bash`, captures its output and
//! enforces a hard wall-clock timeout. Parsing the output is left to
//! `dojo-core`.

pub mod process;

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use dojo_core::error::EvaluationError;
use dojo_core::settings::DojoSettings;
use dojo_core::traits::{EvaluationOutput, ScoreRunner};

const INTERPRETER: &str = "bash";

/// Runs `bash <script> [-e <exam_id>]` in the project directory.
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    script: PathBuf,
    working_dir: PathBuf,
    timeout: Duration,
}

impl ScriptRunner {
    pub fn new(script: impl Into<PathBuf>) -> Self {
        Self {
            script: script.into(),
            working_dir: PathBuf::from("."),
            timeout: Duration::from_secs(60),
        }
    }

    /// Relative directories in `settings` are taken from its `project_dir`.
    pub fn from_settings(settings: &DojoSettings) -> Self {
        let settings = settings.clone().anchored();
        Self::new(settings.score_script_path())
            .with_working_dir(settings.project_dir.clone())
            .with_timeout(settings.score_timeout())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    pub fn script(&self) -> &Path {
        &self.script
    }

    /// The script path as seen from this process, independent of the
    /// directory the script runs in.
    fn resolved_script(&self) -> PathBuf {
        if self.script.is_absolute() {
            return self.script.clone();
        }
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(&self.script),
            Err(_) => self.script.clone(),
        }
    }

    fn command(&self, script: &Path, exam_id: Option<&str>) -> Command {
        let mut cmd = Command::new(INTERPRETER);
        cmd.arg(script).current_dir(&self.working_dir);
        if let Some(id) = exam_id {
            cmd.arg("-e").arg(id);
        }
        for (key, val) in process::script_env() {
            cmd.env(key, val);
        }
        cmd
    }
}

#[async_trait]
impl ScoreRunner for ScriptRunner {
    async fn evaluate(&self, exam_id: Option<&str>) -> Result<EvaluationOutput, EvaluationError> {
        let script = self.resolved_script();
        if !script.is_file() {
            return Err(EvaluationError::ScriptNotFound(self.script.clone()));
        }

        tracing::debug!(
            script = %script.display(),
            exam_id = exam_id.unwrap_or("-"),
            timeout_secs = self.timeout.as_secs(),
            "launching scoring script"
        );
        process::run_captured(self.command(&script, exam_id), self.timeout).await
    }
}
