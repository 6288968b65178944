//! Score aggregation and the scoring run.
//!
//! `ScoringEngine::score` is the one place a practice session ends: it stops
//! the timer, runs the evaluation, parses the output and applies the exam's
//! passing threshold. Every outcome, including a missing or hung script, comes
//! back as a `ScoreResult` value.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::ExamCatalog;
use crate::error::EvaluationError;
use crate::model::{ScoreItem, DEFAULT_PASSING_PERCENTAGE};
use crate::score_output::{parse_score_output, ParsedScores};
use crate::session::{format_elapsed, ExamSession};
use crate::traits::{EvaluationOutput, ScoreRunner};

/// The outcome of one scoring run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub success: bool,
    pub items: Vec<ScoreItem>,
    pub total_score: u32,
    pub max_score: u32,
    /// Rounded down.
    pub percentage: u32,
    pub passed: bool,
    /// Threshold the result was judged against.
    pub passing_percentage: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_id: Option<String>,
    #[serde(default)]
    pub solutions_available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_formatted: Option<String>,
    /// Raw script output, kept for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl ScoreResult {
    /// Judge parsed scores against `passing_percentage`.
    pub fn from_parsed(parsed: ParsedScores, passing_percentage: u32, output: String) -> Self {
        Self {
            success: true,
            passed: parsed.percentage >= passing_percentage,
            items: parsed.items,
            total_score: parsed.total_score,
            max_score: parsed.max_score,
            percentage: parsed.percentage,
            passing_percentage,
            error: None,
            exam_id: None,
            solutions_available: false,
            elapsed_seconds: None,
            elapsed_formatted: None,
            output: Some(output),
        }
    }

    /// A failed run: no items, zero scores, not passed.
    pub fn failure(error: impl ToString, passing_percentage: u32) -> Self {
        Self {
            success: false,
            items: Vec::new(),
            total_score: 0,
            max_score: 0,
            percentage: 0,
            passed: false,
            passing_percentage,
            error: Some(error.to_string()),
            exam_id: None,
            solutions_available: false,
            elapsed_seconds: None,
            elapsed_formatted: None,
            output: None,
        }
    }

    /// Attach which exam was scored and whether its solutions can be shown.
    pub fn with_exam(self, exam_id: Option<String>, solutions_available: bool) -> Self {
        Self {
            exam_id,
            solutions_available,
            ..self
        }
    }

    /// Attach the length of the session that just ended.
    pub fn with_elapsed(self, elapsed: Duration) -> Self {
        Self {
            elapsed_seconds: Some(elapsed.as_secs()),
            elapsed_formatted: Some(format_elapsed(elapsed)),
            ..self
        }
    }
}

/// Turn one evaluation run into a result.
///
/// A non-zero exit still counts as a scored run when the output carries score
/// lines; the script reports failing checks through its text.
pub fn aggregate(
    run: Result<EvaluationOutput, EvaluationError>,
    passing_percentage: u32,
) -> ScoreResult {
    let output = match run {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!("scoring failed: {e}");
            return ScoreResult::failure(e, passing_percentage);
        }
    };

    let parsed = parse_score_output(&output.stdout);
    if !output.exited_cleanly() && parsed.items.is_empty() && !parsed.from_summary {
        let error = EvaluationError::Failed {
            code: output.exit_code.unwrap_or(-1),
            stderr: output.stderr.trim().to_string(),
        };
        tracing::warn!("scoring failed: {error}");
        return ScoreResult::failure(error, passing_percentage);
    }

    tracing::info!(
        items = parsed.items.len(),
        total = parsed.total_score,
        max = parsed.max_score,
        percentage = parsed.percentage,
        duration_ms = output.duration_ms,
        "scoring finished"
    );
    ScoreResult::from_parsed(parsed, passing_percentage, output.stdout)
}

/// Runs scoring for the exams in a catalog.
pub struct ScoringEngine {
    catalog: ExamCatalog,
    runner: Arc<dyn ScoreRunner>,
}

impl ScoringEngine {
    pub fn new(catalog: ExamCatalog, runner: Arc<dyn ScoreRunner>) -> Self {
        Self { catalog, runner }
    }

    /// End the session and score it.
    ///
    /// The exam is the session's, if one was ever started, else `requested`.
    /// The timer is stopped before the script runs, whatever the outcome.
    pub async fn score(&self, session: &ExamSession, requested: Option<&str>) -> ScoreResult {
        let stopped = session.stop();
        let exam_id = stopped.exam_id.or_else(|| requested.map(str::to_string));

        let passing_percentage = exam_id
            .as_deref()
            .map(|id| self.catalog.config(id).passing_percentage)
            .unwrap_or(DEFAULT_PASSING_PERCENTAGE);

        tracing::info!(
            exam_id = exam_id.as_deref().unwrap_or("-"),
            "running scoring script"
        );
        let run = self.runner.evaluate(exam_id.as_deref()).await;

        let solutions_available = exam_id
            .as_deref()
            .is_some_and(|id| self.catalog.solutions_available(id));
        let result = aggregate(run, passing_percentage).with_exam(exam_id, solutions_available);

        match stopped.elapsed {
            Some(elapsed) => result.with_elapsed(elapsed),
            None => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EXAM_CONFIG_FILE;
    use crate::document::SOLUTIONS_FILE;
    use crate::model::ExamConfig;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns one canned response and records what it was asked to score.
    struct CannedRunner {
        response: Mutex<Option<Result<EvaluationOutput, EvaluationError>>>,
        asked: Mutex<Vec<Option<String>>>,
    }

    impl CannedRunner {
        fn new(response: Result<EvaluationOutput, EvaluationError>) -> Arc<Self> {
            Arc::new(Self {
                response: Mutex::new(Some(response)),
                asked: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ScoreRunner for CannedRunner {
        async fn evaluate(
            &self,
            exam_id: Option<&str>,
        ) -> Result<EvaluationOutput, EvaluationError> {
            self.asked.lock().unwrap().push(exam_id.map(str::to_string));
            self.response
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Err(EvaluationError::Launch("already used".into())))
        }
    }

    const SAMPLE_OUTPUT: &str = "Q1  1/1  Namespaces\nQ2  0/2  Pods\nTOTAL SCORE: 1 / 3 (33%)";

    fn exam_dir(conf: &str, with_solutions: bool) -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("ckad-simulation1");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(EXAM_CONFIG_FILE), conf).unwrap();
        if with_solutions {
            std::fs::write(dir.join(SOLUTIONS_FILE), "## Question 1 | Namespaces\n").unwrap();
        }
        root
    }

    #[test]
    fn aggregate_sample_output() {
        let result = aggregate(Ok(EvaluationOutput::from_stdout(SAMPLE_OUTPUT)), 66);
        assert!(result.success);
        assert_eq!(result.items.len(), 2);
        assert_eq!(result.items[0].id, "1");
        assert!(result.items[0].passed);
        assert_eq!(result.items[1].max_score, 2);
        assert_eq!(result.total_score, 1);
        assert_eq!(result.max_score, 3);
        assert_eq!(result.percentage, 33);
        assert!(!result.passed);
        assert!(result.error.is_none());
    }

    #[test]
    fn pass_threshold_is_inclusive() {
        for threshold in [0, 32, 33, 34, 66, 100] {
            let result = aggregate(Ok(EvaluationOutput::from_stdout(SAMPLE_OUTPUT)), threshold);
            assert_eq!(result.passed, 33 >= threshold, "threshold {threshold}");
        }
    }

    #[test]
    fn timeout_becomes_failure() {
        let result = aggregate(Err(EvaluationError::TimedOut(Duration::from_secs(60))), 66);
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Scoring script timed out after 60s"));
        assert!(result.items.is_empty());
        assert_eq!(result.total_score, 0);
        assert_eq!(result.max_score, 0);
        assert_eq!(result.percentage, 0);
        assert!(!result.passed);
    }

    #[test]
    fn nonzero_exit_without_scores_fails() {
        let output = EvaluationOutput {
            stdout: "kubectl: command not found\n".into(),
            stderr: "cluster unreachable\n".into(),
            exit_code: Some(2),
            duration_ms: 5,
        };
        let result = aggregate(Ok(output), 66);
        assert!(!result.success);
        assert!(result.error.unwrap().contains("cluster unreachable"));
    }

    #[test]
    fn nonzero_exit_with_scores_is_scored() {
        let output = EvaluationOutput {
            stdout: SAMPLE_OUTPUT.into(),
            exit_code: Some(1),
            ..Default::default()
        };
        let result = aggregate(Ok(output), 66);
        assert!(result.success);
        assert_eq!(result.percentage, 33);
    }

    #[test]
    fn failed_result_serializes_error() {
        let json = serde_json::to_value(ScoreResult::failure("Scoring script not found", 66)).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Scoring script not found");
        assert!(json.get("elapsed_seconds").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn score_stops_session_and_reports_elapsed() {
        let root = exam_dir("PASSING_PERCENTAGE=30\nEXAM_DURATION=30", true);
        let catalog = ExamCatalog::new(root.path());
        let runner = CannedRunner::new(Ok(EvaluationOutput::from_stdout(SAMPLE_OUTPUT)));
        let engine = ScoringEngine::new(catalog.clone(), runner.clone());

        let session = ExamSession::new();
        session.start(&catalog.config("ckad-simulation1"), 1);
        tokio::time::advance(Duration::from_secs(754)).await;

        let result = engine.score(&session, Some("ignored-because-session-wins")).await;
        assert!(!session.status().running);
        assert!(result.success);
        assert!(result.passed, "33% passes a 30% threshold");
        assert_eq!(result.passing_percentage, 30);
        assert_eq!(result.exam_id.as_deref(), Some("ckad-simulation1"));
        assert!(result.solutions_available);
        assert_eq!(result.elapsed_seconds, Some(754));
        assert_eq!(result.elapsed_formatted.as_deref(), Some("12:34"));
        assert_eq!(
            *runner.asked.lock().unwrap(),
            vec![Some("ckad-simulation1".to_string())]
        );
    }

    #[tokio::test]
    async fn score_without_session_uses_requested_exam() {
        let root = exam_dir("", false);
        let engine = ScoringEngine::new(
            ExamCatalog::new(root.path()),
            CannedRunner::new(Ok(EvaluationOutput::from_stdout(SAMPLE_OUTPUT))),
        );

        let result = engine.score(&ExamSession::new(), Some("ckad-simulation1")).await;
        assert_eq!(result.exam_id.as_deref(), Some("ckad-simulation1"));
        assert_eq!(result.passing_percentage, 66);
        assert!(!result.solutions_available);
        assert!(result.elapsed_seconds.is_none());
    }

    #[tokio::test]
    async fn failed_run_still_ends_session() {
        let root = exam_dir("", false);
        let catalog = ExamCatalog::new(root.path());
        let engine = ScoringEngine::new(
            catalog.clone(),
            CannedRunner::new(Err(EvaluationError::ScriptNotFound("scripts/ckad-score.sh".into()))),
        );
        let session = ExamSession::new();
        session.start(&ExamConfig::with_defaults("ckad-simulation1"), 1);

        let result = engine.score(&session, None).await;
        assert!(!session.status().running);
        assert!(!result.success);
        assert!(result.error.unwrap().contains("not found"));
        assert!(!result.passed);
        assert!(result.elapsed_seconds.is_some());
    }
}
