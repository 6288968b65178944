//! Core data model types for ckad-dojo.
//!
//! These are the records the rest of the system passes around: exam settings,
//! parsed questions and solutions, and per-question score lines.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default exam duration in minutes.
pub const DEFAULT_DURATION_MINUTES: u32 = 120;
/// Default warning threshold in minutes before the end of the exam.
pub const DEFAULT_WARNING_MINUTES: u32 = 15;
/// Default number of scored questions.
pub const DEFAULT_TOTAL_QUESTIONS: u32 = 22;
/// Default number of points across all scored questions.
pub const DEFAULT_TOTAL_POINTS: u32 = 113;
/// Default passing threshold in percent.
pub const DEFAULT_PASSING_PERCENTAGE: u32 = 66;

/// Resolved settings for one exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamConfig {
    /// Directory-derived identifier (e.g. "ckad-simulation1").
    pub exam_id: String,
    /// Human-readable name.
    pub exam_name: String,
    /// Session length in minutes (always > 0).
    pub duration_minutes: u32,
    /// Minutes before the end at which the timer enters its warning level.
    pub warning_minutes: u32,
    /// Number of scored questions.
    pub total_questions: u32,
    /// Number of points across all scored questions.
    pub total_points: u32,
    /// Passing threshold in percent (0..=100).
    pub passing_percentage: u32,
    /// Content revision of the exam, if declared.
    #[serde(default)]
    pub version: Option<String>,
    /// Number of practice-only preview questions.
    #[serde(default)]
    pub preview_questions: u32,
}

impl ExamConfig {
    /// The default configuration for an exam with no (or an unreadable) config source.
    pub fn with_defaults(exam_id: &str) -> Self {
        Self {
            exam_id: exam_id.to_string(),
            exam_name: exam_id.to_string(),
            duration_minutes: DEFAULT_DURATION_MINUTES,
            warning_minutes: DEFAULT_WARNING_MINUTES,
            total_questions: DEFAULT_TOTAL_QUESTIONS,
            total_points: DEFAULT_TOTAL_POINTS,
            passing_percentage: DEFAULT_PASSING_PERCENTAGE,
            version: None,
            preview_questions: 0,
        }
    }

    /// Total session length in seconds.
    pub fn duration_secs(&self) -> u64 {
        u64::from(self.duration_minutes) * 60
    }
}

/// One entry in the exam listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamSummary {
    pub id: String,
    pub name: String,
    pub duration: u32,
    pub questions: u32,
    pub points: u32,
}

impl From<&ExamConfig> for ExamSummary {
    fn from(config: &ExamConfig) -> Self {
        Self {
            id: config.exam_id.clone(),
            name: config.exam_name.clone(),
            duration: config.duration_minutes,
            questions: config.total_questions,
            points: config.total_points,
        }
    }
}

/// The number shown for a question: numeric for regular headers, the raw
/// token for preview headers that already carry their prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionNumber {
    Numeric(u32),
    Preview(String),
}

impl fmt::Display for QuestionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionNumber::Numeric(n) => write!(f, "{n}"),
            QuestionNumber::Preview(raw) => write!(f, "{raw}"),
        }
    }
}

/// A question parsed from `questions.md`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// Canonical id: digits, or `P<n>` for preview questions.
    pub id: String,
    pub number: QuestionNumber,
    pub topic: String,
    /// Markdown body with the metadata table removed.
    pub content: String,
    pub points: u32,
    pub namespace: String,
    pub resources: String,
    pub files: String,
    pub is_preview: bool,
}

/// A worked solution parsed from `solutions.md`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionRecord {
    pub id: String,
    pub number: QuestionNumber,
    pub topic: String,
    pub content: String,
    pub is_preview: bool,
}

/// One graded question from the scoring script output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreItem {
    /// Matches a `QuestionRecord` id.
    pub id: String,
    pub score: u32,
    pub max_score: u32,
    pub topic: String,
    /// True iff every point was earned.
    pub passed: bool,
}

impl ScoreItem {
    pub fn new(id: impl Into<String>, score: u32, max_score: u32, topic: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            score,
            max_score,
            topic: topic.into(),
            passed: score == max_score,
        }
    }

    /// Preview questions are graded for practice only.
    pub fn is_preview(&self) -> bool {
        self.id.starts_with('P')
    }
}
