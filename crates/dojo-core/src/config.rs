//! Per-exam configuration resolver.
//!
//! Reads the shell-style `exam.conf` that sits in every exam directory.
//! Every field has a default, so a missing, unreadable, or partly malformed
//! file still resolves to a complete `ExamConfig`.

use std::path::Path;

use crate::model::ExamConfig;

/// File name of the per-exam configuration.
pub const EXAM_CONFIG_FILE: &str = "exam.conf";

/// Resolve the configuration for `exam_id` under `exams_dir`.
///
/// Never fails: an absent or unreadable file yields the defaults.
pub fn load_exam_config(exams_dir: &Path, exam_id: &str) -> ExamConfig {
    let path = exams_dir.join(exam_id).join(EXAM_CONFIG_FILE);
    match std::fs::read_to_string(&path) {
        Ok(content) => parse_exam_config_str(&content, exam_id),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => ExamConfig::with_defaults(exam_id),
        Err(e) => {
            tracing::warn!("cannot read {}: {e}, using defaults", path.display());
            ExamConfig::with_defaults(exam_id)
        }
    }
}

/// Parse `KEY=value` lines into an `ExamConfig` (useful for testing).
pub fn parse_exam_config_str(content: &str, exam_id: &str) -> ExamConfig {
    let mut config = ExamConfig::with_defaults(exam_id);

    for (key, value) in assignments(content) {
        match key {
            "EXAM_NAME" => config.exam_name = value.to_string(),
            "EXAM_VERSION" => config.version = Some(value.to_string()),
            "EXAM_DURATION" => {
                if let Some(minutes) = parse_field(key, value).filter(|&m| m > 0) {
                    config.duration_minutes = minutes;
                }
            }
            "EXAM_WARNING_TIME" => {
                if let Some(minutes) = parse_field(key, value) {
                    config.warning_minutes = minutes;
                }
            }
            "TOTAL_QUESTIONS" => {
                if let Some(n) = parse_field(key, value) {
                    config.total_questions = n;
                }
            }
            "PREVIEW_QUESTIONS" => {
                if let Some(n) = parse_field(key, value) {
                    config.preview_questions = n;
                }
            }
            "TOTAL_POINTS" => {
                if let Some(n) = parse_field(key, value) {
                    config.total_points = n;
                }
            }
            "PASSING_PERCENTAGE" => {
                if let Some(pct) = parse_field(key, value).filter(|&p| p <= 100) {
                    config.passing_percentage = pct;
                }
            }
            _ => {}
        }
    }

    config
}

/// Yield `(key, value)` pairs, skipping blanks, comments and lines without `=`.
fn assignments(content: &str) -> impl Iterator<Item = (&str, &str)> {
    content.lines().filter_map(|line| {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let (key, value) = line.split_once('=')?;
        let value = value.trim().trim_matches('"').trim_matches('\'');
        Some((key.trim(), value))
    })
}

fn parse_field(key: &str, value: &str) -> Option<u32> {
    match value.parse::<u32>() {
        Ok(n) => Some(n),
        Err(_) => {
            tracing::debug!("ignoring invalid value for {key}: {value:?}");
            None
        }
    }
}
