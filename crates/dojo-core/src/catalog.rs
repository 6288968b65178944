//! The exams directory.
//!
//! Every exam lives in `<exams_dir>/<exam_id>/` with an `exam.conf`, a
//! `questions.md` and optionally a `solutions.md`. Nothing is cached: authors
//! may edit these files while the simulator is running.

use std::path::{Path, PathBuf};

use crate::config::{load_exam_config, EXAM_CONFIG_FILE};
use crate::document::{self, SOLUTIONS_FILE};
use crate::model::{ExamConfig, ExamSummary, QuestionRecord, SolutionRecord};

#[derive(Debug, Clone)]
pub struct ExamCatalog {
    exams_dir: PathBuf,
}

impl ExamCatalog {
    pub fn new(exams_dir: impl Into<PathBuf>) -> Self {
        Self {
            exams_dir: exams_dir.into(),
        }
    }

    pub fn exams_dir(&self) -> &Path {
        &self.exams_dir
    }

    /// Ids of all directories holding an `exam.conf`, sorted.
    pub fn discover(&self) -> Vec<String> {
        let entries = match std::fs::read_dir(&self.exams_dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!("cannot list {}: {e}", self.exams_dir.display());
                return Vec::new();
            }
        };

        let mut ids: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().join(EXAM_CONFIG_FILE).is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        ids.sort();
        ids
    }

    /// Summaries of all discovered exams.
    pub fn list(&self) -> Vec<ExamSummary> {
        self.discover()
            .iter()
            .map(|id| ExamSummary::from(&self.config(id)))
            .collect()
    }

    pub fn contains(&self, exam_id: &str) -> bool {
        self.discover().iter().any(|id| id == exam_id)
    }

    pub fn config(&self, exam_id: &str) -> ExamConfig {
        load_exam_config(&self.exams_dir, exam_id)
    }

    pub fn questions(&self, exam_id: &str) -> Vec<QuestionRecord> {
        document::load_questions(&self.exams_dir, exam_id)
    }

    pub fn solutions(&self, exam_id: &str) -> Vec<SolutionRecord> {
        document::load_solutions(&self.exams_dir, exam_id)
    }

    pub fn solution(&self, exam_id: &str, question_id: &str) -> Option<SolutionRecord> {
        let solutions = self.solutions(exam_id);
        document::find_solution(&solutions, question_id).cloned()
    }

    pub fn solutions_available(&self, exam_id: &str) -> bool {
        self.exams_dir.join(exam_id).join(SOLUTIONS_FILE).is_file()
    }
}
