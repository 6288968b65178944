pub mod exam;
pub mod info;
pub mod list;
pub mod questions;
pub mod score;
pub mod solutions;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};

use dojo_core::catalog::ExamCatalog;
use dojo_core::scoring::ScoringEngine;
use dojo_core::settings::{load_settings_from, DojoSettings};
use dojo_runner::ScriptRunner;

/// Settings shared by every subcommand, with command-line overrides applied.
pub struct Context {
    pub settings: DojoSettings,
}

impl Context {
    pub fn load(
        config: Option<PathBuf>,
        exams_dir: Option<PathBuf>,
        scripts_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let mut settings = load_settings_from(config.as_deref())?;
        // Paths typed on the command line are relative to where dojo runs.
        let cwd = std::env::current_dir().context("cannot read current directory")?;
        if let Some(dir) = exams_dir {
            settings.exams_dir = cwd.join(dir);
        }
        if let Some(dir) = scripts_dir {
            settings.scripts_dir = cwd.join(dir);
        }
        Ok(Self { settings })
    }

    pub fn catalog(&self) -> ExamCatalog {
        ExamCatalog::new(self.settings.exams_dir.clone())
    }

    /// The catalog, after checking that `exam_id` is one of its exams.
    pub fn catalog_for(&self, exam_id: &str) -> Result<ExamCatalog> {
        let catalog = self.catalog();
        if !catalog.contains(exam_id) {
            anyhow::bail!(
                "exam not found: {exam_id} (looked in {})",
                catalog.exams_dir().display()
            );
        }
        Ok(catalog)
    }

    pub fn engine(&self, catalog: ExamCatalog) -> ScoringEngine {
        let runner = ScriptRunner::from_settings(&self.settings);
        ScoringEngine::new(catalog, Arc::new(runner))
    }
}
