//! Application settings.
//!
//! Where the exams and scripts live and how long a scoring run may take.
//! Loaded from TOML, with environment overrides for the two directories.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level ckad-dojo settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DojoSettings {
    /// Working directory for the scoring script.
    #[serde(default = "default_project_dir")]
    pub project_dir: PathBuf,
    /// Directory holding one sub-directory per exam.
    #[serde(default = "default_exams_dir")]
    pub exams_dir: PathBuf,
    /// Directory holding the shell scripts.
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: PathBuf,
    /// File name of the scoring script inside `scripts_dir`.
    #[serde(default = "default_score_script")]
    pub score_script: String,
    /// Hard wall-clock limit for one scoring run.
    #[serde(default = "default_score_timeout")]
    pub score_timeout_secs: u64,
}

fn default_project_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_exams_dir() -> PathBuf {
    PathBuf::from("exams")
}
fn default_scripts_dir() -> PathBuf {
    PathBuf::from("scripts")
}
fn default_score_script() -> String {
    "ckad-score.sh".to_string()
}
fn default_score_timeout() -> u64 {
    60
}

impl Default for DojoSettings {
    fn default() -> Self {
        Self {
            project_dir: default_project_dir(),
            exams_dir: default_exams_dir(),
            scripts_dir: default_scripts_dir(),
            score_script: default_score_script(),
            score_timeout_secs: default_score_timeout(),
        }
    }
}

impl DojoSettings {
    /// Make relative `exams_dir` and `scripts_dir` relative to `project_dir`.
    pub fn anchored(mut self) -> Self {
        if self.exams_dir.is_relative() {
            self.exams_dir = self.project_dir.join(&self.exams_dir);
        }
        if self.scripts_dir.is_relative() {
            self.scripts_dir = self.project_dir.join(&self.scripts_dir);
        }
        self
    }

    pub fn score_script_path(&self) -> PathBuf {
        self.scripts_dir.join(&self.score_script)
    }

    pub fn score_timeout(&self) -> Duration {
        Duration::from_secs(self.score_timeout_secs)
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Single pass: substituted values are not scanned again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        result.push_str(&std::env::var(&rest[start + 2..start + len]).unwrap_or_default());
        rest = &rest[start + len + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Load settings from an explicit path, or search the default locations.
///
/// Search order without a path:
/// 1. `dojo.toml` in the current directory
/// 2. `~/.config/ckad-dojo/config.toml`
///
/// Environment variable overrides: `DOJO_EXAMS_DIR`, `DOJO_SCRIPTS_DIR`.
/// Relative directories, from the file or the environment, are taken from
/// `project_dir`.
pub fn load_settings_from(path: Option<&Path>) -> Result<DojoSettings> {
    let settings_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => [Some(PathBuf::from("dojo.toml")), global_config_path()]
            .into_iter()
            .flatten()
            .find(|p| p.exists()),
    };

    let mut settings = match settings_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let settings = parse_settings_str(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!("loaded settings from {}", path.display());
            settings
        }
        None => DojoSettings::default(),
    };

    if let Ok(dir) = std::env::var("DOJO_EXAMS_DIR") {
        settings.exams_dir = PathBuf::from(dir);
    }
    if let Ok(dir) = std::env::var("DOJO_SCRIPTS_DIR") {
        settings.scripts_dir = PathBuf::from(dir);
    }

    Ok(settings.anchored())
}

/// Parse a settings TOML string and resolve `${VAR}` references in its paths.
pub fn parse_settings_str(content: &str) -> Result<DojoSettings> {
    let mut settings: DojoSettings = toml::from_str(content)?;
    settings.project_dir = resolve_path(&settings.project_dir);
    settings.exams_dir = resolve_path(&settings.exams_dir);
    settings.scripts_dir = resolve_path(&settings.scripts_dir);
    Ok(settings)
}

fn global_config_path() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(|h| {
        PathBuf::from(h)
            .join(".config")
            .join("ckad-dojo")
            .join("config.toml")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_DOJO_TEST_VAR", "/srv/dojo");
        assert_eq!(resolve_env_vars("${_DOJO_TEST_VAR}"), "/srv/dojo");
        assert_eq!(
            resolve_env_vars("${_DOJO_TEST_VAR}/exams"),
            "/srv/dojo/exams"
        );
        assert_eq!(resolve_env_vars("${_DOJO_UNSET_VAR}x"), "x");
        assert_eq!(resolve_env_vars("${unterminated"), "${unterminated");
        assert_eq!(
            resolve_env_vars("${_DOJO_TEST_VAR}:${_DOJO_TEST_VAR}"),
            "/srv/dojo:/srv/dojo"
        );
        std::env::remove_var("_DOJO_TEST_VAR");

        std::env::set_var("_DOJO_SELF_VAR", "${_DOJO_SELF_VAR}");
        assert_eq!(resolve_env_vars("${_DOJO_SELF_VAR}/x"), "${_DOJO_SELF_VAR}/x");
        std::env::remove_var("_DOJO_SELF_VAR");
    }

    #[test]
    fn default_settings() {
        let settings = DojoSettings::default();
        assert_eq!(settings.score_timeout_secs, 60);
        assert_eq!(settings.score_timeout(), Duration::from_secs(60));
        assert_eq!(
            settings.score_script_path(),
            PathBuf::from("scripts/ckad-score.sh")
        );
    }

    #[test]
    fn parse_partial_settings() {
        let settings = parse_settings_str(
            r#"
exams_dir = "/opt/dojo/exams"
score_timeout_secs = 90
"#,
        )
        .unwrap();
        assert_eq!(settings.exams_dir, PathBuf::from("/opt/dojo/exams"));
        assert_eq!(settings.scripts_dir, PathBuf::from("scripts"));
        assert_eq!(settings.score_timeout_secs, 90);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = load_settings_from(Some(Path::new("/no/such/dojo.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dojo.toml");
        std::fs::write(&path, "score_script = \"score.sh\"\n").unwrap();

        let settings = load_settings_from(Some(&path)).unwrap();
        assert_eq!(settings.score_script, "score.sh");
    }

    #[test]
    fn directories_follow_project_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dojo.toml");
        std::fs::write(
            &path,
            format!(
                "project_dir = \"{}\"\nscripts_dir = \"/opt/dojo/scripts\"\n",
                dir.path().display()
            ),
        )
        .unwrap();

        let settings = load_settings_from(Some(&path)).unwrap();
        assert_eq!(settings.exams_dir, dir.path().join("exams"));
        assert_eq!(settings.scripts_dir, PathBuf::from("/opt/dojo/scripts"));
        assert_eq!(
            settings.score_script_path(),
            PathBuf::from("/opt/dojo/scripts/ckad-score.sh")
        );
    }

    #[test]
    fn anchored_keeps_absolute_dirs() {
        let settings = DojoSettings {
            project_dir: PathBuf::from("/srv/dojo"),
            exams_dir: PathBuf::from("/data/exams"),
            ..Default::default()
        }
        .anchored();
        assert_eq!(settings.exams_dir, PathBuf::from("/data/exams"));
        assert_eq!(settings.scripts_dir, PathBuf::from("/srv/dojo/scripts"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dojo.toml");
        std::fs::write(&path, "score_timeout_secs = \"soon\"").unwrap();
        assert!(load_settings_from(Some(&path)).is_err());
    }
}
