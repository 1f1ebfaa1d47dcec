use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::locale::Lang;

const PREFS_FILE: &str = "prefs.toml";

/// User preferences persisted between runs.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct Config {
  /// Last chosen display language (`"ar"` or `"en"`).
  pub lang: Option<String>,
  pub theme_name: Option<String>,
}

pub fn project_dirs() -> Option<ProjectDirs> {
  ProjectDirs::from("", "", "kjkids")
}

pub fn prefs_path() -> Option<PathBuf> {
  project_dirs().map(|dirs| dirs.config_dir().join(PREFS_FILE))
}

impl Config {
  pub fn load() -> Self {
    prefs_path().map(|path| Self::load_from(&path)).unwrap_or_default()
  }

  /// Read preferences from `path`. Missing or unreadable files yield defaults.
  pub fn load_from(path: &Path) -> Self {
    let Ok(content) = std::fs::read_to_string(path) else { return Self::default() };
    match toml::from_str(&content) {
      Ok(config) => config,
      Err(e) => {
        warn!(path = %path.display(), err = %e, "config: ignoring malformed preferences");
        Self::default()
      }
    }
  }

  pub fn save_to(&self, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
      std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let content = toml::to_string(self).context("Failed to serialize preferences")?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
  }

  /// Persisted language, if it names one we know.
  pub fn lang(&self) -> Option<Lang> {
    self.lang.as_deref().and_then(Lang::from_code)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn save_then_load_keeps_preferences() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join(PREFS_FILE);
    let config = Config { lang: Some("en".into()), theme_name: Some("Night".into()) };
    config.save_to(&path).unwrap();
    assert_eq!(Config::load_from(&path), config);
    assert_eq!(Config::load_from(&path).lang(), Some(Lang::En));
  }

  #[test]
  fn missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(Config::load_from(&dir.path().join(PREFS_FILE)), Config::default());
  }

  #[test]
  fn malformed_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(PREFS_FILE);
    std::fs::write(&path, "lang = [").unwrap();
    assert_eq!(Config::load_from(&path), Config::default());
  }

  #[test]
  fn unknown_language_is_ignored() {
    let config = Config { lang: Some("fr".into()), theme_name: None };
    assert_eq!(config.lang(), None);
  }
}
