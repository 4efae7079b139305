//! Prompt templates loaded from external files.

use color_eyre::{eyre::eyre, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::info;

pub const SYSTEM_PROMPT_FILE: &str = "system_prompt.txt";
pub const USER_TEMPLATE_FILE: &str = "user_prompt_template.txt";

/// Loads and caches prompt files from a prompts directory.
///
/// The content cache is instance-scoped; `reload` drops it so edited prompt
/// files are picked up on the next read.
pub struct PromptManager {
  dir: PathBuf,
  cache: HashMap<String, String>,
}

impl PromptManager {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self {
      dir: dir.into(),
      cache: HashMap::new(),
    }
  }

  pub fn system_prompt(&mut self) -> Result<String> {
    self.load_cached(SYSTEM_PROMPT_FILE)
  }

  pub fn user_template(&mut self) -> Result<String> {
    self.load_cached(USER_TEMPLATE_FILE)
  }

  /// Drop cached contents so the next read hits the files again.
  pub fn reload(&mut self) {
    self.cache.clear();
    info!("prompt cache invalidated");
  }

  /// Check that the prompt files exist and are non-empty. Returns the list of
  /// problems found; empty means valid.
  pub fn validate(&self) -> Vec<String> {
    let mut errors = Vec::new();

    if !self.dir.exists() {
      errors.push(format!("prompts directory does not exist: {}", self.dir.display()));
      return errors;
    }

    for name in [SYSTEM_PROMPT_FILE, USER_TEMPLATE_FILE] {
      let path = self.dir.join(name);
      match std::fs::read_to_string(&path) {
        Ok(content) if content.trim().is_empty() => {
          errors.push(format!("prompt file is empty: {}", path.display()));
        }
        Ok(_) => {}
        Err(e) => errors.push(format!("cannot read {}: {}", path.display(), e)),
      }
    }

    errors
  }

  fn load_cached(&mut self, name: &str) -> Result<String> {
    if let Some(content) = self.cache.get(name) {
      return Ok(content.clone());
    }

    let path = self.dir.join(name);
    let content = std::fs::read_to_string(&path)
      .map_err(|e| eyre!("Failed to read prompt file {}: {}", path.display(), e))?;

    self.cache.insert(name.to_string(), content.clone());
    Ok(content)
  }
}

/// Substitute `{name}` placeholders in a template.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
  let mut out = template.to_string();
  for (name, value) in vars {
    out = out.replace(&format!("{{{}}}", name), value);
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn write_prompts(dir: &TempDir, system: &str, user: &str) {
    std::fs::write(dir.path().join(SYSTEM_PROMPT_FILE), system).unwrap();
    std::fs::write(dir.path().join(USER_TEMPLATE_FILE), user).unwrap();
  }

  #[test]
  fn test_loads_and_caches() {
    let dir = TempDir::new().unwrap();
    write_prompts(&dir, "you are a coach", "analyze {activities_data}");

    let mut prompts = PromptManager::new(dir.path());
    assert_eq!(prompts.system_prompt().unwrap(), "you are a coach");

    // Cached: an on-disk change is not visible until reload.
    std::fs::write(dir.path().join(SYSTEM_PROMPT_FILE), "changed").unwrap();
    assert_eq!(prompts.system_prompt().unwrap(), "you are a coach");

    prompts.reload();
    assert_eq!(prompts.system_prompt().unwrap(), "changed");
  }

  #[test]
  fn test_missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let mut prompts = PromptManager::new(dir.path());
    assert!(prompts.system_prompt().is_err());
  }

  #[test]
  fn test_validate_reports_problems() {
    let dir = TempDir::new().unwrap();
    write_prompts(&dir, "", "analyze");

    let prompts = PromptManager::new(dir.path());
    let errors = prompts.validate();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("empty"));

    write_prompts(&dir, "ok", "analyze");
    assert!(prompts.validate().is_empty());
  }

  #[test]
  fn test_validate_missing_dir() {
    let prompts = PromptManager::new("/nonexistent/prompts");
    assert!(!prompts.validate().is_empty());
  }

  #[test]
  fn test_render_substitutes_placeholders() {
    let out = render("Hello {name}, {n} activities", &[("name", "Ana"), ("n", "3")]);
    assert_eq!(out, "Hello Ana, 3 activities");
  }
}
