use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Size of the analysis window, counting back from today.
  pub analysis_days: i64,
  pub output_dir: PathBuf,
  /// Optional training plan file fed to the LLM alongside the data.
  pub training_plan: Option<PathBuf>,
  pub prompts_dir: PathBuf,
  pub llm: LlmConfig,
  pub cache: CacheConfig,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      analysis_days: 7,
      output_dir: PathBuf::from("analysis_reports"),
      training_plan: None,
      prompts_dir: PathBuf::from("prompts"),
      llm: LlmConfig::default(),
      cache: CacheConfig::default(),
    }
  }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
  #[default]
  Anthropic,
  Openai,
  Google,
}

impl ProviderKind {
  pub fn default_model(self) -> &'static str {
    match self {
      ProviderKind::Anthropic => "claude-sonnet-4-20250514",
      ProviderKind::Openai => "gpt-4o",
      ProviderKind::Google => "gemini-2.0-flash-exp",
    }
  }

  pub fn api_key_env(self) -> &'static str {
    match self {
      ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
      ProviderKind::Openai => "OPENAI_API_KEY",
      ProviderKind::Google => "GOOGLE_API_KEY",
    }
  }

  fn parse(s: &str) -> Option<Self> {
    match s.to_lowercase().as_str() {
      "anthropic" => Some(ProviderKind::Anthropic),
      "openai" => Some(ProviderKind::Openai),
      "google" => Some(ProviderKind::Google),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
  pub provider: ProviderKind,
  /// Model name; the provider's default is used when unset.
  pub model: Option<String>,
  pub max_tokens: u32,
  pub temperature: f64,
}

impl Default for LlmConfig {
  fn default() -> Self {
    Self {
      provider: ProviderKind::default(),
      model: None,
      max_tokens: 3000,
      temperature: 0.7,
    }
  }
}

impl LlmConfig {
  pub fn model_name(&self) -> &str {
    self
      .model
      .as_deref()
      .unwrap_or_else(|| self.provider.default_model())
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  pub dir: PathBuf,
  pub ttl_hours: i64,
  pub enabled: bool,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      dir: PathBuf::from(".cache"),
      ttl_hours: 24,
      enabled: true,
    }
  }
}

impl Config {
  /// Load configuration from file, falling back to defaults when no file
  /// exists. Environment overrides are applied last.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./trainsight.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/trainsight/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };

    config.apply_env(|key| std::env::var(key).ok());
    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("trainsight.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("trainsight").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Apply environment overrides through an injected getter so tests don't
  /// have to mutate the process environment.
  fn apply_env(&mut self, get: impl Fn(&str) -> Option<String>) {
    if let Some(provider) = get("LLM_PROVIDER").as_deref().and_then(ProviderKind::parse) {
      self.llm.provider = provider;
    }
    if let Some(days) = get("ANALYSIS_DAYS").and_then(|v| v.parse().ok()) {
      self.analysis_days = days;
    }
    if let Some(ttl) = get("CACHE_TTL_HOURS").and_then(|v| v.parse().ok()) {
      self.cache.ttl_hours = ttl;
    }
    if let Some(use_cache) = get("USE_CACHE") {
      self.cache.enabled = use_cache.to_lowercase() != "false";
    }
    if let Some(plan) = get("TRAINING_PLAN_PATH") {
      self.training_plan = Some(PathBuf::from(plan));
    }
  }

  /// Get the Garmin account email from the environment.
  pub fn garmin_email() -> Result<String> {
    std::env::var("GARMIN_EMAIL")
      .map_err(|_| eyre!("Garmin email not found. Set the GARMIN_EMAIL environment variable."))
  }

  /// Get the Garmin account password from the environment.
  pub fn garmin_password() -> Result<String> {
    std::env::var("GARMIN_PASSWORD")
      .map_err(|_| eyre!("Garmin password not found. Set the GARMIN_PASSWORD environment variable."))
  }

  /// Get the API key for the configured LLM provider from the environment.
  pub fn api_key(provider: ProviderKind) -> Result<String> {
    let var = provider.api_key_env();
    std::env::var(var).map_err(|_| eyre!("LLM API key not found. Set the {} environment variable.", var))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect()
  }

  #[test]
  fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.analysis_days, 7);
    assert_eq!(config.cache.ttl_hours, 24);
    assert!(config.cache.enabled);
    assert_eq!(config.llm.provider, ProviderKind::Anthropic);
    assert_eq!(config.llm.model_name(), "claude-sonnet-4-20250514");
  }

  #[test]
  fn test_env_overrides() {
    let vars = env(&[
      ("LLM_PROVIDER", "openai"),
      ("ANALYSIS_DAYS", "30"),
      ("CACHE_TTL_HOURS", "6"),
      ("USE_CACHE", "false"),
    ]);

    let mut config = Config::default();
    config.apply_env(|key| vars.get(key).cloned());

    assert_eq!(config.llm.provider, ProviderKind::Openai);
    assert_eq!(config.analysis_days, 30);
    assert_eq!(config.cache.ttl_hours, 6);
    assert!(!config.cache.enabled);
  }

  #[test]
  fn test_invalid_env_values_are_ignored() {
    let vars = env(&[("LLM_PROVIDER", "cohere"), ("ANALYSIS_DAYS", "soon")]);

    let mut config = Config::default();
    config.apply_env(|key| vars.get(key).cloned());

    assert_eq!(config.llm.provider, ProviderKind::Anthropic);
    assert_eq!(config.analysis_days, 7);
  }

  #[test]
  fn test_yaml_parse() {
    let yaml = r#"
analysis_days: 14
llm:
  provider: google
  max_tokens: 2000
cache:
  ttl_hours: 48
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.analysis_days, 14);
    assert_eq!(config.llm.provider, ProviderKind::Google);
    assert_eq!(config.llm.max_tokens, 2000);
    assert_eq!(config.llm.model_name(), "gemini-2.0-flash-exp");
    assert_eq!(config.cache.ttl_hours, 48);
    // Unset fields keep their defaults.
    assert!(config.cache.enabled);
  }
}
