//! Configuration loader and validator for the poster generator.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Placeholder app id shipped in the example config; must be replaced before
/// talking to the Graph API.
pub const PLACEHOLDER_FB_APP_ID: &str = "YOUR_FB_APP_ID";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub app: App,
    pub gemini: Gemini,
    pub facebook: Facebook,
}

/// App-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    pub output_dir: String,
    pub capture_settle_ms: u64,
    pub pixel_ratio: u32,
    #[serde(default = "default_true")]
    pub use_fallbacks: bool,
}

/// Generative provider settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Gemini {
    #[serde(default)]
    pub api_key: String,
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub timeout_seconds: u64,
}

/// Graph API settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Facebook {
    pub app_id: String,
    pub graph_version: String,
    #[serde(default)]
    pub user_token: String,
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Ensure required directories exist (creates `app.output_dir` if missing).
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        if self.app.output_dir.trim().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(&self.app.output_dir)
    }

    /// Fill credentials left empty in the file from the process environment.
    /// `GEMINI_API_KEY` wins over `API_KEY`.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.gemini.api_key.trim().is_empty() {
            if let Some(key) = lookup("GEMINI_API_KEY").or_else(|| lookup("API_KEY")) {
                self.gemini.api_key = key;
            }
        }
        if self.facebook.user_token.trim().is_empty() {
            if let Some(token) = lookup("FACEBOOK_USER_TOKEN") {
                self.facebook.user_token = token;
            }
        }
    }

    /// True when the Graph API app id is still the example placeholder.
    pub fn facebook_app_is_placeholder(&self) -> bool {
        self.facebook.app_id.trim() == PLACEHOLDER_FB_APP_ID
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
/// - If the file does not exist, the built-in example is used.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "config file missing; using defaults");
            example().to_string()
        }
        Err(err) => return Err(err.into()),
    };
    let mut cfg: Config = serde_yaml::from_str(&content)?;
    cfg.apply_env();
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.output_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("app.output_dir must be non-empty"));
    }
    if cfg.app.pixel_ratio == 0 {
        return Err(ConfigError::Invalid("app.pixel_ratio must be > 0"));
    }

    if cfg.gemini.base_url.trim().is_empty() {
        return Err(ConfigError::Invalid("gemini.base_url must be non-empty"));
    }
    if cfg.gemini.text_model.trim().is_empty() {
        return Err(ConfigError::Invalid("gemini.text_model must be non-empty"));
    }
    if cfg.gemini.image_model.trim().is_empty() {
        return Err(ConfigError::Invalid("gemini.image_model must be non-empty"));
    }
    if cfg.gemini.timeout_seconds == 0 {
        return Err(ConfigError::Invalid("gemini.timeout_seconds must be > 0"));
    }

    if cfg.facebook.app_id.trim().is_empty() {
        return Err(ConfigError::Invalid("facebook.app_id must be non-empty"));
    }
    if cfg.facebook.graph_version.trim().is_empty() {
        return Err(ConfigError::Invalid("facebook.graph_version must be non-empty"));
    }

    Ok(())
}

/// Returns the example YAML written by `init-config`.
pub fn example() -> &'static str {
    r#"app:
  output_dir: "./posters"
  capture_settle_ms: 800
  pixel_ratio: 2
  use_fallbacks: true

gemini:
  # Leave empty to read GEMINI_API_KEY (or API_KEY) from the environment.
  api_key: ""
  base_url: "https://generativelanguage.googleapis.com/"
  text_model: "gemini-3-flash-preview"
  image_model: "gemini-2.5-flash-image"
  timeout_seconds: 60

facebook:
  app_id: "YOUR_FB_APP_ID"
  graph_version: "v18.0"
  # Leave empty to read FACEBOOK_USER_TOKEN from the environment.
  user_token: ""
"#
}
