use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{GptError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GptConfig {
   /// Base URL of an OpenAI-compatible API (the `/chat/completions` path is
   /// appended)
   pub api_base_url: String,

   /// Optional API key (overridden by `GPT_GIT_API_KEY`, then
   /// `OPENAI_API_KEY`)
   pub api_key: Option<String>,

   /// HTTP request timeout in seconds
   pub request_timeout_secs: u64,

   /// HTTP connection timeout in seconds
   pub connect_timeout_secs: u64,

   pub max_retries:        u32,
   pub initial_backoff_ms: u64,
   pub temperature:        f32,
   pub max_tokens:         u32,
   pub top_p:              f32,
   pub frequency_penalty:  f32,
   pub presence_penalty:   f32,

   /// Model used when `--gpt4` is absent
   pub fast_model:    String,
   /// Model used for `--gpt4`
   pub quality_model: String,
   /// Model used for `--large`, and when a prompt overflows the other tiers
   pub large_model:   String,

   pub fast_context_tokens:    usize,
   pub quality_context_tokens: usize,
   pub large_context_tokens:   usize,
}

impl Default for GptConfig {
   fn default() -> Self {
      Self {
         api_base_url:           "https://api.openai.com/v1".to_string(),
         api_key:                None,
         request_timeout_secs:   120,
         connect_timeout_secs:   30,
         max_retries:            3,
         initial_backoff_ms:     1000,
         temperature:            0.0,
         max_tokens:             500,
         top_p:                  1.0,
         frequency_penalty:      0.5,
         presence_penalty:       0.0,
         fast_model:             "gpt-3.5-turbo".to_string(),
         quality_model:          "gpt-4".to_string(),
         large_model:            "gpt-4-32k".to_string(),
         fast_context_tokens:    4096,
         quality_context_tokens: 8192,
         large_context_tokens:   32768,
      }
   }
}

impl GptConfig {
   /// Load config from the default location (~/.config/gpt-git/config.toml),
   /// or from `GPT_GIT_CONFIG` when set. A missing file yields defaults.
   /// Environment variables override file values:
   /// - `GPT_GIT_API_URL` overrides `api_base_url`
   /// - `GPT_GIT_API_KEY` (or `OPENAI_API_KEY`) overrides `api_key`
   pub fn load() -> Result<Self> {
      let config_path = if let Ok(custom_path) = std::env::var("GPT_GIT_CONFIG") {
         PathBuf::from(custom_path)
      } else {
         Self::default_config_path().unwrap_or_default()
      };

      if config_path.exists() {
         Self::from_file(&config_path)
      } else {
         let mut config = Self::default();
         config.apply_env_overrides(|key| std::env::var(key).ok());
         Ok(config)
      }
   }

   /// Load config from specific file
   pub fn from_file(path: &Path) -> Result<Self> {
      let contents = std::fs::read_to_string(path).map_err(|e| {
         GptError::Config(format!("failed to read {}: {e}", path.display()))
      })?;
      let mut config = Self::from_toml(&contents)?;
      config.apply_env_overrides(|key| std::env::var(key).ok());
      Ok(config)
   }

   pub fn from_toml(contents: &str) -> Result<Self> {
      toml::from_str(contents).map_err(|e| GptError::Config(format!("failed to parse: {e}")))
   }

   fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
      if let Some(api_url) = var("GPT_GIT_API_URL") {
         self.api_base_url = api_url;
      }

      if let Some(api_key) = var("GPT_GIT_API_KEY").or_else(|| var("OPENAI_API_KEY")) {
         self.api_key = Some(api_key);
      }
   }

   /// Get default config path (platform-safe)
   /// Tries HOME (Unix/Linux/macOS) then USERPROFILE (Windows)
   pub fn default_config_path() -> Result<PathBuf> {
      std::env::var("HOME")
         .or_else(|_| std::env::var("USERPROFILE"))
         .map(|home| PathBuf::from(home).join(".config/gpt-git/config.toml"))
         .map_err(|_| {
            GptError::Config("no home directory found (tried HOME and USERPROFILE)".to_string())
         })
   }
}
