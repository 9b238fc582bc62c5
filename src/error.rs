use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GptError {
   #[error(".git directory not found (searched upward from {})", .start.display())]
   RepoNotFound { start: PathBuf },

   #[error("Git command failed: {0}")]
   GitError(String),

   #[error("API request failed (HTTP {status}): {body}")]
   ApiError { status: u16, body: String },

   #[error("API call failed after {retries} retries: {source}")]
   ApiRetryExhausted {
      retries: u32,
      #[source]
      source:  Box<Self>,
   },

   #[error("API returned no completion")]
   EmptyResponse,

   #[error("Config error: {0}")]
   Config(String),

   #[error("IO error: {0}")]
   IoError(#[from] std::io::Error),

   #[error("JSON error: {0}")]
   JsonError(#[from] serde_json::Error),

   #[error("HTTP error: {0}")]
   HttpError(#[from] reqwest::Error),
}

impl GptError {
   /// Rate limits, server errors, timeouts and refused connections are worth
   /// another attempt; everything else fails immediately.
   pub fn is_retryable(&self) -> bool {
      match self {
         Self::ApiError { status, .. } => *status == 429 || *status >= 500,
         Self::HttpError(e) => e.is_timeout() || e.is_connect(),
         _ => false,
      }
   }
}

pub type Result<T> = std::result::Result<T, GptError>;
