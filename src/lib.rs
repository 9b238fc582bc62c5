//! Git commit message generation library
//!
//! Locates the repository, reads its staged diff and asks a GPT model, via an
//! OpenAI-compatible API, for a single-line commit message before committing.
pub mod api;
pub mod commit;
pub mod config;
pub mod error;
pub mod git;
pub mod style;
pub mod tokens;
pub mod types;

// Re-export commonly used types
pub use api::{CompletionClient, GoalCompletion};
pub use config::GptConfig;
pub use error::{GptError, Result};
pub use git::{GitCli, VersionControl};
pub use types::{CommitOptions, CommitResponse, ModelTier};
