use std::{fmt, path::PathBuf};

use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{config::GptConfig, tokens::count_tokens};

// === Command line ===

#[derive(Parser, Debug)]
#[command(name = "gpt", version, about = "GPT helpers for everyday git work")]
pub struct Cli {
   /// Path to config file (default: ~/.config/gpt-git/config.toml)
   #[arg(long, global = true)]
   pub config: Option<PathBuf>,

   /// Log debug output (diff, generated message, git invocations) to stderr
   #[arg(short, long, global = true)]
   pub verbose: bool,

   #[command(subcommand)]
   pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
   /// Git commands backed by GPT
   #[command(subcommand)]
   Git(GitCommand),
}

#[derive(Subcommand, Debug)]
pub enum GitCommand {
   /// Commit staged changes with a GPT-generated message
   Commit(CommitArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CommitArgs {
   /// Use gpt-4 for generating commit messages instead of gpt-3.5-turbo.
   #[arg(long)]
   pub gpt4: bool,

   /// Use gpt-4-32k model for generating commit messages.
   #[arg(long)]
   pub large: bool,

   /// Push the commit to the remote.
   #[arg(long)]
   pub push: bool,

   /// Directory to start searching for the repository from
   #[arg(long, default_value = ".")]
   pub dir: PathBuf,
}

// === Commit pipeline ===

/// Flags that drive one commit run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitOptions {
   pub gpt4:  bool,
   pub large: bool,
   pub push:  bool,
}

impl From<&CommitArgs> for CommitOptions {
   fn from(args: &CommitArgs) -> Self {
      Self { gpt4: args.gpt4, large: args.large, push: args.push }
   }
}

/// Result of `git commit`, printed as `{"response": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitResponse {
   pub response: String,
}

// === Model tiers ===

/// Completion model tier, ordered by context size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
   Fast,
   Quality,
   Large,
}

impl ModelTier {
   /// Tier asked for by the caller's flags, before any context escalation.
   pub const fn requested(fast: bool, large: bool) -> Self {
      if large {
         Self::Large
      } else if fast {
         Self::Fast
      } else {
         Self::Quality
      }
   }

   /// Pick the tier for `prompt`, moving up while the prompt plus the
   /// completion budget does not fit the tier's context window.
   pub fn select(fast: bool, large: bool, prompt: &str, config: &GptConfig) -> Self {
      let mut tier = Self::requested(fast, large);
      loop {
         let needed = count_tokens(tier.model(config), prompt) + config.max_tokens as usize;
         let available = tier.context_tokens(config);
         match tier.next() {
            Some(next) if needed > available => {
               warn!(%tier, needed, available, "prompt exceeds context window, using {next}");
               tier = next;
            },
            _ => return tier,
         }
      }
   }

   const fn next(self) -> Option<Self> {
      match self {
         Self::Fast => Some(Self::Quality),
         Self::Quality => Some(Self::Large),
         Self::Large => None,
      }
   }

   pub fn model(self, config: &GptConfig) -> &str {
      match self {
         Self::Fast => &config.fast_model,
         Self::Quality => &config.quality_model,
         Self::Large => &config.large_model,
      }
   }

   pub const fn context_tokens(self, config: &GptConfig) -> usize {
      match self {
         Self::Fast => config.fast_context_tokens,
         Self::Quality => config.quality_context_tokens,
         Self::Large => config.large_context_tokens,
      }
   }
}

impl fmt::Display for ModelTier {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(match self {
         Self::Fast => "fast",
         Self::Quality => "quality",
         Self::Large => "large",
      })
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   /// Config with model names tiktoken does not know, so token counts are
   /// the 4-chars-per-token estimate.
   fn estimate_config() -> GptConfig {
      GptConfig {
         fast_model: "local-fast".to_string(),
         quality_model: "local-quality".to_string(),
         large_model: "local-large".to_string(),
         max_tokens: 100,
         fast_context_tokens: 200,
         quality_context_tokens: 400,
         large_context_tokens: 800,
         ..Default::default()
      }
   }

   // ========== CLI Tests ==========

   #[test]
   fn test_cli_commit_defaults() {
      let cli = Cli::try_parse_from(["gpt", "git", "commit"]).unwrap();
      let Command::Git(GitCommand::Commit(args)) = cli.command;
      assert!(!args.gpt4);
      assert!(!args.large);
      assert!(!args.push);
      assert_eq!(args.dir, PathBuf::from("."));
      assert!(!cli.verbose);
      assert!(cli.config.is_none());
   }

   #[test]
   fn test_cli_commit_flags() {
      let cli = Cli::try_parse_from([
         "gpt", "git", "commit", "--gpt4", "--large", "--push", "--dir", "/src/repo", "-v",
      ])
      .unwrap();
      let Command::Git(GitCommand::Commit(args)) = cli.command;
      assert_eq!(CommitOptions::from(&args), CommitOptions { gpt4: true, large: true, push: true });
      assert_eq!(args.dir, PathBuf::from("/src/repo"));
      assert!(cli.verbose);
   }

   #[test]
   fn test_cli_rejects_unknown_flag() {
      assert!(Cli::try_parse_from(["gpt", "git", "commit", "--gpt5"]).is_err());
   }

   #[test]
   fn test_commit_response_serializes_to_response_key() {
      let response = CommitResponse { response: "[main abc123] fix typo".to_string() };
      assert_eq!(
         serde_json::to_value(&response).unwrap(),
         serde_json::json!({ "response": "[main abc123] fix typo" })
      );
   }

   // ========== ModelTier Tests ==========

   #[test]
   fn test_requested_tier() {
      assert_eq!(ModelTier::requested(true, false), ModelTier::Fast);
      assert_eq!(ModelTier::requested(false, false), ModelTier::Quality);
      assert_eq!(ModelTier::requested(true, true), ModelTier::Large);
      assert_eq!(ModelTier::requested(false, true), ModelTier::Large);
   }

   #[test]
   fn test_tier_models_from_config() {
      let config = GptConfig::default();
      assert_eq!(ModelTier::Fast.model(&config), "gpt-3.5-turbo");
      assert_eq!(ModelTier::Quality.model(&config), "gpt-4");
      assert_eq!(ModelTier::Large.model(&config), "gpt-4-32k");
   }

   #[test]
   fn test_select_keeps_tier_when_prompt_fits() {
      let config = estimate_config();
      // 100 prompt tokens + 100 completion = 200, fits the fast window exactly
      let prompt = "x".repeat(400);
      assert_eq!(ModelTier::select(true, false, &prompt, &config), ModelTier::Fast);
      assert_eq!(ModelTier::select(false, false, &prompt, &config), ModelTier::Quality);
   }

   #[test]
   fn test_select_escalates_on_overflow() {
      let config = estimate_config();
      let prompt = "x".repeat(404);
      assert_eq!(ModelTier::select(true, false, &prompt, &config), ModelTier::Quality);

      let prompt = "x".repeat(1600);
      assert_eq!(ModelTier::select(true, false, &prompt, &config), ModelTier::Large);
      assert_eq!(ModelTier::select(false, false, &prompt, &config), ModelTier::Large);
   }

   #[test]
   fn test_select_large_never_escalates() {
      let config = estimate_config();
      let prompt = "x".repeat(100_000);
      assert_eq!(ModelTier::select(true, true, &prompt, &config), ModelTier::Large);
   }
}
