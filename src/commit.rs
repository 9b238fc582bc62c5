//! Commit staged changes with a generated message.
//!
//! The pipeline is linear: staged diff → completion → `git commit` → optional
//! `git push`. Errors from either collaborator are returned untouched, and a
//! failed push does not undo the commit before it.

use tracing::debug;

use crate::{
   api::GoalCompletion,
   error::Result,
   git::VersionControl,
   types::{CommitOptions, CommitResponse},
};

/// Instruction sent alongside the staged diff.
pub const COMMIT_GOAL: &str = "Create a short, single-line, git commit message for these changes";

/// Generate a commit message for the currently staged changes.
///
/// An empty diff is still sent to the completion service.
pub fn commit_message(
   vcs: &impl VersionControl,
   completion: &impl GoalCompletion,
   gpt4: bool,
   large: bool,
) -> Result<String> {
   let diff = vcs.staged_diff()?;
   debug!("Diff: {diff}");

   completion.complete_goal(&diff, COMMIT_GOAL, !gpt4, large)
}

/// Commit the staged changes with a generated message, pushing afterwards
/// when `options.push` is set.
pub fn commit(
   vcs: &impl VersionControl,
   completion: &impl GoalCompletion,
   options: &CommitOptions,
) -> Result<CommitResponse> {
   let message = commit_message(vcs, completion, options.gpt4, options.large)?;
   debug!("Commit Message: {message}");

   let mut response = vcs.commit(&message)?;
   if options.push {
      debug!("Pushing commit to remote.");
      let pushed = vcs.push()?;
      response.push('\n');
      response.push_str(&pushed);
   }

   Ok(CommitResponse { response })
}
