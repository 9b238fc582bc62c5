use std::{
   path::{Path, PathBuf},
   process::{Command, Output},
};

use tracing::debug;

use crate::error::{GptError, Result};

/// Name of the metadata entry that marks a repository root.
pub const GIT_DIR_NAME: &str = ".git";

/// Walk upward from `start` to the nearest directory containing `.git`.
///
/// `start` is made absolute first (symlinks are left alone). The filesystem
/// root is never treated as a candidate, so starting at `/` always fails.
pub fn find_git_dir(start: &Path) -> Result<PathBuf> {
   let start = std::path::absolute(start)?;

   start
      .ancestors()
      .take_while(|dir| dir.parent().is_some())
      .find(|dir| dir.join(GIT_DIR_NAME).exists())
      .map(Path::to_path_buf)
      .ok_or_else(|| GptError::RepoNotFound { start: start.clone() })
}

/// Repository operations the commit pipeline needs.
pub trait VersionControl {
   /// Diff of the index against HEAD (`git diff --cached`). May be empty.
   fn staged_diff(&self) -> Result<String>;

   /// Commit the index with `message`, returning the tool's output.
   fn commit(&self, message: &str) -> Result<String>;

   /// Push the current branch to its configured remote.
   fn push(&self) -> Result<String>;
}

/// [`VersionControl`] backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCli {
   root: PathBuf,
}

impl GitCli {
   /// Locate the repository containing `start` and open a handle to it.
   pub fn open(start: &Path) -> Result<Self> {
      let root = find_git_dir(start)?;
      debug!(root = %root.display(), "located repository");
      Ok(Self { root })
   }

   pub fn root(&self) -> &Path {
      &self.root
   }

   fn run(&self, args: &[&str]) -> Result<Output> {
      debug!(?args, "running git");
      let output = Command::new("git")
         .args(args)
         .current_dir(&self.root)
         .output()
         .map_err(|e| GptError::GitError(format!("Failed to run git {}: {e}", args[0])))?;

      if !output.status.success() {
         let stderr = String::from_utf8_lossy(&output.stderr);
         let stdout = String::from_utf8_lossy(&output.stdout);
         return Err(GptError::GitError(format!(
            "git {} failed:\nstderr: {stderr}\nstdout: {stdout}",
            args[0]
         )));
      }

      Ok(output)
   }
}

impl VersionControl for GitCli {
   fn staged_diff(&self) -> Result<String> {
      self.run(&["diff", "--cached"]).map(|output| stdout_text(&output))
   }

   fn commit(&self, message: &str) -> Result<String> {
      self.run(&["commit", "-m", message]).map(|output| stdout_text(&output))
   }

   fn push(&self) -> Result<String> {
      self.run(&["push"]).map(|output| push_text(&output))
   }
}

/// Stdout without its final newline.
fn stdout_text(output: &Output) -> String {
   trim_newline(&String::from_utf8_lossy(&output.stdout))
}

/// `git push` reports on stderr only, so that is used when stdout is empty.
fn push_text(output: &Output) -> String {
   if output.stdout.is_empty() {
      trim_newline(&String::from_utf8_lossy(&output.stderr))
   } else {
      stdout_text(output)
   }
}

fn trim_newline(text: &str) -> String {
   text.strip_suffix('\n').unwrap_or(text).to_string()
}

#[cfg(test)]
mod tests {
   use std::{fs, os::unix::process::ExitStatusExt, process::ExitStatus};

   use super::*;

   #[test]
   fn test_find_git_dir_from_nested_directory() {
      let tmp = tempfile::tempdir().unwrap();
      fs::create_dir(tmp.path().join(".git")).unwrap();
      let nested = tmp.path().join("src").join("deep");
      fs::create_dir_all(&nested).unwrap();

      assert_eq!(find_git_dir(&nested).unwrap(), tmp.path());
   }

   #[test]
   fn test_find_git_dir_at_repo_root() {
      let tmp = tempfile::tempdir().unwrap();
      fs::create_dir(tmp.path().join(".git")).unwrap();

      assert_eq!(find_git_dir(tmp.path()).unwrap(), tmp.path());
   }

   #[test]
   fn test_find_git_dir_prefers_nearest_ancestor() {
      let tmp = tempfile::tempdir().unwrap();
      fs::create_dir(tmp.path().join(".git")).unwrap();
      let inner = tmp.path().join("vendor").join("lib");
      fs::create_dir_all(inner.join(".git")).unwrap();
      let start = inner.join("src");
      fs::create_dir(&start).unwrap();

      assert_eq!(find_git_dir(&start).unwrap(), inner);
   }

   #[test]
   fn test_find_git_dir_accepts_worktree_file() {
      let tmp = tempfile::tempdir().unwrap();
      fs::write(tmp.path().join(".git"), "gitdir: /elsewhere/.git/worktrees/wt\n").unwrap();

      assert_eq!(find_git_dir(tmp.path()).unwrap(), tmp.path());
   }

   #[test]
   fn test_find_git_dir_not_found() {
      let tmp = tempfile::tempdir().unwrap();
      let nested = tmp.path().join("a");
      fs::create_dir(&nested).unwrap();

      // Only meaningful when nothing above the temp dir is a repository.
      if tmp.path().ancestors().any(|dir| dir.join(GIT_DIR_NAME).exists()) {
         eprintln!("skipping: a repository exists above {}", tmp.path().display());
         return;
      }

      let err = find_git_dir(&nested).unwrap_err();
      assert!(matches!(err, GptError::RepoNotFound { .. }));
      assert!(err.to_string().contains(".git directory not found"));
   }

   #[test]
   fn test_find_git_dir_from_filesystem_root() {
      let err = find_git_dir(Path::new("/")).unwrap_err();
      assert!(matches!(err, GptError::RepoNotFound { ref start } if start == Path::new("/")));
   }

   #[test]
   fn test_open_fails_without_repository() {
      assert!(matches!(GitCli::open(Path::new("/")), Err(GptError::RepoNotFound { .. })));
   }

   fn output(stdout: &str, stderr: &str) -> Output {
      Output {
         status: ExitStatus::from_raw(0),
         stdout: stdout.as_bytes().to_vec(),
         stderr: stderr.as_bytes().to_vec(),
      }
   }

   #[test]
   fn test_stdout_text_strips_single_trailing_newline() {
      assert_eq!(stdout_text(&output("diff --git a/f b/f\n+line\n", "")), "diff --git a/f b/f\n+line");
      assert_eq!(stdout_text(&output("", "")), "");
   }

   #[test]
   fn test_stdout_text_ignores_stderr() {
      let text = stdout_text(&output("", "12:00:00.000000 git.c:460 trace: built-in: git diff --cached\n"));
      assert_eq!(text, "");
   }

   #[test]
   fn test_push_text_falls_back_to_stderr() {
      let text = push_text(&output("", "To origin\n   abc..def  main -> main\n"));
      assert_eq!(text, "To origin\n   abc..def  main -> main");
      assert_eq!(push_text(&output("Everything up-to-date\n", "noise\n")), "Everything up-to-date");
   }
}
