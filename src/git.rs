use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::{debug, instrument};

use crate::error::{Error, Result};

/// Trait defining Git operations required by the hook
pub trait Git {
    /// Root of the working tree. Porcelain paths are relative to it.
    fn root(&self) -> &Path;

    /// Run a Git command with the given arguments and return its trimmed stdout
    ///
    /// # Errors
    ///
    /// Returns an error if the git command cannot be executed or exits non-zero
    fn run_git_command(&self, args: &[&str]) -> Result<String>;

    /// Query the working-tree status in porcelain form, untrimmed
    ///
    /// # Errors
    ///
    /// Returns an error if `git status` fails
    fn status_porcelain(&self) -> Result<String>;

    /// Re-register a file with the staging area (`git add`)
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be staged
    fn stage_path(&self, path: &str) -> Result<()>;

    /// Directory Git reads hooks from
    ///
    /// # Errors
    ///
    /// Returns an error if the hooks path cannot be resolved
    fn hooks_dir(&self) -> Result<PathBuf> {
        let hooks = self.run_git_command(&["rev-parse", "--git-path", "hooks"])?;
        Ok(self.root().join(hooks))
    }
}

/// Implementation of Git operations using the local Git CLI
#[derive(Debug, Clone)]
pub struct GitCli {
    repo_path: PathBuf,
}

impl GitCli {
    /// Creates a new `GitCli` rooted at the given working-tree root
    #[must_use]
    pub const fn new(repo_path: PathBuf) -> Self {
        Self { repo_path }
    }

    /// Opens the repository containing `path`, resolving its top-level directory
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotARepository`] if `path` is not inside a Git working tree
    #[instrument(fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self> {
        let output = Command::new("git")
            .args(["rev-parse", "--show-toplevel"])
            .current_dir(path)
            .output()
            .map_err(|e| Error::GitCommandError(e.to_string()))?;

        if !output.status.success() {
            debug!(error = %String::from_utf8_lossy(&output.stderr), "Not a working tree");
            return Err(Error::NotARepository(path.to_path_buf()));
        }

        let root = String::from_utf8(output.stdout)
            .map_err(|e| Error::GitCommandError(e.to_string()))?;
        let root = PathBuf::from(root.trim_end_matches(['\n', '\r']));
        debug!(root = %root.display(), "Repository opened");
        Ok(Self::new(root))
    }

    fn output(&self, args: &[&str]) -> Result<Output> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_path)
            .output()
            .map_err(|e| Error::GitCommandError(e.to_string()))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            debug!(error = %error, "Git command failed");
            return Err(Error::GitCommandError(error.trim().to_string()));
        }
        Ok(output)
    }
}

impl Git for GitCli {
    fn root(&self) -> &Path {
        &self.repo_path
    }

    #[instrument(skip(self), fields(args = ?args, repo_path = %self.repo_path.display()))]
    fn run_git_command(&self, args: &[&str]) -> Result<String> {
        let output = self.output(args)?;

        let result = String::from_utf8(output.stdout)
            .map(|s| s.trim().to_string())
            .map_err(|e| Error::GitCommandError(e.to_string()))?;

        debug!(
            output_length = result.len(),
            "Git command completed successfully"
        );
        Ok(result)
    }

    #[instrument(skip(self), fields(repo_path = %self.repo_path.display()))]
    fn status_porcelain(&self) -> Result<String> {
        let output = self.output(&["-c", "core.quotePath=false", "status", "--porcelain"])?;
        let status =
            String::from_utf8(output.stdout).map_err(|e| Error::GitCommandError(e.to_string()))?;
        debug!(records = status.lines().count(), "Status queried");
        Ok(status)
    }

    #[instrument(skip(self), fields(path = %path, repo_path = %self.repo_path.display()))]
    fn stage_path(&self, path: &str) -> Result<()> {
        self.output(&["add", "--", path])?;
        debug!("File staged");
        Ok(())
    }
}
