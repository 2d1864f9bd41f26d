pub use error::{Error, Result, StatusParseError};
pub use git::{Git, GitCli};
pub use hook::{collect_changes, HookOptions, TocHook};
pub use toc::{ExternalTocTool, TocRewriter, DEFAULT_TOOL};
pub use types::{ChangeEntry, ChangeStatus};

use std::path::{Path, PathBuf};

mod error;
mod git;
mod hook;
pub mod install;
pub mod status;
pub mod toc;
mod types;

/// Creates a `TocHook` for the repository containing `repo_path`.
///
/// The TOC tool is resolved on `PATH` first, so a missing tool fails before
/// the repository is queried or touched.
///
/// # Arguments
///
/// * `repo_path`: Any path inside the Git working tree.
/// * `tool`: Name (or path) of the TOC-rewriting executable.
/// * `options`: Extension filter and staging behaviour.
///
/// # Errors
///
/// Returns [`Error::ToolNotFound`] if the tool cannot be resolved, or
/// [`Error::NotARepository`] if `repo_path` is not inside a working tree.
pub fn new(
    repo_path: &Path,
    tool: &str,
    options: HookOptions,
) -> Result<TocHook<GitCli, ExternalTocTool>> {
    let tool = ExternalTocTool::resolve(tool)?;
    let git = GitCli::open(repo_path)?;
    Ok(TocHook::new(git, tool, options))
}

/// Lists the files the hook would process, without resolving or running the tool.
///
/// # Errors
///
/// Returns an error if `repo_path` is not a repository or the status query fails.
pub fn list_changes(repo_path: &Path, extension: &str) -> Result<Vec<ChangeEntry>> {
    let git = GitCli::open(repo_path)?;
    collect_changes(&git, extension)
}

/// Installs a `pre-commit` hook that runs `toc-hook` with the given tool.
///
/// # Errors
///
/// Returns [`Error::HookExists`] if a hook is present and `force` is false.
pub fn install(repo_path: &Path, tool: &str, force: bool) -> Result<PathBuf> {
    let git = GitCli::open(repo_path)?;
    install::install_hook(&git, tool, force)
}
