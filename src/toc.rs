use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use tracing::{debug, instrument, warn};

use crate::error::{Error, Result};

/// Default name of the external TOC rewriter.
pub const DEFAULT_TOOL: &str = "update_markdown_toc";

/// Something that rewrites a Markdown file's table of contents in place.
pub trait TocRewriter {
    /// Name reported in logs and errors
    fn name(&self) -> &str;

    /// Rewrite the TOC of `path`, relative to the repository `root`
    ///
    /// # Errors
    ///
    /// Returns an error if the rewrite could not be run or did not succeed
    fn rewrite(&self, root: &Path, path: &str) -> Result<()>;
}

/// An executable resolved from `PATH` that takes the file path as its only argument.
#[derive(Debug, Clone)]
pub struct ExternalTocTool {
    name: String,
    program: PathBuf,
}

impl ExternalTocTool {
    /// Resolves `name` against the `PATH` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ToolNotFound`] if no executable named `name` exists.
    pub fn resolve(name: &str) -> Result<Self> {
        let search_path = std::env::var_os("PATH").unwrap_or_default();
        Self::resolve_in(name, &search_path)
    }

    /// Resolves `name` against an explicit `PATH`-style list of directories.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ToolNotFound`] if no executable named `name` exists.
    #[instrument(skip(search_path))]
    pub fn resolve_in(name: &str, search_path: &OsStr) -> Result<Self> {
        let program = find_executable(name, search_path).ok_or_else(|| Error::ToolNotFound {
            tool: name.to_string(),
        })?;
        debug!(program = %program.display(), "TOC tool resolved");
        Ok(Self {
            name: name.to_string(),
            program,
        })
    }

    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl TocRewriter for ExternalTocTool {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self, root), fields(tool = %self.name))]
    fn rewrite(&self, root: &Path, path: &str) -> Result<()> {
        let mut command = Command::new(&self.program);
        command
            .arg(path)
            .current_dir(root)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let mut child = ChildGuard::spawn(&mut command).map_err(|source| Error::ToolSpawn {
            tool: self.name.clone(),
            source,
        })?;
        let status = child.wait()?;

        if !status.success() {
            debug!(status = %status, "TOC tool failed");
            return Err(Error::ToolFailed {
                tool: self.name.clone(),
                path: path.to_string(),
                status,
            });
        }

        debug!("TOC rewritten");
        Ok(())
    }
}

/// Owns a running child process and reaps it on every exit path.
///
/// A successful [`ChildGuard::wait`] releases the child; otherwise `Drop`
/// kills it and waits for it so no zombie is left behind.
#[derive(Debug)]
pub struct ChildGuard {
    child: Option<Child>,
}

impl ChildGuard {
    /// Spawns `command` under the guard.
    ///
    /// # Errors
    ///
    /// Returns the spawn error if the process could not be started.
    pub fn spawn(command: &mut Command) -> std::io::Result<Self> {
        Ok(Self {
            child: Some(command.spawn()?),
        })
    }

    /// Blocks until the child exits.
    ///
    /// # Errors
    ///
    /// Returns an error if waiting fails; the child is then killed on drop.
    pub fn wait(&mut self) -> std::io::Result<ExitStatus> {
        let Some(child) = self.child.as_mut() else {
            return Err(std::io::Error::other("child already reaped"));
        };
        let status = child.wait()?;
        self.child = None;
        Ok(status)
    }

    #[cfg(test)]
    fn id(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            warn!(pid = child.id(), "Killing unfinished subprocess");
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

fn find_executable(name: &str, search_path: &OsStr) -> Option<PathBuf> {
    let direct = Path::new(name);
    if direct.components().count() > 1 {
        return is_executable(direct).then(|| direct.to_path_buf());
    }

    std::env::split_paths(search_path)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Joins directories into a `PATH`-style value.
///
/// # Errors
///
/// Returns an error if a directory contains the platform's path separator.
pub fn join_search_path<I, P>(dirs: I) -> Result<OsString>
where
    I: IntoIterator<Item = P>,
    P: AsRef<OsStr>,
{
    std::env::join_paths(dirs).map_err(|e| Error::IoError(std::io::Error::other(e)))
}
