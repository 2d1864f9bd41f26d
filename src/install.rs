use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, instrument};

use crate::error::{Error, Result};
use crate::git::Git;

const HOOK_NAME: &str = "pre-commit";

/// Renders the `pre-commit` script that runs this binary with `tool`.
#[must_use]
pub fn hook_script(tool: &str) -> String {
    format!(
        "#!/bin/sh\n\
         # Refresh Markdown tables of contents before committing.\n\
         exec toc-hook run --tool '{}'\n",
        tool.replace('\'', r"'\''")
    )
}

/// Writes the `pre-commit` hook into the repository's hooks directory.
///
/// # Errors
///
/// Returns [`Error::HookExists`] if a hook is already installed and `force`
/// is false, or an IO error if the script cannot be written.
#[instrument(skip(git))]
pub fn install_hook(git: &impl Git, tool: &str, force: bool) -> Result<PathBuf> {
    let hooks_dir = git.hooks_dir()?;
    let hook_path = hooks_dir.join(HOOK_NAME);

    if hook_path.exists() && !force {
        return Err(Error::HookExists(hook_path));
    }

    if !hooks_dir.exists() {
        debug!(hooks_dir = %hooks_dir.display(), "Creating hooks directory");
        fs::create_dir_all(&hooks_dir)?;
    }

    fs::write(&hook_path, hook_script(tool))?;
    set_executable(&hook_path)?;

    info!(hook = %hook_path.display(), "Pre-commit hook installed");
    Ok(hook_path)
}

#[cfg(unix)]
fn set_executable(path: &std::path::Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn set_executable(_path: &std::path::Path) -> Result<()> {
    Ok(())
}
