use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::error::{Error, Result};
use crate::git::Git;
use crate::status::parse_porcelain;
use crate::toc::TocRewriter;
use crate::types::ChangeEntry;

/// Tunables for a hook run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookOptions {
    /// File extension to pick up, without the leading dot
    pub extension: String,
    /// Whether to `git add` each rewritten file
    pub stage: bool,
}

impl Default for HookOptions {
    fn default() -> Self {
        Self {
            extension: "md".to_string(),
            stage: true,
        }
    }
}

/// Refreshes the table of contents of every Markdown file about to be committed
pub struct TocHook<G, R> {
    git: G,
    rewriter: R,
    options: HookOptions,
    interrupted: Arc<AtomicBool>,
}

impl<G: Git, R: TocRewriter> TocHook<G, R> {
    #[must_use]
    pub fn new(git: G, rewriter: R, options: HookOptions) -> Self {
        Self {
            git,
            rewriter,
            options,
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shares an interrupt flag; once raised, no further file is processed.
    #[must_use]
    pub fn with_interrupt(mut self, interrupted: Arc<AtomicBool>) -> Self {
        self.interrupted = interrupted;
        self
    }

    /// Lists the files the hook would process, in status order.
    ///
    /// # Errors
    ///
    /// Returns an error if the status query fails or its output cannot be parsed.
    pub fn changes(&self) -> Result<Vec<ChangeEntry>> {
        collect_changes(&self.git, &self.options.extension)
    }

    /// Rewrites and re-stages each pending file, stopping at the first failure.
    ///
    /// Files handled before a failure keep their rewritten, staged content.
    ///
    /// # Errors
    ///
    /// Returns the first error from the status query, the TOC tool or staging,
    /// or [`Error::Interrupted`] if the interrupt flag was raised.
    #[instrument(skip(self), fields(tool = %self.rewriter.name()))]
    pub fn run(&self) -> Result<Vec<ChangeEntry>> {
        let changes = self.changes()?;
        if changes.is_empty() {
            debug!("No matching files staged, nothing to do");
            return Ok(changes);
        }

        for entry in &changes {
            if self.interrupted.load(Ordering::SeqCst) {
                return Err(Error::Interrupted);
            }

            let path = entry.path();
            debug!(path = %path, status = entry.status().as_str(), "Updating TOC");
            self.rewriter.rewrite(self.git.root(), path)?;

            if self.options.stage {
                self.git.stage_path(path)?;
            }
            info!(path = %path, "TOC updated");
        }

        Ok(changes)
    }
}

/// Queries porcelain status and keeps the added, modified and renamed files
/// with the given extension.
///
/// # Errors
///
/// Returns an error if the status query fails or its output cannot be parsed.
#[instrument(skip(git))]
pub fn collect_changes(git: &impl Git, extension: &str) -> Result<Vec<ChangeEntry>> {
    let status = git.status_porcelain()?;
    let entries = parse_porcelain(&status, extension)?;
    debug!(count = entries.len(), "Collected changes");
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::{Path, PathBuf};
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Status,
        Rewrite(String),
        Stage(String),
    }

    type Log = Rc<RefCell<Vec<Call>>>;

    struct FakeGit {
        status: String,
        root: PathBuf,
        log: Log,
    }

    impl Git for FakeGit {
        fn root(&self) -> &Path {
            &self.root
        }

        fn run_git_command(&self, _args: &[&str]) -> Result<String> {
            Ok(String::new())
        }

        fn status_porcelain(&self) -> Result<String> {
            self.log.borrow_mut().push(Call::Status);
            Ok(self.status.clone())
        }

        fn stage_path(&self, path: &str) -> Result<()> {
            self.log.borrow_mut().push(Call::Stage(path.to_string()));
            Ok(())
        }
    }

    struct FakeTool {
        fail_on: Option<&'static str>,
        log: Log,
    }

    impl TocRewriter for FakeTool {
        fn name(&self) -> &str {
            "fake_toc"
        }

        fn rewrite(&self, _root: &Path, path: &str) -> Result<()> {
            self.log.borrow_mut().push(Call::Rewrite(path.to_string()));
            if self.fail_on == Some(path) {
                return Err(Error::GitCommandError(format!("rewrite of {path} failed")));
            }
            Ok(())
        }
    }

    fn build_hook(
        status: &str,
        fail_on: Option<&'static str>,
        options: HookOptions,
    ) -> (TocHook<FakeGit, FakeTool>, Log) {
        let log: Log = Rc::default();
        let git = FakeGit {
            status: status.to_string(),
            root: PathBuf::from("/repo"),
            log: Rc::clone(&log),
        };
        let tool = FakeTool {
            fail_on,
            log: Rc::clone(&log),
        };
        (TocHook::new(git, tool, options), log)
    }

    #[test]
    fn empty_change_set_only_queries_status() {
        let (hook, log) = build_hook(
            " M a.md\n?? b.md\nM  c.txt\n",
            None,
            HookOptions::default(),
        );
        let processed = hook.run().unwrap();
        assert!(processed.is_empty());
        assert_eq!(*log.borrow(), vec![Call::Status]);
    }

    #[test]
    fn files_are_rewritten_then_staged_in_status_order() {
        let (hook, log) = build_hook(
            "M  b.md\nA  a.md\nR  old.md -> new.md\n",
            None,
            HookOptions::default(),
        );
        let processed = hook.run().unwrap();
        assert_eq!(
            processed,
            vec![
                ChangeEntry::Modified("b.md".to_string()),
                ChangeEntry::Added("a.md".to_string()),
                ChangeEntry::RenamedTo("new.md".to_string()),
            ]
        );
        assert_eq!(
            *log.borrow(),
            vec![
                Call::Status,
                Call::Rewrite("b.md".to_string()),
                Call::Stage("b.md".to_string()),
                Call::Rewrite("a.md".to_string()),
                Call::Stage("a.md".to_string()),
                Call::Rewrite("new.md".to_string()),
                Call::Stage("new.md".to_string()),
            ]
        );
    }

    #[test]
    fn first_failure_aborts_remaining_files() {
        let (hook, log) = build_hook(
            "M  one.md\nM  two.md\nM  three.md\n",
            Some("two.md"),
            HookOptions::default(),
        );
        assert!(hook.run().is_err());
        assert_eq!(
            *log.borrow(),
            vec![
                Call::Status,
                Call::Rewrite("one.md".to_string()),
                Call::Stage("one.md".to_string()),
                Call::Rewrite("two.md".to_string()),
            ]
        );
    }

    #[test]
    fn staging_can_be_disabled() {
        let options = HookOptions {
            stage: false,
            ..HookOptions::default()
        };
        let (hook, log) = build_hook("M  one.md\n", None, options);
        hook.run().unwrap();
        assert_eq!(
            *log.borrow(),
            vec![Call::Status, Call::Rewrite("one.md".to_string())]
        );
    }

    #[test]
    fn raised_interrupt_stops_before_next_file() {
        let (hook, log) = build_hook("M  one.md\n", None, HookOptions::default());
        let hook = hook.with_interrupt(Arc::new(AtomicBool::new(true)));
        assert!(matches!(hook.run(), Err(Error::Interrupted)));
        assert_eq!(*log.borrow(), vec![Call::Status]);
    }

    #[test]
    fn custom_extension() {
        let options = HookOptions {
            extension: "markdown".to_string(),
            ..HookOptions::default()
        };
        let (hook, _log) = build_hook("M  a.md\nM  b.markdown\n", None, options);
        assert_eq!(
            hook.changes().unwrap(),
            vec![ChangeEntry::Modified("b.markdown".to_string())]
        );
    }
}
