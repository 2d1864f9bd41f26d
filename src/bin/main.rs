use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use toc_hook::{self, ChangeEntry, HookOptions};
use tracing::{debug, error, level_filters::LevelFilter, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Defaults to `run` when omitted, which is how Git invokes the hook
    #[command(subcommand)]
    command: Option<Command>,

    /// Path inside the Git repository
    #[arg(global = true, short = 'C', long, default_value = ".")]
    repo: PathBuf,

    /// Log level
    #[arg(global = true, short, long, default_value = "warn")]
    log: LevelFilter,
}

#[derive(Subcommand)]
enum Command {
    /// Update and re-stage the TOC of every staged file
    Run(RunArgs),
    /// List the files the hook would update, without running the TOC tool
    List(ListArgs),
    /// Install the pre-commit hook into the repository
    Install(InstallArgs),
}

#[derive(Args, Debug, PartialEq, Eq)]
struct RunArgs {
    /// TOC-rewriting executable, resolved on PATH
    #[arg(short, long, default_value = toc_hook::DEFAULT_TOOL)]
    tool: String,

    #[command(flatten)]
    filter: FilterArgs,

    /// Rewrite files without re-adding them to the index
    #[arg(long)]
    no_stage: bool,
}

#[derive(Args, Debug, PartialEq, Eq)]
struct FilterArgs {
    /// File extension to update
    #[arg(short, long, default_value = "md")]
    extension: String,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            tool: toc_hook::DEFAULT_TOOL.to_string(),
            filter: FilterArgs {
                extension: "md".to_string(),
            },
            no_stage: false,
        }
    }
}

#[derive(Args)]
struct ListArgs {
    #[command(flatten)]
    filter: FilterArgs,

    /// Print entries as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct InstallArgs {
    /// TOC-rewriting executable the hook should call
    #[arg(short, long, default_value = toc_hook::DEFAULT_TOOL)]
    tool: String,

    /// Replace an existing pre-commit hook
    #[arg(short, long)]
    force: bool,
}

fn print_processed(changes: &[ChangeEntry]) {
    if changes.is_empty() {
        return;
    }
    println!("Updated table of contents in {} file(s):", changes.len());
    for change in changes {
        println!("  ~ {}", change.path());
    }
}

fn print_listing(changes: &[ChangeEntry], json: bool) -> toc_hook::Result<()> {
    if json {
        let rendered = serde_json::to_string_pretty(changes)
            .map_err(|e| toc_hook::Error::IoError(e.into()))?;
        println!("{rendered}");
        return Ok(());
    }
    for change in changes {
        println!("{:<8} {}", change.status().as_str(), change.path());
    }
    Ok(())
}

fn dispatch(cli: Cli, interrupted: Arc<AtomicBool>) -> toc_hook::Result<()> {
    match cli.command {
        Some(Command::List(args)) => {
            let changes = toc_hook::list_changes(&cli.repo, &args.filter.extension)?;
            print_listing(&changes, args.json)
        }
        Some(Command::Install(args)) => {
            let path = toc_hook::install(&cli.repo, &args.tool, args.force)?;
            println!("Installed pre-commit hook at {}", path.display());
            Ok(())
        }
        Some(Command::Run(args)) => run_hook(&cli.repo, args, interrupted),
        None => run_hook(&cli.repo, RunArgs::default(), interrupted),
    }
}

fn run_hook(
    repo: &std::path::Path,
    args: RunArgs,
    interrupted: Arc<AtomicBool>,
) -> toc_hook::Result<()> {
    let options = HookOptions {
        extension: args.filter.extension,
        stage: !args.no_stage,
    };
    let hook = toc_hook::new(repo, &args.tool, options)?.with_interrupt(interrupted);
    let processed = hook.run()?;
    print_processed(&processed);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let env_filter = EnvFilter::from_default_env().add_directive(cli.log.into());

    fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(true)
        .init();

    // Ctrl-C stops the run before the next file
    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current file");
            flag.store(true, Ordering::SeqCst);
        }
    });

    let result = match tokio::task::spawn_blocking(move || dispatch(cli, interrupted)).await {
        Ok(result) => result,
        Err(join_error) => {
            error!(error = %join_error, "Hook task panicked");
            return ExitCode::FAILURE;
        }
    };

    match result {
        Ok(()) => {
            debug!("Done");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err}");
            let code = u8::try_from(err.exit_code()).unwrap_or(1);
            ExitCode::from(code)
        }
    }
}
