//! commitline - CLI entry point.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use commitline::backend::{BackendKind, first_enabled};
use commitline::commit::{
    AutoConfirmer, Confirmer, TerminalConfirmer, commit_staged, generate_commit_message,
    open_repository, staged_diff,
};
use commitline::config::{ConfigStore, resolve_config_path};

/// Generate a Conventional Commit message for the staged changes with an LLM.
#[derive(Parser, Debug)]
#[command(name = "commitline")]
#[command(about = "Generate a Conventional Commit message for the staged changes with an LLM")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to the LLM config file (default: .commitline/llm.config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a config file with the local Ollama backend enabled
    Setup {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Generate a message for the staged changes and commit them (default)
    Commit(CommitArgs),

    /// List backends in selection order
    Backends,
}

#[derive(Args, Debug, Default)]
struct CommitArgs {
    /// Accept the first well-formed message without asking
    #[arg(short, long)]
    yes: bool,

    /// Print the accepted message instead of committing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = resolve_config_path(cli.config);
    debug!("Using config file {}", config_path.display());

    match cli.command.unwrap_or(Command::Commit(CommitArgs::default())) {
        // Setup never parses the old file so it can replace a broken one.
        Command::Setup { force } => run_setup(&mut ConfigStore::unloaded(config_path), force),
        Command::Commit(args) => run_commit(&load_store(config_path)?, args).await,
        Command::Backends => run_backends(&load_store(config_path)?),
    }
}

fn load_store(path: PathBuf) -> Result<ConfigStore> {
    ConfigStore::load(path).context("Failed to load LLM config")
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "commitline=debug" } else { "warn" })
    });

    tracing_subscriber::fmt()
        .without_time()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .init();
}

fn run_setup(store: &mut ConfigStore, force: bool) -> Result<()> {
    store
        .init_default(force)
        .context("Failed to write default config")?;
    println!("Wrote {} with the local Ollama backend enabled.", store.path().display());
    Ok(())
}

async fn run_commit(store: &ConfigStore, args: CommitArgs) -> Result<()> {
    let repo = open_repository(Path::new("."))
        .context("Not a git repository. Run commitline from within a git repository.")?;

    let diff = staged_diff(&repo).context("Failed to read staged changes")?;
    if diff.trim().is_empty() {
        println!("No staged changes");
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let confirmer: Box<dyn Confirmer> = if args.yes {
        Box::new(AutoConfirmer)
    } else {
        Box::new(TerminalConfirmer)
    };

    println!("Generating commit message...");
    let outcome = match generate_commit_message(store, &diff, confirmer.as_ref(), &cancel).await {
        Ok(outcome) => outcome,
        Err(e) if e.is_cancelled() => bail!("Cancelled"),
        Err(e) => return Err(e).context("Failed to generate commit message"),
    };

    if args.dry_run {
        println!("{}", outcome.message);
        return Ok(());
    }

    let oid = commit_staged(&repo, &outcome.message).context("Failed to create commit")?;
    let oid = oid.to_string();
    println!(
        "[{}] {} (via {})",
        &oid[..7.min(oid.len())],
        outcome.message,
        outcome.backend
    );
    Ok(())
}

fn run_backends(store: &ConfigStore) -> Result<()> {
    let config = store.config()?;
    let selected = first_enabled(config);

    println!("Config: {}", store.path().display());
    for (i, kind) in BackendKind::PRIORITY.iter().enumerate() {
        let record = config.record(*kind);
        let marker = if selected == Some(*kind) { "*" } else { " " };
        let state = if record.enabled { "enabled" } else { "disabled" };
        println!(
            "{} {}. {:<10} {:<9} {}",
            marker,
            i + 1,
            kind.as_str(),
            state,
            record.model.as_deref().unwrap_or("-")
        );
    }

    if selected.is_none() {
        println!("No backend is enabled.");
    }
    Ok(())
}
