//! cvcp-cli: offline driver for the CVCP credit-score registry.
//!
//! Previews scores for metric files, replays scripted registry calls against
//! a persisted state file, and inspects stored scores.

mod config;
mod script;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use cvcp_core::constants::{
    FRESHNESS_WINDOW_SECS, MAX_BATCH_SIZE, MAX_SCORE, MIN_SCORE, PROTOCOL_VERSION,
};
use cvcp_core::traits::{EventSink, ScoreCalculator};
use cvcp_core::types::{Address, BehavioralMetrics};
use cvcp_core::validation::{check_metric_bounds, data_quality_score};
use cvcp_registry::{FanoutSink, MemoryEventLog, Registry, TracingSink};
use cvcp_scoring::ScoringEngine;
use serde_json::json;
use tracing::info;

use crate::config::CliConfig;
use crate::script::Script;

/// CVCP registry command-line interface.
#[derive(Parser)]
#[command(name = "cvcp-cli", version, about = "Deterministic behavioral credit scoring")]
struct Cli {
    /// Configuration file (default: <config dir>/cvcp/cvcp.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log output format override ("text" or "json")
    #[arg(long, global = true)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate a score from a metrics JSON file without touching state.
    Preview(PreviewArgs),
    /// Execute a replay script against the registry state file.
    Replay(ReplayArgs),
    /// Show the stored score and history for a subject.
    Inspect(InspectArgs),
    /// Print protocol constants and the effective configuration.
    Info,
}

#[derive(Args)]
struct PreviewArgs {
    /// Path to a JSON-encoded metrics object.
    #[arg(short, long)]
    metrics: PathBuf,
}

#[derive(Args)]
struct ReplayArgs {
    /// Path to the replay script.
    #[arg(short, long)]
    script: PathBuf,

    /// State file (default from configuration).
    #[arg(long)]
    state: Option<PathBuf>,

    /// Owner for a new registry when no state file exists.
    #[arg(long)]
    owner: Option<Address>,

    /// Run without writing the resulting state back.
    #[arg(long)]
    dry_run: bool,

    /// Also log every emitted event at INFO.
    #[arg(long)]
    trace_events: bool,
}

#[derive(Args)]
struct InspectArgs {
    /// Subject address (0x-prefixed hex).
    subject: Address,

    /// State file (default from configuration).
    #[arg(long)]
    state: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = CliConfig::load(cli.config.as_deref())?;
    init_logging(
        cli.log_level.as_deref().unwrap_or(&cfg.log_level),
        cli.log_format.as_deref().unwrap_or(&cfg.log_format),
    );

    match cli.command {
        Commands::Preview(args) => cmd_preview(&args),
        Commands::Replay(args) => cmd_replay(&cfg, args),
        Commands::Inspect(args) => cmd_inspect(&cfg, &args),
        Commands::Info => cmd_info(&cfg),
    }
}

fn cmd_preview(args: &PreviewArgs) -> Result<()> {
    let raw = std::fs::read_to_string(&args.metrics)
        .with_context(|| format!("failed to read {}", args.metrics.display()))?;
    let metrics: BehavioralMetrics =
        serde_json::from_str(&raw).context("metrics file is not a valid metrics object")?;

    let preview = ScoringEngine::new().preview(&metrics);
    let report = json!({
        "preview": preview,
        "data_quality": data_quality_score(&metrics),
        "within_bounds": check_metric_bounds(&metrics).is_ok(),
        "content_hash": metrics.content_hash(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn cmd_replay(cfg: &CliConfig, args: ReplayArgs) -> Result<()> {
    let script = Script::from_path(&args.script)?;
    let state_path = args.state.unwrap_or_else(|| cfg.state_file.clone());

    let log = Arc::new(MemoryEventLog::new());
    let mut registry =
        open_or_create(cfg, &state_path, args.owner)?.with_sink(replay_sink(&log, args.trace_events));

    let outcomes = script.run(&mut registry, &log);
    let failed = outcomes.iter().filter(|o| o.error.is_some()).count();
    for outcome in &outcomes {
        println!("{}", serde_json::to_string(outcome)?);
    }
    info!(steps = outcomes.len(), failed, "replay finished");

    if args.dry_run {
        return Ok(());
    }
    save_state(&registry, &state_path)
}

fn replay_sink(log: &Arc<MemoryEventLog>, trace_events: bool) -> Arc<dyn EventSink> {
    if !trace_events {
        return log.clone();
    }
    Arc::new(FanoutSink::new().with(log.clone()).with(Arc::new(TracingSink)))
}

fn cmd_inspect(cfg: &CliConfig, args: &InspectArgs) -> Result<()> {
    let state_path = args.state.clone().unwrap_or_else(|| cfg.state_file.clone());
    let registry = load_state(&state_path)?;
    let report = json!({
        "subject": args.subject,
        "score": registry.get_score(&args.subject),
        "history": registry.get_history(&args.subject),
        "snapshot": registry.get_snapshot(&args.subject),
        "metadata": registry.get_update_metadata(&args.subject),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn cmd_info(cfg: &CliConfig) -> Result<()> {
    let report = json!({
        "protocol_version": PROTOCOL_VERSION,
        "score_range": [MIN_SCORE, MAX_SCORE],
        "freshness_window_secs": FRESHNESS_WINDOW_SECS,
        "max_batch_size": MAX_BATCH_SIZE,
        "registry": cfg.registry,
        "state_file": cfg.state_file,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn open_or_create(cfg: &CliConfig, path: &Path, owner: Option<Address>) -> Result<Registry> {
    if path.exists() {
        return load_state(path);
    }
    let owner = match (owner, cfg.owner.as_deref()) {
        (Some(o), _) => o,
        (None, Some(s)) => s
            .parse()
            .with_context(|| format!("configured owner {s:?} is not a valid address"))?,
        (None, None) => bail!("no state at {} and no owner given (--owner)", path.display()),
    };
    info!(%owner, path = %path.display(), "creating new registry");
    Registry::new(owner, cfg.registry).context("failed to create registry")
}

fn load_state(path: &Path) -> Result<Registry> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read state {}", path.display()))?;
    Registry::restore(&bytes).with_context(|| format!("corrupt state file {}", path.display()))
}

fn save_state(registry: &Registry, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let bytes = registry.export_state()?;
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, &bytes).with_context(|| format!("failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path).with_context(|| format!("failed to replace {}", path.display()))?;
    info!(path = %path.display(), bytes = bytes.len(), "state saved");
    Ok(())
}

/// Initialize the tracing subscriber.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_str));

    // Results go to stdout; logs stay on stderr.
    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
