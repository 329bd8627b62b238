//! Catalog harvester CLI.
//!
//! `harvest` scrapes the catalog into a per-mode snapshot; `merge` combines
//! the primary and community snapshots into one catalog.

use anyhow::{Context, Result};
use catalog_harvester::merge::{load_snapshot, merge};
use catalog_harvester::snapshot::{write_json, write_snapshot};
use catalog_harvester::{HarvestConfig, HarvestMode, Harvester, SnapshotDocument};
use clap::{Args, Parser, Subcommand, ValueEnum};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Color, Table};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Rows shown in the post-run summary table.
const SUMMARY_ROWS: usize = 20;

#[derive(Parser, Debug)]
#[command(name = "catalog-harvester", version)]
#[command(about = "Harvest the public model catalog into JSON snapshots")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Harvest the catalog into a snapshot
    Harvest(HarvestArgs),
    /// Merge the primary and community snapshots
    ///
    /// Either snapshot may be missing, but not both. Two snapshots carrying the
    /// same mode tag are rejected, since their models could not be told apart.
    Merge(MergeArgs),
}

#[derive(Args, Debug)]
struct HarvestArgs {
    /// Which identifiers to harvest
    #[arg(long, value_enum, default_value_t = ModeArg::Primary)]
    mode: ModeArg,

    /// Only harvest the first N candidates
    #[arg(long)]
    limit: Option<usize>,

    /// Snapshot path (ignored with --mode all)
    #[arg(long)]
    out: Option<PathBuf>,

    /// Artifacts harvested at once
    #[arg(long, default_value_t = 6)]
    concurrency: usize,

    /// Catalog site root
    #[arg(long)]
    base_url: Option<String>,

    /// Directory for the default output files
    #[arg(long, default_value = "out")]
    output_dir: PathBuf,
}

#[derive(Args, Debug)]
struct MergeArgs {
    /// Primary snapshot [default: out/models_primary.json]
    #[arg(long, alias = "official")]
    primary: Option<PathBuf>,

    /// Community snapshot [default: out/models_community.json]
    #[arg(long)]
    community: Option<PathBuf>,

    /// Merged catalog path [default: out/models.json]
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ModeArg {
    /// Identifiers without a namespace
    #[value(alias = "official")]
    Primary,
    /// Namespace-qualified identifiers
    Community,
    /// Both, as two separate runs
    All,
}

impl From<ModeArg> for HarvestMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Primary => HarvestMode::Primary,
            ModeArg::Community => HarvestMode::Community,
            ModeArg::All => HarvestMode::All,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .compact()
        .init();

    match cli.command {
        Command::Harvest(args) => run_harvest(args).await,
        Command::Merge(args) => run_merge(args),
    }
}

async fn run_harvest(args: HarvestArgs) -> Result<()> {
    let mut config = HarvestConfig::default()
        .with_concurrency(args.concurrency)
        .with_limit(args.limit)
        .with_output_dir(args.output_dir);
    if let Some(base_url) = args.base_url {
        config = config.with_base_url(base_url);
    }

    let mode = HarvestMode::from(args.mode);
    let mut out = args.out;
    if mode == HarvestMode::All && out.is_some() {
        warn!("--out is ignored with --mode all; writing the default per-mode files");
        out = None;
    }

    let harvester = Harvester::from_config(config).context("Failed to set up the HTTP client")?;

    let runs = match mode {
        HarvestMode::All => vec![HarvestMode::Primary, HarvestMode::Community],
        single => vec![single],
    };
    for run in runs {
        info!(mode = %run, "Starting harvest");
        let snapshot = harvester
            .run(run)
            .await
            .with_context(|| format!("{} harvest failed", run))?;

        let path = out
            .clone()
            .unwrap_or_else(|| harvester.config().snapshot_path(run));
        write_snapshot(&path, &snapshot)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        print_summary(&snapshot, &path);
    }

    Ok(())
}

fn run_merge(args: MergeArgs) -> Result<()> {
    let defaults = HarvestConfig::default();
    let primary_path = args
        .primary
        .unwrap_or_else(|| defaults.snapshot_path(HarvestMode::Primary));
    let community_path = args
        .community
        .unwrap_or_else(|| defaults.snapshot_path(HarvestMode::Community));
    let output = args.output.unwrap_or_else(|| defaults.merged_path());

    let merged = merge(load_snapshot(&primary_path), load_snapshot(&community_path))
        .context("Merge failed")?;
    write_json(&output, &merged).with_context(|| format!("Failed to write {}", output.display()))?;

    println!("Merged catalog written to {}", output.display());
    println!("  Total models: {}", merged.total_artifacts);
    for (source, summary) in &merged.sources {
        println!("  {}: {} models", source, summary.artifact_count);
    }
    Ok(())
}

fn print_summary(snapshot: &SnapshotDocument, path: &Path) {
    let failed = snapshot
        .artifacts
        .iter()
        .filter(|a| a.harvest_error.is_some())
        .count();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new(format!("Top {} ({})", SUMMARY_ROWS, snapshot.provenance_tag)).fg(Color::Cyan),
            Cell::new("Pulls").fg(Color::Cyan),
            Cell::new("Capabilities").fg(Color::Cyan),
            Cell::new("Variants").fg(Color::Cyan),
        ]);

    for artifact in snapshot.artifacts.iter().take(SUMMARY_ROWS) {
        let capabilities: Vec<&str> = artifact.capability_tags.iter().map(String::as_str).collect();
        table.add_row(vec![
            Cell::new(&artifact.identifier),
            Cell::new(
                artifact
                    .popularity_count
                    .map(|p| p.to_string())
                    .unwrap_or_default(),
            )
            .set_alignment(CellAlignment::Right),
            Cell::new(capabilities.join(",")),
            Cell::new(artifact.variant_count.unwrap_or(0)).set_alignment(CellAlignment::Right),
        ]);
    }

    println!("{table}");
    println!(
        "Wrote {} with {} models ({} failed) in {:.1}s",
        path.display(),
        snapshot.artifacts.len(),
        failed,
        snapshot.duration_seconds
    );
}
