//! rowsync CLI
//!
//! Two subcommands mirror the two halves of the toolkit:
//!
//! - `rowsync diff` fetches one table from two sources, reconciles the
//!   snapshots by the declared key columns, and writes a CSV diff report.
//! - `rowsync generate` reads a row-specification file and writes one
//!   transactional SQL block per table group.

use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use rowsync_core::normalize::StripMode;
use rowsync_core::source::{SourceConfig, SourceFetcher};
use rowsync_reconcile::{write_csv, Reconciler};
use rowsync_sqlgen::{parse_spec_text, Synthesizer};
use rowsync_sqlite::SqliteFetcher;

/// Keyed-row reconciliation and DML synthesis.
#[derive(Parser)]
#[command(name = "rowsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare one table across two sources and report the differences.
    Diff {
        /// Left database URL (SQLite path or connection string).
        #[arg(long, env = "ROWSYNC_LEFT_URL")]
        left: String,

        /// Right database URL.
        #[arg(long, env = "ROWSYNC_RIGHT_URL")]
        right: String,

        /// Table to compare.
        #[arg(short, long)]
        table: String,

        /// Comma-separated key column names, e.g. `ID` or `ID,PRIVILEGE_ID`.
        #[arg(short, long)]
        key: String,

        /// Compare text values exactly instead of stripping whitespace.
        #[arg(long)]
        keep_spaces: bool,

        /// Output CSV file (stdout if omitted).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write a JSON summary of the diff counts to this file.
        #[arg(long)]
        summary_json: Option<PathBuf>,
    },

    /// Generate transactional SQL blocks from a row-specification file.
    Generate {
        /// Database URL of the source of truth.
        #[arg(short, long, env = "DATABASE_URL")]
        database: String,

        /// Row-specification input file.
        #[arg(short, long, default_value = "input.txt")]
        input: PathBuf,

        /// Directory for the generated `{index}.{TABLE}.sql` files.
        #[arg(short, long, default_value = "out")]
        output_dir: PathBuf,

        /// Number of scratch CLOB variables per block.
        #[arg(long, default_value_t = 3)]
        pool_size: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Diff {
            left,
            right,
            table,
            key,
            keep_spaces,
            output,
            summary_json,
        } => diff(left, right, table, key, keep_spaces, output, summary_json).await,

        Commands::Generate {
            database,
            input,
            output_dir,
            pool_size,
        } => generate(database, input, output_dir, pool_size).await,
    }
}

#[allow(clippy::too_many_arguments)]
async fn diff(
    left_url: String,
    right_url: String,
    table: String,
    key: String,
    keep_spaces: bool,
    output: Option<PathBuf>,
    summary_json: Option<PathBuf>,
) -> anyhow::Result<()> {
    let key_columns: Vec<String> = key
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    anyhow::ensure!(!key_columns.is_empty(), "at least one key column is required");

    let left_fetcher = SqliteFetcher::connect(&SourceConfig::new(&left_url))
        .await
        .with_context(|| format!("failed to connect to left source {left_url}"))?;
    let right_fetcher = SqliteFetcher::connect(&SourceConfig::new(&right_url))
        .await
        .with_context(|| format!("failed to connect to right source {right_url}"))?;

    info!(table = %table, "fetching snapshots");
    let (left_rows, right_rows) = tokio::join!(
        left_fetcher.fetch_all(&table),
        right_fetcher.fetch_all(&table)
    );
    let left_rows = left_rows.context("left snapshot fetch failed")?;
    let right_rows = right_rows.context("right snapshot fetch failed")?;

    let strip_mode = if keep_spaces {
        StripMode::Preserve
    } else {
        StripMode::Strip
    };
    let reconciler = Reconciler::new(key_columns).strip_mode(strip_mode);

    let left_map = reconciler.index(left_rows)?;
    let right_map = reconciler.index(right_rows)?;
    if left_map.duplicate_keys() + right_map.duplicate_keys() > 0 {
        warn!(
            left = left_map.duplicate_keys(),
            right = right_map.duplicate_keys(),
            "duplicate keys found while indexing snapshots"
        );
    }

    let report = reconciler.reconcile(&left_map, &right_map);
    info!(
        diffs = report.mismatch_count(),
        missing_in_right = report.missing_in_right_count(),
        missing_in_left = report.missing_in_left_count(),
        "reconciliation complete"
    );

    match output {
        Some(path) => {
            let file = fs::File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            write_csv(&report, file)?;
            info!(path = %path.display(), "report written");
        }
        None => write_csv(&report, io::stdout())?,
    }

    if let Some(path) = summary_json {
        let summary = serde_json::json!({
            "table": table,
            "diffs": report.mismatch_count(),
            "missing_in_right": report.missing_in_right_count(),
            "missing_in_left": report.missing_in_left_count(),
            "duplicate_keys": left_map.duplicate_keys() + right_map.duplicate_keys(),
        });
        fs::write(&path, serde_json::to_string_pretty(&summary)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "summary written");
    }
    Ok(())
}

async fn generate(
    database: String,
    input: PathBuf,
    output_dir: PathBuf,
    pool_size: usize,
) -> anyhow::Result<()> {
    let text = fs::read_to_string(&input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let groups = parse_spec_text(&text)?;
    if groups.is_empty() {
        info!(path = %input.display(), "no table groups in input, nothing to do");
        return Ok(());
    }

    let fetcher = SqliteFetcher::connect(&SourceConfig::new(&database))
        .await
        .with_context(|| format!("failed to connect to {database}"))?;

    fs::create_dir_all(&output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let synthesizer = Synthesizer::new().pool_size(pool_size);
    for (index, group) in groups.iter().enumerate() {
        let output = synthesizer.synthesize_group(&fetcher, group).await?;
        for diagnostic in &output.diagnostics {
            eprintln!("warning: {diagnostic}");
        }

        let path = output_dir.join(format!("{}.{}.sql", index + 1, group.table));
        fs::write(&path, output.block.render() + "\n")
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(
            path = %path.display(),
            statements = output.block.statement_count(),
            "block written"
        );
    }
    Ok(())
}
