mod catalog;
mod parser;
mod settings;
mod source;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::info;

use catalog::merge::{self, MergeMode};
use catalog::report::Summary;
use settings::Settings;

#[derive(Parser)]
#[command(name = "bots_catalog", about = "Build the bots catalog JSON from the metadata Word document")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse the document and merge it into the catalog JSON
    Sync {
        /// Source document (.docx, or plain text with one paragraph per line)
        #[arg(long)]
        doc: Option<PathBuf>,
        /// Catalog JSON to update
        #[arg(long)]
        json: Option<PathBuf>,
        /// Parse and merge without writing anything
        #[arg(long)]
        dry_run: bool,
        /// Ignore the existing catalog and write only what the document holds
        #[arg(long, conflicts_with = "update_only")]
        fresh: bool,
        /// Only update bots already present in the catalog
        #[arg(long)]
        update_only: bool,
    },
    /// Field coverage summary of a catalog JSON
    Report {
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Write a catalog JSON back out as marker text
    Render {
        #[arg(long)]
        json: Option<PathBuf>,
        /// Output file (default: stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;

    let result = match cli.command {
        Commands::Sync {
            doc,
            json,
            dry_run,
            fresh,
            update_only,
        } => sync(
            &settings,
            SyncOptions {
                doc: doc.unwrap_or_else(|| settings.doc_path.clone()),
                json: json.unwrap_or_else(|| settings.json_path.clone()),
                dry_run,
                fresh,
                update_only,
            },
        ),
        Commands::Report { json } => {
            let json = json.unwrap_or_else(|| settings.json_path.clone());
            let root = merge::load_catalog(&json)?;
            Summary::from_catalog(&root, &settings.labels).print();
            Ok(())
        }
        Commands::Render { json, out } => {
            let json = json.unwrap_or_else(|| settings.json_path.clone());
            let root = merge::load_catalog(&json)?;
            let text = catalog::render::render(&root, &settings.labels);
            match out {
                Some(path) => {
                    std::fs::write(&path, text)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Wrote {}", path.display());
                }
                None => print!("{}", text),
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

struct SyncOptions {
    doc: PathBuf,
    json: PathBuf,
    dry_run: bool,
    fresh: bool,
    update_only: bool,
}

fn sync(settings: &Settings, opts: SyncOptions) -> anyhow::Result<()> {
    let SyncOptions {
        doc,
        json,
        dry_run,
        fresh,
        update_only,
    } = opts;
    if !doc.exists() {
        bail!("Document not found: {}", doc.display());
    }

    let source = source::open(&doc);
    let paragraphs = source
        .iterate()
        .with_context(|| format!("Failed to read {}", source.path().display()))?;
    info!(paragraphs = paragraphs.len(), doc = %doc.display(), "read document");

    let parsed = parser::parse_paragraphs(&paragraphs, &settings.labels)?;
    if parsed.catalog.packages.is_empty() {
        bail!("No packages found in {}", doc.display());
    }
    println!(
        "Parsed {} packages, {} categories, {} bots",
        parsed.catalog.packages.len(),
        parsed.catalog.category_count(),
        parsed.catalog.bot_count()
    );
    parsed.stats.print();

    let (baseline, mode) = if fresh {
        (Value::Null, MergeMode::Additive)
    } else if update_only {
        (merge::load_catalog(&json)?, MergeMode::UpdateExisting)
    } else {
        (merge::load_catalog_or_empty(&json), MergeMode::Additive)
    };
    let (merged, stats) = merge::merge(baseline, &parsed.catalog, &settings.labels.keys, mode);
    stats.print();

    if dry_run {
        let packages = merged
            .get("packages")
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        println!(
            "Dry run: would write {} packages, {} bots to {}",
            packages,
            catalog::json_bot_count(&merged),
            json.display()
        );
    } else {
        merge::write_catalog(&json, &merged)?;
        println!("Wrote {}", json.display());
        println!();
        Summary::from_catalog(&merged, &settings.labels).print();
    }
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
