use anyhow::Context;
use clap::{Parser, Subcommand};
use deadwood::{analyze, Config};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "deadwood")]
#[command(about = "Static dead-code analysis for Python web applications", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a Python source tree and emit the candidate report.
    Scan {
        /// Project root to analyse.
        path: PathBuf,
        /// JSON configuration document.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write the JSON report to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Print a human summary to stderr as well.
        #[arg(long)]
        summary: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Scan {
            path,
            config,
            output,
            summary,
        } => cmd_scan(path, config.as_deref(), output.as_deref(), *summary),
    }
}

fn cmd_scan(
    path: &Path,
    config_path: Option<&Path>,
    output: Option<&Path>,
    summary: bool,
) -> anyhow::Result<()> {
    let config = match config_path {
        Some(config_path) => Config::from_json_file(config_path)?,
        None => Config::default_config(),
    };

    let report = analyze(path, &config)?;
    let json = report.to_json().context("serializing report")?;

    match output {
        Some(output) => {
            std::fs::write(output, &json)
                .with_context(|| format!("writing {}", output.display()))?;
            tracing::info!(path = %output.display(), "report written");
        }
        None => println!("{json}"),
    }

    if summary {
        eprintln!("+------------------------------------------+");
        eprintln!("| DEADWOOD SCAN                            |");
        eprintln!("+------------------------------------------+");
        eprintln!("| Total symbols  : {:>22} |", report.summary.total);
        eprintln!("| High (delete)  : {:>22} |", report.summary.high);
        eprintln!("| Medium (review): {:>22} |", report.summary.medium);
        eprintln!("| Low (keep)     : {:>22} |", report.summary.low);
        eprintln!("| Orphan files   : {:>22} |", report.summary.orphaned_files);
        eprintln!("| Entrypoints    : {:>22} |", report.entrypoints.len());
        eprintln!("+------------------------------------------+");

        for item in report.items.iter().filter(|i| i.confidence >= 80).take(20) {
            eprintln!(
                "  {:>3}  {}:{}  {} ({})",
                item.confidence, item.file, item.line, item.qualified_name, item.item_type
            );
        }
        if !report.diagnostics.is_empty() {
            eprintln!("  {} diagnostic(s); see report", report.diagnostics.len());
        }
    }

    Ok(())
}
