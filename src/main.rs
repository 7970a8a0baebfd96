//! Shopping Insights: runs one analysis over the shopping dataset
//!
//! This is the main entrypoint that orchestrates loading, the selected
//! analysis, report printing and chart rendering.

use anyhow::{Context, Result};
use clap::Parser;
use shopping_insights::{analysis, load_transactions, viz, Args};
use std::time::Instant;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();
    init_logging(args.verbose);

    let start_time = Instant::now();

    // Step 1: Load data
    let table = load_transactions(&args.input).context("could not load the shopping dataset")?;
    debug!(elapsed = ?start_time.elapsed(), "dataset loaded");

    // Step 2: Run the selected analysis
    let report = analysis::run(args.task, &table, &args.run_options())
        .with_context(|| format!("{:?} analysis failed", args.task))?;
    println!("{report}");

    // Step 3: Render charts
    if args.no_plot {
        debug!("chart rendering disabled");
    } else {
        for chart in report.charts() {
            let path = viz::render(&chart, &args.output_dir)?;
            println!("Chart saved to: {}", path.display());
        }
    }

    info!(
        task = ?args.task,
        elapsed_secs = start_time.elapsed().as_secs_f64(),
        "analysis complete"
    );
    Ok(())
}

/// Log to stderr; `RUST_LOG` overrides the level picked by `--verbose`
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
