use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;

use logtally::generator::{generate_file, GeneratorConfig};
use logtally::logging::init_logging;

/// Generate a synthetic access log in the format logtally reads
#[derive(Parser, Debug)]
#[command(name = "logtally-gen")]
#[command(version)]
struct Args {
    /// Output file
    #[arg(short = 'o', long = "output", default_value = "access.log")]
    output: PathBuf,

    /// Minimum size in GiB
    #[arg(long = "size-gb", default_value_t = 1.0)]
    size_gb: f64,

    /// Seed for reproducible output
    #[arg(long = "seed")]
    seed: Option<u64>,

    /// Spread dates over this many past days
    #[arg(long = "days-back", default_value_t = 60)]
    days_back: u32,

    /// Share of URLs that get a query string (0.0 to 1.0)
    #[arg(long = "query-prob", default_value_t = 0.35)]
    query_probability: f64,

    /// Log progress every N MiB
    #[arg(long = "progress-mb", default_value_t = 100)]
    progress_mb: u64,

    /// Increase log verbosity
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let args = Args::parse();
    // Progress is reported at info level
    init_logging(args.verbose.max(1), false);

    if let Err(e) = run(&args) {
        eprintln!("logtally-gen: Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    if !(args.size_gb.is_finite() && args.size_gb > 0.0) {
        bail!("--size-gb must be a positive number");
    }
    if !(0.0..=1.0).contains(&args.query_probability) {
        bail!("--query-prob must be between 0 and 1");
    }

    let config = GeneratorConfig {
        target_bytes: (args.size_gb * 1024f64.powi(3)) as u64,
        seed: args.seed,
        days_back: args.days_back,
        query_probability: args.query_probability,
        progress_every_bytes: args.progress_mb.max(1) * 1024 * 1024,
        ..Default::default()
    };

    let started = Instant::now();
    let summary = generate_file(&args.output, &config)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    println!(
        "Generated {} ({} lines, {:.3} GiB) in {:.1}s",
        args.output.display(),
        summary.lines,
        summary.bytes as f64 / 1024f64.powi(3),
        started.elapsed().as_secs_f64()
    );
    Ok(())
}
