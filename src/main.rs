use anyhow::{Context, Result};
use clap::Parser;

use logtally::config_file::ConfigFile;
use logtally::logging::init_logging;
use logtally::pipeline::Pipeline;

mod cli;
mod platform;

use cli::{extract_config_file_arg, Cli};
use platform::{fail, ExitCode};

fn main() {
    let raw_args: Vec<String> = std::env::args().collect();

    let cli = match process_args_with_config(raw_args) {
        Ok(Some(cli)) => cli,
        Ok(None) => ExitCode::Success.exit(),
        Err(e) => fail(&e),
    };

    init_logging(cli.verbose, cli.quiet);

    match run(&cli) {
        Ok(()) => ExitCode::Success.exit(),
        Err(e) => fail(&e),
    }
}

/// Apply config-file defaults and aliases, then parse. `None` when the
/// invocation was fully handled (e.g. `--show-config`).
fn process_args_with_config(raw_args: Vec<String>) -> Result<Option<Cli>> {
    let config_file_path = extract_config_file_arg(&raw_args);
    let ignore_config = raw_args.iter().any(|arg| arg == "--ignore-config");
    let show_config = raw_args.iter().any(|arg| arg == "--show-config");

    if show_config {
        let (config, sources) = ConfigFile::load_with_custom_path(config_file_path.as_deref())
            .context("Config file error")?;
        print!("{}", config.describe(&sources));
        return Ok(None);
    }

    let processed_args = if ignore_config {
        raw_args
    } else {
        let (config, _) = ConfigFile::load_with_custom_path(config_file_path.as_deref())
            .context("Config file error")?;
        config.process_args(raw_args).context("Config error")?
    };

    // clap prints its own usage errors and exits with status 2
    Ok(Some(Cli::parse_from(processed_args)))
}

fn run(cli: &Cli) -> Result<()> {
    let Some(file) = cli.file.clone() else {
        eprintln!("logtally: Error: missing input FILE");
        eprintln!("Try 'logtally --help' for more information.");
        ExitCode::InvalidUsage.exit();
    };

    let config = cli.to_process_config(file);
    let pipeline = Pipeline::new(&config)?;
    tracing::debug!(?config, workers = pipeline.workers(), "configuration resolved");

    let result = pipeline.run()?;

    if let Some(path) = &cli.json_out {
        result.write_json(path)?;
        tracing::info!(path = %path.display(), "wrote JSON result");
    }

    if !cli.quiet {
        println!("{}", result.format_summary());
    }
    if cli.stats {
        eprintln!("{}", result.format_stats());
    }

    Ok(())
}
