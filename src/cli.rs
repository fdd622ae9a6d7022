// Command-line interface definition for the logtally binary

use clap::{ArgAction, Parser};
use std::path::PathBuf;

use logtally::config::DEFAULT_BATCH_SIZE;
use logtally::ProcessConfig;

#[derive(Parser, Debug)]
#[command(name = "logtally")]
#[command(about = "Streaming access-log analysis: error and slow-request hot spots")]
#[command(
    long_about = "Streaming access-log analysis: error and slow-request hot spots\n\nReads an access log in batches, counts requests that hit the target status codes\nor exceed the slow threshold, and reports the URLs responsible.\nGzip and zstd compressed input is detected automatically.\n\nLINE FORMAT:\n  IP - - [DATE] \"METHOD URL\" STATUS RESPONSE_TIME_MS\n\nCOMMON EXAMPLES:\n  logtally access.log\n  logtally access.log.gz --status 502,503,504 -j 8\n  logtally access.log --slow-threshold 1000 --json-out summary.json"
)]
#[command(version)]
#[command(args_override_self = true)]
pub struct Cli {
    /// Access log to analyse (plain, gzip or zstd)
    pub file: Option<PathBuf>,

    /// Lines per batch handed to a worker
    #[arg(
        long = "batch-size",
        default_value_t = DEFAULT_BATCH_SIZE,
        help_heading = "Processing Options"
    )]
    pub batch_size: usize,

    /// Requests slower than this many milliseconds count as slow
    #[arg(
        long = "slow-threshold",
        value_name = "MS",
        default_value_t = 200,
        help_heading = "Processing Options"
    )]
    pub slow_threshold: u64,

    /// Target status codes (repeatable, or comma-separated)
    #[arg(
        long = "status",
        value_name = "CODE",
        value_delimiter = ',',
        default_value = "500",
        help_heading = "Processing Options"
    )]
    pub status: Vec<u16>,

    /// Worker threads (default: number of CPUs)
    #[arg(short = 'j', long = "workers", help_heading = "Performance Options")]
    pub workers: Option<usize>,

    /// Write the result as JSON to this path
    #[arg(long = "json-out", value_name = "PATH", help_heading = "Output Options")]
    pub json_out: Option<PathBuf>,

    /// Do not print the summary
    #[arg(short = 'q', long = "quiet", help_heading = "Output Options")]
    pub quiet: bool,

    /// Print a throughput line after the summary
    #[arg(long = "stats", help_heading = "Metrics and Stats")]
    pub stats: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, help_heading = "Output Options")]
    pub verbose: u8,

    /// Specify custom configuration file path
    #[arg(long = "config-file", value_name = "PATH", help_heading = "Configuration Options")]
    pub config_file: Option<PathBuf>,

    /// Ignore configuration files
    #[arg(long = "ignore-config", help_heading = "Configuration Options")]
    pub ignore_config: bool,

    /// Show the active configuration and search locations, then exit
    #[arg(long = "show-config", help_heading = "Configuration Options")]
    pub show_config: bool,

    /// Use alias from configuration file
    #[arg(short = 'a', long = "alias", value_name = "NAME", help_heading = "Configuration Options")]
    pub alias: Vec<String>,
}

impl Cli {
    /// Library configuration for `file`
    pub fn to_process_config(&self, file: PathBuf) -> ProcessConfig {
        let mut config = ProcessConfig::new(file)
            .with_batch_size(self.batch_size)
            .with_slow_threshold_ms(self.slow_threshold)
            .with_status_codes(self.status.clone());
        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        config
    }
}

/// Value of `--config-file` before clap has seen the arguments
pub fn extract_config_file_arg(args: &[String]) -> Option<PathBuf> {
    args.iter().enumerate().find_map(|(i, arg)| {
        if arg == "--config-file" {
            args.get(i + 1).map(PathBuf::from)
        } else {
            arg.strip_prefix("--config-file=").map(PathBuf::from)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["logtally", "access.log"]);
        assert_eq!(cli.batch_size, 10_000);
        assert_eq!(cli.slow_threshold, 200);
        assert_eq!(cli.status, vec![500]);
        assert_eq!(cli.workers, None);
        assert!(!cli.quiet);

        let config = cli.to_process_config(PathBuf::from("access.log"));
        assert_eq!(config, ProcessConfig::new("access.log"));
    }

    #[test]
    fn test_status_list_forms() {
        let cli = Cli::parse_from([
            "logtally", "a.log", "--status", "502,503", "--status", "504", "-j", "3", "-vv",
        ]);
        assert_eq!(cli.status, vec![502, 503, 504]);
        assert_eq!(cli.workers, Some(3));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_rejects_non_numeric_status() {
        assert!(Cli::try_parse_from(["logtally", "a.log", "--status", "abc"]).is_err());
    }

    #[test]
    fn test_extract_config_file_arg() {
        let args: Vec<String> = ["logtally", "--config-file", "rc.ini", "a.log"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(extract_config_file_arg(&args), Some(PathBuf::from("rc.ini")));

        let args = vec!["logtally".to_string(), "--config-file=x.ini".to_string()];
        assert_eq!(extract_config_file_arg(&args), Some(PathBuf::from("x.ini")));
        assert_eq!(extract_config_file_arg(&args[..1]), None);
    }
}
