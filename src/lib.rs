//! Streaming access-log analysis.
//!
//! A log file is read in fixed-size batches; each batch is mapped to partial
//! counters (optionally on a pool of worker threads) and the partials are
//! reduced into one aggregate, from which the top URLs are selected.
//!
//! ```no_run
//! use logtally::{process_log, ProcessConfig};
//!
//! let config = ProcessConfig::new("access.log").with_workers(4);
//! let result = process_log(&config)?;
//! println!("{}", result.format_summary());
//! # Ok::<(), logtally::ProcessError>(())
//! ```

pub mod aggregate;
pub mod config;
pub mod config_file;
pub mod decompression;
pub mod error;
pub mod generator;
pub mod job;
pub mod logging;
pub mod parallel;
pub mod parser;
pub mod pipeline;
pub mod reader;
pub mod reduce;
pub mod result;
pub mod stats;
pub mod top;

pub use aggregate::{aggregate_batch, MatchCriteria};
pub use config::ProcessConfig;
pub use error::{ProcessError, Result};
pub use job::{RunHandle, RunRecord, RunStatus};
pub use parser::{parse_line, LogRecord, ParseOutcome};
pub use pipeline::{process_log, Pipeline, PipelineState};
pub use reader::{Batch, BatchReader};
pub use reduce::{reduce_partials, try_reduce_partials};
pub use result::ProcessingResult;
pub use stats::{AggregateStats, PartialStats, UrlHistogram};
pub use top::{top_n, top_one};
