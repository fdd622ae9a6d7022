//! Run orchestration: validate, read and aggregate, reduce, finalize.

use std::fmt;
use std::io::BufRead;
use std::time::Instant;

use crate::aggregate::{aggregate_batch, MatchCriteria};
use crate::config::{ProcessConfig, ResolvedConfig};
use crate::error::Result;
use crate::parallel::{ParallelConfig, ParallelProcessor};
use crate::reader::BatchReader;
use crate::reduce::try_reduce_partials;
use crate::result::ProcessingResult;
use crate::stats::AggregateStats;
use crate::top::{top_n, top_one, TOP_LIST_LEN};

/// Lifecycle of a single run. Transitions only move forward.
///
/// Partials are folded while batches are still being read, so
/// `ReadingAggregating` covers both the map stage and the running reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineState {
    Idle,
    ReadingAggregating,
    /// Input drained and every partial folded; the totals are being finalized
    Reducing,
    Finalized,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::ReadingAggregating => "reading/aggregating",
            PipelineState::Reducing => "reducing",
            PipelineState::Finalized => "finalized",
        };
        f.write_str(name)
    }
}

pub struct Pipeline {
    config: ResolvedConfig,
    state: PipelineState,
}

impl Pipeline {
    /// Validates the configuration; nothing is opened yet
    pub fn new(config: &ProcessConfig) -> Result<Self> {
        let config = config.resolve()?;
        Ok(Self {
            config,
            state: PipelineState::Idle,
        })
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn workers(&self) -> usize {
        self.config.workers
    }

    fn transition(&mut self, next: PipelineState) {
        debug_assert!(next > self.state, "{} -> {}", self.state, next);
        tracing::debug!(from = %self.state, to = %next, "pipeline state");
        self.state = next;
    }

    /// Open the configured input and run to completion. The elapsed time
    /// includes opening the input.
    pub fn run(self) -> Result<ProcessingResult> {
        let started = Instant::now();
        let reader = BatchReader::open(&self.config.input_path, self.config.batch_size)?;
        self.run_since(reader, started)
    }

    /// Run against an already opened batch reader
    pub fn run_with_reader<R>(self, reader: BatchReader<R>) -> Result<ProcessingResult>
    where
        R: BufRead + Send + 'static,
    {
        self.run_since(reader, Instant::now())
    }

    fn run_since<R>(
        mut self,
        reader: BatchReader<R>,
        started: Instant,
    ) -> Result<ProcessingResult>
    where
        R: BufRead + Send + 'static,
    {
        tracing::info!(
            input = %self.config.input_path.display(),
            batch_size = self.config.batch_size,
            workers = self.config.workers,
            "processing started"
        );

        self.transition(PipelineState::ReadingAggregating);
        let aggregate = if self.config.workers <= 1 {
            aggregate_sequential(reader, &self.config.criteria)?
        } else {
            let processor =
                ParallelProcessor::new(ParallelConfig::with_workers(self.config.workers));
            processor.process(reader, &self.config.criteria)?
        };

        self.transition(PipelineState::Reducing);
        debug_assert!(aggregate.is_consistent());

        let result = self.finalize(&aggregate, started.elapsed().as_secs_f64());
        self.transition(PipelineState::Finalized);

        tracing::info!(
            total_lines = result.total_lines,
            bad_lines = result.bad_lines,
            elapsed_seconds = result.elapsed_seconds,
            "processing finished"
        );
        Ok(result)
    }

    fn finalize(&self, aggregate: &AggregateStats, elapsed_seconds: f64) -> ProcessingResult {
        let criteria = &self.config.criteria;
        ProcessingResult {
            total_lines: aggregate.total_lines(),
            bad_lines: aggregate.bad_lines(),
            total_status: aggregate.total_status(),
            total_slow: aggregate.total_slow(),
            top_url_status: top_one(aggregate.status_by_url()),
            top_url_slow: top_one(aggregate.slow_by_url()),
            top_10_status: top_n(aggregate.status_by_url(), TOP_LIST_LEN),
            top_10_slow: top_n(aggregate.slow_by_url(), TOP_LIST_LEN),
            elapsed_seconds,
            status_code: criteria.status_codes()[0],
            status_codes: criteria.status_codes().to_vec(),
            slow_threshold: criteria.slow_threshold_ms(),
            batch_size: self.config.batch_size,
            workers: self.config.workers,
        }
    }
}

fn aggregate_sequential<R: BufRead>(
    reader: BatchReader<R>,
    criteria: &MatchCriteria,
) -> Result<AggregateStats> {
    try_reduce_partials(reader.map(|batch| {
        batch.map(|batch| {
            tracing::trace!(batch_id = batch.id, lines = batch.len(), "batch aggregated");
            aggregate_batch(&batch.lines[..], criteria)
        })
    }))
}

/// Process the configured log file end to end
pub fn process_log(config: &ProcessConfig) -> Result<ProcessingResult> {
    Pipeline::new(config)?.run()
}
