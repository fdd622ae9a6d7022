//! Type definitions for parallel processing
//!
//! Contains the pool configuration and the messages passed between threads.

use crate::error::ProcessError;
use crate::stats::PartialStats;

/// Configuration for parallel processing
#[derive(Debug, Clone)]
pub struct ParallelConfig {
    pub num_workers: usize,
    /// Capacity of the batch and result channels; `None` means 2 × workers
    pub buffer_size: Option<usize>,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            num_workers: num_cpus::get(),
            buffer_size: None,
        }
    }
}

impl ParallelConfig {
    pub fn with_workers(num_workers: usize) -> Self {
        Self {
            num_workers,
            ..Default::default()
        }
    }

    pub(crate) fn effective_workers(&self) -> usize {
        self.num_workers.max(1)
    }

    /// Bounds how far the reader can run ahead of the reducer
    pub(crate) fn channel_capacity(&self) -> usize {
        self.buffer_size
            .unwrap_or_else(|| self.effective_workers() * 2)
            .max(1)
    }
}

/// Result of aggregating one batch on a worker
#[derive(Debug)]
pub(crate) struct BatchOutcome {
    pub batch_id: u64,
    pub worker_id: usize,
    pub lines: usize,
    pub stats: PartialStats,
}

/// Everything the reducer receives: a finished batch or a fatal error from
/// the reader or a worker
pub(crate) type WorkerMessage = Result<BatchOutcome, ProcessError>;
