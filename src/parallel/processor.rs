//! Main parallel processor
//!
//! Contains the ParallelProcessor struct that wires the reader thread, the
//! worker pool and the reducer together.

use crossbeam_channel::bounded;
use std::sync::Arc;
use std::thread;

use crate::aggregate::{aggregate_batch, MatchCriteria};
use crate::error::{ProcessError, Result};
use crate::reader::Batch;
use crate::reduce::try_reduce_partials;
use crate::stats::{AggregateStats, PartialStats};

use super::batching::reader_thread;
use super::types::ParallelConfig;
use super::worker::{panic_message, worker_thread};

/// Main parallel processor
pub struct ParallelProcessor {
    config: ParallelConfig,
}

impl ParallelProcessor {
    pub fn new(config: ParallelConfig) -> Self {
        Self { config }
    }

    pub fn num_workers(&self) -> usize {
        self.config.effective_workers()
    }

    /// Aggregate `batches` on the worker pool and reduce the partials on the
    /// calling thread as they complete.
    pub fn process<I>(&self, batches: I, criteria: &MatchCriteria) -> Result<AggregateStats>
    where
        I: Iterator<Item = Result<Batch>> + Send + 'static,
    {
        let criteria = Arc::new(criteria.clone());
        self.process_with(batches, move |lines: &[String]| {
            aggregate_batch(lines, &criteria)
        })
    }

    /// Same pipeline with a caller-supplied map function
    pub fn process_with<I, F>(&self, batches: I, map: F) -> Result<AggregateStats>
    where
        I: Iterator<Item = Result<Batch>> + Send + 'static,
        F: Fn(&[String]) -> PartialStats + Clone + Send + 'static,
    {
        let num_workers = self.config.effective_workers();
        let capacity = self.config.channel_capacity();

        let (batch_sender, batch_receiver) = bounded::<Batch>(capacity);
        let (result_sender, result_receiver) = bounded(capacity);

        tracing::debug!(num_workers, capacity, "starting worker pool");

        let mut worker_handles = Vec::with_capacity(num_workers);
        for worker_id in 0..num_workers {
            let batch_receiver = batch_receiver.clone();
            let result_sender = result_sender.clone();
            let map = map.clone();

            let handle = thread::Builder::new()
                .name(format!("logtally-worker-{}", worker_id))
                .spawn(move || worker_thread(worker_id, batch_receiver, result_sender, map))
                .map_err(|e| ProcessError::Worker {
                    worker_id,
                    message: format!("failed to spawn thread: {}", e),
                })?;
            worker_handles.push(handle);
        }
        // Workers own the only batch receivers from here on
        drop(batch_receiver);

        let reader_handle = {
            let error_sender = result_sender.clone();
            thread::Builder::new()
                .name("logtally-reader".to_string())
                .spawn(move || reader_thread(batches, batch_sender, error_sender))
                .map_err(|e| ProcessError::Worker {
                    worker_id: num_workers,
                    message: format!("failed to spawn reader thread: {}", e),
                })?
        };
        // The result stream ends once the reader and every worker have hung up
        drop(result_sender);

        let mut reduced_batches = 0u64;
        let mut reduced_lines = 0u64;
        let reduced = try_reduce_partials(result_receiver.iter().map(|message| {
            message.map(|outcome| {
                reduced_batches += 1;
                reduced_lines += outcome.lines as u64;
                tracing::trace!(
                    batch_id = outcome.batch_id,
                    worker_id = outcome.worker_id,
                    reduced_batches,
                    reduced_lines,
                    "batch reduced"
                );
                outcome.stats
            })
        }));
        // On error this unblocks any worker still trying to send
        drop(result_receiver);

        let read_batches = reader_handle.join().map_err(|payload| ProcessError::Worker {
            worker_id: num_workers,
            message: format!("reader thread panicked: {}", panic_message(payload.as_ref())),
        })?;

        let mut join_error = None;
        for (worker_id, handle) in worker_handles.into_iter().enumerate() {
            if let Err(payload) = handle.join() {
                join_error.get_or_insert(ProcessError::Worker {
                    worker_id,
                    message: format!("thread panicked: {}", panic_message(payload.as_ref())),
                });
            }
        }

        let aggregate = reduced?;
        if let Some(e) = join_error {
            return Err(e);
        }
        if reduced_batches != read_batches {
            // Every batch handed out must come back
            return Err(ProcessError::Worker {
                worker_id: num_workers,
                message: format!(
                    "{} of {} batches were not aggregated",
                    read_batches - reduced_batches,
                    read_batches
                ),
            });
        }

        tracing::debug!(reduced_batches, reduced_lines, "worker pool finished");
        Ok(aggregate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reduce::reduce_partials;

    fn sample_lines(n: usize) -> Vec<String> {
        (0..n)
            .map(|i| match i % 5 {
                0 => format!(r#"10.0.0.{} - - [d] "GET /a" 500 {}"#, i % 255, 150 + i % 100),
                1 => format!(r#"10.0.0.{} - - [d] "GET /b" 200 {}"#, i % 255, 300 + i % 7),
                2 => "broken".to_string(),
                3 => format!(r#"10.0.0.{} - - [d] "POST /u/{}" 500 900"#, i % 255, i % 13),
                _ => format!(r#"10.0.0.{} - - [d] "GET /c" 404 20"#, i % 255),
            })
            .collect()
    }

    fn batches(lines: &[String], size: usize) -> Vec<Result<Batch>> {
        lines
            .chunks(size)
            .enumerate()
            .map(|(id, chunk)| {
                Ok(Batch {
                    id: id as u64,
                    lines: chunk.to_vec(),
                })
            })
            .collect()
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let lines = sample_lines(1_000);
        let criteria = MatchCriteria::default();
        let expected = reduce_partials(std::iter::once(aggregate_batch(&lines[..], &criteria)));

        for workers in [1, 2, 4, 8] {
            for size in [1, 7, 64, 1_000] {
                let processor = ParallelProcessor::new(ParallelConfig::with_workers(workers));
                let actual = processor
                    .process(batches(&lines, size).into_iter(), &criteria)
                    .unwrap();
                assert_eq!(actual, expected, "workers={} batch_size={}", workers, size);
            }
        }
    }

    #[test]
    fn test_no_batches() {
        let processor = ParallelProcessor::new(ParallelConfig::with_workers(3));
        let result = processor
            .process(Vec::<Result<Batch>>::new().into_iter(), &MatchCriteria::default())
            .unwrap();
        assert_eq!(result, AggregateStats::new());
    }

    #[test]
    fn test_zero_workers_runs_one() {
        let processor = ParallelProcessor::new(ParallelConfig::with_workers(0));
        assert_eq!(processor.num_workers(), 1);
    }

    #[test]
    fn test_reader_error_aborts_run() {
        let lines = sample_lines(100);
        let mut input = batches(&lines, 10);
        input.insert(
            3,
            Err(ProcessError::io(
                "access.log",
                std::io::Error::other("read failed"),
            )),
        );

        let processor = ParallelProcessor::new(ParallelConfig::with_workers(2));
        let err = processor
            .process(input.into_iter(), &MatchCriteria::default())
            .unwrap_err();
        assert!(matches!(err, ProcessError::Io { .. }), "got {:?}", err);
    }

    #[test]
    fn test_reader_is_held_back_by_bounded_channels() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::time::Duration;

        const TOTAL: usize = 500;
        let workers = 2;
        let config = ParallelConfig::with_workers(workers);
        let capacity = config.channel_capacity();

        let pulled = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&pulled);
        let input = (0..TOTAL).map(move |id| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, ProcessError>(Batch {
                id: id as u64,
                lines: vec![r#"1.1.1.1 - - [d] "GET /a" 500 900"#.to_string()],
            })
        });

        // Workers block until the gate closes
        let (gate_tx, gate_rx) = crossbeam_channel::unbounded::<()>();
        let criteria = MatchCriteria::default();
        let run = thread::spawn(move || {
            ParallelProcessor::new(config).process_with(input, move |chunk: &[String]| {
                let _ = gate_rx.recv();
                aggregate_batch(chunk, &criteria)
            })
        });

        thread::sleep(Duration::from_millis(200));
        let in_flight = pulled.load(Ordering::SeqCst);
        assert!(
            in_flight <= capacity * 2 + workers + 1,
            "{} batches pulled with capacity {} and {} workers",
            in_flight,
            capacity,
            workers
        );
        assert!(in_flight < TOTAL);

        drop(gate_tx);
        let result = run.join().unwrap().unwrap();
        assert_eq!(pulled.load(Ordering::SeqCst), TOTAL);
        assert_eq!(result.total_lines(), TOTAL as u64);
        assert_eq!(result.total_status(), TOTAL as u64);
    }

    #[test]
    fn test_worker_panic_is_reported() {
        let lines = sample_lines(200);
        let processor = ParallelProcessor::new(ParallelConfig {
            num_workers: 3,
            buffer_size: Some(1),
        });
        let criteria = MatchCriteria::default();
        let err = processor
            .process_with(batches(&lines, 10).into_iter(), move |chunk: &[String]| {
                if chunk.iter().any(|l| l.contains("/u/7")) {
                    panic!("poisoned batch");
                }
                aggregate_batch(chunk, &criteria)
            })
            .unwrap_err();

        match err {
            ProcessError::Worker { message, .. } => assert!(message.contains("poisoned batch")),
            other => panic!("expected worker error, got {:?}", other),
        }
    }
}
