//! Worker thread for parallel processing
//!
//! Contains the worker loop that maps batches to partial statistics.

use crossbeam_channel::{Receiver, Sender};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::error::ProcessError;
use crate::reader::Batch;
use crate::stats::PartialStats;

use super::types::{BatchOutcome, WorkerMessage};

/// Worker thread: aggregates batches until the input channel closes.
///
/// A panic inside `map` is caught and reported to the reducer as a worker
/// failure; the worker then stops. Workers share nothing but the channels.
pub(crate) fn worker_thread<F>(
    worker_id: usize,
    batch_receiver: Receiver<Batch>,
    result_sender: Sender<WorkerMessage>,
    map: F,
) where
    F: Fn(&[String]) -> PartialStats,
{
    tracing::trace!(worker_id, "worker started");
    let mut processed = 0u64;

    for batch in batch_receiver.iter() {
        let batch_id = batch.id;
        let lines = batch.lines.len();

        let message = match panic::catch_unwind(AssertUnwindSafe(|| map(&batch.lines))) {
            Ok(stats) => Ok(BatchOutcome {
                batch_id,
                worker_id,
                lines,
                stats,
            }),
            Err(payload) => Err(ProcessError::Worker {
                worker_id,
                message: format!(
                    "panicked on batch {}: {}",
                    batch_id,
                    panic_message(payload.as_ref())
                ),
            }),
        };

        let failed = message.is_err();
        if result_sender.send(message).is_err() {
            // Reducer hung up after an error elsewhere
            break;
        }
        if failed {
            break;
        }
        processed += 1;
    }

    tracing::trace!(worker_id, processed, "worker finished");
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
