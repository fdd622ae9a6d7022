//! Reader thread for parallel processing
//!
//! Pulls batches from the input and hands them to the worker pool.

use crossbeam_channel::Sender;

use crate::error::Result;
use crate::reader::Batch;

use super::types::WorkerMessage;

/// Reader thread: the only producer of batches.
///
/// The batch channel is bounded, so this blocks whenever the workers fall
/// behind. Read failures go straight to the reducer on `error_sender`.
/// Returns the number of batches handed out.
pub(crate) fn reader_thread<I>(
    batches: I,
    batch_sender: Sender<Batch>,
    error_sender: Sender<WorkerMessage>,
) -> u64
where
    I: Iterator<Item = Result<Batch>>,
{
    let mut sent = 0u64;
    for batch in batches {
        match batch {
            Ok(batch) => {
                if batch_sender.send(batch).is_err() {
                    // All workers are gone; the reducer already stopped
                    tracing::debug!(sent, "batch channel closed, reader stopping");
                    break;
                }
                sent += 1;
            }
            Err(e) => {
                tracing::debug!(error = %e, "reader failed");
                let _ = error_sender.send(Err(e));
                break;
            }
        }
    }
    // Dropping batch_sender here tells the workers there is no more input
    sent
}
