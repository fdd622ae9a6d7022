//! Parallel processing module for logtally
//!
//! Splits the map stage across a pool of worker threads while the calling
//! thread reduces partial results as they arrive.
//!
//! # Module Structure
//!
//! - `types`: Pool configuration and inter-thread messages
//! - `batching`: Reader thread feeding batches to the pool
//! - `worker`: Worker thread mapping batches to partial statistics
//! - `processor`: Main ParallelProcessor orchestration

mod batching;
mod processor;
mod types;
mod worker;

// Re-export public types
pub use processor::ParallelProcessor;
pub use types::ParallelConfig;
