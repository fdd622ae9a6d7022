//! Tracked runs: a processing job with its lifecycle timestamps and outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

use crate::config::ProcessConfig;
use crate::pipeline::process_log;
use crate::result::ProcessingResult;

static NEXT_RUN_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Pending,
    Running,
    Done,
    Failed,
}

impl RunStatus {
    pub fn is_finished(self) -> bool {
        matches!(self, RunStatus::Done | RunStatus::Failed)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Pending => "PENDING",
            RunStatus::Running => "RUNNING",
            RunStatus::Done => "DONE",
            RunStatus::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: u64,
    pub config: ProcessConfig,
    pub status: RunStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub result: Option<ProcessingResult>,
    /// Empty unless the run failed
    pub error_message: String,
}

impl RunRecord {
    /// A pending run with a process-unique id
    pub fn new(config: ProcessConfig) -> Self {
        Self {
            id: NEXT_RUN_ID.fetch_add(1, Ordering::Relaxed),
            config,
            status: RunStatus::Pending,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            result: None,
            error_message: String::new(),
        }
    }

    /// Wall-clock time between start and finish
    pub fn duration(&self) -> Option<chrono::Duration> {
        Some(self.finished_at? - self.started_at?)
    }

    /// Run the pipeline on this thread, recording each transition.
    ///
    /// Failures end up in `error_message`; the record itself is always
    /// returned finished.
    pub fn execute(mut self) -> Self {
        self.status = RunStatus::Running;
        self.started_at = Some(Utc::now());
        self.error_message.clear();
        tracing::info!(run_id = self.id, input = %self.config.input_path.display(), "run started");

        match process_log(&self.config) {
            Ok(result) => {
                self.result = Some(result);
                self.status = RunStatus::Done;
            }
            Err(e) => {
                tracing::warn!(run_id = self.id, error = %e, "run failed");
                self.error_message = e.to_string();
                self.status = RunStatus::Failed;
            }
        }

        self.finished_at = Some(Utc::now());
        tracing::info!(run_id = self.id, status = %self.status, "run finished");
        self
    }

    /// Execute on a background thread
    pub fn launch_in_background(self) -> std::io::Result<RunHandle> {
        let id = self.id;
        let handle = thread::Builder::new()
            .name(format!("logtally-run-{}", id))
            .spawn(move || self.execute())?;
        Ok(RunHandle { id, handle })
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// A run executing on its own thread
pub struct RunHandle {
    id: u64,
    handle: JoinHandle<RunRecord>,
}

impl RunHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Block until the run has finished. `None` only if the run thread panicked.
    pub fn wait(self) -> Option<RunRecord> {
        self.handle.join().ok()
    }
}
