use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::aggregate::{MatchCriteria, DEFAULT_SLOW_THRESHOLD_MS, DEFAULT_STATUS_CODE};
use crate::error::{ProcessError, Result};
use crate::reader::validate_batch_size;

pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Everything a run needs: where to read, how to batch, what to count and
/// how many workers to use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessConfig {
    pub input_path: PathBuf,
    pub batch_size: usize,
    pub slow_threshold_ms: u64,
    pub status_codes: Vec<u16>,
    /// `None` resolves to the number of available CPUs at run time
    pub workers: Option<usize>,
}

impl ProcessConfig {
    pub fn new(input_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            slow_threshold_ms: DEFAULT_SLOW_THRESHOLD_MS,
            status_codes: vec![DEFAULT_STATUS_CODE],
            workers: None,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_slow_threshold_ms(mut self, slow_threshold_ms: u64) -> Self {
        self.slow_threshold_ms = slow_threshold_ms;
        self
    }

    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_codes = vec![status_code];
        self
    }

    pub fn with_status_codes(mut self, status_codes: impl Into<Vec<u16>>) -> Self {
        self.status_codes = status_codes.into();
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    /// Worker count with the CPU default applied
    pub fn effective_workers(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get).max(1)
    }

    /// Check every setting without touching the filesystem
    pub fn validate(&self) -> Result<MatchCriteria> {
        validate_batch_size(self.batch_size)?;
        if self.workers == Some(0) {
            return Err(ProcessError::config("worker count must be greater than 0"));
        }
        MatchCriteria::new(&self.status_codes, self.slow_threshold_ms)
    }

    /// Validated, fully resolved settings for one run
    pub(crate) fn resolve(&self) -> Result<ResolvedConfig> {
        let criteria = self.validate()?;
        Ok(ResolvedConfig {
            input_path: self.input_path.clone(),
            batch_size: self.batch_size,
            workers: self.effective_workers(),
            criteria,
        })
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ResolvedConfig {
    pub input_path: PathBuf,
    pub batch_size: usize,
    pub workers: usize,
    pub criteria: MatchCriteria,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProcessConfig::new("access.log");
        assert_eq!(config.batch_size, 10_000);
        assert_eq!(config.slow_threshold_ms, 200);
        assert_eq!(config.status_codes, vec![500]);
        assert_eq!(config.workers, None);
        assert!(config.effective_workers() >= 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_setters() {
        let config = ProcessConfig::new("a.log")
            .with_batch_size(2)
            .with_slow_threshold_ms(50)
            .with_status_codes(vec![502, 503])
            .with_workers(3);
        assert_eq!(config.batch_size, 2);
        assert_eq!(config.slow_threshold_ms, 50);
        assert_eq!(config.status_codes, vec![502, 503]);
        assert_eq!(config.effective_workers(), 3);

        let single = config.with_status_code(404);
        assert_eq!(single.status_codes, vec![404]);
    }

    #[test]
    fn test_invalid_settings() {
        let base = ProcessConfig::new("a.log");
        assert!(matches!(
            base.clone().with_batch_size(0).validate(),
            Err(ProcessError::Config(_))
        ));
        assert!(matches!(
            base.clone().with_workers(0).validate(),
            Err(ProcessError::Config(_))
        ));
        assert!(matches!(
            base.clone().with_status_codes(Vec::new()).validate(),
            Err(ProcessError::Config(_))
        ));
        assert!(matches!(
            base.with_status_code(1000).validate(),
            Err(ProcessError::Config(_))
        ));
    }

    #[test]
    fn test_resolve_applies_worker_default() {
        let resolved = ProcessConfig::new("a.log").resolve().unwrap();
        assert_eq!(resolved.workers, num_cpus::get().max(1));
        assert_eq!(resolved.criteria.status_codes(), &[500]);
    }
}
