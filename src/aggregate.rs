use serde::{Deserialize, Serialize};

use crate::error::{ProcessError, Result};
use crate::parser::{parse_line, ParseOutcome};
use crate::stats::PartialStats;

pub const DEFAULT_STATUS_CODE: u16 = 500;
pub const DEFAULT_SLOW_THRESHOLD_MS: u64 = 200;
/// Largest status the three-digit grammar can produce
pub const MAX_STATUS_CODE: u16 = 999;

/// What a line has to look like to be counted as a status match or as slow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCriteria {
    status_codes: Vec<u16>,
    slow_threshold_ms: u64,
}

impl Default for MatchCriteria {
    fn default() -> Self {
        Self {
            status_codes: vec![DEFAULT_STATUS_CODE],
            slow_threshold_ms: DEFAULT_SLOW_THRESHOLD_MS,
        }
    }
}

impl MatchCriteria {
    /// Target codes are deduplicated; order of first appearance is kept. Any
    /// code the line grammar can produce (000..=999) is accepted.
    pub fn new(status_codes: &[u16], slow_threshold_ms: u64) -> Result<Self> {
        if status_codes.is_empty() {
            return Err(ProcessError::config("at least one target status code is required"));
        }
        let mut codes: Vec<u16> = Vec::with_capacity(status_codes.len());
        for &code in status_codes {
            if code > MAX_STATUS_CODE {
                return Err(ProcessError::config(format!(
                    "status code {} is outside 0..={}",
                    code, MAX_STATUS_CODE
                )));
            }
            if !codes.contains(&code) {
                codes.push(code);
            }
        }
        Ok(Self {
            status_codes: codes,
            slow_threshold_ms,
        })
    }

    pub fn status_codes(&self) -> &[u16] {
        &self.status_codes
    }

    pub fn slow_threshold_ms(&self) -> u64 {
        self.slow_threshold_ms
    }

    fn matches_status(&self, status: u16) -> bool {
        self.status_codes.contains(&status)
    }

    fn is_slow(&self, response_time_ms: u64) -> bool {
        response_time_ms > self.slow_threshold_ms
    }
}

/// Map stage: fold one batch of raw lines into a `PartialStats`.
///
/// Malformed lines only bump `bad_lines`. The status and slow checks are
/// independent, so a line can count toward both, one or neither. The result
/// owns all of its data and holds no reference to `lines`.
pub fn aggregate_batch<S: AsRef<str>>(lines: &[S], criteria: &MatchCriteria) -> PartialStats {
    let mut stats = PartialStats::default();

    for line in lines {
        stats.total_lines += 1;

        let record = match parse_line(line.as_ref()) {
            ParseOutcome::Record(record) => record,
            ParseOutcome::Malformed => {
                stats.bad_lines += 1;
                continue;
            }
        };

        if criteria.matches_status(record.status) {
            stats.total_status += 1;
            bump(&mut stats.status_by_url, record.url);
        }

        if criteria.is_slow(record.response_time_ms) {
            stats.total_slow += 1;
            bump(&mut stats.slow_by_url, record.url);
        }
    }

    stats
}

fn bump(histogram: &mut crate::stats::UrlHistogram, url: &str) {
    // Avoid allocating a key for URLs already seen in this batch
    if let Some(count) = histogram.get_mut(url) {
        *count += 1;
    } else {
        histogram.insert(url.to_string(), 1);
    }
}
