use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{ProcessError, Result};

/// Final metrics of one run.
///
/// Serializes to a flat JSON object; the `(url, count)` pairs become
/// two-element arrays with a `null` URL when nothing matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub total_lines: u64,
    pub bad_lines: u64,
    pub total_status: u64,
    pub total_slow: u64,
    pub top_url_status: (Option<String>, u64),
    pub top_url_slow: (Option<String>, u64),
    pub top_10_status: Vec<(String, u64)>,
    pub top_10_slow: Vec<(String, u64)>,
    pub elapsed_seconds: f64,
    /// First configured target status, kept for single-code consumers
    pub status_code: u16,
    pub status_codes: Vec<u16>,
    pub slow_threshold: u64,
    pub batch_size: usize,
    pub workers: usize,
}

impl ProcessingResult {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write the pretty JSON form to `path`
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| ProcessError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| ProcessError::io(path, e.into()))?;
        writeln!(writer)
            .and_then(|_| writer.flush())
            .map_err(|e| ProcessError::io(path, e))
    }

    /// Requests per second over the whole run, when measurable
    pub fn lines_per_second(&self) -> Option<f64> {
        if self.elapsed_seconds > 0.0 && self.total_lines > 0 {
            Some(self.total_lines as f64 / self.elapsed_seconds)
        } else {
            None
        }
    }

    fn status_label(&self) -> String {
        self.status_codes
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Human-readable summary block printed by the CLI
    pub fn format_summary(&self) -> String {
        let mut output = String::new();
        let status = self.status_label();

        let _ = writeln!(output, "=== Processing summary ===");
        let _ = writeln!(output, "Total lines:      {}", self.total_lines);
        let _ = writeln!(output, "Bad lines:        {}", self.bad_lines);
        let _ = writeln!(output, "Status [{}]: {}", status, self.total_status);
        let _ = writeln!(
            output,
            "Slow (>{}ms):     {}",
            self.slow_threshold, self.total_slow
        );
        let _ = writeln!(
            output,
            "Top status URL:   {}",
            format_pair(&self.top_url_status)
        );
        let _ = writeln!(
            output,
            "Top slow URL:     {}",
            format_pair(&self.top_url_slow)
        );

        format_ranking(&mut output, &format!("Top URLs by status {}", status), &self.top_10_status);
        format_ranking(
            &mut output,
            &format!("Top slow URLs (>{}ms)", self.slow_threshold),
            &self.top_10_slow,
        );

        let _ = write!(
            output,
            "Elapsed:          {:.4} s ({} workers, batch size {})",
            self.elapsed_seconds, self.workers, self.batch_size
        );
        output
    }

    /// One-line throughput report, in the same shape as the processing stats line
    pub fn format_stats(&self) -> String {
        let mut output = format!(
            "Lines processed: {} total, {} parsed, {} bad",
            self.total_lines,
            self.total_lines.saturating_sub(self.bad_lines),
            self.bad_lines
        );

        let elapsed_ms = (self.elapsed_seconds * 1000.0).round() as u64;
        output.push_str(&format!(" in {}ms", elapsed_ms));

        if let Some(rate) = self.lines_per_second() {
            output.push_str(&format!(" ({:.0} lines/s)", rate));
        }

        output.push_str(&format!(", {} workers", self.workers));
        output
    }
}

fn format_pair(pair: &(Option<String>, u64)) -> String {
    match pair {
        (Some(url), count) => format!("{} ({})", url, count),
        (None, _) => "-".to_string(),
    }
}

fn format_ranking(output: &mut String, title: &str, ranking: &[(String, u64)]) {
    let _ = writeln!(output, "\n{}:", title);
    if ranking.is_empty() {
        let _ = writeln!(output, "  (none)");
        return;
    }
    let width = ranking
        .iter()
        .map(|(_, count)| count.to_string().len())
        .max()
        .unwrap_or(1);
    for (idx, (url, count)) in ranking.iter().enumerate() {
        let _ = writeln!(output, "  {:>2}. {:>width$}  {}", idx + 1, count, url, width = width);
    }
    output.push('\n');
}
