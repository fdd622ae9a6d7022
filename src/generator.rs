//! Synthetic access-log generator for benchmarks and load tests.

use chrono::{DateTime, Duration, Utc};
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::ops::RangeInclusive;
use std::path::Path;

const METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE"];
const STATUS_CODES: &[u16] = &[200, 201, 204, 301, 302, 400, 401, 403, 404, 429, 500, 502, 503];
const BASE_URLS: &[&str] = &[
    "/",
    "/index.html",
    "/login",
    "/logout",
    "/products",
    "/products/123",
    "/cart",
    "/checkout",
    "/api/v1/items",
    "/api/v1/items/123",
    "/search",
    "/assets/app.js",
    "/assets/styles.css",
    "/images/banner.jpg",
];

const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Stop once at least this many bytes were written
    pub target_bytes: u64,
    pub seed: Option<u64>,
    /// Dates fall within this many days before `anchor`
    pub days_back: u32,
    pub query_probability: f64,
    pub query_len: RangeInclusive<usize>,
    pub lines_per_chunk: usize,
    pub progress_every_bytes: u64,
    /// Reference time for dates; `None` means now
    pub anchor: Option<DateTime<Utc>>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            target_bytes: 1024 * MIB,
            seed: None,
            days_back: 60,
            query_probability: 0.35,
            query_len: 10..=80,
            lines_per_chunk: 5_000,
            progress_every_bytes: 100 * MIB,
            anchor: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerateSummary {
    pub bytes: u64,
    pub lines: u64,
}

pub struct LineGenerator {
    rng: fastrand::Rng,
    anchor: DateTime<Utc>,
    days_back: i64,
    query_probability: f64,
    query_len: RangeInclusive<usize>,
}

impl LineGenerator {
    pub fn new(config: &GeneratorConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        Self {
            rng,
            anchor: config.anchor.unwrap_or_else(Utc::now),
            days_back: i64::from(config.days_back),
            query_probability: config.query_probability,
            query_len: config.query_len.clone(),
        }
    }

    /// Mostly fast responses with a slow tail
    fn response_time_ms(&mut self) -> u64 {
        let r = self.rng.f64();
        if r < 0.85 {
            self.rng.u64(20..=350)
        } else if r < 0.97 {
            self.rng.u64(351..=1200)
        } else {
            self.rng.u64(1201..=8000)
        }
    }

    fn pick<T: Copy>(&mut self, items: &[T]) -> T {
        items[self.rng.usize(..items.len())]
    }

    /// Append one newline-terminated line to `out`
    pub fn push_line(&mut self, out: &mut String) {
        let ip = [
            self.rng.u8(1..=254),
            self.rng.u8(1..=254),
            self.rng.u8(1..=254),
            self.rng.u8(1..=254),
        ];
        let when = self.anchor
            - Duration::days(self.rng.i64(0..=self.days_back))
            - Duration::seconds(self.rng.i64(0..86_400));
        let method = self.pick(METHODS);
        let url = self.pick(BASE_URLS);
        let status = self.pick(STATUS_CODES);
        let response_time = self.response_time_ms();

        let _ = write!(
            out,
            "{}.{}.{}.{} - - [{}] \"{} {}",
            ip[0],
            ip[1],
            ip[2],
            ip[3],
            when.format("%d/%b/%Y:%H:%M:%S"),
            method,
            url
        );
        if self.rng.f64() < self.query_probability {
            let len = self.rng.usize(self.query_len.clone());
            out.push_str("?q=");
            out.extend(std::iter::repeat_with(|| self.rng.alphanumeric()).take(len));
            let _ = write!(out, "&p={}", self.rng.u32(1..=9999));
        }
        let _ = writeln!(out, "\" {} {}", status, response_time);
    }
}

/// Write lines to `writer` until `target_bytes` is reached
pub fn generate<W: Write>(writer: &mut W, config: &GeneratorConfig) -> io::Result<GenerateSummary> {
    let mut generator = LineGenerator::new(config);
    let mut summary = GenerateSummary { bytes: 0, lines: 0 };
    let mut next_progress = config.progress_every_bytes.max(1);
    let mut chunk = String::new();

    while summary.bytes < config.target_bytes {
        chunk.clear();
        for _ in 0..config.lines_per_chunk.max(1) {
            generator.push_line(&mut chunk);
            summary.lines += 1;
            if summary.bytes + chunk.len() as u64 >= config.target_bytes {
                break;
            }
        }
        writer.write_all(chunk.as_bytes())?;
        summary.bytes += chunk.len() as u64;

        if summary.bytes >= next_progress {
            tracing::info!(mib = summary.bytes / MIB, lines = summary.lines, "generation progress");
            next_progress += config.progress_every_bytes.max(1);
        }
    }

    writer.flush()?;
    Ok(summary)
}

/// Generate into `path`, creating parent directories as needed
pub fn generate_file(path: &Path, config: &GeneratorConfig) -> io::Result<GenerateSummary> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    generate(&mut writer, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_line;
    use chrono::TimeZone;

    fn config(target_bytes: u64) -> GeneratorConfig {
        GeneratorConfig {
            target_bytes,
            seed: Some(7),
            lines_per_chunk: 64,
            anchor: Some(Utc.with_ymd_and_hms(2024, 9, 10, 15, 3, 27).unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn test_every_line_parses() {
        let mut out = Vec::new();
        let summary = generate(&mut out, &config(64 * 1024)).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(text.lines().count() as u64, summary.lines);
        for line in text.lines() {
            let record = parse_line(line);
            assert!(!record.is_malformed(), "unparseable: {}", line);
        }
    }

    #[test]
    fn test_reaches_target_size() {
        let mut out = Vec::new();
        let summary = generate(&mut out, &config(10_000)).unwrap();
        assert_eq!(summary.bytes, out.len() as u64);
        assert!(summary.bytes >= 10_000);
        // Stops within one line of the target
        assert!(summary.bytes < 10_000 + 512);
    }

    #[test]
    fn test_seed_is_deterministic() {
        let mut a = Vec::new();
        let mut b = Vec::new();
        generate(&mut a, &config(4096)).unwrap();
        generate(&mut b, &config(4096)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_dates_stay_in_window() {
        let mut generator = LineGenerator::new(&GeneratorConfig {
            days_back: 0,
            ..config(0)
        });
        let mut line = String::new();
        generator.push_line(&mut line);
        assert!(line.contains("/Sep/2024:"), "{}", line);
    }

    #[test]
    fn test_generate_file_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("access.log");
        let summary = generate_file(&path, &config(2048)).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), summary.bytes);
    }
}
