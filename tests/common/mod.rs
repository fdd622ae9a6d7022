// tests/common/mod.rs
// Shared test utilities for integration tests
#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;

/// Lines used by most end-to-end checks: with batch size 2, threshold 200ms
/// and target status 500 this gives 5 lines, 1 bad, 2 status hits, 2 slow.
pub const SCENARIO: &str = concat!(
    "10.0.0.1 - - [10/Sep/2024:15:03:27] \"GET /a\" 500 250\n",
    "10.0.0.2 - - [10/Sep/2024:15:03:28] \"GET /b\" 200 201\n",
    "10.0.0.3 - - [10/Sep/2024:15:03:29] \"GET /a\" 500 190\n",
    "this is not an access log line\n",
    "10.0.0.4 - - [10/Sep/2024:15:03:30] \"GET /c\" 200 50\n",
);

/// A scratch directory that doubles as HOME, XDG_CONFIG_HOME and cwd for the
/// binary, so no real user or project configuration leaks into a test.
pub struct Sandbox {
    pub dir: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }

    pub fn write_gzip(&self, name: &str, content: &str) -> PathBuf {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let path = self.dir.path().join(name);
        let file = File::create(&path).expect("Failed to create gzip file");
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(content.as_bytes()).unwrap();
        encoder.finish().unwrap();
        path
    }

    pub fn write_zstd(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        let file = File::create(&path).expect("Failed to create zstd file");
        let mut encoder = zstd::stream::write::Encoder::new(file, 0).unwrap();
        encoder.write_all(content.as_bytes()).unwrap();
        encoder.finish().unwrap();
        path
    }

    /// Run the logtally binary inside the sandbox
    pub fn run(&self, args: &[&str]) -> (String, String, i32) {
        self.run_binary(env!("CARGO_BIN_EXE_logtally"), args)
    }

    pub fn run_generator(&self, args: &[&str]) -> (String, String, i32) {
        self.run_binary(env!("CARGO_BIN_EXE_logtally-gen"), args)
    }

    fn run_binary(&self, binary: &str, args: &[&str]) -> (String, String, i32) {
        let output = Command::new(binary)
            .args(args)
            .current_dir(self.path())
            .env("HOME", self.path())
            .env("XDG_CONFIG_HOME", self.path().join(".config"))
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .expect("Failed to execute binary");

        (
            String::from_utf8_lossy(&output.stdout).to_string(),
            String::from_utf8_lossy(&output.stderr).to_string(),
            output.status.code().unwrap_or(-1),
        )
    }
}

/// Deterministic mixed log of `n` lines for equivalence checks
pub fn mixed_log(n: usize) -> String {
    let mut out = String::new();
    for i in 0..n {
        let line = match i % 6 {
            0 => format!("10.0.{}.1 - - [d] \"GET /api/{}\" 500 {}\n", i % 7, i % 11, 100 + i % 300),
            1 => format!("10.0.{}.2 - - [d] \"POST /login\" 200 {}\n", i % 7, i % 500),
            2 => format!("10.0.{}.3 - - [d] \"GET /slow/{}\" 503 {}\n", i % 7, i % 5, 1000 + i),
            3 => "garbage\n".to_string(),
            4 => format!("10.0.{}.4 - - [d] \"GET /x?id={}\" 404 10\n", i % 7, i % 3),
            _ => format!("10.0.{}.5 - - [d] \"DELETE /api/{}\" 500 999\n", i % 7, i % 13),
        };
        out.push_str(&line);
    }
    out
}
