use std::io::BufRead;
use std::path::{Path, PathBuf};

use crate::decompression::InputReader;
use crate::error::{ProcessError, Result};

const INITIAL_BATCH_CAPACITY: usize = 4096;

/// A bounded, ordered group of raw input lines processed as one unit of work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub id: u64,
    pub lines: Vec<String>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Streams a log file as fixed-size batches of lines.
///
/// Every batch holds exactly `batch_size` lines except the last one, which may
/// be shorter; an empty input yields no batches at all. Invalid UTF-8 is
/// replaced with U+FFFD instead of failing the read. Only one batch plus the
/// read buffer is held in memory at a time.
pub struct BatchReader<R: BufRead = InputReader> {
    reader: R,
    path: PathBuf,
    batch_size: usize,
    next_id: u64,
    buf: Vec<u8>,
    done: bool,
}

impl BatchReader<InputReader> {
    /// Open `path` for batched reading. `batch_size` is validated first so a
    /// bad configuration never touches the filesystem.
    pub fn open<P: AsRef<Path>>(path: P, batch_size: usize) -> Result<Self> {
        validate_batch_size(batch_size)?;
        let path = path.as_ref();
        let reader = InputReader::open(path).map_err(|e| ProcessError::io(path, e))?;
        tracing::debug!(
            path = %path.display(),
            compression = ?reader.compression(),
            batch_size,
            "opened input"
        );
        Ok(Self::with_source(reader, path, batch_size))
    }
}

impl<R: BufRead> BatchReader<R> {
    /// Batch any buffered reader; `path` is only used in error messages
    pub fn from_reader(reader: R, path: impl Into<PathBuf>, batch_size: usize) -> Result<Self> {
        validate_batch_size(batch_size)?;
        Ok(Self::with_source(reader, path, batch_size))
    }

    fn with_source(reader: R, path: impl Into<PathBuf>, batch_size: usize) -> Self {
        Self {
            reader,
            path: path.into(),
            batch_size,
            next_id: 0,
            buf: Vec::new(),
            done: false,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Read one line into `self.buf` and decode it. `Ok(None)` at EOF.
    fn read_line(&mut self) -> std::io::Result<Option<String>> {
        self.buf.clear();
        if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None);
        }
        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }
        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }
}

impl<R: BufRead> Iterator for BatchReader<R> {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        // Grows with the lines actually read, not with the configured size
        let mut lines = Vec::with_capacity(self.batch_size.min(INITIAL_BATCH_CAPACITY));
        while lines.len() < self.batch_size {
            match self.read_line() {
                Ok(Some(line)) => lines.push(line),
                Ok(None) => {
                    self.done = true;
                    break;
                }
                Err(e) => {
                    // A failed read poisons the stream; surface it once and stop
                    self.done = true;
                    return Some(Err(ProcessError::io(self.path.clone(), e)));
                }
            }
        }

        if lines.is_empty() {
            return None;
        }

        let id = self.next_id;
        self.next_id += 1;
        Some(Ok(Batch { id, lines }))
    }
}

pub(crate) fn validate_batch_size(batch_size: usize) -> Result<()> {
    if batch_size == 0 {
        return Err(ProcessError::config("batch size must be greater than 0"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor, Read, Write};
    use tempfile::NamedTempFile;

    fn batches_of(content: &[u8], batch_size: usize) -> Vec<Batch> {
        BatchReader::from_reader(Cursor::new(content.to_vec()), "test.log", batch_size)
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_fixed_size_batches_with_short_tail() {
        let batches = batches_of(b"l1\nl2\nl3\nl4\nl5\n", 2);
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].lines, vec!["l1", "l2"]);
        assert_eq!(batches[1].lines, vec!["l3", "l4"]);
        assert_eq!(batches[2].lines, vec!["l5"]);
        let ids: Vec<u64> = batches.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_exact_multiple_has_no_empty_tail() {
        let batches = batches_of(b"a\nb\nc\nd\n", 2);
        assert_eq!(batches.len(), 2);
        assert!(batches.iter().all(|b| b.len() == 2));
    }

    #[test]
    fn test_empty_input_yields_no_batches() {
        assert!(batches_of(b"", 3).is_empty());
    }

    #[test]
    fn test_last_line_without_newline_is_kept() {
        let batches = batches_of(b"first\r\nsecond", 10);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].lines, vec!["first", "second"]);
    }

    #[test]
    fn test_huge_batch_size_does_not_preallocate() {
        let batches = batches_of(b"only line\n", usize::MAX / 2);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].lines, vec!["only line"]);
    }

    #[test]
    fn test_blank_lines_are_lines() {
        let batches = batches_of(b"\n\nx\n", 10);
        assert_eq!(batches[0].lines, vec!["", "", "x"]);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let batches = batches_of(b"ok\n\xff\xfebad\n", 10);
        assert_eq!(batches[0].lines[0], "ok");
        assert_eq!(batches[0].lines[1], "\u{FFFD}\u{FFFD}bad");
    }

    #[test]
    fn test_zero_batch_size_is_config_error() {
        let err = BatchReader::from_reader(Cursor::new(Vec::new()), "x", 0)
            .err()
            .unwrap();
        assert!(matches!(err, ProcessError::Config(_)));
    }

    #[test]
    fn test_zero_batch_size_checked_before_open() {
        // The path does not exist; the configuration error must win
        let err = BatchReader::open("/definitely/not/here.log", 0).err().unwrap();
        assert!(matches!(err, ProcessError::Config(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = BatchReader::open("/definitely/not/here.log", 10)
            .err()
            .unwrap();
        assert!(matches!(err, ProcessError::Io { .. }));
    }

    #[test]
    fn test_reads_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        for i in 0..7 {
            writeln!(temp_file, "line{}", i).unwrap();
        }
        temp_file.flush().unwrap();

        let reader = BatchReader::open(temp_file.path(), 3).unwrap();
        assert_eq!(reader.batch_size(), 3);
        let sizes: Vec<usize> = reader.map(|b| b.unwrap().len()).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
    }

    struct FailingReader {
        served: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("disk on fire"))
        }
    }

    impl BufRead for FailingReader {
        fn fill_buf(&mut self) -> io::Result<&[u8]> {
            if self.served {
                Err(io::Error::other("disk on fire"))
            } else {
                Ok(b"partial line\n")
            }
        }

        fn consume(&mut self, _amt: usize) {
            self.served = true;
        }
    }

    #[test]
    fn test_mid_stream_read_error_is_surfaced_once() {
        let mut reader =
            BatchReader::from_reader(FailingReader { served: false }, "broken.log", 10).unwrap();
        let first = reader.next().unwrap();
        match first {
            Err(ProcessError::Io { path, source }) => {
                assert_eq!(path, PathBuf::from("broken.log"));
                assert!(source.to_string().contains("disk on fire"));
            }
            other => panic!("expected io error, got {:?}", other),
        }
        assert!(reader.next().is_none());
    }
}
