use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Chain, Cursor, Read};
use std::path::Path;

/// Read buffer for log input (256KB for better throughput on large files)
pub const INPUT_BUFFER_SIZE: usize = 256 * 1024;

const GZIP_MAGIC: [u8; 3] = [0x1F, 0x8B, 0x08];
const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

type Source = Chain<Cursor<Vec<u8>>, File>;

/// Buffered input that transparently decompresses gzip and zstd files.
///
/// Compression is detected from magic bytes, not from the file extension.
pub enum InputReader {
    Gzip(BufReader<MultiGzDecoder<Source>>),
    Zstd(BufReader<zstd::Decoder<'static, BufReader<Source>>>),
    Plain(BufReader<Source>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Gzip,
    Zstd,
    None,
}

impl Compression {
    fn detect(head: &[u8]) -> Self {
        if head.starts_with(&GZIP_MAGIC) {
            Compression::Gzip
        } else if head.starts_with(&ZSTD_MAGIC) {
            Compression::Zstd
        } else {
            Compression::None
        }
    }
}

impl std::fmt::Debug for InputReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "InputReader::{:?}", self.compression())
    }
}

impl InputReader {
    /// Open `path` and sniff the first bytes to pick a decoder
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let mut file = File::open(path.as_ref())?;

        let mut head = [0u8; 4];
        let mut filled = 0;
        // Short reads are legal, keep going until the magic window is full or EOF
        while filled < head.len() {
            let n = file.read(&mut head[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        // Put the sniffed bytes back in front of the stream
        let source = Cursor::new(head[..filled].to_vec()).chain(file);

        Ok(match Compression::detect(&head[..filled]) {
            Compression::Gzip => InputReader::Gzip(BufReader::with_capacity(
                INPUT_BUFFER_SIZE,
                MultiGzDecoder::new(source),
            )),
            Compression::Zstd => InputReader::Zstd(BufReader::with_capacity(
                INPUT_BUFFER_SIZE,
                zstd::Decoder::new(source)?,
            )),
            Compression::None => {
                InputReader::Plain(BufReader::with_capacity(INPUT_BUFFER_SIZE, source))
            }
        })
    }

    pub fn compression(&self) -> Compression {
        match self {
            InputReader::Gzip(_) => Compression::Gzip,
            InputReader::Zstd(_) => Compression::Zstd,
            InputReader::Plain(_) => Compression::None,
        }
    }
}

impl Read for InputReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            InputReader::Gzip(reader) => reader.read(buf),
            InputReader::Zstd(reader) => reader.read(buf),
            InputReader::Plain(reader) => reader.read(buf),
        }
    }
}

impl BufRead for InputReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match self {
            InputReader::Gzip(reader) => reader.fill_buf(),
            InputReader::Zstd(reader) => reader.fill_buf(),
            InputReader::Plain(reader) => reader.fill_buf(),
        }
    }

    fn consume(&mut self, amt: usize) {
        match self {
            InputReader::Gzip(reader) => reader.consume(amt),
            InputReader::Zstd(reader) => reader.consume(amt),
            InputReader::Plain(reader) => reader.consume(amt),
        }
    }
}
