use once_cell::sync::Lazy;
use regex::Regex;

// Example: 192.168.0.1 - - [10/Sep/2024:15:03:27] "GET /index.html" 200 125
static ACCESS_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(?P<ip>\S+)\s+-\s+-\s+\[(?P<date>[^\]]+)\]\s+"(?P<method>[A-Z]+)\s+(?P<url>\S+)"\s+(?P<status>[0-9]{3})\s+(?P<response_time>[0-9]+)$"#,
    )
    .expect("access log grammar is a valid regex")
});

/// One parsed access-log line. Borrows the URL from the input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRecord<'a> {
    pub url: &'a str,
    pub status: u16,
    pub response_time_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome<'a> {
    Record(LogRecord<'a>),
    Malformed,
}

impl<'a> ParseOutcome<'a> {
    pub fn record(self) -> Option<LogRecord<'a>> {
        match self {
            ParseOutcome::Record(record) => Some(record),
            ParseOutcome::Malformed => None,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, ParseOutcome::Malformed)
    }
}

/// Parse a single access-log line.
///
/// The whole whitespace-trimmed line must match
/// `IP - - [DATE] "METHOD URL" STATUS RESPONSE_TIME`; anything else is
/// `Malformed`. The date is captured but not validated. A response time too
/// large for `u64` is treated as malformed.
pub fn parse_line(line: &str) -> ParseOutcome<'_> {
    let Some(captures) = ACCESS_LINE.captures(line.trim()) else {
        return ParseOutcome::Malformed;
    };

    let (Some(url), Some(status), Some(response_time)) = (
        captures.name("url"),
        captures.name("status"),
        captures.name("response_time"),
    ) else {
        return ParseOutcome::Malformed;
    };

    match (
        status.as_str().parse::<u16>(),
        response_time.as_str().parse::<u64>(),
    ) {
        (Ok(status), Ok(response_time_ms)) => ParseOutcome::Record(LogRecord {
            url: url.as_str(),
            status,
            response_time_ms,
        }),
        _ => ParseOutcome::Malformed,
    }
}
