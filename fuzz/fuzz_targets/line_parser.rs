#![no_main]

use libfuzzer_sys::fuzz_target;
use logtally::{parse_line, ParseOutcome};

fuzz_target!(|data: &[u8]| {
    let input = String::from_utf8_lossy(data);
    // Any input is either a record or malformed; it must never panic.
    if let ParseOutcome::Record(record) = parse_line(&input) {
        assert!(record.status <= 999);
        assert!(!record.url.is_empty());
    }
});
