#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use logtally::{aggregate_batch, reduce_partials, BatchReader, MatchCriteria};

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }
    let batch_size = usize::from(data[0] % 16) + 1;
    let body = data[1..].to_vec();

    let criteria = MatchCriteria::default();
    let reader = match BatchReader::from_reader(Cursor::new(body), "fuzz", batch_size) {
        Ok(reader) => reader,
        Err(_) => return,
    };

    let mut lines = Vec::new();
    let mut partials = Vec::new();
    for batch in reader {
        let batch = batch.expect("in-memory reads cannot fail");
        assert!(batch.len() <= batch_size);
        partials.push(aggregate_batch(&batch.lines[..], &criteria));
        lines.extend(batch.lines);
    }

    let batched = reduce_partials(partials);
    let whole = reduce_partials(std::iter::once(aggregate_batch(&lines[..], &criteria)));
    assert_eq!(batched, whole);
    assert!(batched.is_consistent());
});
