//! Ranking of URL histograms.
//!
//! Ties are broken by URL in ascending byte order, so the ranking never
//! depends on hash-map iteration order.

use std::cmp::Ordering;

use crate::stats::UrlHistogram;

/// Number of URLs kept in the ranked lists of a result
pub const TOP_LIST_LEN: usize = 10;

/// Count descending, then URL ascending
fn rank(a: (&String, &u64), b: (&String, &u64)) -> Ordering {
    b.1.cmp(a.1).then_with(|| a.0.cmp(b.0))
}

/// The most frequent URL and its count, or `(None, 0)` for an empty histogram.
///
/// Equal counts resolve to the lexicographically smallest URL, the same entry
/// `top_n(histogram, 1)` would return first.
pub fn top_one(histogram: &UrlHistogram) -> (Option<String>, u64) {
    histogram
        .iter()
        .min_by(|a, b| rank(*a, *b))
        .map(|(url, count)| (Some(url.clone()), *count))
        .unwrap_or((None, 0))
}

/// Up to `limit` URLs sorted by count descending, ties by URL ascending
pub fn top_n(histogram: &UrlHistogram, limit: usize) -> Vec<(String, u64)> {
    if limit == 0 {
        return Vec::new();
    }

    let mut entries: Vec<(&String, &u64)> = histogram.iter().collect();
    if entries.len() > limit {
        // Partition first so only the winners get fully sorted
        entries.select_nth_unstable_by(limit - 1, |a, b| rank(*a, *b));
        entries.truncate(limit);
    }
    entries.sort_unstable_by(|a, b| rank(*a, *b));

    entries
        .into_iter()
        .map(|(url, count)| (url.clone(), *count))
        .collect()
}
