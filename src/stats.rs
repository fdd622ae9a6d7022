use std::collections::HashMap;

/// URL → number of matching requests
pub type UrlHistogram = HashMap<String, u64>;

/// Counters and histograms for a single batch.
///
/// Built by one aggregation call and read-only afterwards: fields are private
/// to the crate and the reducer takes partials by value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialStats {
    pub(crate) total_lines: u64,
    pub(crate) bad_lines: u64,
    pub(crate) total_status: u64,
    pub(crate) total_slow: u64,
    pub(crate) status_by_url: UrlHistogram,
    pub(crate) slow_by_url: UrlHistogram,
}

/// Running sum of every partial consumed so far
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateStats {
    total_lines: u64,
    bad_lines: u64,
    total_status: u64,
    total_slow: u64,
    status_by_url: UrlHistogram,
    slow_by_url: UrlHistogram,
}

macro_rules! counter_accessors {
    ($ty:ty) => {
        impl $ty {
            pub fn total_lines(&self) -> u64 {
                self.total_lines
            }

            pub fn bad_lines(&self) -> u64 {
                self.bad_lines
            }

            pub fn total_status(&self) -> u64 {
                self.total_status
            }

            pub fn total_slow(&self) -> u64 {
                self.total_slow
            }

            pub fn status_by_url(&self) -> &UrlHistogram {
                &self.status_by_url
            }

            pub fn slow_by_url(&self) -> &UrlHistogram {
                &self.slow_by_url
            }

            /// Lines that matched the grammar
            pub fn parsed_lines(&self) -> u64 {
                self.total_lines - self.bad_lines
            }

            /// Category counts never exceed parsed lines and histograms sum to their counters
            pub fn is_consistent(&self) -> bool {
                self.bad_lines <= self.total_lines
                    && self.total_status <= self.parsed_lines()
                    && self.total_slow <= self.parsed_lines()
                    && self.status_by_url.values().sum::<u64>() == self.total_status
                    && self.slow_by_url.values().sum::<u64>() == self.total_slow
            }
        }
    };
}

counter_accessors!(PartialStats);
counter_accessors!(AggregateStats);

impl AggregateStats {
    /// The reduction identity: zero counters, empty histograms
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one batch's partial into the running totals
    pub fn absorb(&mut self, partial: PartialStats) {
        self.total_lines += partial.total_lines;
        self.bad_lines += partial.bad_lines;
        self.total_status += partial.total_status;
        self.total_slow += partial.total_slow;
        merge_histogram(&mut self.status_by_url, partial.status_by_url);
        merge_histogram(&mut self.slow_by_url, partial.slow_by_url);
    }

    /// Combine two running totals, e.g. from independently reduced shards
    pub fn merge(&mut self, other: AggregateStats) {
        self.total_lines += other.total_lines;
        self.bad_lines += other.bad_lines;
        self.total_status += other.total_status;
        self.total_slow += other.total_slow;
        merge_histogram(&mut self.status_by_url, other.status_by_url);
        merge_histogram(&mut self.slow_by_url, other.slow_by_url);
    }
}

impl From<PartialStats> for AggregateStats {
    fn from(partial: PartialStats) -> Self {
        let mut aggregate = AggregateStats::new();
        aggregate.absorb(partial);
        aggregate
    }
}

fn merge_histogram(into: &mut UrlHistogram, from: UrlHistogram) {
    // Fold the smaller map into the larger one
    if into.len() < from.len() {
        let smaller = std::mem::replace(into, from);
        merge_histogram(into, smaller);
        return;
    }
    for (url, count) in from {
        *into.entry(url).or_insert(0) += count;
    }
}
