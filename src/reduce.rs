use crate::stats::{AggregateStats, PartialStats};

/// Reduce stage: fold partials into one aggregate.
///
/// Addition is associative and commutative, so the order in which partials
/// arrive never changes the result. Partials are consumed one at a time,
/// which lets the parallel path feed this straight from a channel.
pub fn reduce_partials<I>(partials: I) -> AggregateStats
where
    I: IntoIterator<Item = PartialStats>,
{
    partials
        .into_iter()
        .fold(AggregateStats::new(), |mut acc, partial| {
            acc.absorb(partial);
            acc
        })
}

/// Like [`reduce_partials`], but stops at the first error.
///
/// Nothing is returned on failure; a half-reduced aggregate is never valid.
pub fn try_reduce_partials<I, E>(partials: I) -> Result<AggregateStats, E>
where
    I: IntoIterator<Item = Result<PartialStats, E>>,
{
    let mut acc = AggregateStats::new();
    for partial in partials {
        acc.absorb(partial?);
    }
    Ok(acc)
}
