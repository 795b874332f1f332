//! Numeric primitives the seqlet extractor is built on.
//!
//! Implementations may process rows in batches or in parallel, but the results must be identical
//! to a plain row-by-row evaluation.

use eyre::Result;

use crate::num::Float;
use crate::track::Track;

pub use batched::Batched;

mod batched;

pub trait NumericBackend {
    /// Sum of `track[e][p..p + window]` for every example `e` and every `p` in
    /// `0..=positions - window`. The output keeps only complete windows, so its width is
    /// `positions - window + 1` and column `p` describes the window starting at position `p`.
    fn windowed_sum<V: Float>(&self, track: &Track<V>, window: usize) -> Result<Track<V>>;

    /// Per-example index of the maximal value, ties are resolved to the lowest index.
    fn row_argmax<V: Float>(&self, track: &Track<V>) -> Result<Vec<usize>>;
}

/// Index of the first maximal value in the slice. A slice made of -inf yields 0.
pub fn argmax<V: Float>(values: &[V]) -> Option<usize> {
    let mut iter = values.iter().enumerate();
    let (mut best, mut top) = iter.next().map(|(ind, val)| (ind, *val))?;
    for (ind, val) in iter {
        if *val > top {
            best = ind;
            top = *val;
        }
    }
    Some(best)
}

/// Append left-to-right sums of every complete window of the row.
pub fn window_sums<V: Float>(row: &[V], window: usize, saveto: &mut Vec<V>) {
    saveto.extend(
        row.windows(window)
            .map(|chunk| chunk.iter().fold(V::zero(), |acc, x| acc + *x)),
    );
}
