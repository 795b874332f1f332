use std::fmt::Display;

#[cfg(feature = "bitcode")]
use bitcode::{Decode, Encode};
use derive_getters::{Dissolve, Getters};
use eyre::Result;

use seqletkit_core_rs::loc::{Interval, IntervalOp, Orientation};
use seqletkit_core_rs::num::Float;

/// Fixed-width candidate region of a single example together with its signed windowed score.
#[cfg_attr(feature = "bitcode", derive(Encode, Decode))]
#[derive(Clone, PartialEq, Debug, Dissolve, Getters)]
pub struct SeqletCoords<V> {
    example: usize,
    interval: Interval<usize>,
    score: V,
    orientation: Orientation,
}

impl<V: Float> SeqletCoords<V> {
    pub fn new(example: usize, start: usize, end: usize, score: V) -> Result<Self> {
        Ok(Self {
            example,
            interval: Interval::new(start, end)?,
            score,
            orientation: Orientation::Forward,
        })
    }

    pub fn is_revcomp(&self) -> bool {
        self.orientation.is_reverse()
    }

    pub fn magnitude(&self) -> V {
        self.score.abs()
    }
}

impl<V> IntervalOp for SeqletCoords<V> {
    type Idx = usize;

    fn start(&self) -> usize {
        self.interval.start()
    }

    fn end(&self) -> usize {
        self.interval.end()
    }
}

impl<V> Display for SeqletCoords<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "example:{},start:{},end:{},rc:{}",
            self.example,
            self.interval.start(),
            self.interval.end(),
            self.orientation.is_reverse()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coords() {
        let coords = SeqletCoords::new(3, 13, 21, -4.5f64).unwrap();
        assert_eq!(*coords.example(), 3);
        assert_eq!((coords.start(), coords.end(), coords.len()), (13, 21, 8));
        assert_eq!(coords.magnitude(), 4.5);
        assert!(!coords.is_revcomp());
        assert_eq!(coords.to_string(), "example:3,start:13,end:21,rc:false");

        assert!(SeqletCoords::new(0, 21, 13, 1.0f32).is_err());
    }
}
