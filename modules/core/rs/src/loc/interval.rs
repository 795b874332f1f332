use std::rc::Rc;
use std::sync::Arc;

use crate::num::PrimInt;
#[cfg(feature = "bitcode")]
use bitcode::{Decode, Encode};
use derive_getters::Dissolve;
use eyre::{eyre, Result};
use impl_tools::autoimpl;
use num::Zero;

/// Interval is a half-open region [start, end) along a score track.
/// Empty intervals (start == end) and intervals with negative length (start > end) are rejected.
#[cfg_attr(feature = "bitcode", derive(Encode, Decode))]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Dissolve)]
pub struct Interval<Idx: PrimInt> {
    start: Idx,
    end: Idx,
}

/// Trait for types that can be viewed as half-open intervals [start, end).
#[autoimpl(for <T: trait + ?Sized> &T, Box<T>, Rc<T>, Arc<T>)]
#[allow(clippy::len_without_is_empty)]
pub trait IntervalOp {
    type Idx: PrimInt;

    fn start(&self) -> Self::Idx;

    fn end(&self) -> Self::Idx;

    fn len(&self) -> Self::Idx {
        self.end() - self.start()
    }

    /// Check that the interval-like object lies inside [0, limit).
    fn within(&self, limit: Self::Idx) -> bool {
        self.start() >= Self::Idx::zero() && self.end() <= limit
    }
}

impl<T: PrimInt> IntervalOp for Interval<T> {
    type Idx = T;

    #[inline(always)]
    fn start(&self) -> Self::Idx {
        self.start
    }
    #[inline(always)]
    fn end(&self) -> Self::Idx {
        self.end
    }
}

impl<Idx: PrimInt> Interval<Idx> {
    pub fn new(start: Idx, end: Idx) -> Result<Self> {
        if start < end {
            Ok(Self { start, end })
        } else {
            Err(eyre!("Invalid interval: start >= end"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construct() {
        let interval = Interval::new(13usize, 21).unwrap();
        assert_eq!(interval, Interval { start: 13, end: 21 });
        assert_eq!((interval.start(), interval.end(), interval.len()), (13, 21, 8));
        assert!(Interval::new(5, 2).is_err());
        assert!(Interval::new(4, 4).is_err());
    }

    #[test]
    fn test_within() {
        let interval = Interval::new(0usize, 30).unwrap();
        assert!(interval.within(30));
        assert!(!interval.within(29));
        assert!(!Interval::new(-1i64, 5).unwrap().within(10));
    }
}
