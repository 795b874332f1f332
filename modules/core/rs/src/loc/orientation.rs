#[cfg(feature = "bitcode")]
use bitcode::{Decode, Encode};

/// Orientation of a region relative to the scored sequence
#[cfg_attr(feature = "bitcode", derive(Encode, Decode))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(i8)]
pub enum Orientation {
    /// Region is read in the same direction as the score track.
    #[default]
    Forward,
    /// Region is the reverse complement of the scored sequence.
    Reverse,
}

impl Orientation {
    pub fn is_reverse(&self) -> bool {
        matches!(self, Orientation::Reverse)
    }
}
