pub use track::{Track, TrackShapeError};

pub mod backend;
pub mod loc;
pub mod num;
pub mod parallelism;
mod track;
