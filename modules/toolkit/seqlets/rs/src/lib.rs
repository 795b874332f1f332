pub use coords::SeqletCoords;
pub use error::SeqletError;
pub use extractor::Extractor;
pub use result::{Extraction, Thresholding};
pub use save::{GroupWriter, MemoryGroup};

mod coords;
mod error;
mod extractor;
mod result;
mod save;
pub mod thresholding;
