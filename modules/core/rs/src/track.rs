use derive_getters::Dissolve;
use derive_more::{Display, Error};
use eyre::Result;
use rayon::prelude::*;

/// Violations of the rectangular shape expected from a score track.
#[derive(Clone, PartialEq, Eq, Debug, Display, Error)]
pub enum TrackShapeError {
    #[display("track rows differ in length: row {row} has {found} positions, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[display("track buffer holds {found} values, expected {examples} x {positions}")]
    Size {
        examples: usize,
        positions: usize,
        found: usize,
    },
    #[display("track has no positions")]
    Empty,
}

/// Dense row-major 2-D array: one row per example, one column per position.
#[derive(Clone, PartialEq, Debug, Dissolve)]
pub struct Track<V> {
    values: Vec<V>,
    examples: usize,
    positions: usize,
}

impl<V: Copy> Track<V> {
    pub fn new(values: Vec<V>, examples: usize, positions: usize) -> Result<Self> {
        if positions == 0 {
            return Err(TrackShapeError::Empty.into());
        }
        if values.len() != examples * positions {
            return Err(TrackShapeError::Size {
                examples,
                positions,
                found: values.len(),
            }
            .into());
        }
        Ok(Self {
            values,
            examples,
            positions,
        })
    }

    /// Build a track from equally sized rows. Ragged input is rejected.
    pub fn from_rows<R: AsRef<[V]>>(rows: impl IntoIterator<Item = R>) -> Result<Self> {
        let mut values = Vec::new();
        let (mut examples, mut positions) = (0, None);
        for (ind, row) in rows.into_iter().enumerate() {
            let row = row.as_ref();
            match positions {
                None => positions = Some(row.len()),
                Some(expected) if expected != row.len() => {
                    return Err(TrackShapeError::Ragged {
                        row: ind,
                        expected,
                        found: row.len(),
                    }
                    .into());
                }
                Some(_) => {}
            }
            values.extend_from_slice(row);
            examples += 1;
        }
        Self::new(values, examples, positions.unwrap_or(0))
    }

    pub fn examples(&self) -> usize {
        self.examples
    }

    pub fn positions(&self) -> usize {
        self.positions
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.examples, self.positions)
    }

    pub fn values(&self) -> &[V] {
        &self.values
    }

    pub fn row(&self, example: usize) -> &[V] {
        let start = example * self.positions;
        &self.values[start..start + self.positions]
    }

    pub fn get(&self, example: usize, position: usize) -> V {
        self.row(example)[position]
    }

    pub fn rows(&self) -> std::slice::ChunksExact<'_, V> {
        self.values.chunks_exact(self.positions)
    }

    pub fn map<U: Copy>(&self, f: impl Fn(V) -> U) -> Track<U> {
        Track {
            values: self.values.iter().map(|x| f(*x)).collect(),
            examples: self.examples,
            positions: self.positions,
        }
    }
}

impl<V: Copy + Send + Sync> Track<V> {
    pub fn par_rows(&self) -> rayon::slice::ChunksExact<'_, V> {
        self.values.par_chunks_exact(self.positions)
    }

    pub fn par_rows_mut(&mut self) -> rayon::slice::ChunksExactMut<'_, V> {
        self.values.par_chunks_exact_mut(self.positions)
    }
}
