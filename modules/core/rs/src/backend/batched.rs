use std::sync::atomic::{AtomicUsize, Ordering};

use derive_getters::Getters;
use eyre::{eyre, Result};
use rayon::prelude::*;

use super::{argmax, window_sums, NumericBackend};
use crate::num::Float;
use crate::track::Track;

/// CPU backend that splits tracks into groups of `batch_size` rows and processes the groups on the
/// current rayon pool.
#[derive(Clone, PartialEq, Eq, Debug, Getters)]
pub struct Batched {
    batch_size: usize,
    progress_update: Option<usize>,
}

impl Default for Batched {
    fn default() -> Self {
        Self {
            batch_size: 50,
            progress_update: None,
        }
    }
}

impl Batched {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_batch_size(&mut self, batch_size: usize) -> Result<&mut Self> {
        if batch_size == 0 {
            return Err(eyre!("Batch size must be greater than 0"));
        }

        self.batch_size = batch_size;
        Ok(self)
    }

    /// Log progress every time another `every` rows are processed. `None` disables reporting.
    pub fn set_progress_update(&mut self, every: Option<usize>) -> Result<&mut Self> {
        if every == Some(0) {
            return Err(eyre!("Progress update interval must be greater than 0"));
        }

        self.progress_update = every;
        Ok(self)
    }

    fn report(&self, stage: &str, processed: &AtomicUsize, rows: usize, total: usize) {
        if let Some(every) = self.progress_update {
            let before = processed.fetch_add(rows, Ordering::Relaxed);
            let after = before + rows;
            if after / every > before / every {
                log::info!("{stage}: processed {after} of {total} rows");
            }
        }
    }
}

impl NumericBackend for Batched {
    fn windowed_sum<V: Float>(&self, track: &Track<V>, window: usize) -> Result<Track<V>> {
        let positions = track.positions();
        if window == 0 || window > positions {
            return Err(eyre!(
                "Window size must be in [1, {positions}], got {window}"
            ));
        }
        let width = positions - window + 1;

        let processed = AtomicUsize::new(0);
        let batches: Vec<Vec<V>> = track
            .values()
            .par_chunks(self.batch_size.saturating_mul(positions))
            .map(|batch| {
                let rows = batch.len() / positions;
                let mut saveto = Vec::with_capacity(rows * width);
                for row in batch.chunks_exact(positions) {
                    window_sums(row, window, &mut saveto);
                }
                self.report("Windowed sum", &processed, rows, track.examples());
                saveto
            })
            .collect();

        Track::new(batches.concat(), track.examples(), width)
    }

    fn row_argmax<V: Float>(&self, track: &Track<V>) -> Result<Vec<usize>> {
        let positions = track.positions();

        let processed = AtomicUsize::new(0);
        let batches: Vec<Vec<usize>> = track
            .values()
            .par_chunks(self.batch_size.saturating_mul(positions))
            .map(|batch| {
                let result: Vec<usize> = batch
                    .chunks_exact(positions)
                    .map(|row| argmax(row).unwrap_or(0))
                    .collect();
                self.report("Argmax", &processed, result.len(), track.examples());
                result
            })
            .collect();

        Ok(batches.concat())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> Track<f64> {
        let rows = (0..7).map(|example| {
            (0..13)
                .map(|pos| ((example * 13 + pos) as f64 * 0.37).sin())
                .collect::<Vec<_>>()
        });
        Track::from_rows(rows).unwrap()
    }

    #[test]
    fn test_settings_validation() {
        let mut backend = Batched::new();
        assert!(backend.set_batch_size(0).is_err());
        assert!(backend.set_progress_update(Some(0)).is_err());
        backend
            .set_batch_size(3)
            .unwrap()
            .set_progress_update(Some(2))
            .unwrap();
        assert_eq!(*backend.batch_size(), 3);
        assert_eq!(*backend.progress_update(), Some(2));
    }

    #[test]
    fn test_windowed_sum() -> Result<()> {
        let track = Track::from_rows([[1.0, 2.0, 3.0, 4.0], [0.5, -0.5, 2.0, 0.0]])?;
        let summed = Batched::new().windowed_sum(&track, 2)?;
        assert_eq!(summed.shape(), (2, 3));
        assert_eq!(summed.row(0), &[3.0, 5.0, 7.0]);
        assert_eq!(summed.row(1), &[0.0, 1.5, 2.0]);

        let whole = Batched::new().windowed_sum(&track, 4)?;
        assert_eq!(whole.values(), &[10.0, 2.0]);

        assert!(Batched::new().windowed_sum(&track, 0).is_err());
        assert!(Batched::new().windowed_sum(&track, 5).is_err());
        Ok(())
    }

    #[test]
    fn test_row_argmax() -> Result<()> {
        let track = Track::from_rows([
            [0.0, 0.0, 0.0],
            [1.0, 5.0, 5.0],
            [f64::NEG_INFINITY, f64::NEG_INFINITY, -1.0],
        ])?;
        assert_eq!(Batched::new().row_argmax(&track)?, vec![0, 1, 2]);
        Ok(())
    }

    #[test]
    fn test_batching_is_result_invariant() -> Result<()> {
        let track = track();
        let mut reference = Batched::new();
        reference.set_batch_size(1000)?;
        let expected_sum = reference.windowed_sum(&track, 4)?;
        let expected_argmax = reference.row_argmax(&track)?;

        for batch_size in [1, 2, 3, 7, usize::MAX] {
            let mut backend = Batched::new();
            backend.set_batch_size(batch_size)?.set_progress_update(Some(2))?;
            assert_eq!(backend.windowed_sum(&track, 4)?, expected_sum);
            assert_eq!(backend.row_argmax(&track)?, expected_argmax);
        }
        Ok(())
    }
}
