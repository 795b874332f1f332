use std::cmp::Ordering;

use derive_getters::Getters;
use eyre::{eyre, Result};
use log::Level;
use rayon::prelude::*;

use seqletkit_core_rs::backend::NumericBackend;
use seqletkit_core_rs::num::{cast, Float};
use seqletkit_core_rs::Track;

use crate::coords::SeqletCoords;
use crate::error::SeqletError;
use crate::result::{Extraction, Thresholding};
use crate::thresholding::{CurvatureElbow, ThresholdSelector};
use row::{Geometry, Row, Rules};

mod row;

/// Greedy seqlet extractor. Each round takes the strongest remaining window of every example,
/// emits it as a flanked seqlet if it passes the peak and background filters, and masks its
/// neighbourhood so that later rounds can't pick overlapping windows.
#[derive(Clone, Debug, Getters)]
pub struct Extractor<V: Float> {
    sliding: usize,
    flank: usize,
    #[getter(skip)]
    suppress: Option<usize>,
    max_seqlets_per_seq: usize,
    max_seqlets_total: usize,
    take_abs: bool,
    min_ratio_top_peak: f64,
    min_ratio_over_bg: f64,
    apply_recentering: bool,
    #[getter(skip)]
    thresholding: Option<Box<dyn ThresholdSelector<V>>>,
    verbose: bool,
}

impl<V: Float> Default for Extractor<V> {
    fn default() -> Self {
        Self {
            sliding: 11,
            flank: 10,
            suppress: None,
            max_seqlets_per_seq: 10,
            max_seqlets_total: 20_000,
            take_abs: true,
            min_ratio_top_peak: 0.0,
            min_ratio_over_bg: 0.0,
            apply_recentering: false,
            thresholding: Some(Box::new(CurvatureElbow::default())),
            verbose: false,
        }
    }
}

impl<V: Float> Extractor<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Half-width of the masked neighbourhood, `sliding / 2 + flank` unless set explicitly.
    pub fn suppress(&self) -> usize {
        self.suppress.unwrap_or(self.flank.saturating_add(self.sliding / 2))
    }

    pub fn thresholding(&self) -> Option<&dyn ThresholdSelector<V>> {
        self.thresholding.as_deref()
    }

    pub fn set_sliding(&mut self, sliding: usize) -> Result<&mut Self> {
        if sliding == 0 {
            return Err(SeqletError::config("sliding window must be > 0"));
        }

        self.sliding = sliding;
        Ok(self)
    }

    pub fn set_flank(&mut self, flank: usize) -> &mut Self {
        self.flank = flank;
        self
    }

    /// `None` restores the default derived from the window and the flank.
    pub fn set_suppress(&mut self, suppress: Option<usize>) -> &mut Self {
        self.suppress = suppress;
        self
    }

    pub fn set_max_seqlets_per_seq(&mut self, max: usize) -> Result<&mut Self> {
        if max == 0 {
            return Err(SeqletError::config("max seqlets per sequence must be > 0"));
        }

        self.max_seqlets_per_seq = max;
        Ok(self)
    }

    pub fn set_max_seqlets_total(&mut self, max: usize) -> Result<&mut Self> {
        if max == 0 {
            return Err(SeqletError::config("max seqlets in total must be > 0"));
        }

        self.max_seqlets_total = max;
        Ok(self)
    }

    pub fn set_take_abs(&mut self, take_abs: bool) -> &mut Self {
        self.take_abs = take_abs;
        self
    }

    pub fn set_min_ratio_top_peak(&mut self, ratio: f64) -> Result<&mut Self> {
        if !(0.0..=1.0).contains(&ratio) {
            return Err(SeqletError::config(format!(
                "min ratio to the top peak must be in [0, 1], got {ratio}"
            )));
        }

        self.min_ratio_top_peak = ratio;
        Ok(self)
    }

    pub fn set_min_ratio_over_bg(&mut self, ratio: f64) -> Result<&mut Self> {
        if !(ratio >= 0.0 && ratio.is_finite()) {
            return Err(SeqletError::config(format!(
                "min ratio over the background must be >= 0, got {ratio}"
            )));
        }

        self.min_ratio_over_bg = ratio;
        Ok(self)
    }

    pub fn set_apply_recentering(&mut self, apply: bool) -> &mut Self {
        self.apply_recentering = apply;
        self
    }

    pub fn set_thresholding(&mut self, selector: impl ThresholdSelector<V> + 'static) -> &mut Self {
        self.thresholding = Some(Box::new(selector));
        self
    }

    /// Keep every candidate that fits under the global cap.
    pub fn disable_thresholding(&mut self) -> &mut Self {
        self.thresholding = None;
        self
    }

    /// Report progress at `info` instead of `debug`.
    pub fn set_verbose(&mut self, verbose: bool) -> &mut Self {
        self.verbose = verbose;
        self
    }

    fn validate(&self, track: &Track<V>) -> Result<()> {
        let (examples, positions) = track.shape();
        if examples == 0 {
            return Err(SeqletError::shape("the track has no examples"));
        }
        if positions < self.sliding {
            return Err(SeqletError::shape(format!(
                "{positions} positions can't fit a sliding window of {}",
                self.sliding
            )));
        }
        if let Some(ind) = track.values().iter().position(|x| !x.is_finite()) {
            return Err(SeqletError::shape(format!(
                "non-finite score at example {}, position {}",
                ind / positions,
                ind % positions
            )));
        }

        let span = self.flank.saturating_mul(2).saturating_add(self.sliding);
        if positions < span {
            log::warn!(
                "Flanked seqlets span {span} positions, more than the {positions} available: \
                 no seqlets will be extracted"
            );
        }
        Ok(())
    }

    fn rules(&self) -> Result<Rules<V>> {
        let ratio = |x: f64| {
            cast::<f64, V>(x).ok_or_else(|| eyre!("Ratio {x} doesn't fit the score type"))
        };
        Ok(Rules {
            min_ratio_top_peak: ratio(self.min_ratio_top_peak)?,
            min_ratio_over_bg: ratio(self.min_ratio_over_bg)?,
            recentering: self.apply_recentering,
        })
    }

    pub fn run<B: NumericBackend>(&self, backend: &B, track: &Track<V>) -> Result<Extraction<V>> {
        self.validate(track)?;
        let level = if self.verbose {
            Level::Info
        } else {
            Level::Debug
        };

        let geometry = Geometry {
            sliding: self.sliding,
            flank: self.flank,
            suppress: self.suppress(),
            positions: track.positions(),
        };
        let rules = self.rules()?;

        let original = backend.windowed_sum(track, self.sliding)?;
        let mut rank = match self.take_abs {
            true => original.map(|x| x.abs()),
            false => original.clone(),
        };
        let mut background = rank.clone();
        let mut tops: Vec<Option<V>> = vec![None; track.examples()];
        log::log!(
            level,
            "Extracting up to {} seqlets from each of {} examples",
            self.max_seqlets_per_seq,
            track.examples()
        );

        let mut candidates = Vec::new();
        for round in 0..self.max_seqlets_per_seq {
            if rank.values().iter().all(|x| *x == V::neg_infinity()) {
                log::debug!("All examples are exhausted after {round} rounds");
                break;
            }
            let peaks = backend.row_argmax(&rank)?;

            // Every worker owns the rows of a single example
            let emitted = rank
                .par_rows_mut()
                .zip(background.par_rows_mut())
                .zip(original.par_rows())
                .zip(peaks.par_iter())
                .zip(tops.par_iter_mut())
                .enumerate()
                .map(|(example, ((((rank, background), original), peak), top))| {
                    Row {
                        example,
                        rank,
                        background,
                        original,
                    }
                    .step(&geometry, &rules, *peak, top)
                })
                .collect::<Result<Vec<_>>>()?;

            let before = candidates.len();
            candidates.extend(emitted.into_iter().flatten());
            log::trace!("Round {round}: {} new candidates", candidates.len() - before);
        }

        let vals_to_threshold: Vec<V> = candidates.iter().map(|x| x.magnitude()).collect();
        log::log!(level, "Found {} candidate seqlets", candidates.len());

        let thresholding = match &self.thresholding {
            Some(selector) if vals_to_threshold.len() >= 2 => {
                selector.select(&vals_to_threshold)?
            }
            Some(_) => {
                log::warn!(
                    "Thresholding is skipped: {} candidate(s) can't support a density estimate",
                    vals_to_threshold.len()
                );
                Thresholding::disabled()
            }
            None => Thresholding::disabled(),
        };
        log::log!(level, "Magnitude threshold: {:?}", thresholding.threshold());

        let threshold = *thresholding.threshold();
        let mut coords: Vec<SeqletCoords<V>> = candidates
            .into_iter()
            .filter(|x| x.magnitude() >= threshold)
            .collect();
        log::log!(level, "{} seqlets passed the threshold", coords.len());

        if coords.len() > self.max_seqlets_total {
            log::log!(
                level,
                "Keeping the {} strongest of {} seqlets",
                self.max_seqlets_total,
                coords.len()
            );
            // Stable: ties keep the emission order
            coords.sort_by(|a, b| {
                b.magnitude()
                    .partial_cmp(&a.magnitude())
                    .unwrap_or(Ordering::Equal)
            });
            coords.truncate(self.max_seqlets_total);
        }

        Ok(Extraction::new(coords, vals_to_threshold, thresholding))
    }
}
