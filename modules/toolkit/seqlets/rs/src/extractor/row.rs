use std::ops::Range;

use eyre::{eyre, Result};

use seqletkit_core_rs::backend::argmax;
use seqletkit_core_rs::num::Float;

use crate::coords::SeqletCoords;
use crate::error::SeqletError;

/// Window layout shared by all rows of a track.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) struct Geometry {
    pub sliding: usize,
    pub flank: usize,
    pub suppress: usize,
    pub positions: usize,
}

impl Geometry {
    /// Width of the summed rows, one column per complete window.
    pub fn width(&self) -> usize {
        self.positions - self.sliding + 1
    }

    /// Summed columns masked around a peak: [floor(a + 0.5 - S), ceil(a + 0.5 + S)) clipped to
    /// the summed row.
    pub fn suppression(&self, peak: usize) -> Range<usize> {
        let start = peak.saturating_sub(self.suppress);
        let end = peak.saturating_add(self.suppress).saturating_add(1).min(self.width());
        start..end
    }

    /// Flanked seqlet [a - F, a + W + F) if it fits into the track.
    pub fn window(&self, peak: usize) -> Option<(usize, usize)> {
        let end = peak.saturating_add(self.sliding).saturating_add(self.flank);
        if peak < self.flank || end > self.positions {
            None
        } else {
            Some((peak - self.flank, end))
        }
    }

    /// Strongest signed window around the peak, searched over [a - F - W/2, a + F + W/2).
    pub fn recenter<V: Float>(&self, original: &[V], peak: usize) -> Option<usize> {
        let reach = self.flank.saturating_add(self.sliding / 2);
        if reach == 0 {
            return Some(peak);
        }
        if peak < reach || peak.saturating_add(reach) > original.len() {
            return None;
        }

        let start = peak - reach;
        argmax(&original[start..peak + reach]).map(|x| start + x)
    }
}

/// Acceptance rules applied to every feasible peak.
#[derive(Copy, Clone, PartialEq, Debug)]
pub(crate) struct Rules<V> {
    pub min_ratio_top_peak: V,
    pub min_ratio_over_bg: V,
    pub recentering: bool,
}

impl<V: Float> Rules<V> {
    pub fn accepts(&self, height: V, top: V, background: V) -> bool {
        // Zero-height chunks only pass when both filters are off
        if height == V::zero() {
            return self.min_ratio_top_peak == V::zero() && self.min_ratio_over_bg == V::zero();
        }
        height >= top * self.min_ratio_top_peak
            && height.abs() >= background.abs() * self.min_ratio_over_bg
    }
}

/// Working state of a single example: the ranking row masked with -inf as peaks are consumed,
/// the background row zeroed around accepted peaks and the signed summed row used for scores.
pub(crate) struct Row<'a, V> {
    pub example: usize,
    pub rank: &'a mut [V],
    pub background: &'a mut [V],
    pub original: &'a [V],
}

impl<V: Float> Row<'_, V> {
    fn unsuppressed(&self) -> usize {
        self.rank.iter().filter(|x| **x != V::neg_infinity()).count()
    }

    /// Mean of the background row over the positions that were never suppressed.
    pub fn background_average(&self, unsuppressed: usize) -> Result<V> {
        if unsuppressed == 0 {
            return Err(SeqletError::DegenerateBackground {
                example: self.example,
            }
            .into());
        }
        let total = self.background.iter().fold(V::zero(), |acc, x| acc + *x);
        let count = V::from(unsuppressed)
            .ok_or_else(|| eyre!("Count {unsuppressed} doesn't fit the score type"))?;
        Ok(total / count)
    }

    /// One extraction round: consume the peak at `peak` and return the seqlet it yields, if any.
    /// `top` keeps the height of the first-round peak of the example.
    pub fn step(
        &mut self,
        geometry: &Geometry,
        rules: &Rules<V>,
        peak: usize,
        top: &mut Option<V>,
    ) -> Result<Option<SeqletCoords<V>>> {
        let unsuppressed = self.unsuppressed();
        if unsuppressed == 0 {
            log::trace!("Example {} is exhausted", self.example);
            return Ok(None);
        }

        let background = self.background_average(unsuppressed)?;
        let height = self.rank[peak];
        let top = *top.get_or_insert(height);
        let suppressed = geometry.suppression(peak);

        let mut emitted = None;
        if geometry.window(peak).is_some() && rules.accepts(height, top, background) {
            emitted = self.emit(geometry, rules, peak)?;
            self.background[suppressed.clone()].fill(V::zero());
        }
        self.rank[suppressed].fill(V::neg_infinity());

        Ok(emitted)
    }

    fn emit(
        &self,
        geometry: &Geometry,
        rules: &Rules<V>,
        peak: usize,
    ) -> Result<Option<SeqletCoords<V>>> {
        let center = match rules.recentering {
            true => match geometry.recenter(self.original, peak) {
                Some(center) => center,
                None => return Ok(None),
            },
            false => peak,
        };

        match geometry.window(center) {
            Some((start, end)) => {
                SeqletCoords::new(self.example, start, end, self.original[center]).map(Some)
            }
            None => Ok(None),
        }
    }
}
