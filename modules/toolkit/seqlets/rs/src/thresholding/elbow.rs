use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use derive_getters::{Dissolve, Getters};
use eyre::{eyre, Result};

use seqletkit_core_rs::num::{cast, Float};

use super::density::{bandwidth, dominant_mode, gaussian_kde, midpoints, reflect, KdeScale};
use super::derivatives::{angle_curvature, angle_firstd, firstd, pairwise_mean, Curve};
use super::ThresholdSelector;
use crate::error::SeqletError;
use crate::result::Thresholding;

/// Intermediate curves of a single elbow search, handed to an [`ElbowObserver`].
#[derive(Clone, PartialEq, Debug, Dissolve, Getters)]
pub struct ElbowDiagnostics {
    bandwidth: f64,
    mode: f64,
    midpoints: Vec<f64>,
    densities: Vec<f64>,
    first: Curve,
    curvature: Curve,
    second: Curve,
    third: Curve,
    threshold: f64,
    // Same search over the third derivative, reported but never used as the cutoff
    third_threshold: Option<f64>,
}

/// Receives diagnostics of every successful elbow search, e.g. to plot the density and its
/// derivatives.
pub trait ElbowObserver: Send + Sync {
    fn observe(&self, diagnostics: &ElbowDiagnostics);
}

impl<F: Fn(&ElbowDiagnostics) + Send + Sync> ElbowObserver for F {
    fn observe(&self, diagnostics: &ElbowDiagnostics) {
        self(diagnostics)
    }
}

/// Threshold at the point of maximal curvature to the right of the dominant mode of the score
/// distribution.
///
/// The distribution is mirrored around its mode before the kernel density estimate so that the
/// left tail can't distort the density, and the cutoff is the x of the largest second derivative
/// of the density where the smoothed second derivative is positive.
#[derive(Clone, Getters)]
pub struct CurvatureElbow {
    bins: usize,
    percentiles_in_bandwidth: f64,
    kde_scale: KdeScale,
    #[getter(skip)]
    observer: Option<Arc<dyn ElbowObserver>>,
}

impl Default for CurvatureElbow {
    fn default() -> Self {
        Self {
            bins: 100,
            percentiles_in_bandwidth: 10.0,
            kde_scale: KdeScale::Planar,
            observer: None,
        }
    }
}

impl Debug for CurvatureElbow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurvatureElbow")
            .field("bins", &self.bins)
            .field("percentiles_in_bandwidth", &self.percentiles_in_bandwidth)
            .field("kde_scale", &self.kde_scale)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl CurvatureElbow {
    pub fn new(bins: usize, percentiles_in_bandwidth: f64) -> Result<Self> {
        let mut elbow = Self::default();
        elbow
            .set_bins(bins)?
            .set_percentiles_in_bandwidth(percentiles_in_bandwidth)?;
        Ok(elbow)
    }

    pub fn set_bins(&mut self, bins: usize) -> Result<&mut Self> {
        if bins == 0 {
            return Err(SeqletError::config("number of density bins must be > 0"));
        }

        self.bins = bins;
        Ok(self)
    }

    pub fn set_percentiles_in_bandwidth(&mut self, percentiles: f64) -> Result<&mut Self> {
        if !(percentiles > 0.0 && percentiles < 100.0) {
            return Err(SeqletError::config(format!(
                "percentiles in bandwidth must be in (0, 100), got {percentiles}"
            )));
        }

        self.percentiles_in_bandwidth = percentiles;
        Ok(self)
    }

    /// The angle-based derivatives depend on the absolute density values, so the scale moves the
    /// selected threshold.
    pub fn set_kde_scale(&mut self, scale: KdeScale) -> &mut Self {
        self.kde_scale = scale;
        self
    }

    pub fn set_observer(&mut self, observer: impl ElbowObserver + 'static) -> &mut Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn clear_observer(&mut self) -> &mut Self {
        self.observer = None;
        self
    }

    pub fn has_observer(&self) -> bool {
        self.observer.is_some()
    }

    /// Run the elbow search over finite magnitudes and return every intermediate curve.
    pub fn analyze(&self, values: &[f64]) -> Result<ElbowDiagnostics> {
        if values.len() < 2 {
            return Err(SeqletError::degenerate(format!(
                "at least 2 values are required, got {}",
                values.len()
            )));
        }
        if let Some(x) = values.iter().find(|x| !x.is_finite()) {
            return Err(SeqletError::degenerate(format!("non-finite value {x}")));
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let (min, max) = (sorted[0], sorted[sorted.len() - 1]);

        let bandwidth = bandwidth(&sorted, self.percentiles_in_bandwidth)?;
        let mode = dominant_mode(values, 2 * self.bins);
        log::debug!("Elbow search: bandwidth {bandwidth}, dominant mode {mode}");

        let sample = reflect(values, mode);
        let midpoints = midpoints(min, max, self.bins);
        let densities = gaussian_kde(&sample, bandwidth, &midpoints, self.kde_scale);

        let first = angle_firstd(&midpoints, &densities);
        let curvature = angle_curvature(&midpoints, &densities);
        let second = angle_firstd(first.x(), first.y());
        let third = firstd(second.x(), second.y());
        let aligned = pairwise_mean(second.y());

        let threshold =
            elbow(&second, &aligned, mode).ok_or(SeqletError::ElbowNotFound { mode })?;
        let third_threshold = elbow(&third, &aligned, mode);
        log::debug!("Elbow search: threshold {threshold}");

        Ok(ElbowDiagnostics {
            bandwidth,
            mode,
            midpoints,
            densities,
            first,
            curvature,
            second,
            third,
            threshold,
            third_threshold,
        })
    }
}

// x of the first maximal y among samples right of the mode with a positive aligned value
fn elbow(curve: &Curve, aligned: &[f64], mode: f64) -> Option<f64> {
    let mut best: Option<(f64, f64)> = None;
    for ((x, y), avg) in curve.x().iter().zip(curve.y()).zip(aligned) {
        if *x > mode && *avg > 0.0 && best.is_none_or(|(_, top)| *y > top) {
            best = Some((*x, *y));
        }
    }
    best.map(|(x, _)| x)
}

impl<V: Float> ThresholdSelector<V> for CurvatureElbow {
    fn select(&self, values: &[V]) -> Result<Thresholding<V>> {
        let values = values
            .iter()
            .map(|x| {
                x.to_f64()
                    .filter(|x| x.is_finite())
                    .ok_or_else(|| SeqletError::degenerate(format!("non-finite value {x:?}")))
            })
            .collect::<Result<Vec<_>>>()?;

        let diagnostics = self.analyze(&values)?;
        if let Some(observer) = &self.observer {
            observer.observe(&diagnostics);
        }

        let convert = |x: f64| {
            cast::<f64, V>(x).ok_or_else(|| eyre!("Value {x} doesn't fit the score type"))
        };
        let threshold = convert(diagnostics.threshold)?;
        let densities = diagnostics
            .densities
            .iter()
            .map(|x| convert(*x))
            .collect::<Result<Vec<_>>>()?;
        Ok(Thresholding::new(threshold, Some(densities)))
    }
}
