//! Density stages of the elbow search: bandwidth choice, dominant mode, reflection around the
//! mode and the Gaussian kernel density itself.

use std::f64::consts::PI;

use eyre::Result;
use rayon::prelude::*;

use crate::error::SeqletError;

/// Median of the values, the mean of the two middle values for even counts.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);

    let mid = values.len() / 2;
    match values.len() % 2 {
        0 => Some(0.5 * (values[mid - 1] + values[mid])),
        _ => Some(values[mid]),
    }
}

/// Median gap between every `step`-th sorted value, `step` covering `percentiles` percent of the
/// sample.
pub fn bandwidth(sorted: &[f64], percentiles: f64) -> Result<f64> {
    if sorted.len() < 2 {
        return Err(SeqletError::degenerate(format!(
            "at least 2 values are required, got {}",
            sorted.len()
        )));
    }
    let step = (((0.01 * sorted.len() as f64) * percentiles).floor() as usize).max(1);

    let mut last = sorted[0];
    let mut gaps = Vec::with_capacity(sorted.len() / step);
    for ind in (step..sorted.len()).step_by(step) {
        gaps.push(sorted[ind] - last);
        last = sorted[ind];
    }

    match median(&mut gaps) {
        Some(bandwidth) if bandwidth > 0.0 => Ok(bandwidth),
        bandwidth => Err(SeqletError::degenerate(format!(
            "kernel bandwidth must be positive, got {:?}",
            bandwidth
        ))),
    }
}

/// Center of the most populated bin of an equal-width histogram over [min, max]. The first bin
/// wins ties.
pub fn dominant_mode(values: &[f64], bins: usize) -> f64 {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
            (lo.min(*x), hi.max(*x))
        });
    let (lo, hi) = if min == max {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    };

    let mut counts = vec![0usize; bins];
    for x in values {
        let ind = (((x - lo) / (hi - lo)) * bins as f64) as usize;
        counts[ind.min(bins - 1)] += 1;
    }

    let mut top = 0;
    for (ind, cnt) in counts.iter().enumerate() {
        if *cnt > counts[top] {
            top = ind;
        }
    }
    lo + (top as f64 + 0.5) * ((hi - lo) / bins as f64)
}

/// Values at or above the mode followed by their mirror images around the mode.
pub fn reflect(values: &[f64], mode: f64) -> Vec<f64> {
    let mut reflected: Vec<f64> = values.iter().copied().filter(|x| *x >= mode).collect();
    let mirrored: Vec<f64> = reflected.iter().map(|x| 2.0 * mode - x).collect();
    reflected.extend(mirrored);
    reflected
}

/// Centers of `bins` equal slices of [min, max].
pub fn midpoints(min: f64, max: f64, bins: usize) -> Vec<f64> {
    (0..bins)
        .map(|ind| min + ((ind as f64 + 0.5) * (max - min)) / bins as f64)
        .collect()
}

/// Normalization of the Gaussian kernel density.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum KdeScale {
    /// Two-dimensional kernel over the points lifted to (x, 0): the one-dimensional density times
    /// 1 / (h sqrt(2 pi)).
    #[default]
    Planar,
    /// One-dimensional density, integrates to 1 over x.
    Linear,
}

impl KdeScale {
    fn norm(&self, samples: usize, bandwidth: f64) -> f64 {
        let linear = 1.0 / (samples as f64 * bandwidth * (2.0 * PI).sqrt());
        match self {
            KdeScale::Planar => linear / (bandwidth * (2.0 * PI).sqrt()),
            KdeScale::Linear => linear,
        }
    }
}

/// Gaussian kernel density of the sample evaluated at each point.
pub fn gaussian_kde(sample: &[f64], bandwidth: f64, points: &[f64], scale: KdeScale) -> Vec<f64> {
    let norm = scale.norm(sample.len(), bandwidth);
    points
        .par_iter()
        .map(|point| {
            sample
                .iter()
                .map(|x| {
                    let z = (point - x) / bandwidth;
                    (-0.5 * z * z).exp()
                })
                .sum::<f64>()
                * norm
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median() {
        assert_eq!(median(&mut []), None);
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn test_bandwidth() -> Result<()> {
        // 20 values, 10 percentiles -> every 2nd value, gaps of 2.0
        let sorted: Vec<f64> = (0..20).map(|x| x as f64).collect();
        assert_eq!(bandwidth(&sorted, 10.0)?, 2.0);

        // Fewer values than a single percentile step still sample every value
        assert_eq!(bandwidth(&[0.0, 1.0, 3.0], 10.0)?, 1.5);
        Ok(())
    }

    #[test]
    fn test_degenerate_bandwidth() {
        for sorted in [vec![1.0], vec![2.0; 50]] {
            let err = bandwidth(&sorted, 10.0).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<SeqletError>(),
                Some(SeqletError::DegenerateDistribution { .. })
            ));
        }
    }

    #[test]
    fn test_dominant_mode() {
        // Bins of width 1 over [0, 4]: [0, 1) holds 1 value, [1, 2) holds 3 values
        let values = [0.5, 1.1, 1.5, 1.9, 2.5, 4.0];
        assert_eq!(dominant_mode(&values, 4), 1.5);

        // The maximum falls into the last bin
        assert_eq!(dominant_mode(&[0.0, 3.9, 4.0, 4.0], 4), 3.5);

        // Ties are resolved to the first bin
        assert_eq!(dominant_mode(&[0.0, 4.0], 4), 0.5);

        // Constant samples are binned over [x - 0.5, x + 0.5]
        assert_eq!(dominant_mode(&[2.0, 2.0], 2), 2.25);
    }

    #[test]
    fn test_reflect() {
        assert_eq!(reflect(&[0.0, 1.0, 3.0, 4.0], 2.0), vec![3.0, 4.0, 1.0, 0.0]);
    }

    #[test]
    fn test_midpoints() {
        assert_eq!(midpoints(0.0, 4.0, 4), vec![0.5, 1.5, 2.5, 3.5]);
    }

    #[test]
    fn test_gaussian_kde() {
        let densities = gaussian_kde(&[0.0], 1.0, &[0.0, 1.0, -1.0], KdeScale::Linear);
        let peak = 1.0 / (2.0 * PI).sqrt();
        assert!((densities[0] - peak).abs() < 1e-12);
        assert!((densities[1] - peak * (-0.5f64).exp()).abs() < 1e-12);
        assert_eq!(densities[1], densities[2]);

        // The linear density integrates to ~1
        let grid: Vec<f64> = (0..2001).map(|x| -10.0 + x as f64 * 0.01).collect();
        let linear = gaussian_kde(&[-1.0, 0.5, 2.0], 0.7, &grid, KdeScale::Linear);
        let area: f64 = linear.iter().sum::<f64>() * 0.01;
        assert!((area - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_planar_kde() {
        // Planar density of a single point at the origin is 1 / (2 pi h^2)
        let densities = gaussian_kde(&[0.0], 0.5, &[0.0], KdeScale::Planar);
        assert!((densities[0] - 1.0 / (2.0 * PI * 0.25)).abs() < 1e-12);

        let sample = [-1.0, 0.5, 2.0];
        let points = [-0.3, 0.0, 1.7];
        let linear = gaussian_kde(&sample, 0.7, &points, KdeScale::Linear);
        let planar = gaussian_kde(&sample, 0.7, &points, KdeScale::Planar);
        for (l, p) in linear.iter().zip(&planar) {
            assert!((p - l / (0.7 * (2.0 * PI).sqrt())).abs() < 1e-12);
        }
    }
}
