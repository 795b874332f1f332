//! Finite-difference stages of the elbow search. Every stage maps sampled curves to a new curve
//! sampled at the midpoints of adjacent x values, so each stage is one sample shorter.

use derive_getters::{Dissolve, Getters};
use derive_more::Constructor;
use itertools::Itertools;

#[derive(Clone, PartialEq, Debug, Default, Constructor, Dissolve, Getters)]
pub struct Curve {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl Curve {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

fn midpoint_stage(x: &[f64], y: &[f64], slope: impl Fn(f64, f64) -> f64) -> Curve {
    debug_assert_eq!(x.len(), y.len());
    let (x, y) = x
        .iter()
        .tuple_windows()
        .zip(y.iter().tuple_windows())
        .map(|((x0, x1), (y0, y1))| (0.5 * (x0 + x1), slope(y1 - y0, x1 - x0)))
        .unzip();
    Curve::new(x, y)
}

/// Plain rise over run.
pub fn firstd(x: &[f64], y: &[f64]) -> Curve {
    midpoint_stage(x, y, |dy, dx| dy / dx)
}

/// Angle of the secant line, `atan2(dy, dx)`. Unlike the plain slope it is bounded, so steep
/// density flanks do not dominate the next stage.
pub fn angle_firstd(x: &[f64], y: &[f64]) -> Curve {
    midpoint_stage(x, y, |dy, dx| dy.atan2(dx))
}

/// Rate of change of the secant angle.
pub fn angle_curvature(x: &[f64], y: &[f64]) -> Curve {
    let angles = angle_firstd(x, y);
    firstd(angles.x(), angles.y())
}

/// Averages of adjacent samples.
pub fn pairwise_mean(y: &[f64]) -> Vec<f64> {
    y.iter().tuple_windows().map(|(a, b)| 0.5 * (a + b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_firstd() {
        let curve = firstd(&[0.0, 1.0, 3.0], &[0.0, 2.0, 3.0]);
        assert_eq!(curve.x(), &vec![0.5, 2.0]);
        assert_eq!(curve.y(), &vec![2.0, 0.5]);
        assert!(firstd(&[1.0], &[1.0]).is_empty());
    }

    #[test]
    fn test_angle_firstd() {
        let curve = angle_firstd(&[0.0, 1.0, 2.0, 3.0], &[0.0, 1.0, 1.0, 0.0]);
        assert_eq!(curve.len(), 3);
        let expected = [
            std::f64::consts::FRAC_PI_4,
            0.0,
            -std::f64::consts::FRAC_PI_4,
        ];
        for (found, expected) in curve.y().iter().zip(expected) {
            assert!((found - expected).abs() < EPS);
        }
    }

    #[test]
    fn test_angle_curvature_of_line_is_flat() {
        let x: Vec<f64> = (0..10).map(|i| i as f64 * 0.5).collect();
        let y: Vec<f64> = x.iter().map(|x| 3.0 - 2.0 * x).collect();
        let curvature = angle_curvature(&x, &y);
        assert_eq!(curvature.len(), 8);
        assert!(curvature.y().iter().all(|y| y.abs() < EPS));
        assert_eq!(curvature.x()[0], 0.5);
    }

    #[test]
    fn test_pairwise_mean() {
        assert_eq!(pairwise_mean(&[1.0, 3.0, -1.0]), vec![2.0, 1.0]);
        assert!(pairwise_mean(&[1.0]).is_empty());
    }
}
