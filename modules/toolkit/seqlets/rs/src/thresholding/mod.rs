use std::fmt::Debug;

use dyn_clone::DynClone;
use eyre::Result;

use seqletkit_core_rs::num::Float;

use crate::result::Thresholding;

pub use density::KdeScale;
pub use derivatives::Curve;
pub use elbow::{CurvatureElbow, ElbowDiagnostics, ElbowObserver};

pub mod density;
pub mod derivatives;
mod elbow;

/// Strategy that turns the magnitudes of all candidates into a single cutoff.
pub trait ThresholdSelector<V: Float>: DynClone + Debug + Send + Sync {
    fn select(&self, values: &[V]) -> Result<Thresholding<V>>;
}

dyn_clone::clone_trait_object!(<V> ThresholdSelector<V> where V: Float);

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug)]
    struct Fixed(f32);

    impl ThresholdSelector<f32> for Fixed {
        fn select(&self, _: &[f32]) -> Result<Thresholding<f32>> {
            Ok(Thresholding::new(self.0, None))
        }
    }

    #[test]
    fn test_boxed_selectors_are_cloneable() -> Result<()> {
        let selectors: Vec<Box<dyn ThresholdSelector<f32>>> =
            vec![Box::new(Fixed(1.5)), Box::new(CurvatureElbow::default())];
        let cloned = selectors.clone();

        assert_eq!(*cloned[0].select(&[])?.threshold(), 1.5);
        assert!(format!("{:?}", cloned[1]).starts_with("CurvatureElbow"));
        Ok(())
    }
}
