#[cfg(feature = "bitcode")]
use bitcode::{Decode, Encode};
use derive_getters::{Dissolve, Getters};
use derive_more::Constructor;
use eyre::{eyre, Result};

use seqletkit_core_rs::num::Float;

use crate::coords::SeqletCoords;
use crate::save::GroupWriter;

/// Scalar cutoff chosen by a threshold selector and, when available, the density it was derived
/// from.
#[cfg_attr(feature = "bitcode", derive(Encode, Decode))]
#[derive(Clone, PartialEq, Debug, Default, Constructor, Dissolve, Getters)]
pub struct Thresholding<V> {
    threshold: V,
    densities: Option<Vec<V>>,
}

impl<V: Float> Thresholding<V> {
    /// Zero cutoff without density diagnostics, used when no selector runs.
    pub fn disabled() -> Self {
        Self::new(V::zero(), None)
    }

    pub fn save(&self, group: &mut dyn GroupWriter) -> Result<()> {
        group.write_attr("threshold", to_f64(self.threshold)?)?;
        if let Some(densities) = &self.densities {
            let densities = densities
                .iter()
                .map(|x| to_f64(*x))
                .collect::<Result<Vec<_>>>()?;
            group.write_numeric("densities", &densities)?;
        }
        Ok(())
    }
}

#[cfg_attr(feature = "bitcode", derive(Encode, Decode))]
#[derive(Clone, PartialEq, Debug, Default, Constructor, Dissolve, Getters)]
pub struct Extraction<V> {
    // Candidates that passed the threshold and the global cap
    coords: Vec<SeqletCoords<V>>,
    // |score| of every candidate before filtering, in emission order
    vals_to_threshold: Vec<V>,
    thresholding: Thresholding<V>,
}

impl<V: Float> Extraction<V> {
    pub fn save(&self, group: &mut dyn GroupWriter) -> Result<()> {
        let coords: Vec<String> = self.coords.iter().map(|x| x.to_string()).collect();
        group.write_strings("coords", &coords)?;

        let vals = self
            .vals_to_threshold
            .iter()
            .map(|x| to_f64(*x))
            .collect::<Result<Vec<_>>>()?;
        group.write_numeric("vals_to_threshold", &vals)?;

        let mut thresholding = group.create_group("thresholding_results")?;
        self.thresholding.save(&mut *thresholding)
    }
}

fn to_f64<V: Float>(value: V) -> Result<f64> {
    value
        .to_f64()
        .ok_or_else(|| eyre!("Value {:?} can't be represented as f64", value))
}
