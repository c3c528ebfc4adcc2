//! Coil-combined image reconstruction.

use std::sync::Arc;

use ndarray::Axis;

use super::Transform;
use crate::error::{Result, TransformError};
use crate::mask_func::{seed_for, MaskFunc};
use crate::ops::{
    apply_mask, complex_multiplication, conjugate, modulus, root_sum_of_squares, FourierOperator,
};
use crate::sample::{Key, Sample, Value};

/// Coil combination used to form the target image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconstructionType {
    /// Sum of per-coil complex images.
    Complex,
    /// Magnitude of [`ReconstructionType::Complex`].
    ComplexMod,
    /// Root-sum-of-squares over coils.
    #[default]
    Rss,
    /// Sum over coils of `conj(sensitivity) * image`.
    Sense,
    /// Magnitude of [`ReconstructionType::Sense`].
    SenseMod,
}

impl ReconstructionType {
    /// True when the target is real-valued.
    pub fn is_real(self) -> bool {
        matches!(self, Self::ComplexMod | Self::Rss | Self::SenseMod)
    }
}

impl std::str::FromStr for ReconstructionType {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "complex" => Ok(Self::Complex),
            "complex_mod" => Ok(Self::ComplexMod),
            "rss" => Ok(Self::Rss),
            "sense" => Ok(Self::Sense),
            "sense_mod" => Ok(Self::SenseMod),
            other => Err(TransformError::InvalidConfig(format!(
                "unknown reconstruction type `{}`",
                other
            ))),
        }
    }
}

/// Back-project k-space and combine coils into `target_key`.
///
/// Output is `([slice,] h, w)` for real-valued types and
/// `([slice,] h, w, 2)` otherwise.
pub struct ComputeImage {
    kspace_key: Key,
    target_key: Key,
    backward_operator: Arc<dyn FourierOperator>,
    type_reconstruction: ReconstructionType,
}

impl ComputeImage {
    pub fn new(
        kspace_key: Key,
        target_key: Key,
        backward_operator: Arc<dyn FourierOperator>,
        type_reconstruction: ReconstructionType,
    ) -> Self {
        Self {
            kspace_key,
            target_key,
            backward_operator,
            type_reconstruction,
        }
    }
}

impl Transform for ComputeImage {
    fn name(&self) -> &'static str {
        "ComputeImage"
    }

    fn apply(&self, sample: &mut Sample) -> Result<()> {
        let kspace = sample.complex(self.kspace_key, "image reconstruction")?;
        let image = self.backward_operator.apply(kspace)?;

        let combined = match self.type_reconstruction {
            ReconstructionType::Complex | ReconstructionType::ComplexMod => image.sum_axis(Axis(0)),
            ReconstructionType::Rss => root_sum_of_squares(&image, true)?,
            ReconstructionType::Sense | ReconstructionType::SenseMod => {
                let sensitivity_map = sample.complex(
                    Key::SensitivityMap,
                    "sensitivity map is required for SENSE reconstruction",
                )?;
                complex_multiplication(&conjugate(sensitivity_map)?, &image)?.sum_axis(Axis(0))
            }
        };

        let target = match self.type_reconstruction {
            ReconstructionType::ComplexMod | ReconstructionType::SenseMod => {
                Value::Real(modulus(&combined)?)
            }
            ReconstructionType::Rss => Value::Real(combined),
            ReconstructionType::Complex | ReconstructionType::Sense => Value::Complex(combined),
        };
        sample.insert(self.target_key, target);
        Ok(())
    }
}

/// Reference image from the ACS region of the current (possibly cropped)
/// k-space, stored as `body_coil_image`.
pub struct EstimateBodyCoilImage {
    mask_func: Arc<dyn MaskFunc>,
    backward_operator: Arc<dyn FourierOperator>,
    use_seed: bool,
}

impl EstimateBodyCoilImage {
    pub fn new(
        mask_func: Arc<dyn MaskFunc>,
        backward_operator: Arc<dyn FourierOperator>,
        use_seed: bool,
    ) -> Self {
        Self {
            mask_func,
            backward_operator,
            use_seed,
        }
    }
}

impl Transform for EstimateBodyCoilImage {
    fn name(&self) -> &'static str {
        "EstimateBodyCoilImage"
    }

    fn apply(&self, sample: &mut Sample) -> Result<()> {
        let kspace = sample.complex(Key::Kspace, "body coil image estimation")?;
        // A fresh ACS mask: k-space may have been cropped since the first one was drawn.
        let seed = seed_for(self.use_seed, sample.filename());
        let acs_mask = self
            .mask_func
            .generate(&kspace.shape()[1..], seed.as_ref(), true)?;

        let acs_kspace = apply_mask(kspace, &acs_mask)?;
        let acs_image = self.backward_operator.apply(&acs_kspace)?;
        let body_coil_image = root_sum_of_squares(&acs_image, true)?;
        sample.insert(Key::BodyCoilImage, Value::Real(body_coil_image));
        Ok(())
    }
}
