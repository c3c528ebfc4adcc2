//! Image-domain cropping of k-space.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::Transform;
use crate::error::{Result, TransformError};
use crate::mask_func::seed_for;
use crate::ops::{complex_center_crop, complex_random_crop, FourierOperator, OffsetSampler};
use crate::sample::{Key, Sample, Value};

/// Target size of a k-space crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum CropSpec {
    /// Fixed `(height, width)`.
    Shape([usize; 2]),
    /// Read per sample from a shape field (first two entries).
    Key(Key),
}

impl CropSpec {
    fn validate(&self) -> Result<()> {
        match self {
            CropSpec::Shape(s) if s.contains(&0) => Err(TransformError::InvalidConfig(format!(
                "crop shape {:?} must be strictly positive",
                s
            ))),
            _ => Ok(()),
        }
    }

    fn resolve(&self, sample: &Sample) -> Result<[usize; 2]> {
        match self {
            CropSpec::Shape(s) => Ok(*s),
            CropSpec::Key(key) => {
                let dims = sample.shape_value(*key, "dynamic crop shape")?;
                match dims {
                    [h, w, ..] => Ok([*h, *w]),
                    _ => Err(TransformError::InvalidConfig(format!(
                        "crop key `{}` holds {:?}, need at least two entries",
                        key, dims
                    ))),
                }
            }
        }
    }
}

/// Crop k-space by way of the image domain.
///
/// k-space is back-projected, the image is cropped (centered or at a random
/// offset) and the crop is projected back, replacing `kspace`.
pub struct CropKspace {
    crop: CropSpec,
    forward_operator: Arc<dyn FourierOperator>,
    backward_operator: Arc<dyn FourierOperator>,
    image_space_center_crop: bool,
    sampler: OffsetSampler,
    use_seed: bool,
}

impl CropKspace {
    pub fn new(
        crop: CropSpec,
        forward_operator: Arc<dyn FourierOperator>,
        backward_operator: Arc<dyn FourierOperator>,
        image_space_center_crop: bool,
        sampler: OffsetSampler,
        use_seed: bool,
    ) -> Result<Self> {
        crop.validate()?;
        if let OffsetSampler::Gaussian { sigma: Some(s) } = &sampler {
            if s.iter().any(|v| !v.is_finite() || *v < 0.0) {
                return Err(TransformError::InvalidConfig(format!(
                    "gaussian crop sigma {:?} must be finite and non-negative",
                    s
                )));
            }
        }
        Ok(Self {
            crop,
            forward_operator,
            backward_operator,
            image_space_center_crop,
            sampler,
            use_seed,
        })
    }
}

impl Transform for CropKspace {
    fn name(&self) -> &'static str {
        "CropKspace"
    }

    fn apply(&self, sample: &mut Sample) -> Result<()> {
        let kspace = sample.complex(Key::Kspace, "k-space crop")?;
        let backprojected = self.backward_operator.apply(kspace)?;
        let crop_shape = self.crop.resolve(sample)?;

        let cropped = if self.image_space_center_crop {
            complex_center_crop(&backprojected, crop_shape)?
        } else {
            let mut rng = match seed_for(self.use_seed, sample.filename()) {
                Some(seed) => seed.rng(),
                None => StdRng::from_entropy(),
            };
            complex_random_crop(&backprojected, crop_shape, &self.sampler, &mut rng)?
        };

        let cropped_kspace = self.forward_operator.apply(&cropped)?;
        tracing::trace!(
            "{}: cropped k-space to {:?}",
            sample.filename(),
            cropped_kspace.shape()
        );
        sample.insert(Key::Kspace, Value::Complex(cropped_kspace));
        Ok(())
    }
}
