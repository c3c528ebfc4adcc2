//! Sampling mask creation and masked k-space.

use std::sync::Arc;

use super::Transform;
use crate::error::{Result, TransformError};
use crate::mask_func::{seed_for, MaskFunc};
use crate::ops::apply_mask;
use crate::ops::mask::apply_padding_to_mask;
use crate::sample::{Key, Sample, Value};

/// Shape handed to the mask generator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MaskShape {
    /// k-space shape without the coil axis.
    #[default]
    FromKspace,
    /// Spatial shape where `None` entries are taken from k-space.
    Partial(Vec<Option<usize>>),
    /// Fixed spatial shape.
    Fixed(Vec<usize>),
}

impl MaskShape {
    /// Resolve against a k-space shape `(coil, [slice,] h, w, 2)`. The result
    /// always ends with the complex axis.
    pub fn resolve(&self, kspace_shape: &[usize]) -> Result<Vec<usize>> {
        if kspace_shape.len() < 3 {
            return Err(TransformError::ShapeMismatch {
                lhs: kspace_shape.to_vec(),
                rhs: vec![0, 0, 0, 2],
            });
        }
        let mut shape = match self {
            MaskShape::FromKspace => return Ok(kspace_shape[1..].to_vec()),
            MaskShape::Partial(dims) => {
                let spatial = &kspace_shape[1..kspace_shape.len() - 1];
                if dims.len() > spatial.len() {
                    return Err(TransformError::InvalidConfig(format!(
                        "mask shape {:?} has more axes than k-space {:?}",
                        dims, kspace_shape
                    )));
                }
                dims.iter()
                    .zip(spatial)
                    .map(|(d, &k)| d.unwrap_or(k))
                    .collect::<Vec<_>>()
            }
            MaskShape::Fixed(dims) => dims.clone(),
        };
        shape.push(2);
        Ok(shape)
    }
}

/// Draw the sampling mask (and optionally the ACS mask) for a sample.
pub struct CreateSamplingMask {
    mask_func: Arc<dyn MaskFunc>,
    shape: MaskShape,
    use_seed: bool,
    return_acs: bool,
}

impl CreateSamplingMask {
    pub fn new(mask_func: Arc<dyn MaskFunc>, shape: MaskShape, use_seed: bool, return_acs: bool) -> Self {
        Self {
            mask_func,
            shape,
            use_seed,
            return_acs,
        }
    }
}

impl Transform for CreateSamplingMask {
    fn name(&self) -> &'static str {
        "CreateSamplingMask"
    }

    fn apply(&self, sample: &mut Sample) -> Result<()> {
        let kspace_shape = sample
            .complex(Key::Kspace, "sampling mask shape is derived from k-space")?
            .shape()
            .to_vec();
        let shape = self.shape.resolve(&kspace_shape)?;
        let seed = seed_for(self.use_seed, sample.filename());

        let mut sampling_mask = self.mask_func.generate(&shape, seed.as_ref(), false)?;
        if sample.contains(Key::Padding) {
            let padding = sample.mask(Key::Padding, "zero padding")?;
            sampling_mask = apply_padding_to_mask(&sampling_mask, padding)?;
        }
        sample.insert(Key::SamplingMask, Value::Mask(sampling_mask));

        if self.return_acs {
            // The ACS mask follows the actual k-space extent, not the requested shape.
            let acs_mask = self
                .mask_func
                .generate(&kspace_shape[1..], seed.as_ref(), true)?;
            sample.insert(Key::AcsMask, Value::Mask(acs_mask));
        }
        Ok(())
    }
}

/// Mask `input_kspace_key` with `sampling_mask_key` into `target_kspace_key`.
#[derive(Debug, Clone)]
pub struct ApplyMask {
    pub sampling_mask_key: Key,
    pub input_kspace_key: Key,
    pub target_kspace_key: Key,
}

impl Default for ApplyMask {
    fn default() -> Self {
        Self {
            sampling_mask_key: Key::SamplingMask,
            input_kspace_key: Key::Kspace,
            target_kspace_key: Key::MaskedKspace,
        }
    }
}

impl Transform for ApplyMask {
    fn name(&self) -> &'static str {
        "ApplyMask"
    }

    fn apply(&self, sample: &mut Sample) -> Result<()> {
        let kspace = sample.complex(self.input_kspace_key, "input k-space for masking")?;
        let mask = sample.mask(self.sampling_mask_key, "sampling mask for masking")?;
        let masked = apply_mask(kspace, mask)?;
        sample.insert(self.target_kspace_key, Value::Complex(masked));
        Ok(())
    }
}
