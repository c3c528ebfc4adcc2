//! Detection and removal of zero-padded k-space regions.

use ndarray::Axis;

use super::Transform;
use crate::error::Result;
use crate::ops::{apply_padding, modulus};
use crate::sample::{Key, Sample, Value};

/// Detect zero-padded k-space locations.
///
/// With `E(x) = Σ_c |y_c(x)|` the coil-summed magnitude, a location is padding
/// when `E(x) < mean(E) * eps`. The mask is stored as `(1, [slice,] h, w, 1)`.
#[derive(Debug, Clone)]
pub struct ComputeZeroPadding {
    pub kspace_key: Key,
    pub padding_key: Key,
    pub eps: f32,
}

impl Default for ComputeZeroPadding {
    fn default() -> Self {
        Self {
            kspace_key: Key::Kspace,
            padding_key: Key::Padding,
            eps: 1e-4,
        }
    }
}

impl ComputeZeroPadding {
    pub fn new(kspace_key: Key, padding_key: Key, eps: f32) -> Self {
        Self {
            kspace_key,
            padding_key,
            eps,
        }
    }
}

impl Transform for ComputeZeroPadding {
    fn name(&self) -> &'static str {
        "ComputeZeroPadding"
    }

    fn apply(&self, sample: &mut Sample) -> Result<()> {
        let kspace = sample.complex(self.kspace_key, "zero-padding detection")?;
        let energy = modulus(kspace)?.sum_axis(Axis(0));
        let threshold = energy.mean().unwrap_or(0.0) * self.eps;
        let padding = energy.mapv(|v| v < threshold).insert_axis(Axis(0));
        let last = padding.ndim();
        let padding = padding.insert_axis(Axis(last));

        tracing::trace!(
            "{}: {} of {} locations flagged as padding",
            sample.filename(),
            padding.iter().filter(|&&p| p).count(),
            padding.len()
        );
        sample.insert(self.padding_key, Value::Mask(padding));
        Ok(())
    }
}

/// Zero k-space wherever the padding mask is set.
#[derive(Debug, Clone)]
pub struct ApplyZeroPadding {
    pub kspace_key: Key,
    pub padding_key: Key,
}

impl Default for ApplyZeroPadding {
    fn default() -> Self {
        Self {
            kspace_key: Key::Kspace,
            padding_key: Key::Padding,
        }
    }
}

impl Transform for ApplyZeroPadding {
    fn name(&self) -> &'static str {
        "ApplyZeroPadding"
    }

    fn apply(&self, sample: &mut Sample) -> Result<()> {
        let kspace = sample.complex(self.kspace_key, "zero-padding application")?;
        let padding = sample.mask(self.padding_key, "zero-padding application")?;
        let padded = apply_padding(kspace, padding)?;
        sample.insert(self.kspace_key, Value::Complex(padded));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::synthetic_kspace;
    use ndarray::s;

    #[test]
    fn zero_columns_are_flagged_as_padding() {
        let mut kspace = synthetic_kspace(3, 8, 8);
        kspace.slice_mut(s![.., .., 0..2, ..]).fill(0.0);
        let mut sample = Sample::new("a").with(Key::Kspace, Value::Complex(kspace));

        ComputeZeroPadding::default().apply(&mut sample).unwrap();
        let padding = sample.mask(Key::Padding, "t").unwrap();
        assert_eq!(padding.shape(), &[1, 8, 8, 1]);
        for (idx, &p) in padding.indexed_iter() {
            assert_eq!(p, idx[2] < 2, "at {:?}", idx);
        }
    }

    #[test]
    fn huge_eps_flags_everything() {
        let mut sample = Sample::new("a").with(Key::Kspace, Value::Complex(synthetic_kspace(2, 4, 4)));
        ComputeZeroPadding::new(Key::Kspace, Key::Padding, 1e6)
            .apply(&mut sample)
            .unwrap();
        assert!(sample.mask(Key::Padding, "t").unwrap().iter().all(|&p| p));
    }

    #[test]
    fn padding_application_zeroes_flagged_locations() {
        let kspace = synthetic_kspace(2, 4, 4);
        let padding = ndarray::ArrayD::from_shape_fn(ndarray::IxDyn(&[1, 4, 4, 1]), |i| i[1] == 3);
        let mut sample = Sample::new("a")
            .with(Key::Kspace, Value::Complex(kspace.clone()))
            .with(Key::Padding, Value::Mask(padding));
        ApplyZeroPadding::default().apply(&mut sample).unwrap();
        let out = sample.complex(Key::Kspace, "t").unwrap();
        assert!(out.slice(s![.., 3, .., ..]).iter().all(|&v| v == 0.0));
        assert_eq!(out.slice(s![.., 0..3, .., ..]), kspace.slice(s![.., 0..3, .., ..]));
    }

    #[test]
    fn missing_padding_is_an_error() {
        let mut sample = Sample::new("a").with(Key::Kspace, Value::Complex(synthetic_kspace(1, 2, 2)));
        assert!(ApplyZeroPadding::default()
            .apply(&mut sample)
            .unwrap_err()
            .is_missing_dependency());
    }
}
