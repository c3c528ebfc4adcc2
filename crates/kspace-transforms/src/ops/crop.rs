//! Spatial cropping of complex tensors.
//!
//! Crops act on the two axes preceding the complex axis, i.e. `(height, width)`
//! of `(coil, [slice,] height, width, 2)`.

use ndarray::{ArrayD, Slice};
use rand::Rng;
use rand_distr::StandardNormal;

use super::complex::assert_complex;
use crate::error::{Result, TransformError};

/// How random crop offsets are drawn.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum OffsetSampler {
    /// Every valid offset is equally likely.
    #[default]
    Uniform,
    /// Offsets concentrate around the centered position.
    ///
    /// `sigma` is the per-axis standard deviation in pixels; when unset it
    /// defaults to a quarter of the valid offset range on that axis.
    Gaussian { sigma: Option<[f64; 2]> },
}

/// Spatial `(height, width)` extent of a complex tensor.
fn spatial_extent(data: &ArrayD<f32>) -> Result<[usize; 2]> {
    assert_complex(&data.view())?;
    let ndim = data.ndim();
    if ndim < 3 {
        return Err(TransformError::ShapeMismatch {
            lhs: data.shape().to_vec(),
            rhs: vec![0, 0, 2],
        });
    }
    Ok([data.shape()[ndim - 3], data.shape()[ndim - 2]])
}

fn check_crop(extent: [usize; 2], crop: [usize; 2]) -> Result<()> {
    if crop.iter().any(|&c| c == 0) || crop[0] > extent[0] || crop[1] > extent[1] {
        return Err(TransformError::InvalidConfig(format!(
            "cannot crop {:?} out of spatial extent {:?}",
            crop, extent
        )));
    }
    Ok(())
}

/// Top-left corner of the centered crop window.
pub fn center_crop_offsets(extent: [usize; 2], crop: [usize; 2]) -> Result<[usize; 2]> {
    check_crop(extent, crop)?;
    Ok([(extent[0] - crop[0]) / 2, (extent[1] - crop[1]) / 2])
}

/// Top-left corner of a randomly placed crop window.
pub fn random_crop_offsets<R: Rng + ?Sized>(
    extent: [usize; 2],
    crop: [usize; 2],
    sampler: &OffsetSampler,
    rng: &mut R,
) -> Result<[usize; 2]> {
    check_crop(extent, crop)?;
    let mut offsets = [0usize; 2];
    for axis in 0..2 {
        let max_offset = extent[axis] - crop[axis];
        offsets[axis] = match sampler {
            OffsetSampler::Uniform => rng.gen_range(0..=max_offset),
            OffsetSampler::Gaussian { sigma } => {
                let range = max_offset as f64;
                let sigma = sigma.map_or(range / 4.0, |s| s[axis]);
                let z: f64 = rng.sample(StandardNormal);
                (range / 2.0 + sigma * z).round().clamp(0.0, range) as usize
            }
        };
    }
    Ok(offsets)
}

/// Cut a `crop`-sized window starting at `offsets` out of the spatial axes.
pub fn crop_at(data: &ArrayD<f32>, offsets: [usize; 2], crop: [usize; 2]) -> Result<ArrayD<f32>> {
    let extent = spatial_extent(data)?;
    check_crop(extent, crop)?;
    if offsets[0] + crop[0] > extent[0] || offsets[1] + crop[1] > extent[1] {
        return Err(TransformError::InvalidConfig(format!(
            "crop window {:?} at {:?} exceeds extent {:?}",
            crop, offsets, extent
        )));
    }
    let h_axis = data.ndim() - 3;
    let view = data.slice_each_axis(|ax| {
        let a = ax.axis.index();
        if a == h_axis {
            Slice::from(offsets[0]..offsets[0] + crop[0])
        } else if a == h_axis + 1 {
            Slice::from(offsets[1]..offsets[1] + crop[1])
        } else {
            Slice::from(..)
        }
    });
    Ok(view.to_owned())
}

pub fn complex_center_crop(data: &ArrayD<f32>, crop: [usize; 2]) -> Result<ArrayD<f32>> {
    let offsets = center_crop_offsets(spatial_extent(data)?, crop)?;
    crop_at(data, offsets, crop)
}

pub fn complex_random_crop<R: Rng + ?Sized>(
    data: &ArrayD<f32>,
    crop: [usize; 2],
    sampler: &OffsetSampler,
    rng: &mut R,
) -> Result<ArrayD<f32>> {
    let offsets = random_crop_offsets(spatial_extent(data)?, crop, sampler, rng)?;
    tracing::trace!("random crop offsets {:?} for window {:?}", offsets, crop);
    crop_at(data, offsets, crop)
}
