//! kspace-transforms: preprocessing pipeline for multi-coil MRI k-space.
//!
//! Raw k-space samples are turned into training/inference items: masked,
//! optionally cropped and normalized k-space paired with a target image. The
//! stages of the standard pipeline are:
//!
//! 1. **Materialize** – raw complex arrays become paired real/imaginary tensors.
//! 2. **Crop** – k-space is cropped through the image domain (Fourier round trip).
//! 3. **Mask** – zero padding is detected and a sampling (and ACS) mask is drawn.
//! 4. **Sensitivities** – unit maps or an ACS-based root-sum-of-squares estimate.
//! 5. **Target** – coil-combined image (complex sum, RSS or SENSE).
//! 6. **Scale** – a percentile or maximum magnitude normalizes the outputs.
//! 7. **Collate** – the coil axis is zero-padded to a fixed count.
//!
//! # Public API
//! - [`Sample`], [`Key`] and [`Value`]: the data flowing through stages
//! - [`Transform`] and [`Compose`]: individual stages and their sequencing
//! - [`MriTransformsConfig`] and [`build_mri_transforms`]: the standard pipeline
//! - [`FourierOperator`] and [`MaskFunc`]: caller-supplied collaborators, with
//!   [`Fft2`]/[`Ifft2`] as ready-made centered orthonormal operators
//!
//! Tensor primitives live in [`ops`]; every stage type lives in [`transforms`].

mod error;
pub mod mask_func;
pub mod ops;
mod pipeline;
mod sample;
pub mod transforms;

#[cfg(test)]
mod test_utils;

pub use error::{Result, TransformError};
pub use mask_func::{MaskFunc, SampleSeed};
pub use ops::{default_operators, Fft2, FourierOperator, Ifft2, OffsetSampler};
pub use pipeline::{build_mri_transforms, CropSamplerType, MriTransformsConfig};
pub use sample::{Key, Sample, Value};
pub use transforms::{
    Compose, CropSpec, ReconstructionType, SensitivityMapType, Transform, Whitening,
};
