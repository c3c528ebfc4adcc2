//! Transform stages and their composition.
//!
//! Each stage reads some fields of a [`Sample`](crate::Sample) and writes or
//! overwrites others. [`Compose`] runs an ordered list of stages; the
//! `crate::pipeline` module decides which stages go into that list.

mod compose;
mod crop;
mod housekeeping;
mod image;
mod padding;
mod sampling;
mod scaling;
mod sensitivity;
mod whiten;

pub use compose::Compose;
pub use crop::{CropKspace, CropSpec};
pub use housekeeping::{DeleteKeys, PadCoilDimension, RenameKeys, ToTensor};
pub use image::{ComputeImage, EstimateBodyCoilImage, ReconstructionType};
pub use padding::{ApplyZeroPadding, ComputeZeroPadding};
pub use sampling::{ApplyMask, CreateSamplingMask, MaskShape};
pub use scaling::{ComputeScalingFactor, Normalize};
pub use sensitivity::{EstimateSensitivityMap, SensitivityMapType};
pub use whiten::{complex_whiten, WhitenData, Whitening};

use crate::error::Result;
use crate::sample::Sample;

/// One pipeline stage.
///
/// Stages are immutable after construction and may be shared between threads;
/// all per-sample state lives in the [`Sample`] they are handed.
pub trait Transform: Send + Sync {
    /// Short stage name used in logs and pipeline listings.
    fn name(&self) -> &'static str;

    /// Mutate `sample` in place. An error aborts the pipeline run.
    fn apply(&self, sample: &mut Sample) -> Result<()>;
}
