//! Standard MRI preprocessing pipeline.
//!
//! [`MriTransformsConfig`] is the flat, serializable description of the
//! pipeline; [`build_mri_transforms`] turns it into a [`Compose`](crate::Compose)
//! with the stages in their canonical order.

mod build;
mod config;

pub use build::build_mri_transforms;
pub use config::{CropSamplerType, MriTransformsConfig};
