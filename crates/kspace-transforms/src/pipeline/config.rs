//! Serde-backed pipeline configuration.

use crate::error::{Result, TransformError};
use crate::ops::OffsetSampler;
use crate::sample::Key;
use crate::transforms::{CropSpec, ReconstructionType};

/// Offset distribution for random (non-centered) crops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropSamplerType {
    #[default]
    Uniform,
    Gaussian,
}

impl CropSamplerType {
    /// Offset sampler with an optional per-axis sigma for the gaussian kind.
    pub fn sampler(self, sigma: Option<[f64; 2]>) -> OffsetSampler {
        match self {
            Self::Uniform => OffsetSampler::Uniform,
            Self::Gaussian => OffsetSampler::Gaussian { sigma },
        }
    }
}

impl std::str::FromStr for CropSamplerType {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "uniform" => Ok(Self::Uniform),
            "gaussian" => Ok(Self::Gaussian),
            other => Err(TransformError::InvalidConfig(format!(
                "crop sampler must be `uniform` or `gaussian`, got `{}`",
                other
            ))),
        }
    }
}

/// Flat configuration of the standard MRI preprocessing pipeline.
///
/// Fourier operators and the mask function are supplied separately to
/// [`build_mri_transforms`](super::build_mri_transforms).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MriTransformsConfig {
    /// Crop k-space through the image domain. `None` disables cropping.
    pub crop: Option<CropSpec>,
    /// Sampler for random crops. Ignored without `crop` or with a center crop.
    pub crop_type: CropSamplerType,
    /// Per-axis sigma of the gaussian crop sampler; `None` uses a quarter of
    /// the free range.
    pub crop_gaussian_sigma: Option<[f64; 2]>,
    /// Crop around the image center instead of at a random offset.
    pub image_center_crop: bool,
    /// Relative energy threshold below which k-space counts as zero padding.
    pub padding_eps: f32,
    /// Estimate sensitivities from the ACS region; unit maps otherwise.
    pub estimate_sensitivity_maps: bool,
    /// Compute `body_coil_image` (needs a mask function).
    pub estimate_body_coil_image: bool,
    /// Width-axis gaussian weighting of the ACS region.
    pub sensitivity_maps_gaussian: Option<f64>,
    pub delete_acs_mask: bool,
    /// Drop the fully sampled `kspace` at the end of the pipeline.
    pub delete_kspace: bool,
    pub image_recon_type: ReconstructionType,
    /// Zero-pad the coil axis of `masked_kspace` and `sensitivity_map` to this
    /// many coils.
    pub pad_coils: Option<usize>,
    /// Field the scaling factor is computed from. `None` means factor 1.
    pub scaling_key: Option<Key>,
    /// Magnitude percentile used as scaling factor; `None` uses the maximum.
    pub scale_percentile: Option<f64>,
    /// Seed masks and random crops from the sample filename.
    pub use_seed: bool,
}

impl Default for MriTransformsConfig {
    fn default() -> Self {
        Self {
            crop: None,
            crop_type: CropSamplerType::Uniform,
            crop_gaussian_sigma: None,
            image_center_crop: true,
            padding_eps: 1e-4,
            estimate_sensitivity_maps: true,
            estimate_body_coil_image: false,
            sensitivity_maps_gaussian: None,
            delete_acs_mask: true,
            delete_kspace: true,
            image_recon_type: ReconstructionType::Rss,
            pad_coils: None,
            scaling_key: Some(Key::MaskedKspace),
            scale_percentile: Some(0.99),
            use_seed: true,
        }
    }
}

impl MriTransformsConfig {
    /// Parse a JSON object; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| TransformError::InvalidConfig(e.to_string()))
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| TransformError::InvalidConfig(e.to_string()))
    }
}
