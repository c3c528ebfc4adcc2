//! Assembly of the standard preprocessing pipeline.

use std::sync::Arc;

use super::config::MriTransformsConfig;
use crate::error::Result;
use crate::mask_func::MaskFunc;
use crate::ops::FourierOperator;
use crate::sample::Key;
use crate::transforms::{
    ApplyMask, ApplyZeroPadding, Compose, ComputeImage, ComputeScalingFactor, ComputeZeroPadding,
    CreateSamplingMask, CropKspace, CropSpec, DeleteKeys, EstimateBodyCoilImage,
    EstimateSensitivityMap, MaskShape, Normalize, PadCoilDimension, SensitivityMapType, ToTensor,
    Transform,
};

/// Assemble the standard preprocessing pipeline.
///
/// Stage order:
/// 1. `ToTensor`
/// 2. `CropKspace` (with `crop`)
/// 3. `ComputeZeroPadding`, `ApplyZeroPadding`, `CreateSamplingMask` (with a mask function)
/// 4. `EstimateSensitivityMap`
/// 5. `DeleteKeys([acs_mask])` (with `delete_acs_mask`)
/// 6. `ComputeImage` into `target`
/// 7. `ApplyMask` into `masked_kspace`
/// 8. `EstimateBodyCoilImage` (with `estimate_body_coil_image` and a mask function)
/// 9. `ComputeScalingFactor`, `Normalize`
/// 10. `PadCoilDimension` for `masked_kspace` and `sensitivity_map`
/// 11. `DeleteKeys([kspace])` (with `delete_kspace`)
///
/// Masks and padding are in place before sensitivities and `masked_kspace`
/// are derived; scaling sees the final `masked_kspace` and `target`.
pub fn build_mri_transforms(
    forward_operator: Arc<dyn FourierOperator>,
    backward_operator: Arc<dyn FourierOperator>,
    mask_func: Option<Arc<dyn MaskFunc>>,
    config: &MriTransformsConfig,
) -> Result<Compose> {
    let mut stages: Vec<Box<dyn Transform>> = vec![Box::new(ToTensor)];

    if let Some(crop) = config.crop {
        stages.push(Box::new(CropKspace::new(
            crop,
            Arc::clone(&forward_operator),
            Arc::clone(&backward_operator),
            config.image_center_crop,
            config.crop_type.sampler(config.crop_gaussian_sigma),
            config.use_seed,
        )?));
    }

    if let Some(mask_func) = &mask_func {
        // A dynamic crop size is only known per sample; the mask then follows k-space.
        let mask_shape = match config.crop {
            Some(CropSpec::Shape([h, w])) => MaskShape::Fixed(vec![h, w]),
            _ => MaskShape::FromKspace,
        };
        stages.push(Box::new(ComputeZeroPadding::new(
            Key::Kspace,
            Key::Padding,
            config.padding_eps,
        )));
        stages.push(Box::new(ApplyZeroPadding::default()));
        stages.push(Box::new(CreateSamplingMask::new(
            Arc::clone(mask_func),
            mask_shape,
            config.use_seed,
            config.estimate_sensitivity_maps,
        )));
    }

    let type_of_map = if config.estimate_sensitivity_maps {
        SensitivityMapType::RssEstimate
    } else {
        SensitivityMapType::Unit
    };
    stages.push(Box::new(EstimateSensitivityMap::new(
        Key::Kspace,
        Arc::clone(&backward_operator),
        type_of_map,
        config.sensitivity_maps_gaussian,
    )));

    if config.delete_acs_mask {
        stages.push(Box::new(DeleteKeys::new(vec![Key::AcsMask])));
    }

    stages.push(Box::new(ComputeImage::new(
        Key::Kspace,
        Key::Target,
        Arc::clone(&backward_operator),
        config.image_recon_type,
    )));
    stages.push(Box::new(ApplyMask::default()));

    if config.estimate_body_coil_image {
        if let Some(mask_func) = &mask_func {
            stages.push(Box::new(EstimateBodyCoilImage::new(
                Arc::clone(mask_func),
                Arc::clone(&backward_operator),
                config.use_seed,
            )));
        }
    }

    stages.push(Box::new(ComputeScalingFactor::new(
        config.scaling_key,
        config.scale_percentile,
        Key::ScalingFactor,
    )?));
    stages.push(Box::new(Normalize::default()));
    stages.push(Box::new(PadCoilDimension::new(config.pad_coils, Key::MaskedKspace)));
    stages.push(Box::new(PadCoilDimension::new(config.pad_coils, Key::SensitivityMap)));

    if config.delete_kspace {
        stages.push(Box::new(DeleteKeys::new(vec![Key::Kspace])));
    }

    let pipeline = Compose::new(stages);
    tracing::info!("built MRI transforms with {} stages", pipeline.len());
    tracing::debug!("{}", pipeline);
    Ok(pipeline)
}
