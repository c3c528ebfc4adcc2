//! Coil sensitivity maps and the body-coil image.
//!
//! Maps are either unit maps or estimated from the ACS region of k-space.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ndarray::{ArrayD, Axis};

use super::Transform;
use crate::error::{Result, TransformError};
use crate::ops::mask::scale_along_width;
use crate::ops::{apply_mask, root_sum_of_squares, safe_divide, FourierOperator};
use crate::sample::{Key, Sample, Value};

/// How coil sensitivities are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityMapType {
    /// Constant `1 + 0i` for every coil.
    #[default]
    Unit,
    /// ACS image divided by its root-sum-of-squares combination.
    RssEstimate,
}

impl std::str::FromStr for SensitivityMapType {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "unit" => Ok(Self::Unit),
            "rss_estimate" => Ok(Self::RssEstimate),
            other => Err(TransformError::InvalidConfig(format!(
                "expected type of map to be either `unit` or `rss_estimate`, got `{}`",
                other
            ))),
        }
    }
}

/// Estimate coil sensitivity maps into `sensitivity_map`.
pub struct EstimateSensitivityMap {
    kspace_key: Key,
    backward_operator: Arc<dyn FourierOperator>,
    type_of_map: SensitivityMapType,
    gaussian_sigma: Option<f64>,
    warned_single_coil: AtomicBool,
    warned_overwrite: AtomicBool,
}

impl EstimateSensitivityMap {
    pub fn new(
        kspace_key: Key,
        backward_operator: Arc<dyn FourierOperator>,
        type_of_map: SensitivityMapType,
        gaussian_sigma: Option<f64>,
    ) -> Self {
        Self {
            kspace_key,
            backward_operator,
            type_of_map,
            gaussian_sigma,
            warned_single_coil: AtomicBool::new(false),
            warned_overwrite: AtomicBool::new(false),
        }
    }

    pub fn type_of_map(&self) -> SensitivityMapType {
        self.type_of_map
    }

    /// Back-project the ACS region of k-space, optionally weighted along the
    /// width axis by `exp(-(x / sigma)²)` with `x` spanning `[-1, 1]`.
    pub fn estimate_acs_image(&self, sample: &Sample) -> Result<ArrayD<f32>> {
        let kspace = sample.complex(self.kspace_key, "sensitivity estimation")?;

        if kspace.shape()[0] == 1 && !self.warned_single_coil.swap(true, Ordering::Relaxed) {
            tracing::warn!(
                "estimation of sensitivity map of single-coil data; \
                 this warning will be displayed only once"
            );
        }
        if sample.contains(Key::SensitivityMap) && !self.warned_overwrite.swap(true, Ordering::Relaxed)
        {
            tracing::warn!(
                "`sensitivity_map` is given, but will be overwritten; \
                 this warning will be displayed only once"
            );
        }

        let acs_mask = sample.mask(Key::AcsMask, "ACS mask for sensitivity estimation")?;
        let mut kspace_acs = apply_mask(kspace, acs_mask)?;

        if let Some(sigma) = self.gaussian_sigma.filter(|s| *s != 0.0) {
            let width = kspace_acs.shape()[kspace_acs.ndim() - 2];
            scale_along_width(&mut kspace_acs, &gaussian_profile(width, sigma));
        }

        self.backward_operator.apply(&kspace_acs)
    }
}

/// `exp(-(x/sigma)²)` sampled at `n` points evenly spanning `[-1, 1]`.
fn gaussian_profile(n: usize, sigma: f64) -> Vec<f32> {
    (0..n)
        .map(|i| {
            let x = if n > 1 {
                -1.0 + 2.0 * i as f64 / (n - 1) as f64
            } else {
                -1.0
            };
            (-(x / sigma).powi(2)).exp() as f32
        })
        .collect()
}

impl Transform for EstimateSensitivityMap {
    fn name(&self) -> &'static str {
        "EstimateSensitivityMap"
    }

    fn apply(&self, sample: &mut Sample) -> Result<()> {
        let sensitivity_map = match self.type_of_map {
            SensitivityMapType::Unit => {
                let kspace = sample.complex(self.kspace_key, "unit sensitivity map")?;
                let mut map = ArrayD::<f32>::zeros(kspace.raw_dim());
                let last = Axis(map.ndim() - 1);
                map.index_axis_mut(last, 0).fill(1.0);
                map
            }
            SensitivityMapType::RssEstimate => {
                let acs_image = self.estimate_acs_image(sample)?;
                // (1, [slice,] h, w, 1) so it broadcasts over coils and the complex axis.
                let rss = root_sum_of_squares(&acs_image, true)?.insert_axis(Axis(0));
                let last = rss.ndim();
                let rss = rss.insert_axis(Axis(last));
                safe_divide(&acs_image, &rss)?
            }
        };
        sample.insert(Key::SensitivityMap, Value::Complex(sensitivity_map));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{modulus, Ifft2};
    use crate::test_utils::synthetic_kspace;
    use approx::assert_abs_diff_eq;
    use ndarray::IxDyn;

    fn full_acs(h: usize, w: usize) -> Value {
        Value::Mask(ArrayD::from_elem(IxDyn(&[1, h, w, 1]), true))
    }

    #[test]
    fn unit_map_is_one_plus_zero_i() {
        let stage = EstimateSensitivityMap::new(
            Key::Kspace,
            Arc::new(Ifft2::default()),
            SensitivityMapType::Unit,
            None,
        );
        let mut sample = Sample::new("a").with(Key::Kspace, Value::Complex(synthetic_kspace(3, 4, 5)));
        stage.apply(&mut sample).unwrap();
        let map = sample.complex(Key::SensitivityMap, "t").unwrap();
        assert_eq!(map.shape(), &[3, 4, 5, 2]);
        for c in map.lanes(Axis(3)) {
            assert_eq!(c[0], 1.0);
            assert_eq!(c[1], 0.0);
        }
    }

    #[test]
    fn rss_estimate_has_unit_combined_magnitude() {
        let stage = EstimateSensitivityMap::new(
            Key::Kspace,
            Arc::new(Ifft2::default()),
            SensitivityMapType::RssEstimate,
            None,
        );
        let mut sample = Sample::new("a")
            .with(Key::Kspace, Value::Complex(synthetic_kspace(4, 8, 8)))
            .with(Key::AcsMask, full_acs(8, 8));
        stage.apply(&mut sample).unwrap();

        let map = sample.complex(Key::SensitivityMap, "t").unwrap();
        assert_eq!(map.shape(), &[4, 8, 8, 2]);
        let rss = root_sum_of_squares(map, true).unwrap();
        for &v in rss.iter() {
            assert_abs_diff_eq!(v, 1.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn empty_acs_region_yields_zero_map_without_nans() {
        let stage = EstimateSensitivityMap::new(
            Key::Kspace,
            Arc::new(Ifft2::default()),
            SensitivityMapType::RssEstimate,
            Some(0.5),
        );
        let mut sample = Sample::new("a")
            .with(Key::Kspace, Value::Complex(synthetic_kspace(2, 4, 4)))
            .with(Key::AcsMask, Value::Mask(ArrayD::from_elem(IxDyn(&[1, 4, 4, 1]), false)));
        stage.apply(&mut sample).unwrap();
        let map = sample.complex(Key::SensitivityMap, "t").unwrap();
        assert!(map.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn gaussian_weighting_changes_acs_image() {
        let make = |sigma| {
            EstimateSensitivityMap::new(
                Key::Kspace,
                Arc::new(Ifft2::default()),
                SensitivityMapType::RssEstimate,
                sigma,
            )
        };
        let sample = Sample::new("a")
            .with(Key::Kspace, Value::Complex(synthetic_kspace(2, 8, 8)))
            .with(Key::AcsMask, full_acs(8, 8));
        let plain = make(None).estimate_acs_image(&sample).unwrap();
        let zero_sigma = make(Some(0.0)).estimate_acs_image(&sample).unwrap();
        let weighted = make(Some(0.3)).estimate_acs_image(&sample).unwrap();
        assert_eq!(plain, zero_sigma);
        let e_plain: f32 = modulus(&plain).unwrap().iter().map(|v| v * v).sum();
        let e_weighted: f32 = modulus(&weighted).unwrap().iter().map(|v| v * v).sum();
        assert!(e_weighted < e_plain);
    }

    #[test]
    fn gaussian_profile_peaks_at_center() {
        let p = gaussian_profile(5, 1.0);
        assert_abs_diff_eq!(p[2], 1.0);
        assert_abs_diff_eq!(p[0], (-1.0f32).exp(), epsilon = 1e-6);
        assert_eq!(p[0], p[4]);
        assert_eq!(gaussian_profile(1, 1.0).len(), 1);
    }

    #[test]
    fn single_coil_and_overwrite_only_warn() {
        let stage = EstimateSensitivityMap::new(
            Key::Kspace,
            Arc::new(Ifft2::default()),
            SensitivityMapType::RssEstimate,
            None,
        );
        let mut sample = Sample::new("a")
            .with(Key::Kspace, Value::Complex(synthetic_kspace(1, 4, 4)))
            .with(Key::AcsMask, full_acs(4, 4))
            .with(Key::SensitivityMap, Value::Complex(ArrayD::zeros(IxDyn(&[1, 4, 4, 2]))));
        stage.apply(&mut sample).unwrap();
        stage.apply(&mut sample).unwrap();
        assert!(stage.warned_single_coil.load(Ordering::Relaxed));
        assert!(stage.warned_overwrite.load(Ordering::Relaxed));
    }

    #[test]
    fn map_type_parses_known_names_only() {
        assert_eq!("unit".parse::<SensitivityMapType>().unwrap(), SensitivityMapType::Unit);
        assert_eq!(
            "rss_estimate".parse::<SensitivityMapType>().unwrap(),
            SensitivityMapType::RssEstimate
        );
        assert!(matches!(
            "espirit".parse::<SensitivityMapType>(),
            Err(TransformError::InvalidConfig(_))
        ));
    }
}
