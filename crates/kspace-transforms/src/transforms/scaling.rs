//! Percentile scaling factor and normalization.

use super::Transform;
use crate::error::{Result, TransformError};
use crate::ops::magnitude;
use crate::sample::{Key, Sample, Value};

/// Compute the scalar used by [`Normalize`].
///
/// - `normalize_key == Some(Key::ScalingFactor)`: the stored factor is passed
///   through.
/// - `normalize_key == None`: the factor is `1.0`.
/// - otherwise: the maximum magnitude of the field, or with a percentile `p`
///   the `k`-th largest magnitude where `k = floor((1 - p) * N) + 1`.
#[derive(Debug, Clone)]
pub struct ComputeScalingFactor {
    normalize_key: Option<Key>,
    percentile: Option<f64>,
    scaling_factor_key: Key,
}

impl ComputeScalingFactor {
    pub fn new(normalize_key: Option<Key>, percentile: Option<f64>, scaling_factor_key: Key) -> Result<Self> {
        if let Some(p) = percentile {
            if !(0.0..=1.0).contains(&p) {
                return Err(TransformError::InvalidConfig(format!(
                    "scaling percentile must lie in [0, 1], got {}",
                    p
                )));
            }
        }
        Ok(Self {
            normalize_key,
            percentile,
            scaling_factor_key,
        })
    }

    fn factor(&self, sample: &Sample) -> Result<f32> {
        let key = match self.normalize_key {
            None => return Ok(1.0),
            Some(Key::ScalingFactor) => {
                return sample.scalar(Key::ScalingFactor, "given scaling factor")
            }
            Some(key) => key,
        };

        let (data, is_complex) = sample.tensor(key, "scaling factor source")?;
        let mut values: Vec<f32> = magnitude(data, is_complex)?.iter().copied().collect();
        if values.is_empty() {
            return Err(TransformError::InvalidConfig(format!(
                "cannot compute a scaling factor from empty field `{}`",
                key
            )));
        }

        match self.percentile.filter(|p| *p > 0.0) {
            Some(p) => {
                let n = values.len();
                let k = (((1.0 - p) * n as f64) as usize + 1).min(n);
                let (_, kth, _) = values.select_nth_unstable_by(k - 1, |a, b| b.total_cmp(a));
                Ok(*kth)
            }
            None => Ok(values.into_iter().fold(f32::NEG_INFINITY, f32::max)),
        }
    }
}

impl Transform for ComputeScalingFactor {
    fn name(&self) -> &'static str {
        "ComputeScalingFactor"
    }

    fn apply(&self, sample: &mut Sample) -> Result<()> {
        let factor = self.factor(sample)?;
        tracing::debug!("{}: scaling factor {}", sample.filename(), factor);
        sample.insert(self.scaling_factor_key, Value::Scalar(factor));
        Ok(())
    }
}

/// Divide a list of fields by the stored scaling factor.
///
/// Nothing happens when the factor is absent or zero. After normalizing,
/// `scaling_diff` is set to `0.0`.
#[derive(Debug, Clone)]
pub struct Normalize {
    pub scaling_factor_key: Key,
    pub keys_to_normalize: Vec<Key>,
}

impl Default for Normalize {
    fn default() -> Self {
        Self {
            scaling_factor_key: Key::ScalingFactor,
            // sensitivity_map is already scale free.
            keys_to_normalize: vec![
                Key::MaskedKspace,
                Key::Target,
                Key::Kspace,
                Key::BodyCoilImage,
                Key::InitialImage,
                Key::InitialKspace,
            ],
        }
    }
}

impl Transform for Normalize {
    fn name(&self) -> &'static str {
        "Normalize"
    }

    fn apply(&self, sample: &mut Sample) -> Result<()> {
        let factor = match sample.get(self.scaling_factor_key) {
            None => return Ok(()),
            Some(Value::Scalar(v)) => *v,
            Some(other) => {
                return Err(TransformError::UnexpectedValue {
                    key: self.scaling_factor_key,
                    expected: "scalar",
                    found: other.kind(),
                })
            }
        };
        if factor == 0.0 {
            return Ok(());
        }

        for &key in &self.keys_to_normalize {
            match sample.get_mut(key) {
                None => {}
                Some(Value::Complex(a)) | Some(Value::Real(a)) => a.mapv_inplace(|v| v / factor),
                Some(Value::Scalar(v)) => *v /= factor,
                Some(other) => {
                    return Err(TransformError::UnexpectedValue {
                        key,
                        expected: "tensor or scalar",
                        found: other.kind(),
                    })
                }
            }
        }
        sample.insert(Key::ScalingDiff, Value::Scalar(0.0));
        Ok(())
    }
}
