//! Field bookkeeping: deletion, renaming, coil padding and tensor materialization.

use ndarray::{concatenate, ArrayD, Axis};

use super::Transform;
use crate::error::{Result, TransformError};
use crate::ops::to_paired;
use crate::sample::{Key, Sample, Value};

/// Remove fields; absent keys are ignored.
#[derive(Debug, Clone)]
pub struct DeleteKeys {
    pub keys: Vec<Key>,
}

impl DeleteKeys {
    pub fn new(keys: Vec<Key>) -> Self {
        Self { keys }
    }
}

impl Transform for DeleteKeys {
    fn name(&self) -> &'static str {
        "DeleteKeys"
    }

    fn apply(&self, sample: &mut Sample) -> Result<()> {
        for &key in &self.keys {
            sample.remove(key);
        }
        Ok(())
    }
}

/// Move values from `old_keys[i]` to `new_keys[i]`; absent keys are skipped.
#[derive(Debug, Clone)]
pub struct RenameKeys {
    pairs: Vec<(Key, Key)>,
}

impl RenameKeys {
    pub fn new(old_keys: Vec<Key>, new_keys: Vec<Key>) -> Result<Self> {
        if old_keys.len() != new_keys.len() {
            return Err(TransformError::InvalidConfig(format!(
                "rename needs as many new keys as old keys, got {} and {}",
                old_keys.len(),
                new_keys.len()
            )));
        }
        Ok(Self {
            pairs: old_keys.into_iter().zip(new_keys).collect(),
        })
    }
}

impl Transform for RenameKeys {
    fn name(&self) -> &'static str {
        "RenameKeys"
    }

    fn apply(&self, sample: &mut Sample) -> Result<()> {
        for &(old, new) in &self.pairs {
            if let Some(value) = sample.remove(old) {
                sample.insert(new, value);
            }
        }
        Ok(())
    }
}

/// Zero-pad the coil axis of a field up to `pad_coils` coils.
///
/// Zeros are prepended, so existing coils keep their data and end up last.
#[derive(Debug, Clone)]
pub struct PadCoilDimension {
    pub pad_coils: Option<usize>,
    pub key: Key,
    pub coil_dim: usize,
}

impl PadCoilDimension {
    pub fn new(pad_coils: Option<usize>, key: Key) -> Self {
        Self {
            pad_coils,
            key,
            coil_dim: 0,
        }
    }
}

impl Transform for PadCoilDimension {
    fn name(&self) -> &'static str {
        "PadCoilDimension"
    }

    fn apply(&self, sample: &mut Sample) -> Result<()> {
        let target = match self.pad_coils {
            Some(n) if n > 0 => n,
            _ => return Ok(()),
        };
        let data = match sample.get(self.key) {
            None => return Ok(()),
            Some(Value::Complex(a)) | Some(Value::Real(a)) => a,
            Some(other) => {
                return Err(TransformError::UnexpectedValue {
                    key: self.key,
                    expected: "tensor",
                    found: other.kind(),
                })
            }
        };
        if self.coil_dim >= data.ndim() {
            return Err(TransformError::InvalidConfig(format!(
                "coil axis {} out of range for `{}` with shape {:?}",
                self.coil_dim,
                self.key,
                data.shape()
            )));
        }

        let current = data.shape()[self.coil_dim];
        if current > target {
            return Err(TransformError::CoilCapacity {
                target,
                current,
                filename: sample.filename().to_string(),
            });
        }
        if current == target {
            return Ok(());
        }

        let mut zeros_shape = data.shape().to_vec();
        zeros_shape[self.coil_dim] = target - current;
        let zeros = ArrayD::<f32>::zeros(zeros_shape);
        let padded = concatenate(Axis(self.coil_dim), &[zeros.view(), data.view()]).map_err(|_| {
            TransformError::ShapeMismatch {
                lhs: zeros.shape().to_vec(),
                rhs: data.shape().to_vec(),
            }
        })?;

        let value = match sample.get(self.key) {
            Some(Value::Real(_)) => Value::Real(padded),
            _ => Value::Complex(padded),
        };
        sample.insert(self.key, value);
        Ok(())
    }
}

/// Materialize loader output into pipeline tensors.
///
/// k-space must be `(coil, [slice,] h, w)` complex. Raw complex fields become
/// paired tensors, real 0/1 masks become boolean masks, and a one-element
/// scaling factor array becomes a scalar.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToTensor;

const PAIRED_KEYS: [Key; 4] = [
    Key::Kspace,
    Key::InitialKspace,
    Key::SensitivityMap,
    Key::InitialImage,
];

impl Transform for ToTensor {
    fn name(&self) -> &'static str {
        "ToTensor"
    }

    fn apply(&self, sample: &mut Sample) -> Result<()> {
        let ndim = match sample.require(Key::Kspace, "k-space to materialize")? {
            Value::RawComplex(a) => a.ndim().saturating_sub(1),
            Value::Complex(a) => a.ndim().saturating_sub(2),
            other => {
                return Err(TransformError::UnexpectedValue {
                    key: Key::Kspace,
                    expected: "complex k-space",
                    found: other.kind(),
                })
            }
        };
        if !matches!(ndim, 2 | 3) {
            return Err(TransformError::UnsupportedDimensionality { ndim });
        }

        for key in PAIRED_KEYS {
            if let Some(Value::RawComplex(raw)) = sample.get(key) {
                let paired = to_paired(raw);
                sample.insert(key, Value::Complex(paired));
            }
        }

        for key in [Key::SamplingMask, Key::AcsMask] {
            if let Some(Value::Real(raw)) = sample.get(key) {
                let mask = raw.mapv(|v| v != 0.0);
                sample.insert(key, Value::Mask(mask));
            }
        }

        match sample.get(Key::ScalingFactor) {
            None | Some(Value::Scalar(_)) => {}
            Some(Value::Real(a)) if a.len() == 1 => {
                let v = a.iter().next().copied().unwrap_or(1.0);
                sample.insert(Key::ScalingFactor, Value::Scalar(v));
            }
            Some(other) => {
                return Err(TransformError::UnexpectedValue {
                    key: Key::ScalingFactor,
                    expected: "scalar",
                    found: other.kind(),
                })
            }
        }
        Ok(())
    }
}
