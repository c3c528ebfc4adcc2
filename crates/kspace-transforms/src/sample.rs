//! The unit of work flowing through a pipeline.
//!
//! A [`Sample`] is a key/value store over a closed key vocabulary ([`Key`]).
//! Values are typed ([`Value`]); stages read them through fallible accessors
//! that distinguish "absent" from "present with the wrong kind".

use std::collections::BTreeMap;

use ndarray::ArrayD;
use num_complex::Complex32;

use crate::error::{Result, TransformError};

/// Field names a sample may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    /// Fully sampled multi-coil k-space, `(coil, [slice,] height, width, 2)`.
    Kspace,
    /// Undersampled k-space derived from `kspace` and `sampling_mask`.
    MaskedKspace,
    SamplingMask,
    /// Autocalibration mask used for sensitivity estimation.
    AcsMask,
    /// True where k-space carries no signal, `(1, [slice,] height, width, 1)`.
    Padding,
    SensitivityMap,
    /// Reconstructed reference image.
    Target,
    BodyCoilImage,
    InitialImage,
    InitialKspace,
    ComplexImage,
    /// Per-sample crop target; the first two entries are used.
    ReconstructionSize,
    ScalingFactor,
    ScalingDiff,
    LoglikelihoodScaling,
}

impl Key {
    pub const ALL: [Key; 15] = [
        Key::Kspace,
        Key::MaskedKspace,
        Key::SamplingMask,
        Key::AcsMask,
        Key::Padding,
        Key::SensitivityMap,
        Key::Target,
        Key::BodyCoilImage,
        Key::InitialImage,
        Key::InitialKspace,
        Key::ComplexImage,
        Key::ReconstructionSize,
        Key::ScalingFactor,
        Key::ScalingDiff,
        Key::LoglikelihoodScaling,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Key::Kspace => "kspace",
            Key::MaskedKspace => "masked_kspace",
            Key::SamplingMask => "sampling_mask",
            Key::AcsMask => "acs_mask",
            Key::Padding => "padding",
            Key::SensitivityMap => "sensitivity_map",
            Key::Target => "target",
            Key::BodyCoilImage => "body_coil_image",
            Key::InitialImage => "initial_image",
            Key::InitialKspace => "initial_kspace",
            Key::ComplexImage => "complex_image",
            Key::ReconstructionSize => "reconstruction_size",
            Key::ScalingFactor => "scaling_factor",
            Key::ScalingDiff => "scaling_diff",
            Key::LoglikelihoodScaling => "loglikelihood_scaling",
        }
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for Key {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self> {
        Key::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| TransformError::InvalidConfig(format!("unknown sample key `{}`", s)))
    }
}

/// Payload stored under a [`Key`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Native complex array as delivered by a loader, before materialization.
    RawComplex(ArrayD<Complex32>),
    /// Complex data with real/imaginary parts on a trailing axis of size 2.
    Complex(ArrayD<f32>),
    /// Real-valued array (magnitude images, raw real inputs).
    Real(ArrayD<f32>),
    Mask(ArrayD<bool>),
    Scalar(f32),
    Shape(Vec<usize>),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::RawComplex(_) => "raw complex",
            Value::Complex(_) => "complex tensor",
            Value::Real(_) => "real tensor",
            Value::Mask(_) => "mask",
            Value::Scalar(_) => "scalar",
            Value::Shape(_) => "shape",
        }
    }

    /// Shape of the array payload, if any.
    pub fn shape(&self) -> Option<&[usize]> {
        match self {
            Value::RawComplex(a) => Some(a.shape()),
            Value::Complex(a) | Value::Real(a) => Some(a.shape()),
            Value::Mask(a) => Some(a.shape()),
            Value::Scalar(_) | Value::Shape(_) => None,
        }
    }
}

/// One item of a dataset: an identifying filename plus its fields.
///
/// A sample is owned by the pipeline run that processes it; stages mutate it
/// in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sample {
    filename: String,
    fields: BTreeMap<Key, Value>,
}

impl Sample {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, key: Key, value: Value) -> Self {
        self.fields.insert(key, value);
        self
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn contains(&self, key: Key) -> bool {
        self.fields.contains_key(&key)
    }

    pub fn get(&self, key: Key) -> Option<&Value> {
        self.fields.get(&key)
    }

    pub fn get_mut(&mut self, key: Key) -> Option<&mut Value> {
        self.fields.get_mut(&key)
    }

    /// Insert or overwrite a field, returning the previous value.
    pub fn insert(&mut self, key: Key, value: Value) -> Option<Value> {
        self.fields.insert(key, value)
    }

    pub fn remove(&mut self, key: Key) -> Option<Value> {
        self.fields.remove(&key)
    }

    pub fn keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.fields.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Value under `key`, or a missing-dependency error naming `context`.
    pub fn require(&self, key: Key, context: &'static str) -> Result<&Value> {
        self.fields
            .get(&key)
            .ok_or(TransformError::MissingKey { key, context })
    }

    /// Paired real/imaginary tensor under `key`.
    pub fn complex(&self, key: Key, context: &'static str) -> Result<&ArrayD<f32>> {
        match self.require(key, context)? {
            Value::Complex(a) => Ok(a),
            other => Err(unexpected(key, "complex tensor", other)),
        }
    }

    /// Real or complex tensor under `key`, with a flag telling which.
    pub fn tensor(&self, key: Key, context: &'static str) -> Result<(&ArrayD<f32>, bool)> {
        match self.require(key, context)? {
            Value::Complex(a) => Ok((a, true)),
            Value::Real(a) => Ok((a, false)),
            other => Err(unexpected(key, "tensor", other)),
        }
    }

    pub fn mask(&self, key: Key, context: &'static str) -> Result<&ArrayD<bool>> {
        match self.require(key, context)? {
            Value::Mask(m) => Ok(m),
            other => Err(unexpected(key, "mask", other)),
        }
    }

    pub fn scalar(&self, key: Key, context: &'static str) -> Result<f32> {
        match self.require(key, context)? {
            Value::Scalar(v) => Ok(*v),
            other => Err(unexpected(key, "scalar", other)),
        }
    }

    pub fn shape_value(&self, key: Key, context: &'static str) -> Result<&[usize]> {
        match self.require(key, context)? {
            Value::Shape(s) => Ok(s),
            other => Err(unexpected(key, "shape", other)),
        }
    }
}

fn unexpected(key: Key, expected: &'static str, found: &Value) -> TransformError {
    TransformError::UnexpectedValue {
        key,
        expected,
        found: found.kind(),
    }
}
