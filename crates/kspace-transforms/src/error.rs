//! Error taxonomy shared by every transform stage.

use crate::sample::Key;

// ── Error type ───────────────────────────────────────────────────────────

/// Failure raised by a transform stage, a tensor primitive, or pipeline
/// construction. Every variant is fatal for the sample being processed.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformError {
    /// A stage needs a field that is not present in the sample.
    MissingKey { key: Key, context: &'static str },
    /// A field is present but holds a different kind of value.
    UnexpectedValue {
        key: Key,
        expected: &'static str,
        found: &'static str,
    },
    /// Malformed stage parameters (crop spec, map type, key lists, ...).
    InvalidConfig(String),
    /// Only 2D and 3D (+coil) k-space can be materialized.
    UnsupportedDimensionality { ndim: usize },
    /// Coil padding target is smaller than the number of coils present.
    CoilCapacity {
        target: usize,
        current: usize,
        filename: String,
    },
    /// Two arrays could not be combined element-wise.
    ShapeMismatch { lhs: Vec<usize>, rhs: Vec<usize> },
    /// An external collaborator (Fourier operator, mask function) failed.
    Operator(String),
}

impl std::fmt::Display for TransformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingKey { key, context } => {
                write!(f, "key `{}` not found in sample ({})", key, context)
            }
            Self::UnexpectedValue {
                key,
                expected,
                found,
            } => write!(
                f,
                "key `{}` holds a {} value, expected {}",
                key, found, expected
            ),
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            Self::UnsupportedDimensionality { ndim } => write!(
                f,
                "can only cast 2D and 3D data (+coil) to tensor, got {}D",
                ndim
            ),
            Self::CoilCapacity {
                target,
                current,
                filename,
            } => write!(
                f,
                "tried to pad to {} coils, but already have {} for {}",
                target, current, filename
            ),
            Self::ShapeMismatch { lhs, rhs } => {
                write!(f, "shapes {:?} and {:?} are not broadcastable", lhs, rhs)
            }
            Self::Operator(msg) => write!(f, "operator failure: {}", msg),
        }
    }
}

impl std::error::Error for TransformError {}

impl TransformError {
    /// True for errors caused by a required field being absent.
    pub fn is_missing_dependency(&self) -> bool {
        matches!(self, Self::MissingKey { .. })
    }
}

pub type Result<T> = std::result::Result<T, TransformError>;
