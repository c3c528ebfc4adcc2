//! Sampling-mask generator seam and filename-derived seeding.

use ndarray::ArrayD;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::Result;

/// Deterministic per-sample seed: the filename's characters as code points.
///
/// Every slice of a volume shares its filename, so seeding mask generation and
/// random cropping with it makes repeated passes over the volume reproducible.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SampleSeed(Vec<u32>);

impl SampleSeed {
    pub fn from_filename(filename: &str) -> Self {
        Self(filename.chars().map(u32::from).collect())
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    /// Fold the code points into one 64-bit value (FNV-1a).
    pub fn to_u64(&self) -> u64 {
        const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
        const PRIME: u64 = 0x0000_0100_0000_01b3;
        self.0.iter().fold(OFFSET, |hash, &word| {
            word.to_le_bytes()
                .iter()
                .fold(hash, |h, &b| (h ^ u64::from(b)).wrapping_mul(PRIME))
        })
    }

    pub fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.to_u64())
    }
}

/// Generates sampling patterns.
///
/// `shape` excludes the coil axis and ends with the complex axis (size 2),
/// e.g. `([slice,] height, width, 2)`. The returned mask must broadcast against
/// k-space, typically `(1, [slice,] height, width, 1)`. Output must be
/// deterministic for a given `(shape, seed)`; `return_acs` asks for the
/// calibration region only.
pub trait MaskFunc: Send + Sync {
    fn generate(
        &self,
        shape: &[usize],
        seed: Option<&SampleSeed>,
        return_acs: bool,
    ) -> Result<ArrayD<bool>>;
}

impl<F> MaskFunc for F
where
    F: Fn(&[usize], Option<&SampleSeed>, bool) -> Result<ArrayD<bool>> + Send + Sync,
{
    fn generate(
        &self,
        shape: &[usize],
        seed: Option<&SampleSeed>,
        return_acs: bool,
    ) -> Result<ArrayD<bool>> {
        self(shape, seed, return_acs)
    }
}

/// Seed for `filename`, or `None` when seeding is disabled.
pub(crate) fn seed_for(use_seed: bool, filename: &str) -> Option<SampleSeed> {
    use_seed.then(|| SampleSeed::from_filename(filename))
}
