//! Synthetic k-space and a deterministic mask function for unit tests.

use std::sync::Arc;

use ndarray::{ArrayD, IxDyn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::mask_func::{MaskFunc, SampleSeed};

/// Paired k-space `(coils, h, w, 2)` with every component in `±[0.5, 1.5)`.
pub(crate) fn synthetic_kspace(coils: usize, h: usize, w: usize) -> ArrayD<f32> {
    let mut rng = StdRng::seed_from_u64(7 + (coils * 131 + h * 17 + w) as u64);
    ArrayD::from_shape_fn(IxDyn(&[coils, h, w, 2]), |_| {
        let v: f32 = rng.gen_range(0.5..1.5);
        if rng.gen_bool(0.5) {
            v
        } else {
            -v
        }
    })
}

/// Sampling mask: locations with odd `y + x`. ACS mask: central block of
/// `max(1, n / 4)` rows and columns.
pub(crate) fn checkerboard_mask_func() -> Arc<dyn MaskFunc> {
    Arc::new(
        |shape: &[usize], _seed: Option<&SampleSeed>, return_acs: bool| -> Result<ArrayD<bool>> {
            let spatial = &shape[..shape.len() - 1];
            let mut dims = vec![1];
            dims.extend_from_slice(spatial);
            dims.push(1);
            let (h, w) = (spatial[spatial.len() - 2], spatial[spatial.len() - 1]);
            let (bh, bw) = ((h / 4).max(1), (w / 4).max(1));
            let (y0, x0) = ((h - bh) / 2, (w - bw) / 2);
            let n = dims.len();
            Ok(ArrayD::from_shape_fn(IxDyn(&dims), |idx| {
                let (y, x) = (idx[n - 3], idx[n - 2]);
                if return_acs {
                    (y0..y0 + bh).contains(&y) && (x0..x0 + bw).contains(&x)
                } else {
                    (y + x) % 2 == 1
                }
            }))
        },
    )
}
