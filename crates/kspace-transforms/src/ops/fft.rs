//! Fourier operators over the spatial `(height, width)` axes.
//!
//! The pipeline only depends on the [`FourierOperator`] seam. [`Fft2`] and
//! [`Ifft2`] are the stock implementations: a 2D FFT over the two axes that
//! precede the complex axis, optionally centered (`ifftshift → fft → fftshift`)
//! and orthonormal.

use std::sync::Arc;

use ndarray::{ArrayD, Axis, IxDyn, Zip};
use num_complex::Complex32;
use rustfft::FftPlanner;

use super::complex::assert_complex;
use crate::error::{Result, TransformError};

/// Maps a paired complex tensor `(..., height, width, 2)` to another of the
/// same shape. Implementations must be pure functions of their input.
pub trait FourierOperator: Send + Sync {
    fn apply(&self, data: &ArrayD<f32>) -> Result<ArrayD<f32>>;
}

impl<F> FourierOperator for F
where
    F: Fn(&ArrayD<f32>) -> Result<ArrayD<f32>> + Send + Sync,
{
    fn apply(&self, data: &ArrayD<f32>) -> Result<ArrayD<f32>> {
        self(data)
    }
}

/// Forward 2D FFT (image → k-space).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fft2 {
    /// Shift the zero frequency to the center of the spectrum.
    pub centered: bool,
    /// Scale by `1/sqrt(height * width)`.
    pub normalized: bool,
}

/// Backward 2D FFT (k-space → image).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Ifft2 {
    pub centered: bool,
    pub normalized: bool,
}

impl Default for Fft2 {
    fn default() -> Self {
        Self {
            centered: true,
            normalized: true,
        }
    }
}

impl Default for Ifft2 {
    fn default() -> Self {
        Self {
            centered: true,
            normalized: true,
        }
    }
}

impl FourierOperator for Fft2 {
    fn apply(&self, data: &ArrayD<f32>) -> Result<ArrayD<f32>> {
        fft2(data, false, self.centered, self.normalized)
    }
}

impl FourierOperator for Ifft2 {
    fn apply(&self, data: &ArrayD<f32>) -> Result<ArrayD<f32>> {
        fft2(data, true, self.centered, self.normalized)
    }
}

/// Default centered orthonormal operator pair `(forward, backward)`.
pub fn default_operators() -> (Arc<dyn FourierOperator>, Arc<dyn FourierOperator>) {
    (Arc::new(Fft2::default()), Arc::new(Ifft2::default()))
}

fn fft2(data: &ArrayD<f32>, inverse: bool, centered: bool, normalized: bool) -> Result<ArrayD<f32>> {
    assert_complex(&data.view())?;
    let ndim = data.ndim();
    if ndim < 3 {
        return Err(TransformError::ShapeMismatch {
            lhs: data.shape().to_vec(),
            rhs: vec![0, 0, 2],
        });
    }

    // Unpack into native complex values: shape (..., height, width).
    let complex_axis = Axis(ndim - 1);
    let values: Vec<Complex32> = data
        .lanes(complex_axis)
        .into_iter()
        .map(|c| Complex32::new(c[0], c[1]))
        .collect();
    let mut buf = ArrayD::from_shape_vec(IxDyn(&data.shape()[..ndim - 1]), values)
        .map_err(|e| TransformError::Operator(e.to_string()))?;

    let mut planner = FftPlanner::<f32>::new();
    for axis in [ndim - 3, ndim - 2] {
        let n = buf.len_of(Axis(axis));
        if n == 0 {
            continue;
        }
        let plan = if inverse {
            planner.plan_fft_inverse(n)
        } else {
            planner.plan_fft_forward(n)
        };
        let scale = match (normalized, inverse) {
            (true, _) => 1.0 / (n as f32).sqrt(),
            (false, true) => 1.0 / n as f32,
            (false, false) => 1.0,
        };
        let mut line = vec![Complex32::default(); n];
        let mut scratch = vec![Complex32::default(); plan.get_inplace_scratch_len()];
        for mut lane in buf.lanes_mut(Axis(axis)) {
            line.iter_mut().zip(lane.iter()).for_each(|(dst, src)| *dst = *src);
            if centered {
                // ifftshift
                line.rotate_left(n / 2);
            }
            plan.process_with_scratch(&mut line, &mut scratch);
            if centered {
                // fftshift
                line.rotate_right(n / 2);
            }
            lane.iter_mut()
                .zip(line.iter())
                .for_each(|(dst, src)| *dst = *src * scale);
        }
    }

    let mut out = ArrayD::<f32>::zeros(data.raw_dim());
    Zip::from(out.lanes_mut(complex_axis))
        .and(&buf)
        .for_each(|mut o, c| {
            o[0] = c.re;
            o[1] = c.im;
        });
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::prelude::*;

    fn random_kspace(shape: &[usize], seed: u64) -> ArrayD<f32> {
        let mut rng = StdRng::seed_from_u64(seed);
        ArrayD::from_shape_fn(IxDyn(shape), |_| rng.gen_range(-1.0f32..1.0))
    }

    #[test]
    fn backward_then_forward_roundtrips() {
        for shape in [vec![4, 16, 16, 2], vec![2, 3, 9, 12, 2], vec![1, 7, 5, 2]] {
            let k = random_kspace(&shape, 5);
            let image = Ifft2::default().apply(&k).unwrap();
            let back = Fft2::default().apply(&image).unwrap();
            for (a, b) in k.iter().zip(back.iter()) {
                assert_abs_diff_eq!(a, b, epsilon = 1e-4);
            }
        }
    }

    #[test]
    fn unnormalized_pair_roundtrips() {
        let k = random_kspace(&[2, 8, 6, 2], 9);
        let fwd = Fft2 {
            centered: false,
            normalized: false,
        };
        let bwd = Ifft2 {
            centered: false,
            normalized: false,
        };
        let back = fwd.apply(&bwd.apply(&k).unwrap()).unwrap();
        for (a, b) in k.iter().zip(back.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-4);
        }
    }

    #[test]
    fn centered_transform_of_center_impulse_is_flat() {
        let mut image = ArrayD::<f32>::zeros(IxDyn(&[1, 8, 8, 2]));
        image[[0, 4, 4, 0]] = 8.0;
        let k = Fft2::default().apply(&image).unwrap();
        for c in k.lanes(Axis(3)) {
            assert_abs_diff_eq!(c[0], 1.0, epsilon = 1e-5);
            assert_abs_diff_eq!(c[1], 0.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn orthonormal_transform_preserves_energy() {
        let k = random_kspace(&[3, 10, 10, 2], 13);
        let image = Ifft2::default().apply(&k).unwrap();
        let e_k: f32 = k.iter().map(|v| v * v).sum();
        let e_i: f32 = image.iter().map(|v| v * v).sum();
        assert_abs_diff_eq!(e_k, e_i, epsilon = 1e-2);
    }

    #[test]
    fn closures_act_as_operators() {
        let identity = |d: &ArrayD<f32>| -> Result<ArrayD<f32>> { Ok(d.clone()) };
        let op: Arc<dyn FourierOperator> = Arc::new(identity);
        let k = random_kspace(&[1, 2, 2, 2], 1);
        assert_eq!(op.apply(&k).unwrap(), k);
    }

    #[test]
    fn real_input_is_rejected() {
        let data = ArrayD::<f32>::zeros(IxDyn(&[2, 4, 4]));
        assert!(Fft2::default().apply(&data).is_err());
    }
}
