//! Real/imaginary channel whitening.

use nalgebra::Matrix2;
use ndarray::{ArrayD, Axis, Zip};

use super::Transform;
use crate::error::{Result, TransformError};
use crate::ops::complex::assert_complex;
use crate::sample::{Key, Sample, Value};

/// Result of [`complex_whiten`].
#[derive(Debug, Clone, PartialEq)]
pub struct Whitening {
    /// Global mean over real and imaginary parts together.
    pub mean: f32,
    /// `sqrt(eigenvalue + epsilon)` per principal direction.
    pub std: [f32; 2],
    /// Centered data rotated onto the covariance eigenvectors and scaled by `std`.
    pub whitened: ArrayD<f32>,
}

/// Decorrelate the real and imaginary channels of a complex tensor.
///
/// Second moments are `(Σ a·b - mean(a)·mean(b)) / n` over all elements; the
/// 2×2 matrix they form is symmetric, so its eigenvalues are real.
pub fn complex_whiten(data: &ArrayD<f32>, epsilon: f64) -> Result<Whitening> {
    assert_complex(&data.view())?;
    let last = Axis(data.ndim() - 1);
    let mean = data.mean().ok_or_else(|| {
        TransformError::InvalidConfig("cannot whiten an empty tensor".to_string())
    })?;

    let real = data.index_axis(last, 0);
    let imag = data.index_axis(last, 1);
    let n = real.len() as f64;
    let (mut sum_r, mut sum_i, mut sum_rr, mut sum_ri, mut sum_ii) = (0.0, 0.0, 0.0, 0.0, 0.0);
    Zip::from(&real).and(&imag).for_each(|&r, &i| {
        let (r, i) = (f64::from(r), f64::from(i));
        sum_r += r;
        sum_i += i;
        sum_rr += r * r;
        sum_ri += r * i;
        sum_ii += i * i;
    });
    let (mean_r, mean_i) = (sum_r / n, sum_i / n);
    let covariance = Matrix2::new(
        (sum_rr - mean_r * mean_r) / n,
        (sum_ri - mean_r * mean_i) / n,
        (sum_ri - mean_r * mean_i) / n,
        (sum_ii - mean_i * mean_i) / n,
    );

    let eigen = covariance.symmetric_eigen();
    let std = [
        (eigen.eigenvalues[0] + epsilon).sqrt(),
        (eigen.eigenvalues[1] + epsilon).sqrt(),
    ];
    let vectors = eigen.eigenvectors;

    let mean_f64 = f64::from(mean);
    let mut whitened = ArrayD::<f32>::zeros(data.raw_dim());
    Zip::from(whitened.lanes_mut(last))
        .and(data.lanes(last))
        .for_each(|mut out, c| {
            let (r, i) = (f64::from(c[0]) - mean_f64, f64::from(c[1]) - mean_f64);
            for j in 0..2 {
                out[j] = ((r * vectors[(0, j)] + i * vectors[(1, j)]) / std[j]) as f32;
            }
        });

    Ok(Whitening {
        mean,
        std: [std[0] as f32, std[1] as f32],
        whitened,
    })
}

/// Replace a complex field with its whitened version.
#[derive(Debug, Clone)]
pub struct WhitenData {
    pub epsilon: f64,
    pub key: Key,
}

impl Default for WhitenData {
    fn default() -> Self {
        Self {
            epsilon: 1e-10,
            key: Key::ComplexImage,
        }
    }
}

impl Transform for WhitenData {
    fn name(&self) -> &'static str {
        "WhitenData"
    }

    fn apply(&self, sample: &mut Sample) -> Result<()> {
        let data = sample.complex(self.key, "whitening")?;
        let Whitening { whitened, .. } = complex_whiten(data, self.epsilon)?;
        sample.insert(self.key, Value::Complex(whitened));
        Ok(())
    }
}
