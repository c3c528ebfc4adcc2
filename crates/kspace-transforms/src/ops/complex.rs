//! Element-wise arithmetic on paired real/imaginary tensors.
//!
//! Complex tensors carry real and imaginary parts on a trailing axis of size 2.
//! The coil axis, where present, is axis 0.

use ndarray::{ArrayD, ArrayViewD, ArrayViewMut1, Axis, IxDyn, Zip};
use num_complex::Complex32;

use crate::error::{Result, TransformError};

/// Fail unless `data` has a trailing complex axis of size 2.
pub fn assert_complex(data: &ArrayViewD<'_, f32>) -> Result<()> {
    match data.shape().last() {
        Some(2) => Ok(()),
        _ => Err(TransformError::ShapeMismatch {
            lhs: data.shape().to_vec(),
            rhs: vec![2],
        }),
    }
}

/// Magnitude `sqrt(re² + im²)`; drops the complex axis.
pub fn modulus(data: &ArrayD<f32>) -> Result<ArrayD<f32>> {
    assert_complex(&data.view())?;
    let last = Axis(data.ndim() - 1);
    Ok(data.map_axis(last, |c| c[0].hypot(c[1])))
}

/// Magnitude of a real or complex tensor.
pub fn magnitude(data: &ArrayD<f32>, is_complex: bool) -> Result<ArrayD<f32>> {
    if is_complex {
        modulus(data)
    } else {
        Ok(data.mapv(f32::abs))
    }
}

#[inline]
fn store(mut lane: ArrayViewMut1<'_, f32>, value: Complex32) {
    lane[0] = value.re;
    lane[1] = value.im;
}

pub fn conjugate(data: &ArrayD<f32>) -> Result<ArrayD<f32>> {
    assert_complex(&data.view())?;
    let last = Axis(data.ndim() - 1);
    let mut out = ArrayD::<f32>::zeros(data.raw_dim());
    Zip::from(out.lanes_mut(last))
        .and(data.lanes(last))
        .for_each(|o, x| store(o, Complex32::new(x[0], x[1]).conj()));
    Ok(out)
}

/// Complex product of two paired tensors of identical shape.
pub fn complex_multiplication(a: &ArrayD<f32>, b: &ArrayD<f32>) -> Result<ArrayD<f32>> {
    assert_complex(&a.view())?;
    if a.shape() != b.shape() {
        return Err(TransformError::ShapeMismatch {
            lhs: a.shape().to_vec(),
            rhs: b.shape().to_vec(),
        });
    }
    let last = Axis(a.ndim() - 1);
    let mut out = ArrayD::<f32>::zeros(a.raw_dim());
    Zip::from(out.lanes_mut(last))
        .and(a.lanes(last))
        .and(b.lanes(last))
        .for_each(|o, x, y| store(o, Complex32::new(x[0], x[1]) * Complex32::new(y[0], y[1])));
    Ok(out)
}

/// Root-sum-of-squares over the coil axis (axis 0).
///
/// Complex input yields `sqrt(Σ_c |x_c|²)` with both coil and complex axes
/// removed; real input yields `sqrt(Σ_c x_c²)`.
pub fn root_sum_of_squares(data: &ArrayD<f32>, is_complex: bool) -> Result<ArrayD<f32>> {
    let squared = if is_complex {
        assert_complex(&data.view())?;
        let last = Axis(data.ndim() - 1);
        data.map_axis(last, |c| c[0] * c[0] + c[1] * c[1])
    } else {
        data.mapv(|v| v * v)
    };
    if squared.ndim() == 0 {
        return Err(TransformError::ShapeMismatch {
            lhs: data.shape().to_vec(),
            rhs: vec![],
        });
    }
    Ok(squared.sum_axis(Axis(0)).mapv(f32::sqrt))
}

/// Numpy-style broadcast shape of two shapes (right-aligned).
pub fn broadcast_shape(a: &[usize], b: &[usize]) -> Result<Vec<usize>> {
    let ndim = a.len().max(b.len());
    let dim_at = |s: &[usize], i: usize| -> usize {
        let offset = ndim - s.len();
        if i < offset {
            1
        } else {
            s[i - offset]
        }
    };
    (0..ndim)
        .map(|i| match (dim_at(a, i), dim_at(b, i)) {
            (x, y) if x == y => Ok(x),
            (1, y) => Ok(y),
            (x, 1) => Ok(x),
            _ => Err(TransformError::ShapeMismatch {
                lhs: a.to_vec(),
                rhs: b.to_vec(),
            }),
        })
        .collect()
}

/// Broadcast both views to their common shape.
pub(crate) fn co_broadcast<'a, 'b, A, B>(
    a: &'a ArrayViewD<'a, A>,
    b: &'b ArrayViewD<'b, B>,
) -> Result<(ArrayViewD<'a, A>, ArrayViewD<'b, B>)> {
    let shape = broadcast_shape(a.shape(), b.shape())?;
    let mismatch = || TransformError::ShapeMismatch {
        lhs: a.shape().to_vec(),
        rhs: b.shape().to_vec(),
    };
    let a = a.broadcast(IxDyn(&shape)).ok_or_else(mismatch)?;
    let b = b.broadcast(IxDyn(&shape)).ok_or_else(mismatch)?;
    Ok((a, b))
}

/// `a / b` with broadcasting, returning zero wherever `b == 0`.
pub fn safe_divide(a: &ArrayD<f32>, b: &ArrayD<f32>) -> Result<ArrayD<f32>> {
    let (av, bv) = (a.view(), b.view());
    let (av, bv) = co_broadcast(&av, &bv)?;
    let mut out = ArrayD::<f32>::zeros(av.raw_dim());
    Zip::from(&mut out)
        .and(&av)
        .and(&bv)
        .for_each(|o, &x, &y| *o = if y == 0.0 { 0.0 } else { x / y });
    Ok(out)
}

/// Convert a native complex array into the paired representation.
pub fn to_paired(data: &ArrayD<Complex32>) -> ArrayD<f32> {
    let mut shape = data.shape().to_vec();
    shape.push(2);
    let mut out = ArrayD::<f32>::zeros(IxDyn(&shape));
    let last = Axis(out.ndim() - 1);
    Zip::from(out.lanes_mut(last))
        .and(data)
        .for_each(|o, &c| store(o, c));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::prelude::*;

    fn random_complex(shape: &[usize], seed: u64) -> ArrayD<f32> {
        let mut rng = StdRng::seed_from_u64(seed);
        ArrayD::from_shape_fn(IxDyn(shape), |_| rng.gen_range(-1.0f32..1.0))
    }

    #[test]
    fn modulus_drops_complex_axis() {
        let data = ArrayD::from_shape_vec(IxDyn(&[1, 2, 2]), vec![3.0, 4.0, 0.0, -2.0]).unwrap();
        let m = modulus(&data).unwrap();
        assert_eq!(m.shape(), &[1, 2]);
        assert_relative_eq!(m[[0, 0]], 5.0);
        assert_relative_eq!(m[[0, 1]], 2.0);
    }

    #[test]
    fn modulus_rejects_real_input() {
        let data = ArrayD::<f32>::zeros(IxDyn(&[4, 3]));
        assert!(modulus(&data).is_err());
    }

    #[test]
    fn conjugate_negates_imaginary_part() {
        let data = random_complex(&[2, 3, 3, 2], 1);
        let c = conjugate(&data).unwrap();
        for (x, y) in data.lanes(Axis(3)).into_iter().zip(c.lanes(Axis(3))) {
            assert_eq!(x[0], y[0]);
            assert_eq!(x[1], -y[1]);
        }
    }

    #[test]
    fn product_matches_complex_arithmetic() {
        let a = ArrayD::from_shape_vec(IxDyn(&[2, 2]), vec![1.0, 2.0, 0.0, 1.0]).unwrap();
        let b = ArrayD::from_shape_vec(IxDyn(&[2, 2]), vec![3.0, -1.0, 0.0, 1.0]).unwrap();
        let p = complex_multiplication(&a, &b).unwrap();
        // (1 + 2i)(3 - i) = 5 + 5i, i * i = -1
        assert_eq!(p.iter().copied().collect::<Vec<_>>(), vec![5.0, 5.0, -1.0, 0.0]);
        let c = conjugate(&a).unwrap();
        assert_eq!(c.iter().copied().collect::<Vec<_>>(), vec![1.0, -2.0, 0.0, -1.0]);
    }

    #[test]
    fn product_with_conjugate_is_squared_magnitude() {
        let data = random_complex(&[2, 4, 4, 2], 2);
        let prod = complex_multiplication(&conjugate(&data).unwrap(), &data).unwrap();
        let m = modulus(&data).unwrap();
        for (p, mag) in prod.lanes(Axis(3)).into_iter().zip(m.iter()) {
            assert_relative_eq!(p[0], mag * mag, epsilon = 1e-6);
            assert_relative_eq!(p[1], 0.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn rss_is_non_negative_and_zero_only_when_all_coils_vanish() {
        let mut data = random_complex(&[4, 5, 5, 2], 3);
        for c in 0..4 {
            data[[c, 2, 2, 0]] = 0.0;
            data[[c, 2, 2, 1]] = 0.0;
        }
        // One coil alone keeps a pixel alive.
        data[[3, 1, 1, 0]] = 0.5;
        let rss = root_sum_of_squares(&data, true).unwrap();
        assert_eq!(rss.shape(), &[5, 5]);
        assert!(rss.iter().all(|&v| v >= 0.0));
        assert_eq!(rss[[2, 2]], 0.0);
        assert!(rss[[1, 1]] > 0.0);
    }

    #[test]
    fn rss_matches_manual_sum() {
        let data = random_complex(&[3, 2, 2, 2], 4);
        let rss = root_sum_of_squares(&data, true).unwrap();
        let mut expected = 0.0f32;
        for c in 0..3 {
            expected += data[[c, 1, 0, 0]].powi(2) + data[[c, 1, 0, 1]].powi(2);
        }
        assert_relative_eq!(rss[[1, 0]], expected.sqrt(), epsilon = 1e-6);
    }

    #[test]
    fn safe_divide_returns_zero_for_zero_denominator() {
        let a = ArrayD::from_shape_vec(IxDyn(&[2, 2]), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let b = ArrayD::from_shape_vec(IxDyn(&[2, 1]), vec![0.0, 2.0]).unwrap();
        let out = safe_divide(&a, &b).unwrap();
        assert_eq!(out.shape(), &[2, 2]);
        assert_eq!(out[[0, 0]], 0.0);
        assert_eq!(out[[0, 1]], 0.0);
        assert_relative_eq!(out[[1, 0]], 1.5);
        assert_relative_eq!(out[[1, 1]], 2.0);
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn broadcast_shape_follows_numpy_rules() {
        assert_eq!(broadcast_shape(&[4, 1, 3], &[5, 1]).unwrap(), vec![4, 5, 3]);
        assert_eq!(broadcast_shape(&[1, 8, 8, 1], &[4, 8, 8, 2]).unwrap(), vec![4, 8, 8, 2]);
        assert!(broadcast_shape(&[3], &[4]).is_err());
    }

    #[test]
    fn to_paired_appends_complex_axis() {
        let raw = ArrayD::from_shape_vec(
            IxDyn(&[1, 2]),
            vec![Complex32::new(1.0, -1.0), Complex32::new(0.5, 2.0)],
        )
        .unwrap();
        let paired = to_paired(&raw);
        assert_eq!(paired.shape(), &[1, 2, 2]);
        assert_eq!(paired[[0, 1, 0]], 0.5);
        assert_eq!(paired[[0, 1, 1]], 2.0);
    }
}
