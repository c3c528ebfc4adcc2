//! Broadcast masking primitives.
//!
//! Masks have singleton coil and complex axes, e.g. `(1, [slice,] h, w, 1)`,
//! and broadcast against k-space `(coil, [slice,] h, w, 2)`.

use ndarray::{ArrayD, Zip};

use super::complex::co_broadcast;
use crate::error::Result;

/// Keep `data` where `mask` is true, zero elsewhere.
pub fn apply_mask(data: &ArrayD<f32>, mask: &ArrayD<bool>) -> Result<ArrayD<f32>> {
    select(data, mask, true)
}

/// Zero `data` wherever `padding` is true.
pub fn apply_padding(data: &ArrayD<f32>, padding: &ArrayD<bool>) -> Result<ArrayD<f32>> {
    select(data, padding, false)
}

/// Drop sampled locations that fall into the padding region.
pub fn apply_padding_to_mask(mask: &ArrayD<bool>, padding: &ArrayD<bool>) -> Result<ArrayD<bool>> {
    let (mv, pv) = (mask.view(), padding.view());
    let (mv, pv) = co_broadcast(&mv, &pv)?;
    let mut out = ArrayD::from_elem(mv.raw_dim(), false);
    Zip::from(&mut out)
        .and(&mv)
        .and(&pv)
        .for_each(|o, &m, &p| *o = m && !p);
    Ok(out)
}

/// Multiply by a per-width profile (axis `ndim - 2` of a complex tensor).
pub fn scale_along_width(data: &mut ArrayD<f32>, profile: &[f32]) {
    let width_axis = ndarray::Axis(data.ndim().saturating_sub(2));
    for (mut slab, &w) in data.axis_iter_mut(width_axis).zip(profile) {
        slab.mapv_inplace(|v| v * w);
    }
}

fn select(data: &ArrayD<f32>, mask: &ArrayD<bool>, keep_when: bool) -> Result<ArrayD<f32>> {
    let (dv, mv) = (data.view(), mask.view());
    let (dv, mv) = co_broadcast(&dv, &mv)?;
    let mut out = ArrayD::<f32>::zeros(dv.raw_dim());
    // `+ 0.0` clears the sign of masked zeros.
    Zip::from(&mut out)
        .and(&dv)
        .and(&mv)
        .for_each(|o, &x, &m| *o = if m == keep_when { x + 0.0 } else { 0.0 });
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::IxDyn;

    fn column_mask(w: usize, keep: impl Fn(usize) -> bool) -> ArrayD<bool> {
        ArrayD::from_shape_fn(IxDyn(&[1, 1, w, 1]), |idx| keep(idx[2]))
    }

    #[test]
    fn mask_zeroes_unsampled_columns() {
        let data = ArrayD::from_elem(IxDyn(&[2, 4, 4, 2]), 1.5f32);
        let mask = column_mask(4, |x| x % 2 == 0);
        let out = apply_mask(&data, &mask).unwrap();
        assert_eq!(out.shape(), data.shape());
        for (idx, &v) in out.indexed_iter() {
            assert_eq!(v, if idx[2] % 2 == 0 { 1.5 } else { 0.0 });
        }
    }

    #[test]
    fn masking_is_idempotent() {
        let data = ArrayD::from_shape_fn(IxDyn(&[3, 5, 6, 2]), |i| (i[1] * 7 + i[2]) as f32 - 9.0);
        let mask = column_mask(6, |x| x != 2 && x != 5);
        let once = apply_mask(&data, &mask).unwrap();
        let twice = apply_mask(&once, &mask).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn padding_zeroes_flagged_entries() {
        let data = ArrayD::from_elem(IxDyn(&[2, 2, 2, 2]), 1.0f32);
        let padding = ArrayD::from_shape_fn(IxDyn(&[1, 2, 2, 1]), |i| i[1] == 0);
        let out = apply_padding(&data, &padding).unwrap();
        assert!(out.index_axis(ndarray::Axis(1), 0).iter().all(|&v| v == 0.0));
        assert!(out.index_axis(ndarray::Axis(1), 1).iter().all(|&v| v == 1.0));
    }

    #[test]
    fn padded_mask_broadcasts_to_common_shape() {
        let mask = column_mask(3, |_| true);
        let padding = ArrayD::from_shape_fn(IxDyn(&[1, 2, 3, 1]), |i| i[1] == 1 && i[2] == 0);
        let out = apply_padding_to_mask(&mask, &padding).unwrap();
        assert_eq!(out.shape(), &[1, 2, 3, 1]);
        assert!(!out[[0, 1, 0, 0]]);
        assert!(out[[0, 0, 0, 0]]);
    }

    #[test]
    fn incompatible_mask_is_rejected() {
        let data = ArrayD::<f32>::zeros(IxDyn(&[2, 4, 4, 2]));
        let mask = ArrayD::from_elem(IxDyn(&[1, 3, 4, 1]), true);
        assert!(apply_mask(&data, &mask).is_err());
    }
}
