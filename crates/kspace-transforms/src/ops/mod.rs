//! Tensor primitives the transform stages are built from.
//!
//! The stages in `crate::transforms` own the call order and sample bookkeeping;
//! this module provides the numerical building blocks on paired complex
//! tensors: arithmetic, broadcast masking, cropping and Fourier operators.

pub mod complex;
pub mod crop;
pub mod fft;
pub mod mask;

pub use complex::{
    broadcast_shape, complex_multiplication, conjugate, magnitude, modulus, root_sum_of_squares,
    safe_divide, to_paired,
};
pub use crop::{complex_center_crop, complex_random_crop, OffsetSampler};
pub use fft::{default_operators, Fft2, FourierOperator, Ifft2};
pub use mask::{apply_mask, apply_padding, apply_padding_to_mask};
