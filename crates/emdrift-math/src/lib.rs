//! Numerical kernels for the EM drift-wave model.

pub mod fft;
pub mod laplace;
pub mod operators;
pub mod tridiag;
