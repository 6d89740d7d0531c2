//! Toroidal (z) FFT helpers around rustfft.
//!
//! Convention matches numpy:
//! - Forward FFT: unnormalized
//! - Inverse FFT: normalized by 1/nz

use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Planned forward/inverse transforms along one periodic z line.
#[derive(Clone)]
pub struct ZTransform {
    nz: usize,
    zlength: f64,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl std::fmt::Debug for ZTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZTransform")
            .field("nz", &self.nz)
            .field("zlength", &self.zlength)
            .finish()
    }
}

impl ZTransform {
    pub fn new(nz: usize, zlength: f64) -> Self {
        let mut planner = FftPlanner::new();
        ZTransform {
            nz,
            zlength,
            forward: planner.plan_fft_forward(nz),
            inverse: planner.plan_fft_inverse(nz),
        }
    }

    pub fn nz(&self) -> usize {
        self.nz
    }

    pub fn forward(&self, values: &[f64]) -> Vec<Complex64> {
        debug_assert_eq!(values.len(), self.nz);
        let mut data: Vec<Complex64> = values.iter().map(|v| Complex64::new(*v, 0.0)).collect();
        self.forward.process(&mut data);
        data
    }

    /// Inverse transform, keeping the real part.
    pub fn inverse(&self, mut spectrum: Vec<Complex64>) -> Vec<f64> {
        debug_assert_eq!(spectrum.len(), self.nz);
        self.inverse.process(&mut spectrum);
        let norm = 1.0 / self.nz as f64;
        spectrum.iter().map(|c| c.re * norm).collect()
    }

    /// Physical wavenumber of FFT bin `k`; bins above nz/2 are negative modes.
    pub fn wavenumber(&self, k: usize) -> f64 {
        let k_eff = if k <= self.nz / 2 {
            k as f64
        } else {
            k as f64 - self.nz as f64
        };
        2.0 * std::f64::consts::PI * k_eff / self.zlength
    }

    /// Returns g(z) = f(z + angle) for a periodic line f.
    pub fn shift(&self, values: &[f64], angle: f64) -> Vec<f64> {
        let mut spectrum = self.forward(values);
        for (k, c) in spectrum.iter_mut().enumerate() {
            let phase = self.wavenumber(k) * angle;
            *c *= Complex64::new(phase.cos(), phase.sin());
        }
        self.inverse(spectrum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_fft_roundtrip() {
        let zt = ZTransform::new(16, 2.0 * PI);
        let original: Vec<f64> = (0..16).map(|i| (i * i) as f64 * 0.1 - 3.0).collect();
        let recovered = zt.inverse(zt.forward(&original));
        for (i, (&a, &b)) in original.iter().zip(recovered.iter()).enumerate() {
            assert!((a - b).abs() < 1e-10, "roundtrip failed at {i}: {a} vs {b}");
        }
    }

    #[test]
    fn test_dc_component() {
        let zt = ZTransform::new(8, 2.0 * PI);
        let spectrum = zt.forward(&[3.0; 8]);
        assert!((spectrum[0].re - 24.0).abs() < 1e-10);
        for c in &spectrum[1..] {
            assert!(c.norm() < 1e-10);
        }
    }

    #[test]
    fn test_wavenumber_signs() {
        let zt = ZTransform::new(8, PI);
        assert_eq!(zt.wavenumber(0), 0.0);
        assert!((zt.wavenumber(1) - 2.0).abs() < 1e-12);
        assert!((zt.wavenumber(4) - 8.0).abs() < 1e-12);
        assert!((zt.wavenumber(7) + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_shift_moves_cosine() {
        let nz = 32;
        let zlength = 2.0 * PI;
        let dz = zlength / nz as f64;
        let zt = ZTransform::new(nz, zlength);
        let f: Vec<f64> = (0..nz).map(|k| (k as f64 * dz).cos()).collect();
        let angle = 0.37;
        let g = zt.shift(&f, angle);
        for k in 0..nz {
            let expected = (k as f64 * dz + angle).cos();
            assert!((g[k] - expected).abs() < 1e-10, "shift mismatch at {k}");
        }
    }

    #[test]
    fn test_shift_by_zero_is_identity() {
        let zt = ZTransform::new(10, 2.0 * PI);
        let f: Vec<f64> = (0..10).map(|k| (k as f64).sin() + 0.5).collect();
        let g = zt.shift(&f, 0.0);
        for (a, b) in f.iter().zip(g.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }
}
