// ─────────────────────────────────────────────────────────────────────
// SCPN EM-Drift — Laplacian Inversion
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Perpendicular Laplacian inversion on a field-aligned grid.
//!
//! Solves (∇⊥² + a) x = b on every poloidal plane. The toroidal direction
//! is Fourier transformed; each mode k is then a tridiagonal system in x:
//!
//!   g11 ∂²x/∂x² + 2 g13 (ik) ∂x/∂x − g33 k² x + a x = b_k
//!
//! Radial guard cells hold the boundary rows (zero value, or zero gradient
//! when the matching flag is set). Planes are independent and solved in
//! parallel with rayon.

use crate::fft::ZTransform;
use crate::tridiag::thomas_solve;
use emdrift_types::error::{DriftError, DriftResult};
use emdrift_types::state::{Field2D, Field3D, Mesh, Metric};
use ndarray::{Array2, Axis};
use num_complex::Complex64;
use rayon::prelude::*;

/// Boundary-condition bit set for the inversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvertFlags(u32);

impl InvertFlags {
    pub const NONE: InvertFlags = InvertFlags(0);
    /// Zero gradient at the inner edge for the k = 0 mode.
    pub const DC_IN_GRAD: InvertFlags = InvertFlags(1);
    /// Zero gradient at the inner edge for k != 0.
    pub const AC_IN_GRAD: InvertFlags = InvertFlags(2);
    /// Zero gradient at the outer edge for the k = 0 mode.
    pub const DC_OUT_GRAD: InvertFlags = InvertFlags(4);
    /// Zero gradient at the outer edge for k != 0.
    pub const AC_OUT_GRAD: InvertFlags = InvertFlags(8);
    /// Drop the k = 0 component of the solution.
    pub const ZERO_DC: InvertFlags = InvertFlags(16);

    const KNOWN: u32 = 31;

    pub fn from_bits(bits: u32) -> DriftResult<Self> {
        if bits & !Self::KNOWN != 0 {
            return Err(DriftError::InvalidFlags(bits));
        }
        Ok(InvertFlags(bits))
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: InvertFlags) -> bool {
        self.0 & other.0 == other.0
    }

    fn inner_grad(self, k: usize) -> bool {
        if k == 0 {
            self.contains(Self::DC_IN_GRAD)
        } else {
            self.contains(Self::AC_IN_GRAD)
        }
    }

    fn outer_grad(self, k: usize) -> bool {
        if k == 0 {
            self.contains(Self::DC_OUT_GRAD)
        } else {
            self.contains(Self::AC_OUT_GRAD)
        }
    }
}

impl std::ops::BitOr for InvertFlags {
    type Output = InvertFlags;
    fn bitor(self, rhs: InvertFlags) -> InvertFlags {
        InvertFlags(self.0 | rhs.0)
    }
}

/// Linear elliptic inversion, `invert(b, flags, a) -> x` with (∇⊥² + a) x = b.
///
/// Only core poloidal rows of the result are meaningful; guard rows are
/// left at zero for the halo exchange to fill.
pub trait LaplaceSolver: Send + Sync {
    fn invert(&self, b: &Field3D, flags: InvertFlags, a: Option<&Field2D>) -> DriftResult<Field3D>;
}

/// Direct FFT + Thomas inversion using the metric of one partition.
#[derive(Debug, Clone)]
pub struct FftLaplace {
    mesh: Mesh,
    g11: Field2D,
    g13: Field2D,
    g33: Field2D,
    dx: Field2D,
    ztrans: ZTransform,
}

impl FftLaplace {
    pub fn new(mesh: &Mesh, metric: &Metric) -> Self {
        FftLaplace {
            mesh: mesh.clone(),
            g11: metric.g11.clone(),
            g13: metric.g13.clone(),
            g33: metric.g33.clone(),
            dx: metric.dx.clone(),
            ztrans: ZTransform::new(mesh.nz, mesh.zlength()),
        }
    }

    /// Solve one poloidal plane. Returns the [nx, nz] solution.
    fn solve_plane(
        &self,
        b: &Field3D,
        y: usize,
        flags: InvertFlags,
        a: Option<&Field2D>,
    ) -> DriftResult<Array2<f64>> {
        let nx = self.mesh.nx;
        let nz = self.mesh.nz;
        let mxg = self.mesh.mxg;
        let zero = Complex64::new(0.0, 0.0);
        let one = Complex64::new(1.0, 0.0);

        // bk[x][k]
        let bk: Vec<Vec<Complex64>> = (0..nx)
            .map(|x| {
                let line: Vec<f64> = b.slice(ndarray::s![x, y, ..]).to_vec();
                self.ztrans.forward(&line)
            })
            .collect();

        let mut xk = vec![vec![zero; nz]; nx];
        let mut lower = vec![zero; nx];
        let mut diag = vec![zero; nx];
        let mut upper = vec![zero; nx];
        let mut rhs = vec![zero; nx];

        for k in 0..nz {
            if k == 0 && flags.contains(InvertFlags::ZERO_DC) {
                continue;
            }
            let kw = self.ztrans.wavenumber(k);
            let inner_grad = flags.inner_grad(k);
            let outer_grad = flags.outer_grad(k);

            for ix in 0..nx {
                lower[ix] = zero;
                upper[ix] = zero;
                rhs[ix] = zero;
                if ix < mxg {
                    diag[ix] = one;
                    if inner_grad {
                        upper[ix] = -one;
                    }
                } else if ix >= nx - mxg {
                    diag[ix] = one;
                    if outer_grad {
                        lower[ix] = -one;
                    }
                } else {
                    let dx = self.dx[[ix, y]];
                    let g11 = self.g11[[ix, y]] / (dx * dx);
                    let cross = Complex64::new(0.0, kw * self.g13[[ix, y]] / dx);
                    let shift = a.map_or(0.0, |a| a[[ix, y]]);
                    lower[ix] = Complex64::new(g11, 0.0) - cross;
                    upper[ix] = Complex64::new(g11, 0.0) + cross;
                    diag[ix] = Complex64::new(-2.0 * g11 - kw * kw * self.g33[[ix, y]] + shift, 0.0);
                    rhs[ix] = bk[ix][k];
                }
            }

            let sol = thomas_solve(&lower, &diag, &upper, &rhs).map_err(|e| match e {
                DriftError::SolverDiverged { iteration, message } => DriftError::SolverDiverged {
                    iteration,
                    message: format!("plane y={y}, mode k={k}: {message}"),
                },
                other => other,
            })?;
            for ix in 0..nx {
                xk[ix][k] = sol[ix];
            }
        }

        let mut plane = Array2::zeros((nx, nz));
        for (ix, spectrum) in xk.into_iter().enumerate() {
            let line = self.ztrans.inverse(spectrum);
            for (iz, v) in line.into_iter().enumerate() {
                plane[[ix, iz]] = v;
            }
        }
        Ok(plane)
    }
}

impl LaplaceSolver for FftLaplace {
    fn invert(&self, b: &Field3D, flags: InvertFlags, a: Option<&Field2D>) -> DriftResult<Field3D> {
        let mesh = &self.mesh;
        if b.dim() != (mesh.nx, mesh.local_ny(), mesh.nz) {
            return Err(DriftError::PhysicsViolation(format!(
                "Inversion source shape {:?} does not match mesh",
                b.dim()
            )));
        }
        if let Some(a) = a {
            if a.dim() != (mesh.nx, mesh.local_ny()) {
                return Err(DriftError::PhysicsViolation(format!(
                    "Inversion coefficient shape {:?} does not match mesh",
                    a.dim()
                )));
            }
        }
        // Pure Neumann on both edges leaves the DC mode defined only up to a constant.
        let no_shift = a.map_or(true, |a| a.iter().all(|v| *v == 0.0));
        if flags.contains(InvertFlags::DC_IN_GRAD | InvertFlags::DC_OUT_GRAD)
            && !flags.contains(InvertFlags::ZERO_DC)
            && no_shift
        {
            return Err(DriftError::InvalidFlags(flags.bits()));
        }
        if b.iter().any(|v| !v.is_finite()) {
            return Err(DriftError::PhysicsViolation(
                "Inversion source contains non-finite values".to_string(),
            ));
        }

        let planes: Vec<(usize, Array2<f64>)> = (mesh.ystart()..mesh.yend())
            .into_par_iter()
            .map(|y| self.solve_plane(b, y, flags, a).map(|p| (y, p)))
            .collect::<DriftResult<Vec<_>>>()?;

        let mut x = mesh.zeros_3d();
        for (y, plane) in planes {
            x.index_axis_mut(Axis(1), y).assign(&plane);
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(DriftError::SolverDiverged {
                iteration: 0,
                message: "Laplacian inversion produced non-finite values".to_string(),
            });
        }
        log::debug!(
            "Laplacian inversion: {} planes, flags={:#x}",
            mesh.ny,
            flags.bits()
        );
        Ok(x)
    }
}
