// ─────────────────────────────────────────────────────────────────────
// SCPN EM-Drift — Closure Evaluator
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Parallel current closures and the right-hand sides of the model.
//!
//! Two closures for jpar:
//! - inertialess electrons (Ohm's law):
//!   jpar = (Te0 ∇∥Ni − Ni0 ∇∥phi) / (fmei 0.51 nu), Ve = −jpar/Ni0
//! - evolved electron momentum: Ve = Ajpar (+ Apar), jpar = −Ni0 Ve
//!
//! Right-hand sides:
//! ```text
//! dNi/dt    = −(b0 × ∇phi)·∇Ni0 / B
//! drho/dt   = B² ∇∥ jpar
//! dAjpar/dt = ∇∥phi/fmei − (Te0/Ni0) ∇∥Ni/fmei + 0.51 nu jpar/Ni0
//! ```

use crate::normalize::Normalization;
use crate::profiles::Equilibrium;
use emdrift_math::operators::{b0x_grad_dot_grad, div_par, grad_par};
use emdrift_types::constants::SPITZER_COEFF;
use emdrift_types::state::{Field2D, Field3D, Mesh, Metric};

/// Profile-dependent collision and viscosity coefficients.
#[derive(Debug, Clone)]
pub struct Coefficients {
    /// nu = nu_hat Ni0 / Te0^1.5
    pub nu: Field2D,
    /// mu_i = mui_hat Ni0 / Ti0^0.5, zero where Ti0 = 0
    pub mu_i: Field2D,
}

pub fn nonlinear_coefficients(eq: &Equilibrium, norm: &Normalization) -> Coefficients {
    let nu = ndarray::Zip::from(&eq.ni0)
        .and(&eq.te0)
        .map_collect(|&n, &te| norm.nu_hat * n / te.powf(1.5));
    let mu_i = ndarray::Zip::from(&eq.ni0)
        .and(&eq.ti0)
        .map_collect(|&n, &ti| if ti > 0.0 { norm.mui_hat * n / ti.sqrt() } else { 0.0 });
    Coefficients { nu, mu_i }
}

/// Ohm's law current for massless electrons. Boundary treatment and the
/// exchange of the result are left to the caller.
pub fn inertialess_current(
    ni: &Field3D,
    phi: &Field3D,
    eq: &Equilibrium,
    nu: &Field2D,
    fmei: f64,
    metric: &Metric,
) -> Field3D {
    let mut jpar = grad_par(ni, metric);
    let gphi = grad_par(phi, metric);
    for ((i, j, k), v) in jpar.indexed_iter_mut() {
        let resist = fmei * SPITZER_COEFF * nu[[i, j]];
        *v = (eq.te0[[i, j]] * *v - eq.ni0[[i, j]] * gphi[[i, j, k]]) / resist;
    }
    jpar
}

/// Ve = −jpar / Ni0
pub fn velocity_from_current(jpar: &Field3D, ni0: &Field2D) -> Field3D {
    let mut ve = jpar.clone();
    for ((i, j, _), v) in ve.indexed_iter_mut() {
        *v = -*v / ni0[[i, j]];
    }
    ve
}

/// Velocity and current from the evolved momentum: (Ve, jpar).
pub fn evolved_closure(ajpar: &Field3D, apar: Option<&Field3D>, ni0: &Field2D) -> (Field3D, Field3D) {
    let ve = match apar {
        Some(apar) => ajpar + apar,
        None => ajpar.clone(),
    };
    let mut jpar = ve.clone();
    for ((i, j, _), v) in jpar.indexed_iter_mut() {
        *v *= -ni0[[i, j]];
    }
    (ve, jpar)
}

/// E×B advection of a background profile, (b0 × ∇phi)·∇f / B.
pub fn ve_grad(f: &Field2D, phi: &Field3D, mesh: &Mesh, metric: &Metric) -> Field3D {
    let mut out = b0x_grad_dot_grad(phi, f, mesh, metric);
    for ((i, j, _), v) in out.indexed_iter_mut() {
        *v /= metric.bxy[[i, j]];
    }
    out
}

pub fn density_rhs(phi: &Field3D, ni0: &Field2D, mesh: &Mesh, metric: &Metric) -> Field3D {
    -ve_grad(ni0, phi, mesh, metric)
}

pub fn vorticity_rhs(jpar: &Field3D, metric: &Metric) -> Field3D {
    let mut out = div_par(jpar, metric);
    for ((i, j, _), v) in out.indexed_iter_mut() {
        let b = metric.bxy[[i, j]];
        *v *= b * b;
    }
    out
}

pub fn momentum_rhs(
    phi: &Field3D,
    ni: &Field3D,
    jpar: &Field3D,
    eq: &Equilibrium,
    nu: &Field2D,
    fmei: f64,
    metric: &Metric,
) -> Field3D {
    let gphi = grad_par(phi, metric);
    let gni = grad_par(ni, metric);
    let mut out = gphi;
    for ((i, j, k), v) in out.indexed_iter_mut() {
        let ni0 = eq.ni0[[i, j]];
        *v = *v / fmei - (eq.te0[[i, j]] / ni0) * gni[[i, j, k]] / fmei
            + SPITZER_COEFF * nu[[i, j]] * jpar[[i, j, k]] / ni0;
    }
    out
}
