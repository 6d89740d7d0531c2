// ─────────────────────────────────────────────────────────────────────
// SCPN EM-Drift — Differential Operators
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Second-order finite differences on the field-aligned grid.
//!
//! x and y derivatives are defined wherever both neighbours exist and
//! are zero on the outermost layer; z is periodic. Parallel operators use
//! the field-aligned forms Grad_par = ∂y/√g_22 and
//! Div_par(f) = B Grad_par(f/B).

use emdrift_types::state::{Field2D, Field3D, Mesh, Metric};

/// Central ∂/∂x.
pub fn ddx(f: &Field3D, metric: &Metric) -> Field3D {
    let (nx, ny, nz) = f.dim();
    let mut out = Field3D::zeros((nx, ny, nz));
    for i in 1..nx.saturating_sub(1) {
        for j in 0..ny {
            let inv = 0.5 / metric.dx[[i, j]];
            for k in 0..nz {
                out[[i, j, k]] = (f[[i + 1, j, k]] - f[[i - 1, j, k]]) * inv;
            }
        }
    }
    out
}

/// Central ∂/∂y.
pub fn ddy(f: &Field3D, metric: &Metric) -> Field3D {
    let (nx, ny, nz) = f.dim();
    let mut out = Field3D::zeros((nx, ny, nz));
    for i in 0..nx {
        for j in 1..ny.saturating_sub(1) {
            let inv = 0.5 / metric.dy[[i, j]];
            for k in 0..nz {
                out[[i, j, k]] = (f[[i, j + 1, k]] - f[[i, j - 1, k]]) * inv;
            }
        }
    }
    out
}

/// Central periodic ∂/∂z.
pub fn ddz(f: &Field3D, mesh: &Mesh) -> Field3D {
    let (nx, ny, nz) = f.dim();
    let mut out = Field3D::zeros((nx, ny, nz));
    let inv = 0.5 / mesh.dz;
    for i in 0..nx {
        for j in 0..ny {
            for k in 0..nz {
                let kp = (k + 1) % nz;
                let km = (k + nz - 1) % nz;
                out[[i, j, k]] = (f[[i, j, kp]] - f[[i, j, km]]) * inv;
            }
        }
    }
    out
}

/// Parallel gradient ∂y f / √g_22.
pub fn grad_par(f: &Field3D, metric: &Metric) -> Field3D {
    let mut out = ddy(f, metric);
    for ((i, j, _), v) in out.indexed_iter_mut() {
        *v /= metric.g_22[[i, j]].sqrt();
    }
    out
}

/// Parallel divergence B ∇∥(f/B).
pub fn div_par(f: &Field3D, metric: &Metric) -> Field3D {
    let mut scaled = f.clone();
    for ((i, j, _), v) in scaled.indexed_iter_mut() {
        *v /= metric.bxy[[i, j]];
    }
    let mut out = grad_par(&scaled, metric);
    for ((i, j, _), v) in out.indexed_iter_mut() {
        *v *= metric.bxy[[i, j]];
    }
    out
}

/// (b0 × ∇phi) · ∇a for an axisymmetric `a`, upwinded in the advecting
/// velocity and divided by J √g_22.
pub fn b0x_grad_dot_grad(phi: &Field3D, a: &Field2D, mesh: &Mesh, metric: &Metric) -> Field3D {
    let (nx, ny, nz) = phi.dim();
    let dpdx = ddx(phi, metric);
    let dpdy = ddy(phi, metric);
    let dpdz = ddz(phi, mesh);

    let mut out = Field3D::zeros((nx, ny, nz));
    for i in 1..nx.saturating_sub(1) {
        for j in 1..ny.saturating_sub(1) {
            let dx = metric.dx[[i, j]];
            let dy = metric.dy[[i, j]];
            let norm = metric.j[[i, j]] * metric.g_22[[i, j]].sqrt();
            for k in 0..nz {
                let vx = metric.g_22[[i, j]] * dpdz[[i, j, k]] - metric.g_23[[i, j]] * dpdy[[i, j, k]];
                let vy = metric.g_23[[i, j]] * dpdx[[i, j, k]] - metric.g_12[[i, j]] * dpdz[[i, j, k]];
                let ax = upwind(vx, a[[i - 1, j]], a[[i, j]], a[[i + 1, j]], dx);
                let ay = upwind(vy, a[[i, j - 1]], a[[i, j]], a[[i, j + 1]], dy);
                out[[i, j, k]] = (vx * ax + vy * ay) / norm;
            }
        }
    }
    out
}

#[inline(always)]
fn upwind(v: f64, fm: f64, f0: f64, fp: f64, h: f64) -> f64 {
    if v >= 0.0 {
        (f0 - fm) / h
    } else {
        (fp - f0) / h
    }
}
