// ─────────────────────────────────────────────────────────────────────
// SCPN EM-Drift — Shared Test Fixtures
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![allow(dead_code)]

use emdrift_core::model::{SimState, TwoFluidModel};
use emdrift_core::comms::Communicator;
use emdrift_math::laplace::LaplaceSolver;
use emdrift_types::config::RunConfig;
use emdrift_types::grid::GridFile;
use ndarray::Array2;
use std::f64::consts::PI;

pub const NX: usize = 8;
pub const NY: usize = 8;
pub const TE_X: f64 = 10.0;
pub const NI_X: f64 = 1.0;

/// rho_s for AA = 2, ZZ = 1, Te_x = 10 eV, bmag = 1 T.
pub fn rho_s() -> f64 {
    1.02 * (2.0f64 * TE_X).sqrt() / 1.0e4
}

/// Large-aspect-ratio circular geometry whose normalised quantities are
/// of order one: R/rho_s ≈ 20, hthe/rho_s = 5, dx = 0.5.
pub fn test_grid(nx: usize, ny: usize) -> GridFile {
    let rs = rho_s();
    let mut grid = GridFile::new(nx, ny);
    grid.insert_scalar("Te_x", TE_X);
    grid.insert_scalar("Ti_x", TE_X);
    grid.insert_scalar("Ni_x", NI_X);
    grid.insert_scalar("bmag", 1.0);

    let field = |f: &dyn Fn(usize, usize) -> f64| Array2::from_shape_fn((nx, ny), |(i, j)| f(i, j));
    let bp: f64 = 0.2;
    let bt: f64 = 1.0;
    grid.insert_2d("Rxy", &field(&|i, _| (20.0 + 0.5 * i as f64) * rs));
    grid.insert_2d("hthe", &field(&|_, _| 5.0 * rs));
    grid.insert_2d("Bpxy", &field(&|_, _| bp));
    grid.insert_2d("Btxy", &field(&|_, _| bt));
    grid.insert_2d("Bxy", &field(&|_, _| (bp * bp + bt * bt).sqrt()));
    grid.insert_2d("dpsi", &field(&|_, _| 0.5 * rs * rs));
    grid.insert_2d("sinty", &field(&|i, _| 0.01 * (1.0 + 0.1 * i as f64) / (rs * rs)));
    grid.insert_2d("qinty", &field(&|i, j| 0.3 + 0.05 * j as f64 + 0.01 * i as f64));
    grid.insert_2d(
        "Ni0",
        &field(&|i, j| NI_X * (1.0 + 0.05 * (i as f64 * 0.7).cos() + 0.01 * j as f64)),
    );
    grid.insert_2d("Te0", &field(&|i, _| TE_X * (1.0 - 0.02 * i as f64)));
    grid.insert_2d("Ti0", &field(&|i, _| TE_X * (0.8 + 0.01 * i as f64)));
    grid
}

/// Same geometry with Ni0 = Te0 = Ti0 = 1 after normalisation.
pub fn uniform_grid(nx: usize, ny: usize) -> GridFile {
    let mut grid = test_grid(nx, ny);
    grid.insert_2d("Ni0", &Array2::from_elem((nx, ny), NI_X));
    grid.insert_2d("Te0", &Array2::from_elem((nx, ny), TE_X));
    grid.insert_2d("Ti0", &Array2::from_elem((nx, ny), TE_X));
    grid
}

pub fn config() -> RunConfig {
    let mut cfg = RunConfig::default();
    cfg.mesh.nz = 8;
    cfg
}

/// Smooth non-trivial initial state evaluated at global coordinates, core
/// rows only. Guard rows are left for the halo exchange.
pub fn seed_state<C: Communicator, L: LaplaceSolver>(model: &mut TwoFluidModel<C, L>) {
    let mesh = model.mesh().clone();
    let ny_global = mesh.ny_global as f64;
    let st: &mut SimState = model.state_mut();
    for i in 0..mesh.nx {
        for jl in mesh.ystart()..mesh.yend() {
            let jg = (mesh.y_offset + jl - mesh.myg) as f64;
            let y = 2.0 * PI * jg / ny_global;
            for k in 0..mesh.nz {
                let z = k as f64 * mesh.dz;
                let x = i as f64 / (mesh.nx - 1) as f64;
                let envelope = (PI * x).sin();
                st.rho[[i, jl, k]] = 1e-2 * envelope * (y + 2.0 * z).cos();
                st.ni[[i, jl, k]] = 1e-2 * envelope * (y - z).sin();
                st.ajpar[[i, jl, k]] = 1e-3 * envelope * (2.0 * y + z).cos();
            }
        }
    }
}
