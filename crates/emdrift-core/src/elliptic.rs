// ─────────────────────────────────────────────────────────────────────
// SCPN EM-Drift — Elliptic Solve Adapter
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! The two per-step inversions of the model.
//!
//! - Potential: ∇⊥² phi = rho / Ni0
//! - Vector potential: (∇⊥² + a) Apar = -a Ajpar, a = -β/(2 fmei) Ni0
//!
//! Both delegate to a [`LaplaceSolver`]. The vector-potential coefficient is
//! computed once when the adapter is built.

use crate::normalize::Normalization;
use emdrift_math::laplace::{InvertFlags, LaplaceSolver};
use emdrift_types::error::{DriftError, DriftResult};
use emdrift_types::state::{Field2D, Field3D};
use log::debug;
use ndarray::Axis;

/// Divide (or multiply) every toroidal line of `f` by the matching 2-D value.
fn scale_by_2d(f: &Field3D, g: &Field2D, op: impl Fn(f64, f64) -> f64) -> DriftResult<Field3D> {
    let (nx, ny, _) = f.dim();
    if g.dim() != (nx, ny) {
        return Err(DriftError::PhysicsViolation(format!(
            "2-D coefficient {:?} does not match field plane ({nx}, {ny})",
            g.dim()
        )));
    }
    let mut out = f.clone();
    for (mut line, c) in out.lanes_mut(Axis(2)).into_iter().zip(g.iter()) {
        line.mapv_inplace(|v| op(v, *c));
    }
    Ok(out)
}

#[derive(Debug, Clone, Copy)]
pub struct PotentialSolve {
    flags: InvertFlags,
}

impl PotentialSolve {
    pub fn new(phi_flags: u32) -> DriftResult<Self> {
        Ok(PotentialSolve {
            flags: InvertFlags::from_bits(phi_flags)?,
        })
    }

    pub fn flags(&self) -> InvertFlags {
        self.flags
    }

    pub fn solve<L: LaplaceSolver + ?Sized>(&self, solver: &L, rho: &Field3D, ni0: &Field2D) -> DriftResult<Field3D> {
        let source = scale_by_2d(rho, ni0, |v, n| v / n)?;
        solver.invert(&source, self.flags, None)
    }
}

#[derive(Debug, Clone)]
pub struct VectorPotentialSolve {
    flags: InvertFlags,
    coefficient: Field2D,
}

impl VectorPotentialSolve {
    pub fn new(apar_flags: u32, norm: &Normalization, ni0: &Field2D) -> DriftResult<Self> {
        let flags = InvertFlags::from_bits(apar_flags)?;
        let scale = -0.5 * norm.beta_p / norm.fmei;
        let coefficient = ni0.mapv(|n| scale * n);
        debug!(
            "Apar coefficient a = {:e} * Ni0, flags {:#x}",
            scale,
            flags.bits()
        );
        Ok(VectorPotentialSolve { flags, coefficient })
    }

    pub fn flags(&self) -> InvertFlags {
        self.flags
    }

    pub fn coefficient(&self) -> &Field2D {
        &self.coefficient
    }

    pub fn solve<L: LaplaceSolver + ?Sized>(&self, solver: &L, ajpar: &Field3D) -> DriftResult<Field3D> {
        let source = scale_by_2d(ajpar, &self.coefficient, |v, a| -a * v)?;
        solver.invert(&source, self.flags, Some(&self.coefficient))
    }
}

/// Solver plus the inversions the selected physics needs.
#[derive(Debug)]
pub struct EllipticSolves<L> {
    solver: L,
    potential: PotentialSolve,
    vector_potential: Option<VectorPotentialSolve>,
}

impl<L: LaplaceSolver> EllipticSolves<L> {
    pub fn new(solver: L, potential: PotentialSolve, vector_potential: Option<VectorPotentialSolve>) -> Self {
        EllipticSolves {
            solver,
            potential,
            vector_potential,
        }
    }

    pub fn solves_apar(&self) -> bool {
        self.vector_potential.is_some()
    }

    pub fn vector_potential(&self) -> Option<&VectorPotentialSolve> {
        self.vector_potential.as_ref()
    }

    /// Potential, then vector potential. Apar is `None` when it is not
    /// solved for; nothing is returned unless every requested solve succeeds.
    pub fn solve(&self, rho: &Field3D, ni0: &Field2D, ajpar: &Field3D) -> DriftResult<(Field3D, Option<Field3D>)> {
        let phi = self.potential.solve(&self.solver, rho, ni0)?;
        let apar = match &self.vector_potential {
            Some(vp) => Some(vp.solve(&self.solver, ajpar)?),
            None => None,
        };
        Ok((phi, apar))
    }
}
