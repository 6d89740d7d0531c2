// ─────────────────────────────────────────────────────────────────────
// SCPN EM-Drift — Radial Boundary Policy
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use emdrift_types::config::{BoundaryOptions, RadialBoundary};
use emdrift_types::state::Field3D;
use ndarray::Axis;

/// Inner guard rows x < mxg take the value of the first core row.
pub fn flatten_inner(f: &mut Field3D, mxg: usize) {
    let nx = f.len_of(Axis(0));
    if mxg == 0 || mxg >= nx {
        return;
    }
    let edge = f.index_axis(Axis(0), mxg).to_owned();
    for x in 0..mxg {
        f.index_axis_mut(Axis(0), x).assign(&edge);
    }
}

/// Outer guard rows x >= nx - mxg take the value of the last core row.
pub fn flatten_outer(f: &mut Field3D, mxg: usize) {
    let nx = f.len_of(Axis(0));
    if mxg == 0 || 2 * mxg > nx {
        return;
    }
    let edge = f.index_axis(Axis(0), nx - mxg - 1).to_owned();
    for x in (nx - mxg)..nx {
        f.index_axis_mut(Axis(0), x).assign(&edge);
    }
}

fn zero_inner(f: &mut Field3D, mxg: usize) {
    let nx = f.len_of(Axis(0));
    for x in 0..mxg.min(nx) {
        f.index_axis_mut(Axis(0), x).fill(0.0);
    }
}

fn zero_outer(f: &mut Field3D, mxg: usize) {
    let nx = f.len_of(Axis(0));
    for x in nx.saturating_sub(mxg)..nx {
        f.index_axis_mut(Axis(0), x).fill(0.0);
    }
}

/// Per-edge radial treatment applied to right-hand sides and to the
/// inertialess current before it is exchanged.
#[derive(Debug, Clone, Copy)]
pub struct BoundaryPolicy {
    inner: RadialBoundary,
    outer: RadialBoundary,
    mxg: usize,
}

impl BoundaryPolicy {
    pub fn new(opts: &BoundaryOptions, mxg: usize) -> Self {
        BoundaryPolicy {
            inner: opts.inner,
            outer: opts.outer,
            mxg,
        }
    }

    pub fn apply(&self, f: &mut Field3D) {
        match self.inner {
            RadialBoundary::Flat => flatten_inner(f, self.mxg),
            RadialBoundary::Zero => zero_inner(f, self.mxg),
        }
        match self.outer {
            RadialBoundary::Flat => flatten_outer(f, self.mxg),
            RadialBoundary::Zero => zero_outer(f, self.mxg),
        }
    }
}
