// ─────────────────────────────────────────────────────────────────────
// SCPN EM-Drift — Step Orchestrator
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Two-fluid model state and the per-step right-hand-side evaluation.
//!
//! Evolving fields: vorticity `rho`, density `Ni`, parallel electron
//! momentum `Ajpar` (unless Ohm's law replaces it). One call to
//! [`TwoFluidModel::evaluate`] runs, in this order:
//!
//! 1. phi from rho, then Apar from Ajpar (when electromagnetic)
//! 2. halo exchange of rho, Ni, Ajpar, phi, Apar
//! 3. nu and mu_i from the equilibrium
//! 4. the closure of the selected physics mode
//! 5. right-hand sides, then the radial boundary policy

use crate::boundary::BoundaryPolicy;
use crate::closure::{
    density_rhs, evolved_closure, inertialess_current, momentum_rhs, nonlinear_coefficients,
    velocity_from_current, vorticity_rhs,
};
use crate::comms::Communicator;
use crate::elliptic::{EllipticSolves, PotentialSolve, VectorPotentialSolve};
use crate::metric::build_metric;
use crate::normalize::Normalization;
use crate::output::{OutputKind, OutputRegistry, OutputValue};
use crate::profiles::Equilibrium;
use emdrift_math::laplace::{FftLaplace, LaplaceSolver};
use emdrift_types::config::{RunConfig, TwoFluidOptions};
use emdrift_types::error::{DriftError, DriftResult};
use emdrift_types::grid::GridFile;
use emdrift_types::state::{Field2D, Field3D, Mesh, Metric};
use log::{debug, info};
use std::time::Instant;

/// Physics variant, fixed for the lifetime of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicsMode {
    /// Apar ≡ 0, electron momentum evolved.
    Electrostatic,
    /// Apar ≡ 0, jpar from Ohm's law.
    ZeroElectronMass,
    /// Apar solved every step.
    FullTwoFluid,
}

impl PhysicsMode {
    /// `ZeroElMass` takes precedence over `estatic`.
    pub fn select(opts: &TwoFluidOptions) -> Self {
        if opts.zero_el_mass {
            PhysicsMode::ZeroElectronMass
        } else if opts.estatic {
            PhysicsMode::Electrostatic
        } else {
            PhysicsMode::FullTwoFluid
        }
    }

    pub fn solves_apar(self) -> bool {
        self == PhysicsMode::FullTwoFluid
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldId {
    Rho,
    Ni,
    Ajpar,
    Phi,
    Apar,
    Jpar,
}

impl FieldId {
    fn slot(self) -> usize {
        match self {
            FieldId::Rho => 0,
            FieldId::Ni => 1,
            FieldId::Ajpar => 2,
            FieldId::Phi => 3,
            FieldId::Apar => 4,
            FieldId::Jpar => 5,
        }
    }
}

/// Fields registered for one collective exchange.
#[derive(Debug, Clone, Default)]
pub struct FieldGroup {
    ids: Vec<FieldId>,
}

impl FieldGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: FieldId) {
        if !self.ids.contains(&id) {
            self.ids.push(id);
        }
    }

    pub fn ids(&self) -> &[FieldId] {
        &self.ids
    }

    pub fn contains(&self, id: FieldId) -> bool {
        self.ids.contains(&id)
    }

    /// One exchange of every registered field of `state`.
    pub fn run<C: Communicator>(&self, comm: &mut C, state: &mut SimState) -> DriftResult<()> {
        comm.exchange(&mut state.select_mut(&self.ids))
    }
}

/// Evolving, derived and right-hand-side fields of one partition.
#[derive(Debug, Clone)]
pub struct SimState {
    pub rho: Field3D,
    pub ni: Field3D,
    pub ajpar: Field3D,

    pub phi: Field3D,
    pub apar: Field3D,
    pub jpar: Field3D,
    pub ve: Field3D,
    pub nu: Field2D,
    pub mu_i: Field2D,

    pub f_rho: Field3D,
    pub f_ni: Field3D,
    pub f_ajpar: Field3D,
}

impl SimState {
    pub fn new(mesh: &Mesh) -> Self {
        SimState {
            rho: mesh.zeros_3d(),
            ni: mesh.zeros_3d(),
            ajpar: mesh.zeros_3d(),
            phi: mesh.zeros_3d(),
            apar: mesh.zeros_3d(),
            jpar: mesh.zeros_3d(),
            ve: mesh.zeros_3d(),
            nu: mesh.zeros_2d(),
            mu_i: mesh.zeros_2d(),
            f_rho: mesh.zeros_3d(),
            f_ni: mesh.zeros_3d(),
            f_ajpar: mesh.zeros_3d(),
        }
    }

    pub fn field(&self, id: FieldId) -> &Field3D {
        match id {
            FieldId::Rho => &self.rho,
            FieldId::Ni => &self.ni,
            FieldId::Ajpar => &self.ajpar,
            FieldId::Phi => &self.phi,
            FieldId::Apar => &self.apar,
            FieldId::Jpar => &self.jpar,
        }
    }

    pub fn field_mut(&mut self, id: FieldId) -> &mut Field3D {
        match id {
            FieldId::Rho => &mut self.rho,
            FieldId::Ni => &mut self.ni,
            FieldId::Ajpar => &mut self.ajpar,
            FieldId::Phi => &mut self.phi,
            FieldId::Apar => &mut self.apar,
            FieldId::Jpar => &mut self.jpar,
        }
    }

    /// Time derivative paired with an evolving field.
    pub fn rhs(&self, id: FieldId) -> Option<&Field3D> {
        match id {
            FieldId::Rho => Some(&self.f_rho),
            FieldId::Ni => Some(&self.f_ni),
            FieldId::Ajpar => Some(&self.f_ajpar),
            _ => None,
        }
    }

    /// Disjoint mutable borrows of the requested fields, in request order.
    /// Repeated ids are returned once.
    pub fn select_mut(&mut self, ids: &[FieldId]) -> Vec<&mut Field3D> {
        let SimState {
            rho,
            ni,
            ajpar,
            phi,
            apar,
            jpar,
            ..
        } = self;
        let mut slots = [Some(rho), Some(ni), Some(ajpar), Some(phi), Some(apar), Some(jpar)];
        ids.iter().filter_map(|id| slots[id.slot()].take()).collect()
    }
}

/// An evolving variable as seen by the time integrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvolvingVariable {
    pub name: &'static str,
    pub id: FieldId,
}

pub struct TwoFluidModel<C, L = FftLaplace> {
    mode: PhysicsMode,
    evolve_ajpar: bool,
    apar_in_epar: bool,
    mesh: Mesh,
    metric: Metric,
    norm: Normalization,
    eq: Equilibrium,
    elliptic: EllipticSolves<L>,
    boundary: BoundaryPolicy,
    comm: C,
    comms: FieldGroup,
    com_jp: FieldGroup,
    outputs: OutputRegistry,
    state: SimState,
}

impl<C: Communicator> TwoFluidModel<C, FftLaplace> {
    /// Model with the direct FFT Laplacian inversion. Collective over all
    /// partitions linked to `comm`.
    pub fn new(config: &RunConfig, grid: &GridFile, comm: C) -> DriftResult<Self> {
        Self::with_solver(config, grid, comm, |mesh, metric| FftLaplace::new(mesh, metric))
    }
}

impl<C: Communicator, L: LaplaceSolver> TwoFluidModel<C, L> {
    pub fn with_solver<F>(config: &RunConfig, grid: &GridFile, mut comm: C, make_solver: F) -> DriftResult<Self>
    where
        F: FnOnce(&Mesh, &Metric) -> L,
    {
        config.validate()?;
        grid.validate()?;
        info!("Solving 6-variable 2-fluid equations");

        let opts = &config.mesh;
        let slice = comm.slice().clone();
        if slice.global_ny != grid.ny {
            return Err(DriftError::ConfigError(format!(
                "Partitioning covers ny = {}, grid has ny = {}",
                slice.global_ny, grid.ny
            )));
        }
        if slice.halo != opts.myg {
            return Err(DriftError::ConfigError(format!(
                "Communicator halo {} differs from MYG = {}",
                slice.halo, opts.myg
            )));
        }
        if slice.local_ny < opts.myg {
            return Err(DriftError::ConfigError(format!(
                "Partition {} owns {} poloidal rows, fewer than MYG = {}",
                slice.rank, slice.local_ny, opts.myg
            )));
        }
        if grid.nx <= 2 * opts.mxg {
            return Err(DriftError::ConfigError(format!(
                "nx = {} leaves no radial core points with MXG = {}",
                grid.nx, opts.mxg
            )));
        }

        let mut mesh = Mesh::new(grid.nx, slice.local_ny, opts.nz, opts.mxg, opts.myg, opts.zperiod);
        mesh.y_offset = slice.y_start;
        mesh.ny_global = slice.global_ny;

        let norm = Normalization::from_grid(grid, &config.two_fluid)?;
        let metric = build_metric(grid, &mesh, opts, config.two_fluid.shear_factor, &norm, &mut comm)?;
        let eq = Equilibrium::load(grid, &mesh, &norm, opts.y_periodic)?;
        if opts.y_periodic && opts.twist_shift {
            comm.set_twist_shift(&metric.shift_angle, mesh.nz, mesh.zlength());
        }

        let mode = PhysicsMode::select(&config.two_fluid);
        let evolve_ajpar = config.evolve_ajpar();
        info!("Physics mode: {mode:?}");
        if evolve_ajpar {
            info!("=> Evolving Ajpar");
        } else {
            info!("=> Not evolving Ajpar");
        }

        let potential = PotentialSolve::new(config.two_fluid.phi_flags)?;
        let vector_potential = if mode.solves_apar() {
            Some(VectorPotentialSolve::new(config.two_fluid.apar_flags, &norm, &eq.ni0)?)
        } else {
            None
        };
        let elliptic = EllipticSolves::new(make_solver(&mesh, &metric), potential, vector_potential);

        let mut comms = FieldGroup::new();
        comms.add(FieldId::Rho);
        comms.add(FieldId::Ni);
        if evolve_ajpar {
            comms.add(FieldId::Ajpar);
        }
        comms.add(FieldId::Phi);
        comms.add(FieldId::Apar);
        let mut com_jp = FieldGroup::new();
        com_jp.add(FieldId::Jpar);

        let mut outputs = OutputRegistry::new();
        outputs.add("phi", OutputKind::Field3D, true);
        outputs.add("Apar", OutputKind::Field3D, true);
        outputs.add("jpar", OutputKind::Field3D, true);
        if mode == PhysicsMode::ZeroElectronMass {
            outputs.add("Ajpar", OutputKind::Field3D, true);
        }
        for name in ["Ni0", "Te0", "Ti0"] {
            outputs.add(name, OutputKind::Field2D, false);
        }
        for name in ["Te_x", "Ti_x", "Ni_x", "rho_s", "wci", "Zeff", "AA"] {
            outputs.add(name, OutputKind::Scalar, false);
        }

        let mut state = SimState::new(&mesh);
        let coeffs = nonlinear_coefficients(&eq, &norm);
        state.nu = coeffs.nu;
        state.mu_i = coeffs.mu_i;

        Ok(TwoFluidModel {
            mode,
            evolve_ajpar,
            apar_in_epar: config.two_fluid.apar_in_epar,
            boundary: BoundaryPolicy::new(&config.boundary, mesh.mxg),
            mesh,
            metric,
            norm,
            eq,
            elliptic,
            comm,
            comms,
            com_jp,
            outputs,
            state,
        })
    }

    pub fn mode(&self) -> PhysicsMode {
        self.mode
    }

    pub fn evolves_ajpar(&self) -> bool {
        self.evolve_ajpar
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn metric(&self) -> &Metric {
        &self.metric
    }

    pub fn normalization(&self) -> &Normalization {
        &self.norm
    }

    pub fn equilibrium(&self) -> &Equilibrium {
        &self.eq
    }

    pub fn state(&self) -> &SimState {
        &self.state
    }

    /// The integrator writes evolving fields here between evaluations.
    pub fn state_mut(&mut self) -> &mut SimState {
        &mut self.state
    }

    pub fn comm(&self) -> &C {
        &self.comm
    }

    /// Cached coefficient of the vector-potential solve, if it is solved.
    pub fn apar_coefficient(&self) -> Option<&Field2D> {
        self.elliptic.vector_potential().map(|vp| vp.coefficient())
    }

    pub fn exchange_group(&self) -> &FieldGroup {
        &self.comms
    }

    pub fn outputs(&self) -> &OutputRegistry {
        &self.outputs
    }

    /// Variables the integrator advances, each paired with `state().rhs(id)`.
    pub fn variables(&self) -> Vec<EvolvingVariable> {
        let mut vars = vec![
            EvolvingVariable {
                name: "rho",
                id: FieldId::Rho,
            },
            EvolvingVariable {
                name: "Ni",
                id: FieldId::Ni,
            },
        ];
        if self.evolve_ajpar {
            vars.push(EvolvingVariable {
                name: "Ajpar",
                id: FieldId::Ajpar,
            });
        }
        vars
    }

    /// Current value of a registered output.
    pub fn output(&self, name: &str) -> Option<OutputValue<'_>> {
        self.outputs.get(name)?;
        let n = &self.norm;
        let value = match name {
            "phi" => OutputValue::Field3D(&self.state.phi),
            "Apar" => OutputValue::Field3D(&self.state.apar),
            "jpar" => OutputValue::Field3D(&self.state.jpar),
            "Ajpar" => OutputValue::Field3D(&self.state.ajpar),
            "Ni0" => OutputValue::Field2D(&self.eq.ni0),
            "Te0" => OutputValue::Field2D(&self.eq.te0),
            "Ti0" => OutputValue::Field2D(&self.eq.ti0),
            "Te_x" => OutputValue::Scalar(n.te_x),
            "Ti_x" => OutputValue::Scalar(n.ti_x),
            "Ni_x" => OutputValue::Scalar(n.ni_x),
            "rho_s" => OutputValue::Scalar(n.rho_s),
            "wci" => OutputValue::Scalar(n.wci),
            "Zeff" => OutputValue::Scalar(n.zeff),
            "AA" => OutputValue::Scalar(n.aa),
            _ => return None,
        };
        Some(value)
    }

    /// Right-hand sides of all evolving variables at time `t`.
    ///
    /// Collective: every partition must call this once per step, and a
    /// failure on any partition makes the call fail on all of them. On error
    /// the derived fields and right-hand sides keep their previous values;
    /// only guard rows of the evolving fields may have been refreshed.
    pub fn evaluate(&mut self, t: f64) -> DriftResult<()> {
        let started = Instant::now();

        let solved = self
            .elliptic
            .solve(&self.state.rho, &self.eq.ni0, &self.state.ajpar);
        let (phi, apar) = match solved {
            Ok(fields) => fields,
            Err(e) => {
                self.comm.abandon_exchange(&e.to_string());
                return Err(e);
            }
        };
        let apar = apar.unwrap_or_else(|| self.mesh.zeros_3d());
        let solve_time = started.elapsed();

        let prev_phi = std::mem::replace(&mut self.state.phi, phi);
        let prev_apar = std::mem::replace(&mut self.state.apar, apar);
        if let Err(e) = self.exchange_and_close() {
            self.state.phi = prev_phi;
            self.state.apar = prev_apar;
            return Err(e);
        }

        let st = &mut self.state;
        st.f_ni = density_rhs(&st.phi, &self.eq.ni0, &self.mesh, &self.metric);
        st.f_rho = vorticity_rhs(&st.jpar, &self.metric);
        if self.evolve_ajpar {
            st.f_ajpar = momentum_rhs(&st.phi, &st.ni, &st.jpar, &self.eq, &st.nu, self.norm.fmei, &self.metric);
        } else {
            st.f_ajpar.fill(0.0);
        }
        for f in [&mut st.f_rho, &mut st.f_ni, &mut st.f_ajpar] {
            self.boundary.apply(f);
        }

        debug!(
            "t = {t:.6e}: elliptic {:.3} ms, total {:.3} ms",
            solve_time.as_secs_f64() * 1e3,
            started.elapsed().as_secs_f64() * 1e3
        );
        Ok(())
    }

    fn exchange_and_close(&mut self) -> DriftResult<()> {
        self.comms.run(&mut self.comm, &mut self.state)?;

        let coeffs = nonlinear_coefficients(&self.eq, &self.norm);
        self.state.nu = coeffs.nu;
        self.state.mu_i = coeffs.mu_i;

        match self.mode {
            PhysicsMode::ZeroElectronMass => self.close_inertialess(),
            PhysicsMode::Electrostatic | PhysicsMode::FullTwoFluid => {
                self.close_evolved();
                Ok(())
            }
        }
    }

    /// Leaves `jpar` untouched when its exchange fails.
    fn close_inertialess(&mut self) -> DriftResult<()> {
        let st = &mut self.state;
        let mut jpar = inertialess_current(&st.ni, &st.phi, &self.eq, &st.nu, self.norm.fmei, &self.metric);
        self.boundary.apply(&mut jpar);
        let prev_jpar = std::mem::replace(&mut st.jpar, jpar);
        if let Err(e) = self.com_jp.run(&mut self.comm, st) {
            st.jpar = prev_jpar;
            return Err(e);
        }

        st.ve = velocity_from_current(&st.jpar, &self.eq.ni0);
        st.ajpar.assign(&st.ve);
        Ok(())
    }

    fn close_evolved(&mut self) {
        let st = &mut self.state;
        let apar = if self.apar_in_epar { Some(&st.apar) } else { None };
        let (ve, jpar) = evolved_closure(&st.ajpar, apar, &self.eq.ni0);
        st.ve = ve;
        st.jpar = jpar;
    }
}
