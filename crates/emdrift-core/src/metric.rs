// ─────────────────────────────────────────────────────────────────────
// SCPN EM-Drift — Metric Builder
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Field-aligned metric tensor from raw grid geometry.
//!
//! Geometry is first normalised to `rho_s` and the reference field, then
//! the contravariant and covariant components follow from the
//! Clebsch-type coordinates (x = psi, y = theta, z = phi - zShift):
//!
//! ```text
//! g11 = (R Bp)^2        g22 = 1/hthe^2      g33 = I^2 g11 + B^2/g11
//! g12 = 0               g13 = -I g11        g23 = -Bt/(hthe Bp R)
//! J   = hthe/Bp
//! ```

use crate::comms::Communicator;
use crate::normalize::Normalization;
use emdrift_types::config::MeshOptions;
use emdrift_types::error::{DriftError, DriftResult};
use emdrift_types::grid::{local_slab, GridFile};
use emdrift_types::state::{Field2D, Mesh, Metric};
use log::{debug, info, warn};
use ndarray::Zip;

/// Geometry inputs after slab extraction and normalisation.
#[derive(Debug, Clone)]
pub struct NormalizedGeometry {
    pub rxy: Field2D,
    pub bpxy: Field2D,
    pub btxy: Field2D,
    pub bxy: Field2D,
    pub hthe: Field2D,
    pub i_shear: Field2D,
    pub dx: Field2D,
    pub dy: Field2D,
    pub z_shift: Field2D,
}

impl NormalizedGeometry {
    pub fn load(
        grid: &GridFile,
        mesh: &Mesh,
        opts: &MeshOptions,
        shear_factor: f64,
        norm: &Normalization,
    ) -> DriftResult<Self> {
        let periodic = opts.y_periodic;
        let slab = |f: ndarray::Array2<f64>| local_slab(&f, mesh, periodic);

        let rho_s = norm.rho_s;
        let b0 = norm.b_tesla();
        let shear_factor = if opts.shift_x_derivs {
            info!("Radial derivatives in shifted coordinates: integrated shear disabled");
            0.0
        } else {
            shear_factor
        };

        let rxy = slab(grid.require_2d("Rxy")?)? / rho_s;
        let hthe = slab(grid.require_2d("hthe")?)? / rho_s;
        let bpxy = slab(grid.require_2d("Bpxy")?)? / b0;
        let btxy = slab(grid.require_2d("Btxy")?)? / b0;
        let bxy = slab(grid.require_2d("Bxy")?)? / b0;
        let dx = slab(grid.require_2d("dpsi")?)? / (rho_s * rho_s * b0);
        let i_shear = slab(grid.get_2d_or_zero("sinty"))? * (rho_s * rho_s * b0 * shear_factor);
        let z_shift = slab(grid.get_2d_or_zero("qinty"))?;
        let dy = match grid.get_2d("dy") {
            Some(dy) => slab(dy)?,
            None => {
                debug!("Grid has no dy, using uniform 2pi/ny");
                Field2D::from_elem(
                    (mesh.nx, mesh.local_ny()),
                    2.0 * std::f64::consts::PI / mesh.ny_global as f64,
                )
            }
        };

        Ok(NormalizedGeometry {
            rxy,
            bpxy,
            btxy,
            bxy,
            hthe,
            i_shear,
            dx,
            dy,
            z_shift,
        })
    }

    pub fn validate(&self) -> DriftResult<()> {
        for (name, f) in [
            ("Rxy", &self.rxy),
            ("Bpxy", &self.bpxy),
            ("Bxy", &self.bxy),
            ("hthe", &self.hthe),
            ("dy", &self.dy),
        ] {
            if f.iter().any(|v| !v.is_finite() || *v <= 0.0) {
                return Err(DriftError::PhysicsViolation(format!(
                    "Geometry field {name} must be positive everywhere"
                )));
            }
        }
        if self.dx.iter().any(|v| !v.is_finite() || *v == 0.0) {
            return Err(DriftError::PhysicsViolation(
                "Radial spacing dpsi must be finite and non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Contravariant and covariant components from normalised geometry.
pub fn metric_from_geometry(geo: &NormalizedGeometry, nx: usize) -> Metric {
    let r = &geo.rxy;
    let bp = &geo.bpxy;
    let bt = &geo.btxy;
    let b = &geo.bxy;
    let h = &geo.hthe;
    let i = &geo.i_shear;

    let g11 = Zip::from(r).and(bp).map_collect(|&r, &bp| (r * bp).powi(2));
    let g22 = h.mapv(|h| 1.0 / (h * h));
    let g33 = Zip::from(i)
        .and(&g11)
        .and(b)
        .map_collect(|&i, &g11, &b| i * i * g11 + b * b / g11);
    let g12 = Field2D::zeros(r.dim());
    let g13 = Zip::from(i).and(&g11).map_collect(|&i, &g11| -i * g11);
    let g23 = Zip::from(bt)
        .and(h)
        .and(bp)
        .and(r)
        .map_collect(|&bt, &h, &bp, &r| -bt / (h * bp * r));

    let j = Zip::from(h).and(bp).map_collect(|&h, &bp| h / bp);

    let g_11 = Zip::from(&g11)
        .and(i)
        .and(r)
        .map_collect(|&g11, &i, &r| 1.0 / g11 + (i * r).powi(2));
    let g_22 = Zip::from(b)
        .and(h)
        .and(bp)
        .map_collect(|&b, &h, &bp| (b * h / bp).powi(2));
    let g_33 = r.mapv(|r| r * r);
    let g_12 = Zip::from(bt)
        .and(h)
        .and(i)
        .and(r)
        .and(bp)
        .map_collect(|&bt, &h, &i, &r, &bp| bt * h * i * r / bp);
    let g_13 = Zip::from(i).and(r).map_collect(|&i, &r| i * r * r);
    let g_23 = Zip::from(bt)
        .and(h)
        .and(r)
        .and(bp)
        .map_collect(|&bt, &h, &r, &bp| bt * h * r / bp);

    Metric {
        g11,
        g22,
        g33,
        g12,
        g13,
        g23,
        g_11,
        g_22,
        g_33,
        g_12,
        g_13,
        g_23,
        j,
        bxy: geo.bxy.clone(),
        bpxy: geo.bpxy.clone(),
        btxy: geo.btxy.clone(),
        rxy: geo.rxy.clone(),
        hthe: geo.hthe.clone(),
        i_shear: geo.i_shear.clone(),
        dx: geo.dx.clone(),
        dy: geo.dy.clone(),
        z_shift: geo.z_shift.clone(),
        shift_angle: vec![0.0; nx],
    }
}

/// Build the metric of the partition behind `comm`. Collective: every
/// partition must call this, since the twist-shift angle (zShift on the
/// `jyseps2_2` row) is broadcast from the partition owning that row.
pub fn build_metric<C: Communicator>(
    grid: &GridFile,
    mesh: &Mesh,
    opts: &MeshOptions,
    shear_factor: f64,
    norm: &Normalization,
    comm: &mut C,
) -> DriftResult<Metric> {
    let geo = NormalizedGeometry::load(grid, mesh, opts, shear_factor, norm)?;
    geo.validate()?;
    let mut metric = metric_from_geometry(&geo, mesh.nx);

    let mut jsurf = opts.jyseps2_2;
    if jsurf >= mesh.ny_global {
        warn!(
            "jyseps2_2 = {jsurf} outside grid with ny = {}, using last surface",
            mesh.ny_global
        );
        jsurf = mesh.ny_global - 1;
    }
    let owner = owner_of(comm, jsurf);
    if comm.slice().rank == owner {
        let jlocal = jsurf - mesh.y_offset + mesh.myg;
        for (ix, angle) in metric.shift_angle.iter_mut().enumerate() {
            *angle = metric.z_shift[[ix, jlocal]];
        }
    }
    comm.broadcast(&mut metric.shift_angle, owner)?;
    debug!(
        "Twist-shift angle from rank {owner}: [{:e} .. {:e}]",
        metric.shift_angle.first().copied().unwrap_or(0.0),
        metric.shift_angle.last().copied().unwrap_or(0.0)
    );

    if metric.g11.iter().chain(metric.g33.iter()).chain(metric.j.iter()).any(|v| !v.is_finite()) {
        return Err(DriftError::PhysicsViolation(
            "Metric contains non-finite components".to_string(),
        ));
    }
    Ok(metric)
}

/// Rank owning global poloidal row `jglobal`, assuming every partition
/// uses the same even decomposition.
fn owner_of<C: Communicator>(comm: &C, jglobal: usize) -> usize {
    let sl = comm.slice();
    let base = sl.global_ny / sl.nranks;
    let rem = sl.global_ny % sl.nranks;
    let wide = rem * (base + 1);
    if jglobal < wide {
        jglobal / (base + 1)
    } else {
        rem + (jglobal - wide) / base.max(1)
    }
}
