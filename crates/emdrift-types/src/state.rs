// ─────────────────────────────────────────────────────────────────────
// SCPN EM-Drift — State
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use ndarray::{Array2, Array3, Axis};

/// Axisymmetric quantity on the (x, y) plane, shape [nx, ny + 2*myg].
pub type Field2D = Array2<f64>;

/// Full quantity, shape [nx, ny + 2*myg, nz]. z is periodic and has no guards.
pub type Field3D = Array3<f64>;

/// Local extent of one poloidal partition of a field-aligned grid.
///
/// x is radial (not decomposed, guard cells included in `nx`),
/// y is poloidal (decomposed, `myg` guard rows on each side),
/// z is toroidal (periodic).
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// Radial points including `2*mxg` guard cells.
    pub nx: usize,
    /// Core poloidal points owned by this partition.
    pub ny: usize,
    /// Toroidal points.
    pub nz: usize,
    pub mxg: usize,
    pub myg: usize,
    /// Toroidal grid spacing [rad].
    pub dz: f64,
    /// Global poloidal index of the first owned core row.
    pub y_offset: usize,
    /// Core poloidal points of the whole domain.
    pub ny_global: usize,
}

impl Mesh {
    pub fn new(nx: usize, ny: usize, nz: usize, mxg: usize, myg: usize, zperiod: f64) -> Self {
        Mesh {
            nx,
            ny,
            nz,
            mxg,
            myg,
            dz: 2.0 * std::f64::consts::PI / zperiod / nz as f64,
            y_offset: 0,
            ny_global: ny,
        }
    }

    /// Poloidal rows including guards.
    pub fn local_ny(&self) -> usize {
        self.ny + 2 * self.myg
    }

    pub fn xstart(&self) -> usize {
        self.mxg
    }

    /// One past the last radial core point.
    pub fn xend(&self) -> usize {
        self.nx - self.mxg
    }

    pub fn ystart(&self) -> usize {
        self.myg
    }

    /// One past the last poloidal core row.
    pub fn yend(&self) -> usize {
        self.myg + self.ny
    }

    /// Toroidal extent of the simulated wedge.
    pub fn zlength(&self) -> f64 {
        self.dz * self.nz as f64
    }

    pub fn zeros_2d(&self) -> Field2D {
        Array2::zeros((self.nx, self.local_ny()))
    }

    pub fn zeros_3d(&self) -> Field3D {
        Array3::zeros((self.nx, self.local_ny(), self.nz))
    }

    /// Extend a 2-D field uniformly along z.
    pub fn broadcast_z(&self, f: &Field2D) -> Field3D {
        let mut out = self.zeros_3d();
        for (mut plane, value) in out
            .lanes_mut(Axis(2))
            .into_iter()
            .zip(f.iter())
        {
            plane.fill(*value);
        }
        out
    }
}

/// Field-aligned metric tensor and normalised geometry of one partition.
///
/// All 2-D arrays have the shape of [`Mesh::zeros_2d`].
#[derive(Debug, Clone)]
pub struct Metric {
    // Contravariant components.
    pub g11: Field2D,
    pub g22: Field2D,
    pub g33: Field2D,
    pub g12: Field2D,
    pub g13: Field2D,
    pub g23: Field2D,
    // Covariant components.
    pub g_11: Field2D,
    pub g_22: Field2D,
    pub g_33: Field2D,
    pub g_12: Field2D,
    pub g_13: Field2D,
    pub g_23: Field2D,
    /// Jacobian.
    pub j: Field2D,
    /// Normalised |B|, B_pol and B_tor.
    pub bxy: Field2D,
    pub bpxy: Field2D,
    pub btxy: Field2D,
    /// Normalised major radius and poloidal arc-length factor.
    pub rxy: Field2D,
    pub hthe: Field2D,
    /// Normalised integrated shear.
    pub i_shear: Field2D,
    /// Normalised radial and poloidal grid spacing.
    pub dx: Field2D,
    pub dy: Field2D,
    /// Toroidal shift of field lines, zShift.
    pub z_shift: Field2D,
    /// Twist-shift angle per radial point, identical on every partition.
    pub shift_angle: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_extents() {
        let mesh = Mesh::new(12, 8, 16, 2, 1, 1.0);
        assert_eq!(mesh.local_ny(), 10);
        assert_eq!(mesh.xstart(), 2);
        assert_eq!(mesh.xend(), 10);
        assert_eq!(mesh.ystart(), 1);
        assert_eq!(mesh.yend(), 9);
        assert_eq!(mesh.zeros_2d().dim(), (12, 10));
        assert_eq!(mesh.zeros_3d().dim(), (12, 10, 16));
        assert!((mesh.zlength() - 2.0 * std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn test_zperiod_shrinks_wedge() {
        let mesh = Mesh::new(6, 4, 8, 1, 1, 4.0);
        assert!((mesh.zlength() - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_broadcast_z_is_uniform() {
        let mesh = Mesh::new(5, 3, 4, 1, 1, 1.0);
        let f = Array2::from_shape_fn((5, 5), |(i, j)| (i * 10 + j) as f64);
        let g = mesh.broadcast_z(&f);
        for ((i, j, _), v) in g.indexed_iter() {
            assert_eq!(*v, f[[i, j]]);
        }
    }
}
