// ─────────────────────────────────────────────────────────────────────
// SCPN EM-Drift — Equilibrium Profiles
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::normalize::Normalization;
use emdrift_types::error::{DriftError, DriftResult};
use emdrift_types::grid::{local_slab, GridFile};
use emdrift_types::state::{Field2D, Mesh};

/// Normalised background density and temperatures of one partition.
#[derive(Debug, Clone)]
pub struct Equilibrium {
    pub ni0: Field2D,
    pub ti0: Field2D,
    pub te0: Field2D,
}

impl Equilibrium {
    /// Load `Ni0`, `Ti0`, `Te0` (zero-filled when absent), cut out the local
    /// slab and normalise. See [`Equilibrium::validate`] for what must hold.
    pub fn load(grid: &GridFile, mesh: &Mesh, norm: &Normalization, y_periodic: bool) -> DriftResult<Self> {
        let ni0 = local_slab(&grid.get_2d_or_zero("Ni0"), mesh, y_periodic)?;
        let ti0 = local_slab(&grid.get_2d_or_zero("Ti0"), mesh, y_periodic)?;
        let te0 = local_slab(&grid.get_2d_or_zero("Te0"), mesh, y_periodic)?;
        let eq = Equilibrium {
            ni0: norm.normalize_density(&ni0),
            ti0: norm.normalize_temperature(&ti0),
            te0: norm.normalize_temperature(&te0),
        };
        eq.validate()?;
        Ok(eq)
    }

    /// `Ni0` and `Te0` appear as divisors and must be strictly positive.
    /// `Ti0` only sets the ion viscosity and may be zero.
    pub fn validate(&self) -> DriftResult<()> {
        for (name, f) in [("Ni0", &self.ni0), ("Te0", &self.te0)] {
            if let Some(bad) = f.iter().find(|v| !v.is_finite() || **v <= 0.0) {
                return Err(DriftError::PhysicsViolation(format!(
                    "Equilibrium profile {name} must be positive everywhere, found {bad}"
                )));
            }
        }
        if let Some(bad) = self.ti0.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(DriftError::PhysicsViolation(format!(
                "Equilibrium profile Ti0 must be non-negative everywhere, found {bad}"
            )));
        }
        if self.ni0.dim() != self.ti0.dim() || self.ni0.dim() != self.te0.dim() {
            return Err(DriftError::PhysicsViolation(
                "Equilibrium profiles have inconsistent shapes".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::ReferenceScales;
    use emdrift_types::config::TwoFluidOptions;
    use ndarray::Array2;

    fn norm() -> Normalization {
        let scales = ReferenceScales {
            te_x: 20.0,
            ti_x: 10.0,
            ni_x: 0.5,
            bmag: 1.0,
        };
        Normalization::compute(&scales, &TwoFluidOptions::default()).expect("valid scales")
    }

    #[test]
    fn test_load_normalises_profiles() {
        let mut grid = GridFile::new(4, 3);
        grid.insert_2d("Ni0", &Array2::from_elem((4, 3), 1.0));
        grid.insert_2d("Ti0", &Array2::from_elem((4, 3), 10.0));
        grid.insert_2d("Te0", &Array2::from_elem((4, 3), 40.0));
        let mesh = Mesh::new(4, 3, 4, 1, 1, 1.0);
        let eq = Equilibrium::load(&grid, &mesh, &norm(), false).expect("positive profiles");
        assert_eq!(eq.ni0.dim(), (4, 5));
        assert!(eq.ni0.iter().all(|v| (v - 2.0).abs() < 1e-12));
        assert!(eq.ti0.iter().all(|v| (v - 0.5).abs() < 1e-12));
        assert!(eq.te0.iter().all(|v| (v - 2.0).abs() < 1e-12));
    }

    #[test]
    fn test_missing_ion_temperature_is_zero_filled() {
        let mut grid = GridFile::new(4, 3);
        grid.insert_2d("Ni0", &Array2::from_elem((4, 3), 1.0));
        grid.insert_2d("Te0", &Array2::from_elem((4, 3), 40.0));
        let mesh = Mesh::new(4, 3, 4, 1, 1, 1.0);
        let eq = Equilibrium::load(&grid, &mesh, &norm(), false).expect("Ti0 is optional");
        assert!(eq.ti0.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_missing_electron_temperature_is_rejected() {
        let mut grid = GridFile::new(4, 3);
        grid.insert_2d("Ni0", &Array2::from_elem((4, 3), 1.0));
        grid.insert_2d("Ti0", &Array2::from_elem((4, 3), 10.0));
        let mesh = Mesh::new(4, 3, 4, 1, 1, 1.0);
        match Equilibrium::load(&grid, &mesh, &norm(), false) {
            Err(DriftError::PhysicsViolation(msg)) => assert!(msg.contains("Te0")),
            other => panic!("expected PhysicsViolation, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_ion_temperature_is_rejected() {
        let mut grid = GridFile::new(4, 3);
        grid.insert_2d("Ni0", &Array2::from_elem((4, 3), 1.0));
        grid.insert_2d("Te0", &Array2::from_elem((4, 3), 40.0));
        grid.insert_2d("Ti0", &Array2::from_elem((4, 3), -1.0));
        let mesh = Mesh::new(4, 3, 4, 1, 1, 1.0);
        assert!(Equilibrium::load(&grid, &mesh, &norm(), false).is_err());
    }
}
