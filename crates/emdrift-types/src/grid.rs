// ─────────────────────────────────────────────────────────────────────
// SCPN EM-Drift — Grid File
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Keyed access to a grid description.
//!
//! The grid stores global 2-D quantities on the core poloidal rows only
//! (`[nx][ny]`, radial guard cells included) plus named scalars. Partitions
//! extract their local slab with poloidal guard rows attached.

use crate::error::{DriftError, DriftResult};
use crate::state::{Field2D, Mesh};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GridFile {
    pub nx: usize,
    pub ny: usize,
    #[serde(default)]
    pub fields: HashMap<String, Vec<Vec<f64>>>,
    #[serde(default)]
    pub scalars: HashMap<String, f64>,
}

impl GridFile {
    pub fn new(nx: usize, ny: usize) -> Self {
        GridFile {
            nx,
            ny,
            fields: HashMap::new(),
            scalars: HashMap::new(),
        }
    }

    pub fn from_file(path: &str) -> DriftResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let grid: Self = serde_json::from_str(&contents)?;
        grid.validate()?;
        Ok(grid)
    }

    pub fn validate(&self) -> DriftResult<()> {
        if self.nx < 3 || self.ny < 1 {
            return Err(DriftError::ConfigError(format!(
                "Grid too small: nx={}, ny={}",
                self.nx, self.ny
            )));
        }
        for (name, rows) in &self.fields {
            if rows.len() != self.nx || rows.iter().any(|r| r.len() != self.ny) {
                return Err(DriftError::ConfigError(format!(
                    "Grid field '{name}' is not {}x{}",
                    self.nx, self.ny
                )));
            }
        }
        Ok(())
    }

    pub fn insert_2d(&mut self, name: &str, values: &Array2<f64>) {
        let rows = values.outer_iter().map(|r| r.to_vec()).collect();
        self.fields.insert(name.to_string(), rows);
    }

    pub fn insert_scalar(&mut self, name: &str, value: f64) {
        self.scalars.insert(name.to_string(), value);
    }

    pub fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name) || self.scalars.contains_key(name)
    }

    /// Global [nx, ny] array, if present.
    pub fn get_2d(&self, name: &str) -> Option<Array2<f64>> {
        let rows = self.fields.get(name)?;
        Some(Array2::from_shape_fn((self.nx, self.ny), |(i, j)| rows[i][j]))
    }

    /// Global array, zero-filled when absent.
    pub fn get_2d_or_zero(&self, name: &str) -> Array2<f64> {
        match self.get_2d(name) {
            Some(f) => f,
            None => {
                log::info!("Grid variable '{name}' not found, setting to zero");
                Array2::zeros((self.nx, self.ny))
            }
        }
    }

    pub fn require_2d(&self, name: &str) -> DriftResult<Array2<f64>> {
        self.get_2d(name).ok_or_else(|| {
            DriftError::ConfigError(format!("Required grid variable '{name}' missing"))
        })
    }

    pub fn get_scalar(&self, name: &str) -> Option<f64> {
        self.scalars.get(name).copied()
    }

    pub fn require_scalar(&self, name: &str) -> DriftResult<f64> {
        self.get_scalar(name).ok_or_else(|| {
            DriftError::ConfigError(format!("Required grid scalar '{name}' missing"))
        })
    }
}

/// Cut the local slab of a global [nx, ny_global] array out for `mesh`,
/// attaching `myg` guard rows on each side. Guard rows beyond the global
/// ends wrap when `y_periodic`, otherwise they repeat the nearest core row.
pub fn local_slab(global: &Array2<f64>, mesh: &Mesh, y_periodic: bool) -> DriftResult<Field2D> {
    let (gnx, gny) = global.dim();
    if gnx != mesh.nx || gny != mesh.ny_global {
        return Err(DriftError::PhysicsViolation(format!(
            "Global field is {gnx}x{gny}, mesh expects {}x{}",
            mesh.nx, mesh.ny_global
        )));
    }
    let mut out = mesh.zeros_2d();
    for jl in 0..mesh.local_ny() {
        let jg = mesh.y_offset as isize + jl as isize - mesh.myg as isize;
        let src = if y_periodic {
            jg.rem_euclid(gny as isize) as usize
        } else {
            jg.clamp(0, gny as isize - 1) as usize
        };
        out.column_mut(jl).assign(&global.column(src));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(nx: usize, ny: usize) -> Array2<f64> {
        Array2::from_shape_fn((nx, ny), |(i, j)| (100 * i + j) as f64)
    }

    #[test]
    fn test_missing_optional_is_zero_filled() {
        let grid = GridFile::new(4, 3);
        let f = grid.get_2d_or_zero("Ni0");
        assert_eq!(f.dim(), (4, 3));
        assert!(f.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_missing_required_is_config_error() {
        let grid = GridFile::new(4, 3);
        assert!(matches!(
            grid.require_scalar("Te_x"),
            Err(DriftError::ConfigError(_))
        ));
        assert!(matches!(
            grid.require_2d("Rxy"),
            Err(DriftError::ConfigError(_))
        ));
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut grid = GridFile::new(4, 3);
        grid.insert_2d("Rxy", &ramp(4, 3));
        grid.insert_scalar("bmag", 1.5);
        assert!(grid.has("Rxy"));
        assert!(grid.has("bmag"));
        assert_eq!(grid.require_2d("Rxy").unwrap()[[2, 1]], 201.0);
        assert_eq!(grid.require_scalar("bmag").unwrap(), 1.5);
        assert!(grid.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_ragged_field() {
        let mut grid = GridFile::new(4, 3);
        grid.fields.insert("bad".into(), vec![vec![0.0; 3]; 3]);
        assert!(grid.validate().is_err());
    }

    #[test]
    fn test_json_roundtrip_keeps_keys() {
        let mut grid = GridFile::new(3, 2);
        grid.insert_2d("hthe", &ramp(3, 2));
        grid.insert_scalar("Te_x", 10.0);
        let text = serde_json::to_string(&grid).unwrap();
        let back: GridFile = serde_json::from_str(&text).unwrap();
        assert_eq!(back.get_2d("hthe"), grid.get_2d("hthe"));
        assert_eq!(back.get_scalar("Te_x"), Some(10.0));
    }

    #[test]
    fn test_local_slab_guards() {
        let global = ramp(4, 6);
        let mut mesh = Mesh::new(4, 3, 4, 1, 1, 1.0);
        mesh.ny_global = 6;
        mesh.y_offset = 0;

        let clamped = local_slab(&global, &mesh, false).unwrap();
        assert_eq!(clamped.dim(), (4, 5));
        assert_eq!(clamped[[1, 0]], global[[1, 0]]);
        assert_eq!(clamped[[1, 1]], global[[1, 0]]);
        assert_eq!(clamped[[1, 4]], global[[1, 3]]);

        let wrapped = local_slab(&global, &mesh, true).unwrap();
        assert_eq!(wrapped[[1, 0]], global[[1, 5]]);

        mesh.y_offset = 3;
        let upper = local_slab(&global, &mesh, true).unwrap();
        assert_eq!(upper[[2, 0]], global[[2, 2]]);
        assert_eq!(upper[[2, 4]], global[[2, 0]]);
    }
}
