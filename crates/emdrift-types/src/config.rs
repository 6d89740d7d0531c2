// ─────────────────────────────────────────────────────────────────────
// SCPN EM-Drift — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::error::{DriftError, DriftResult};
use serde::{Deserialize, Serialize};

/// Top-level run configuration.
/// Every key is optional; missing keys take the typed defaults below.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(rename = "2fluid", default)]
    pub two_fluid: TwoFluidOptions,
    /// Per-variable options for the parallel electron momentum.
    #[serde(rename = "Ajpar", default)]
    pub ajpar: VariableOptions,
    #[serde(default)]
    pub mesh: MeshOptions,
    #[serde(default)]
    pub boundary: BoundaryOptions,
}

/// Physics switches and plasma composition, section `2fluid`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwoFluidOptions {
    /// Ion atomic mass number.
    #[serde(rename = "AA", default = "default_aa")]
    pub aa: f64,
    /// Ion charge number.
    #[serde(rename = "ZZ", default = "default_one")]
    pub zz: f64,
    /// Electrostatic operation (no Apar).
    #[serde(default)]
    pub estatic: bool,
    /// Neglect electron inertia; Ajpar follows from Ohm's law.
    #[serde(rename = "ZeroElMass", default)]
    pub zero_el_mass: bool,
    /// Include Apar in E_parallel.
    #[serde(rename = "AparInEpar", default = "default_true")]
    pub apar_in_epar: bool,
    #[serde(rename = "Zeff", default = "default_one")]
    pub zeff: f64,
    /// Perpendicular viscosity override; zero means use the Braginskii value.
    #[serde(default)]
    pub nu_perp: f64,
    #[serde(rename = "ShearFactor", default = "default_one")]
    pub shear_factor: f64,
    /// Collisionality multiplier.
    #[serde(default = "default_one")]
    pub nu_factor: f64,
    #[serde(default)]
    pub phi_flags: u32,
    #[serde(default)]
    pub apar_flags: u32,
}

fn default_aa() -> f64 {
    2.0
}
fn default_one() -> f64 {
    1.0
}
fn default_true() -> bool {
    true
}

impl Default for TwoFluidOptions {
    fn default() -> Self {
        TwoFluidOptions {
            aa: default_aa(),
            zz: default_one(),
            estatic: false,
            zero_el_mass: false,
            apar_in_epar: default_true(),
            zeff: default_one(),
            nu_perp: 0.0,
            shear_factor: default_one(),
            nu_factor: default_one(),
            phi_flags: 0,
            apar_flags: 0,
        }
    }
}

/// Qualified per-variable options, e.g. `Ajpar:evolve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableOptions {
    #[serde(default = "default_true")]
    pub evolve: bool,
}

impl Default for VariableOptions {
    fn default() -> Self {
        VariableOptions { evolve: true }
    }
}

/// Mesh and decomposition options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshOptions {
    /// Radial guard cells on each side.
    #[serde(rename = "MXG", default = "default_guards")]
    pub mxg: usize,
    /// Poloidal guard cells on each side.
    #[serde(rename = "MYG", default = "default_guards")]
    pub myg: usize,
    /// Toroidal points per partition.
    #[serde(default = "default_nz")]
    pub nz: usize,
    /// Fraction of the torus simulated is 1/zperiod.
    #[serde(default = "default_one")]
    pub zperiod: f64,
    /// Radial derivatives taken in shifted coordinates.
    #[serde(rename = "ShiftXderivs", default)]
    pub shift_x_derivs: bool,
    /// Poloidal direction closes on itself (core flux surfaces).
    #[serde(default)]
    pub y_periodic: bool,
    /// Apply the twist-shift angle at the poloidal seam.
    #[serde(rename = "TwistShift", default)]
    pub twist_shift: bool,
    /// Global poloidal index of the surface whose zShift is the twist-shift angle.
    #[serde(default)]
    pub jyseps2_2: usize,
    /// Number of poloidal partitions.
    #[serde(rename = "NYPE", default = "default_nype")]
    pub nype: usize,
}

fn default_guards() -> usize {
    2
}
fn default_nz() -> usize {
    16
}
fn default_nype() -> usize {
    1
}

impl Default for MeshOptions {
    fn default() -> Self {
        MeshOptions {
            mxg: default_guards(),
            myg: default_guards(),
            nz: default_nz(),
            zperiod: default_one(),
            shift_x_derivs: false,
            y_periodic: false,
            twist_shift: false,
            jyseps2_2: 0,
            nype: default_nype(),
        }
    }
}

/// Radial boundary treatment at one edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RadialBoundary {
    /// Zero radial gradient.
    #[default]
    Flat,
    /// Guard cells set to zero.
    Zero,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BoundaryOptions {
    /// Core/private-flux edge.
    #[serde(default)]
    pub inner: RadialBoundary,
    /// Scrape-off-layer edge.
    #[serde(default)]
    pub outer: RadialBoundary,
}

impl RunConfig {
    /// Load from a JSON options file.
    pub fn from_file(path: &str) -> DriftResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(text: &str) -> DriftResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DriftResult<()> {
        let tf = &self.two_fluid;
        if !tf.aa.is_finite() || tf.aa <= 0.0 {
            return Err(DriftError::ConfigError(format!(
                "AA must be positive, got {}",
                tf.aa
            )));
        }
        if !tf.zz.is_finite() || tf.zz <= 0.0 {
            return Err(DriftError::ConfigError(format!(
                "ZZ must be positive, got {}",
                tf.zz
            )));
        }
        if !tf.zeff.is_finite() || tf.zeff <= 0.0 {
            return Err(DriftError::ConfigError(format!(
                "Zeff must be positive, got {}",
                tf.zeff
            )));
        }
        let mesh = &self.mesh;
        if mesh.mxg == 0 || mesh.myg == 0 {
            return Err(DriftError::ConfigError(
                "MXG and MYG must be >= 1".to_string(),
            ));
        }
        if mesh.nz < 2 {
            return Err(DriftError::ConfigError(format!(
                "nz must be >= 2, got {}",
                mesh.nz
            )));
        }
        if !mesh.zperiod.is_finite() || mesh.zperiod <= 0.0 {
            return Err(DriftError::ConfigError(format!(
                "zperiod must be positive, got {}",
                mesh.zperiod
            )));
        }
        if mesh.nype == 0 {
            return Err(DriftError::ConfigError("NYPE must be >= 1".to_string()));
        }
        Ok(())
    }

    /// Whether the parallel electron momentum is time-evolved.
    /// Ohm's law replaces it when electron inertia is neglected.
    pub fn evolve_ajpar(&self) -> bool {
        self.ajpar.evolve && !self.two_fluid.zero_el_mass
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_takes_defaults() {
        let cfg = RunConfig::from_json_str("{}").expect("empty config is valid");
        assert_eq!(cfg.two_fluid.aa, 2.0);
        assert_eq!(cfg.two_fluid.zz, 1.0);
        assert!(!cfg.two_fluid.estatic);
        assert!(!cfg.two_fluid.zero_el_mass);
        assert!(cfg.two_fluid.apar_in_epar);
        assert_eq!(cfg.two_fluid.nu_perp, 0.0);
        assert!(cfg.ajpar.evolve);
        assert_eq!(cfg.mesh.mxg, 2);
        assert_eq!(cfg.mesh.nype, 1);
        assert_eq!(cfg.boundary.inner, RadialBoundary::Flat);
        assert_eq!(cfg.boundary.outer, RadialBoundary::Flat);
    }

    #[test]
    fn test_section_keys_use_reference_names() {
        let text = r#"{
            "2fluid": { "AA": 1.0, "ZeroElMass": true, "ShearFactor": 0.5, "phi_flags": 3 },
            "Ajpar": { "evolve": true },
            "mesh": { "MXG": 1, "ShiftXderivs": true, "NYPE": 2 },
            "boundary": { "outer": "zero" }
        }"#;
        let cfg = RunConfig::from_json_str(text).expect("valid config");
        assert_eq!(cfg.two_fluid.aa, 1.0);
        assert!(cfg.two_fluid.zero_el_mass);
        assert_eq!(cfg.two_fluid.shear_factor, 0.5);
        assert_eq!(cfg.two_fluid.phi_flags, 3);
        assert_eq!(cfg.mesh.mxg, 1);
        assert!(cfg.mesh.shift_x_derivs);
        assert_eq!(cfg.mesh.nype, 2);
        assert_eq!(cfg.boundary.inner, RadialBoundary::Flat);
        assert_eq!(cfg.boundary.outer, RadialBoundary::Zero);
    }

    #[test]
    fn test_zero_el_mass_disables_ajpar_evolution() {
        let mut cfg = RunConfig::default();
        assert!(cfg.evolve_ajpar());
        cfg.two_fluid.zero_el_mass = true;
        assert!(!cfg.evolve_ajpar());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(RunConfig::from_json_str(r#"{"2fluid": {"AA": -1.0}}"#).is_err());
        assert!(RunConfig::from_json_str(r#"{"mesh": {"MYG": 0}}"#).is_err());
        assert!(RunConfig::from_json_str(r#"{"mesh": {"NYPE": 0}}"#).is_err());
        assert!(RunConfig::from_json_str(r#"{"mesh": {"zperiod": 0.0}}"#).is_err());
        assert!(RunConfig::from_json_str("not json").is_err());
    }
}
