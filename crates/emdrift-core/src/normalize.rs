// ─────────────────────────────────────────────────────────────────────
// SCPN EM-Drift — Parameter Normalizer
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Reference scales and dimensionless Braginskii coefficients.
//!
//! Lengths are normalised to the ion sound gyroradius `rho_s`, times to the
//! ion cyclotron frequency `wci`, densities to `Ni_x` and temperatures to
//! `Te_x`.

use emdrift_types::config::TwoFluidOptions;
use emdrift_types::constants::{
    BETA_ESTATIC, BETA_PREFACTOR, DENSITY_UNIT_CM3, GAUSS_PER_TESLA, ION_VISCOSITY_COEFF,
    LAMBDA_EI_OFFSET, LAMBDA_II_OFFSET, MASS_RATIO_PROTON_ELECTRON, NU_EI_PREFACTOR,
    NU_II_PREFACTOR, NU_PERP_UNSET, RHO_S_PREFACTOR, WCI_PREFACTOR,
};
use emdrift_types::error::{DriftError, DriftResult};
use emdrift_types::grid::GridFile;
use emdrift_types::state::Field2D;
use log::info;

/// Reference quantities as stored in the grid description.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceScales {
    /// Electron temperature [eV].
    pub te_x: f64,
    /// Ion temperature [eV].
    pub ti_x: f64,
    /// Density [1e14 cm^-3].
    pub ni_x: f64,
    /// Magnetic field [T].
    pub bmag: f64,
}

impl ReferenceScales {
    pub fn from_grid(grid: &GridFile) -> DriftResult<Self> {
        Ok(ReferenceScales {
            te_x: grid.require_scalar("Te_x")?,
            ti_x: grid.require_scalar("Ti_x")?,
            ni_x: grid.require_scalar("Ni_x")?,
            bmag: grid.require_scalar("bmag")?,
        })
    }
}

/// Derived normalisation, computed once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalization {
    pub te_x: f64,
    pub ti_x: f64,
    /// Reference density [cm^-3].
    pub ni_x: f64,
    /// Reference field [G].
    pub bmag: f64,
    pub aa: f64,
    pub zz: f64,
    pub zeff: f64,
    /// Ion sound gyroradius [cm].
    pub rho_s: f64,
    /// Electron to ion mass ratio.
    pub fmei: f64,
    pub lambda_ei: f64,
    pub lambda_ii: f64,
    /// Ion cyclotron frequency [1/s].
    pub wci: f64,
    pub nueix: f64,
    pub nuiix: f64,
    /// Normalised resistivity coefficient.
    pub nu_hat: f64,
    /// Normalised ion viscosity coefficient.
    pub mui_hat: f64,
    pub beta_p: f64,
    /// Ion sound speed [cm/s].
    pub vi_x: f64,
}

impl Normalization {
    /// Read the reference scales from `grid` and derive the coefficients.
    /// A present `hthe0` only produces a diagnostic.
    pub fn from_grid(grid: &GridFile, opts: &TwoFluidOptions) -> DriftResult<Self> {
        let norm = Self::compute(&ReferenceScales::from_grid(grid)?, opts)?;
        if let Some(hthe0) = grid.get_scalar("hthe0") {
            info!(
                "Input from BOUT/UEDGE: Z length needs to be divided by {:e}",
                hthe0 / norm.rho_s
            );
        }
        Ok(norm)
    }

    pub fn compute(scales: &ReferenceScales, opts: &TwoFluidOptions) -> DriftResult<Self> {
        for (name, v) in [
            ("Te_x", scales.te_x),
            ("Ti_x", scales.ti_x),
            ("Ni_x", scales.ni_x),
            ("bmag", scales.bmag),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(DriftError::ConfigError(format!(
                    "Reference scale {name} must be positive, got {v}"
                )));
            }
        }

        let (aa, zz) = (opts.aa, opts.zz);
        let te_x = scales.te_x;
        let ti_x = scales.ti_x;
        let ni_x = scales.ni_x * DENSITY_UNIT_CM3;
        let bmag = scales.bmag * GAUSS_PER_TESLA;

        let rho_s = RHO_S_PREFACTOR * (aa * te_x).sqrt() / zz / bmag;
        let fmei = 1.0 / MASS_RATIO_PROTON_ELECTRON / aa;

        let lambda_ei = LAMBDA_EI_OFFSET - (ni_x.sqrt() / te_x).ln();
        let lambda_ii = LAMBDA_II_OFFSET - (zz.powi(3) * (2.0 * ni_x).sqrt() / ti_x.powf(1.5)).ln();
        let wci = WCI_PREFACTOR * zz * bmag / aa;
        let nueix = NU_EI_PREFACTOR * ni_x * lambda_ei / te_x.powf(1.5);
        let nuiix = NU_II_PREFACTOR * zz.powi(4) * ni_x * lambda_ii / ti_x.powf(1.5) / aa.sqrt();
        let nu_hat = opts.nu_factor * opts.zeff * nueix / wci;

        let mui_hat = if opts.nu_perp < NU_PERP_UNSET {
            ION_VISCOSITY_COEFF * nuiix / wci
        } else {
            opts.nu_perp
        };

        let beta_p = if opts.estatic {
            BETA_ESTATIC
        } else {
            BETA_PREFACTOR * ni_x * te_x / (bmag * bmag)
        };

        let norm = Normalization {
            te_x,
            ti_x,
            ni_x,
            bmag,
            aa,
            zz,
            zeff: opts.zeff,
            rho_s,
            fmei,
            lambda_ei,
            lambda_ii,
            wci,
            nueix,
            nuiix,
            nu_hat,
            mui_hat,
            beta_p,
            vi_x: wci * rho_s,
        };
        info!(
            "Normalisation: rho_s = {:e} cm, wci = {:e} 1/s, Vi_x = {:e} cm/s, beta_p = {:e}",
            norm.rho_s, norm.wci, norm.vi_x, norm.beta_p
        );
        info!(
            "Collisions: nueix = {:e}, nuiix = {:e}, nu_hat = {:e}, mui_hat = {:e}",
            norm.nueix, norm.nuiix, norm.nu_hat, norm.mui_hat
        );
        Ok(norm)
    }

    /// Reference field in tesla.
    pub fn b_tesla(&self) -> f64 {
        self.bmag / GAUSS_PER_TESLA
    }

    /// Density scale in the grid's units of 1e14 cm^-3.
    pub fn density_scale(&self) -> f64 {
        self.ni_x / DENSITY_UNIT_CM3
    }

    pub fn normalize_density(&self, f: &Field2D) -> Field2D {
        f / self.density_scale()
    }

    pub fn denormalize_density(&self, f: &Field2D) -> Field2D {
        f * self.density_scale()
    }

    /// Both temperatures are normalised to `Te_x`.
    pub fn normalize_temperature(&self, f: &Field2D) -> Field2D {
        f / self.te_x
    }

    pub fn denormalize_temperature(&self, f: &Field2D) -> Field2D {
        f * self.te_x
    }
}
