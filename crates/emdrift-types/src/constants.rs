// ─────────────────────────────────────────────────────────────────────
// SCPN EM-Drift — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Numerical constants of the Braginskii two-fluid closure in CGS/eV units.

/// Proton-to-electron mass ratio.
pub const MASS_RATIO_PROTON_ELECTRON: f64 = 1836.2;

/// Grid density scale: grid files store densities in units of 1e14 cm^-3.
pub const DENSITY_UNIT_CM3: f64 = 1.0e14;

/// Tesla to Gauss.
pub const GAUSS_PER_TESLA: f64 = 1.0e4;

/// Ion sound gyroradius prefactor: rho_s = 1.02 sqrt(A Te) / (Z B) [cm].
pub const RHO_S_PREFACTOR: f64 = 1.02;

/// Ion cyclotron frequency prefactor: wci = 9.58e3 Z B / A [rad/s].
pub const WCI_PREFACTOR: f64 = 9.58e3;

/// Electron-ion collision frequency prefactor.
pub const NU_EI_PREFACTOR: f64 = 2.91e-6;

/// Ion-ion collision frequency prefactor.
pub const NU_II_PREFACTOR: f64 = 4.78e-8;

/// Plasma beta prefactor: beta = 4.03e-11 n T / B^2.
pub const BETA_PREFACTOR: f64 = 4.03e-11;

/// Coulomb logarithm offsets (electron-ion, ion-ion).
pub const LAMBDA_EI_OFFSET: f64 = 24.0;
pub const LAMBDA_II_OFFSET: f64 = 23.0;

/// Braginskii parallel resistivity coefficient (Z = 1).
pub const SPITZER_COEFF: f64 = 0.51;

/// Braginskii ion viscosity coefficient.
pub const ION_VISCOSITY_COEFF: f64 = 0.3;

/// Beta used in electrostatic runs. Small enough to decouple Apar without
/// special-casing any formula.
pub const BETA_ESTATIC: f64 = 1.0e-29;

/// Below this a user-supplied nu_perp counts as "unset".
pub const NU_PERP_UNSET: f64 = 1.0e-10;
