//! Electromagnetic drift-wave two-fluid model.
//!
//! Startup: normalisation, metric, equilibrium profiles.
//! Per step: elliptic solves, halo exchange, closure, right-hand sides.

pub mod boundary;
pub mod closure;
pub mod comms;
pub mod elliptic;
pub mod metric;
pub mod model;
pub mod normalize;
pub mod output;
pub mod profiles;
