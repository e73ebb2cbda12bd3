//! pc-core: shared foundation for the powercycle flowsheet solver.
//!
//! Contains:
//! - units (uom SI types + constructors)
//! - numeric (Real + tolerances + float helpers)
//! - ids (compact handles for stream nodes and unit operations)
//! - convergence (damped secant / polynomial root tracking for one scalar)
//! - error (shared error types)

pub mod convergence;
pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

pub use convergence::{ConvergenceVariable, ConvergenceVariableSnapshot};
pub use error::{CoreError, CoreResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
