//! Outer convergence loop for sequential-modular flowsheets.
//!
//! A [`Flowsheet`] declares scalar recycle unknowns (tears) and evaluates a
//! freshly built graph for one set of guesses. The [`ConvergenceEngine`]
//! repeats that evaluation, steering each tear with a
//! [`pc_core::ConvergenceVariable`], until every residual is inside tolerance
//! or the iteration cap is hit. It never reorders units and never forms a
//! Jacobian.

pub mod engine;
pub mod error;
pub mod flowsheet;

pub use engine::{ConvergenceEngine, EngineConfig, EngineEvent, EngineOutcome, EngineStatus};
pub use error::{SolverError, SolverResult};
pub use flowsheet::{Flowsheet, Residuals, TearGuesses, TearVariable};
