//! Error types for convergence runs.

use pc_core::CoreError;
use pc_graph::SimError;
use thiserror::Error;

/// Errors that can end a convergence run.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Problem setup error: {what}")]
    Setup { what: String },

    #[error("Flowsheet returned no residual for tear '{name}'")]
    MissingResidual { name: String },

    #[error("Evaluation failed: {0}")]
    Sim(#[from] SimError),

    #[error("Tear declaration error: {0}")]
    Core(#[from] CoreError),
}

pub type SolverResult<T> = Result<T, SolverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_errors_keep_their_message() {
        let err: SolverError = SimError::input("mix", "inlet pressures differ").into();
        assert!(err.to_string().contains("mix"));
        assert!(matches!(err, SolverError::Sim(SimError::Input { .. })));
    }
}
