//! Flowsheet evaluation errors.

use pc_core::CoreError;
use pc_fluids::FluidError;
use thiserror::Error;

pub type SimResult<T> = Result<T, SimError>;

/// Errors raised while assembling or evaluating a flowsheet.
#[derive(Error, Debug)]
pub enum SimError {
    /// Caller-supplied data is inconsistent (unequal pressures, impossible
    /// flow split, wrong port count, ...).
    #[error("{unit}: invalid input: {what}")]
    Input { unit: String, what: String },

    /// The property oracle could not resolve a state.
    #[error("Property error: {0}")]
    Property(#[from] FluidError),

    /// An inner iterative solve ran out of iterations.
    #[error("{unit}: no convergence: {what}")]
    Convergence { unit: String, what: String },

    #[error("Name clash: '{name}' is already registered")]
    NameClash { name: String },

    #[error("Result '{name}' already published by '{owner}'")]
    ResultClash { name: String, owner: String },

    #[error("Unknown unit operation '{name}'")]
    UnknownUnit { name: String },

    #[error("Unknown stream node {label}")]
    UnknownNode { label: String },

    #[error("No result published under '{name}'")]
    MissingResult { name: String },

    #[error("Node {node}: missing {what}")]
    Missing { node: String, what: &'static str },

    /// Cooperative interrupt requested by the caller.
    #[error("Evaluation interrupted")]
    Interrupted,

    #[error("Result payload error: {0}")]
    Payload(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl SimError {
    pub fn input(unit: &str, what: impl Into<String>) -> Self {
        SimError::Input {
            unit: unit.to_string(),
            what: what.into(),
        }
    }

    pub fn convergence(unit: &str, what: impl Into<String>) -> Self {
        SimError::Convergence {
            unit: unit.to_string(),
            what: what.into(),
        }
    }

    /// Errors a ranked retry may recover from by trying another strategy.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SimError::Property(_) | SimError::Convergence { .. })
    }
}
