//! Error types for unit-operation construction.

use pc_core::CoreError;
use pc_graph::SimError;
use thiserror::Error;

/// Errors raised while building a unit from its parameters.
///
/// Failures during `calc` are reported as [`SimError`] by the graph.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComponentError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Non-physical value: {what}")]
    NonPhysical { what: &'static str },
}

pub type ComponentResult<T> = Result<T, ComponentError>;

impl From<CoreError> for ComponentError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::NonFinite { what, .. } => ComponentError::NonPhysical { what },
            CoreError::InvalidArg { what } | CoreError::Invariant { what } => {
                ComponentError::InvalidArg { what }
            }
            CoreError::InvalidRange { .. } => ComponentError::InvalidArg {
                what: "invalid range",
            },
        }
    }
}

impl From<ComponentError> for SimError {
    fn from(e: ComponentError) -> Self {
        SimError::input("component", e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ComponentError::InvalidArg {
            what: "efficiency must be in (0,1]",
        };
        assert!(err.to_string().contains("efficiency"));
    }

    #[test]
    fn error_conversion() {
        let sim: SimError = ComponentError::NonPhysical { what: "duty" }.into();
        assert!(matches!(sim, SimError::Input { .. }));
        let comp: ComponentError = CoreError::NonFinite {
            what: "dt_min",
            value: f64::NAN,
        }
        .into();
        assert_eq!(comp, ComponentError::NonPhysical { what: "dt_min" });
    }
}
