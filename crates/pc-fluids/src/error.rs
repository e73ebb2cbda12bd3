//! Property oracle failures.
//!
//! Every variant is recoverable from the caller's point of view: a unit
//! operation may back off its trial state and ask again.

use thiserror::Error;

pub type FluidResult<T> = Result<T, FluidError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FluidError {
    /// NaN, infinite or negative where the quantity must be positive.
    #[error("{what} is not physical")]
    NonPhysical { what: &'static str },

    #[error("{what} = {value} lies outside the model envelope")]
    OutOfRange { what: &'static str, value: f64 },

    #[error("bad property request: {what}")]
    InvalidArg { what: &'static str },

    /// The model cannot resolve this input pair for this stream.
    #[error("{what} not available from this model")]
    NotSupported { what: &'static str },

    /// Inner solve (T from p,h and the like) did not close.
    #[error("state solve for {what} did not converge")]
    ConvergenceFailed { what: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_quantity() {
        let err = FluidError::NonPhysical { what: "pressure" };
        assert_eq!(err.to_string(), "pressure is not physical");

        let err = FluidError::OutOfRange {
            what: "temperature",
            value: 12.5,
        };
        assert!(err.to_string().starts_with("temperature = 12.5"));

        let err = FluidError::ConvergenceFailed { what: "T(p, h)" };
        assert!(err.to_string().contains("T(p, h)"));
    }
}
