//! Property oracle trait and validation helpers.

use crate::error::{FluidError, FluidResult};
use crate::state::{FluidState, MassFraction, SpecEnthalpy, StateInput};
use pc_core::units::{Pressure, Temperature};

/// Thermodynamic property oracle for the working fluid.
///
/// Implementations must be thread-safe (Send + Sync) so a single oracle can be
/// shared by every flowsheet evaluation. Infeasible or out-of-range inputs fail
/// with a [`FluidError`]; callers treat that as a recoverable signal.
pub trait PropertyOracle: Send + Sync {
    /// Get the model name (for debugging/logging).
    fn name(&self) -> &str;

    /// Resolve a full state from an input pair and a composition.
    fn resolve(&self, input: StateInput, y: MassFraction) -> FluidResult<FluidState>;

    /// Enthalpy at pressure and temperature.
    fn h_pt(&self, p: Pressure, t: Temperature, y: MassFraction) -> FluidResult<SpecEnthalpy> {
        Ok(self.resolve(StateInput::PT { p, t }, y)?.h)
    }

    /// Temperature at pressure and enthalpy.
    fn t_ph(&self, p: Pressure, h: SpecEnthalpy, y: MassFraction) -> FluidResult<Temperature> {
        Ok(self.resolve(StateInput::PH { p, h }, y)?.t)
    }
}

/// Validation helpers for fluid properties.
pub(crate) mod validation {
    use super::*;

    /// Ensure pressure is positive and finite.
    pub fn validate_pressure(p: Pressure) -> FluidResult<()> {
        if !p.value.is_finite() || p.value <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "pressure must be positive and finite",
            });
        }
        Ok(())
    }

    /// Ensure temperature is positive and finite.
    pub fn validate_temperature(t: Temperature) -> FluidResult<()> {
        if !t.value.is_finite() || t.value <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "temperature must be positive and finite",
            });
        }
        Ok(())
    }

    /// Ensure a caloric property (h, e, s) is finite; it may be negative.
    pub fn validate_caloric(v: f64, what: &'static str) -> FluidResult<()> {
        if !v.is_finite() {
            return Err(FluidError::NonPhysical { what });
        }
        Ok(())
    }

    /// Ensure a mass fraction lies in [0, 1].
    pub fn validate_fraction(y: MassFraction) -> FluidResult<()> {
        if !y.is_finite() || !(0.0..=1.0).contains(&y) {
            return Err(FluidError::OutOfRange {
                what: "mass fraction",
                value: y,
            });
        }
        Ok(())
    }

    /// Ensure a quality lies in [0, 1].
    pub fn validate_quality(q: f64) -> FluidResult<()> {
        if !q.is_finite() || !(0.0..=1.0).contains(&q) {
            return Err(FluidError::OutOfRange {
                what: "vapour quality",
                value: q,
            });
        }
        Ok(())
    }

    /// Ensure specific heat capacity is positive and finite.
    pub fn validate_cp(cp: f64) -> FluidResult<()> {
        if !cp.is_finite() || cp <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "cp must be positive and finite",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::validation::*;
    use pc_core::units::{k, pa};

    #[test]
    fn pressure_validation() {
        assert!(validate_pressure(pa(1e5)).is_ok());
        assert!(validate_pressure(pa(0.0)).is_err());
        assert!(validate_pressure(pa(f64::NAN)).is_err());
    }

    #[test]
    fn temperature_validation() {
        assert!(validate_temperature(k(300.0)).is_ok());
        assert!(validate_temperature(k(-1.0)).is_err());
    }

    #[test]
    fn fraction_and_quality_validation() {
        assert!(validate_fraction(0.0).is_ok());
        assert!(validate_fraction(1.0).is_ok());
        assert!(validate_fraction(1.01).is_err());
        assert!(validate_quality(-0.1).is_err());
        assert!(validate_cp(0.0).is_err());
        assert!(validate_caloric(f64::INFINITY, "h").is_err());
    }
}
