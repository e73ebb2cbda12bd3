//! Thermodynamic state definitions.

use pc_core::units::{Density, Pressure, Temperature};

/// Specific enthalpy [J/kg].
///
/// Not part of uom's standard set, so we use f64 with clear documentation.
pub type SpecEnthalpy = f64;

/// Specific internal energy [J/kg].
pub type SpecInternalEnergy = f64;

/// Specific entropy [J/(kg·K)].
pub type SpecEntropy = f64;

/// Specific heat capacity [J/(kg·K)].
pub type SpecHeatCapacity = f64;

/// Mass fraction of the light (reference) component [-].
pub type MassFraction = f64;

/// Independent property pair used to fix a state.
///
/// Listed in the order a stream node prefers them when several are known.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StateInput {
    /// Pressure and specific enthalpy.
    PH { p: Pressure, h: SpecEnthalpy },
    /// Pressure and specific internal energy.
    PE { p: Pressure, e: SpecInternalEnergy },
    /// Pressure and specific entropy.
    PS { p: Pressure, s: SpecEntropy },
    /// Pressure and vapour quality.
    PQ { p: Pressure, q: f64 },
    /// Pressure and temperature.
    PT { p: Pressure, t: Temperature },
    /// Temperature and vapour quality.
    TQ { t: Temperature, q: f64 },
}

impl StateInput {
    pub fn label(&self) -> &'static str {
        match self {
            StateInput::PH { .. } => "PH",
            StateInput::PE { .. } => "PE",
            StateInput::PS { .. } => "PS",
            StateInput::PQ { .. } => "PQ",
            StateInput::PT { .. } => "PT",
            StateInput::TQ { .. } => "TQ",
        }
    }
}

/// Fully resolved state returned by a property model.
///
/// Quality and dome-edge compositions are only reported by models that know
/// about phase change; secondary media leave them empty. Outside the dome the
/// quality is extrapolated (<0 sub-cooled, >1 superheated).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluidState {
    pub p: Pressure,
    pub t: Temperature,
    pub h: SpecEnthalpy,
    pub e: Option<SpecInternalEnergy>,
    pub s: SpecEntropy,
    pub rho: Option<Density>,
    pub q: Option<f64>,
    pub y: MassFraction,
    pub y_vap: Option<MassFraction>,
    pub y_liq: Option<MassFraction>,
}

impl FluidState {
    pub fn p_pa(&self) -> f64 {
        self.p.value
    }

    pub fn t_k(&self) -> f64 {
        self.t.value
    }

    /// Vapour quality clamped into the two-phase interval.
    pub fn q_clamped(&self) -> Option<f64> {
        self.q.map(|q| q.clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pc_core::units::{k, pa};

    #[test]
    fn input_labels() {
        let input = StateInput::PT {
            p: pa(1e5),
            t: k(300.0),
        };
        assert_eq!(input.label(), "PT");
        assert_eq!(StateInput::TQ { t: k(300.0), q: 0.5 }.label(), "TQ");
    }

    #[test]
    fn quality_clamp() {
        let st = FluidState {
            p: pa(1e5),
            t: k(400.0),
            h: 0.0,
            e: None,
            s: 0.0,
            rho: None,
            q: Some(1.3),
            y: 0.5,
            y_vap: None,
            y_liq: None,
        };
        assert_eq!(st.q_clamped(), Some(1.0));
    }
}
