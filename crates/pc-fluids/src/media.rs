//! Secondary heat-transfer media with constant heat capacity.
//!
//! Molten salts and similar loop fluids never change phase inside the cycle,
//! so they bypass the property oracle. Enthalpy and entropy are measured from
//! the ice point:
//!
//! ```text
//! h = cp * (T - 273.15 K)
//! s = cp * ln(T / 273.15 K)
//! ```

use crate::error::{FluidError, FluidResult};
use crate::model::{PropertyOracle, validation};
use crate::state::{FluidState, MassFraction, SpecEnthalpy, SpecHeatCapacity, StateInput};
use pc_core::units::{Pressure, T_ZERO_K, Temperature, k};

/// Registered secondary medium.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Medium {
    pub name: &'static str,
    /// Specific heat capacity [J/(kg·K)]
    pub cp: SpecHeatCapacity,
    /// Lowest usable temperature (freezing margin) [K]
    pub t_min: f64,
    /// Highest usable temperature (decomposition) [K]
    pub t_max: f64,
}

/// Hitec XL nitrate salt.
pub const HITEC_XL: Medium = Medium {
    name: "hitecxl",
    cp: 1447.0,
    t_min: 130.0 + T_ZERO_K,
    t_max: 490.0 + T_ZERO_K,
};

/// Hitec ternary nitrate salt.
pub const HITEC: Medium = Medium {
    name: "hitec",
    cp: 1561.7,
    t_min: 180.0 + T_ZERO_K,
    t_max: 560.0 + T_ZERO_K,
};

pub const MEDIA: &[Medium] = &[HITEC_XL, HITEC];

/// Case-insensitive lookup in the media registry.
pub fn lookup_medium(name: &str) -> Option<&'static Medium> {
    MEDIA.iter().find(|m| m.name.eq_ignore_ascii_case(name))
}

/// Constant-cp, incompressible property model.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantCpModel {
    pub name: String,
    pub cp: SpecHeatCapacity,
    pub t_min: Option<f64>,
    pub t_max: Option<f64>,
}

impl ConstantCpModel {
    pub fn new(name: impl Into<String>, cp: SpecHeatCapacity) -> FluidResult<Self> {
        validation::validate_cp(cp)?;
        Ok(Self {
            name: name.into(),
            cp,
            t_min: None,
            t_max: None,
        })
    }

    pub fn from_medium(medium: &Medium) -> Self {
        Self {
            name: medium.name.to_string(),
            cp: medium.cp,
            t_min: Some(medium.t_min),
            t_max: Some(medium.t_max),
        }
    }

    pub fn h_at(&self, t_k: f64) -> SpecEnthalpy {
        self.cp * (t_k - T_ZERO_K)
    }

    pub fn t_at(&self, h: SpecEnthalpy) -> f64 {
        T_ZERO_K + h / self.cp
    }

    pub fn s_at(&self, t_k: f64) -> f64 {
        self.cp * (t_k / T_ZERO_K).ln()
    }

    /// Resolve from enthalpy, temperature or entropy; other pairs need a
    /// phase-change model.
    pub fn resolve_input(&self, input: StateInput) -> FluidResult<FluidState> {
        let (p, t_k) = match input {
            StateInput::PH { p, h } => {
                validation::validate_caloric(h, "enthalpy must be finite")?;
                (p, self.t_at(h))
            }
            StateInput::PT { p, t } => (p, t.value),
            StateInput::PS { p, s } => {
                validation::validate_caloric(s, "entropy must be finite")?;
                (p, T_ZERO_K * (s / self.cp).exp())
            }
            StateInput::PE { .. } | StateInput::PQ { .. } | StateInput::TQ { .. } => {
                return Err(FluidError::NotSupported {
                    what: "constant-cp media resolve from h, T or s only",
                });
            }
        };
        validation::validate_pressure(p)?;
        let t = k(t_k);
        validation::validate_temperature(t)?;
        let h = self.h_at(t_k);
        Ok(FluidState {
            p,
            t,
            h,
            e: Some(h),
            s: self.s_at(t_k),
            rho: None,
            q: None,
            y: 0.0,
            y_vap: None,
            y_liq: None,
        })
    }
}

impl PropertyOracle for ConstantCpModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn resolve(&self, input: StateInput, _y: MassFraction) -> FluidResult<FluidState> {
        self.resolve_input(input)
    }
}

/// What a stream carries: the working fluid at some composition, or a
/// secondary medium that bypasses the oracle.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamFluid {
    Working { y: MassFraction },
    Secondary(ConstantCpModel),
}

impl StreamFluid {
    /// Pick the property route from a stream's tags.
    ///
    /// A registered medium wins; an unregistered tag (or none) with a cp
    /// override becomes an ad-hoc constant-cp medium; otherwise the working
    /// fluid is used and needs a composition.
    pub fn from_tags(medium: Option<&str>, cp: Option<f64>, y: Option<f64>) -> Option<Self> {
        if let Some(m) = medium.and_then(lookup_medium) {
            return Some(StreamFluid::Secondary(ConstantCpModel::from_medium(m)));
        }
        if let Some(cp) = cp {
            let name = medium.unwrap_or("constant-cp");
            return ConstantCpModel::new(name, cp).ok().map(StreamFluid::Secondary);
        }
        y.map(|y| StreamFluid::Working { y })
    }

    pub fn resolve(
        &self,
        oracle: &dyn PropertyOracle,
        input: StateInput,
    ) -> FluidResult<FluidState> {
        match self {
            StreamFluid::Working { y } => oracle.resolve(input, *y),
            StreamFluid::Secondary(model) => model.resolve_input(input),
        }
    }

    pub fn h_pt(
        &self,
        oracle: &dyn PropertyOracle,
        p: Pressure,
        t: Temperature,
    ) -> FluidResult<SpecEnthalpy> {
        Ok(self.resolve(oracle, StateInput::PT { p, t })?.h)
    }

    pub fn t_ph(
        &self,
        oracle: &dyn PropertyOracle,
        p: Pressure,
        h: SpecEnthalpy,
    ) -> FluidResult<Temperature> {
        Ok(self.resolve(oracle, StateInput::PH { p, h })?.t)
    }

    /// Lowest usable temperature, if the medium declares one.
    pub fn t_min(&self) -> Option<f64> {
        match self {
            StreamFluid::Working { .. } => None,
            StreamFluid::Secondary(model) => model.t_min,
        }
    }

    pub fn is_secondary(&self) -> bool {
        matches!(self, StreamFluid::Secondary(_))
    }
}
