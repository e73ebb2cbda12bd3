//! Discretised temperature profile of a counter-current exchanger.
//!
//! Both enthalpy changes are cut into `N` equal increments. Station 0 pairs
//! the hot inlet with the cold outlet, station `N` the hot outlet with the
//! cold inlet:
//!
//! ```text
//! h_hot(i)  = h_hot_in   - i * (h_hot_in  - h_hot_out) / N
//! h_cold(i) = h_cold_out - i * (h_cold_out - h_cold_in) / N
//! ```

use pc_core::units::{Pressure, k};
use pc_fluids::{FluidResult, PropertyOracle, StreamFluid};
use serde::{Deserialize, Serialize};

/// One side of the exchanger.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangerStream {
    pub fluid: StreamFluid,
    pub p: Pressure,
    /// Inlet enthalpy [J/kg]
    pub h_in: f64,
    /// Inlet temperature [K]
    pub t_in: f64,
    pub mdot: Option<f64>,
}

impl ExchangerStream {
    /// Temperature [K] at this side's pressure.
    pub fn t_at(&self, oracle: &dyn PropertyOracle, h: f64) -> FluidResult<f64> {
        Ok(self.fluid.t_ph(oracle, self.p, h)?.value)
    }

    /// Enthalpy [J/kg] at this side's pressure.
    pub fn h_at(&self, oracle: &dyn PropertyOracle, t: f64) -> FluidResult<f64> {
        self.fluid.h_pt(oracle, self.p, k(t))
    }
}

/// Outlet enthalpies and flows of both sides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Terminals {
    pub h_hot_out: f64,
    pub h_cold_out: f64,
    pub m_hot: f64,
    pub m_cold: f64,
}

impl Terminals {
    /// Heat given up by the hot side [W].
    pub fn duty(&self, hot: &ExchangerStream) -> f64 {
        self.m_hot * (hot.h_in - self.h_hot_out)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinchProfile {
    /// Smallest hot minus cold difference over all stations [K]
    pub dt_min: f64,
    /// Pinch station, 0 at the hot end and 1 at the cold end
    pub fraction: f64,
    /// Hot-side temperatures from inlet to outlet [K]
    pub t_hot: Vec<f64>,
    /// Cold-side temperatures from outlet to inlet [K]
    pub t_cold: Vec<f64>,
    pub effectiveness: f64,
    /// Heat transferred [W]
    pub duty: f64,
}

/// Evaluate the profile for fixed terminals.
///
/// The maximum duty is the smaller of cooling the hot side to the cold
/// inlet temperature and heating the cold side to the hot inlet temperature.
pub fn check(
    oracle: &dyn PropertyOracle,
    hot: &ExchangerStream,
    cold: &ExchangerStream,
    ends: &Terminals,
    segments: usize,
) -> FluidResult<PinchProfile> {
    let n = segments.max(1);
    let dh_hot = (hot.h_in - ends.h_hot_out) / n as f64;
    let dh_cold = (ends.h_cold_out - cold.h_in) / n as f64;

    let mut t_hot = Vec::with_capacity(n + 1);
    let mut t_cold = Vec::with_capacity(n + 1);
    let mut dt_min = f64::INFINITY;
    let mut station = 0;
    for i in 0..=n {
        let th = hot.t_at(oracle, hot.h_in - dh_hot * i as f64)?;
        let tc = cold.t_at(oracle, ends.h_cold_out - dh_cold * i as f64)?;
        if th - tc < dt_min {
            dt_min = th - tc;
            station = i;
        }
        t_hot.push(th);
        t_cold.push(tc);
    }

    let duty = ends.duty(hot);
    let q_max_hot = ends.m_hot * (hot.h_in - hot.h_at(oracle, cold.t_in)?);
    let q_max_cold = ends.m_cold * (cold.h_at(oracle, hot.t_in)? - cold.h_in);
    let q_max = q_max_hot.min(q_max_cold);
    let effectiveness = if duty > 0.0 && q_max > 0.0 {
        duty / q_max
    } else {
        0.0
    };

    Ok(PinchProfile {
        dt_min,
        fraction: station as f64 / n as f64,
        t_hot,
        t_cold,
        effectiveness,
        duty,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pc_core::units::{T_ZERO_K, bar};
    use pc_fluids::{ConstantCpModel, IdealBinaryModel};

    const CP: f64 = 4180.0;

    fn water(t_c: f64, mdot: f64) -> ExchangerStream {
        let model = ConstantCpModel::new("water", CP).unwrap();
        ExchangerStream {
            h_in: model.h_at(t_c + T_ZERO_K),
            fluid: StreamFluid::Secondary(model),
            p: bar(1.0),
            t_in: t_c + T_ZERO_K,
            mdot: Some(mdot),
        }
    }

    #[test]
    fn linear_profiles_pinch_at_the_cold_end() {
        let oracle = IdealBinaryModel::default();
        // Hot 150 -> 100 C against cold 95 -> 140 C at equal duty.
        let hot = water(150.0, 1.0);
        let cold = water(95.0, 50.0 / 45.0);
        let ends = Terminals {
            h_hot_out: CP * 100.0,
            h_cold_out: CP * 140.0,
            m_hot: 1.0,
            m_cold: 50.0 / 45.0,
        };
        let profile = check(&oracle, &hot, &cold, &ends, 10).unwrap();
        assert!((profile.dt_min - 5.0).abs() < 1e-9);
        assert_eq!(profile.fraction, 1.0);
        assert_eq!(profile.t_hot.len(), 11);
        assert!((profile.t_hot[0] - hot.t_in).abs() < 1e-9);
        assert!((profile.duty - CP * 50.0).abs() < 1e-6);
        assert!((profile.effectiveness - 50.0 / 55.0).abs() < 1e-9);
    }

    #[test]
    fn no_duty_means_no_effectiveness() {
        let oracle = IdealBinaryModel::default();
        let hot = water(150.0, 1.0);
        let cold = water(50.0, 1.0);
        let ends = Terminals {
            h_hot_out: hot.h_in,
            h_cold_out: cold.h_in,
            m_hot: 1.0,
            m_cold: 1.0,
        };
        let profile = check(&oracle, &hot, &cold, &ends, 4).unwrap();
        assert_eq!(profile.effectiveness, 0.0);
        assert!((profile.dt_min - 100.0).abs() < 1e-9);
        // equal differences everywhere: the first station wins
        assert_eq!(profile.fraction, 0.0);
    }
}
