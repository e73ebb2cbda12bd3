//! Counter-current heat exchanger constrained by a minimum approach.
//!
//! Port order: inlets `[hot_in, cold_in]`, outlets `[hot_out, cold_out]`.
//! Whatever the caller leaves open is closed from the energy balance, the
//! optional duty and the pinch condition:
//!
//! | outlets known | flows known    | closure                                    |
//! |---------------|----------------|--------------------------------------------|
//! | none          | both           | shoot [`Strategy::RANKED`]                 |
//! | one           | both           | energy balance                             |
//! | one           | one            | [`Strategy::HotFlow`] / [`Strategy::ColdFlow`] |
//! | both          | one or none    | energy balance (duty when no flow known)   |
//! | both          | both           | balance checked, `OverSpecified` warning   |
//!
//! A known non-positive flow on either side means no exchange: both outlets
//! take their inlet state whatever else was given.

mod profile;
mod shooting;

pub use profile::{ExchangerStream, PinchProfile, Terminals, check};
pub use shooting::{ShootingProblem, ShootingSolution, Strategy, first_success};

use pc_core::NodeId;
use pc_core::numeric::nearly_equal;
use pc_core::units::{Power, Pressure};
use pc_fluids::StateInput;
use pc_graph::{Arity, CalcContext, SimError, SimResult, SimWarning, UnitOperation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::common::{DUTY_TOL, check_finite};
use crate::error::{ComponentError, ComponentResult};

/// Achieved pinch further than this from the target is reported [K].
const PINCH_REPORT_TOL: f64 = 0.1;

/// Pinch solver settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchConfig {
    /// Profile increments per side
    pub segments: usize,
    /// Minimum hot minus cold temperature difference [K]
    pub dt_min: f64,
    /// Acceptable pinch error [K]
    pub tolerance: f64,
    /// Trials per strategy
    pub max_iter: usize,
    /// Failed property lookups tolerated per strategy
    pub max_infeasible: usize,
}

impl Default for PinchConfig {
    fn default() -> Self {
        Self {
            segments: 11,
            dt_min: 5.0,
            tolerance: 0.1,
            max_iter: 20,
            max_infeasible: 5,
        }
    }
}

impl PinchConfig {
    pub fn validate(&self) -> ComponentResult<()> {
        if self.segments == 0 {
            return Err(ComponentError::InvalidArg {
                what: "pinch needs at least one segment",
            });
        }
        if !self.dt_min.is_finite() || self.dt_min < 0.0 {
            return Err(ComponentError::InvalidArg {
                what: "pinch approach must be finite and non-negative",
            });
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(ComponentError::InvalidArg {
                what: "pinch tolerance must be positive",
            });
        }
        if self.max_iter == 0 || self.max_infeasible == 0 {
            return Err(ComponentError::InvalidArg {
                what: "pinch iteration caps must be positive",
            });
        }
        Ok(())
    }
}

/// Published by [`PinchHex`] under its unit name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinchResult {
    /// Strategy that placed the pinch, if shooting was needed
    pub strategy: Option<Strategy>,
    pub trials: usize,
    #[serde(flatten)]
    pub profile: PinchProfile,
}

#[derive(Debug, Clone, PartialEq)]
enum Closure {
    Shot(ShootingSolution),
    Balance(Terminals),
    OverSpecified(Terminals),
}

impl Closure {
    fn ends(&self) -> Terminals {
        match self {
            Closure::Shot(sol) => sol.ends,
            Closure::Balance(ends) | Closure::OverSpecified(ends) => *ends,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PinchHex {
    config: PinchConfig,
    duty: Option<Power>,
}

impl PinchHex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PinchConfig) -> ComponentResult<Self> {
        config.validate()?;
        Ok(Self { config, duty: None })
    }

    /// Fix the heat transferred, used when a mass flow is left open.
    pub fn with_duty(mut self, duty: Power) -> ComponentResult<Self> {
        check_finite(duty.value, "exchanger duty")?;
        self.duty = Some(duty);
        Ok(self)
    }

    pub fn config(&self) -> &PinchConfig {
        &self.config
    }

    fn close(&self, pb: &mut ShootingProblem<'_>) -> SimResult<Closure> {
        let unit = pb.unit;
        let (h1, h3) = (pb.hot.h_in, pb.cold.h_in);
        let duty = self.duty.map(|q| q.value);
        let ends = |h_hot_out, h_cold_out, m_hot, m_cold| Terminals {
            h_hot_out,
            h_cold_out,
            m_hot,
            m_cold,
        };

        if let (Some(m_hot), Some(m_cold)) = (pb.hot.mdot, pb.cold.mdot) {
            if m_hot <= 0.0 || m_cold <= 0.0 {
                debug!(unit, m_hot, m_cold, "no flow on one side, no exchange");
                return Ok(Closure::Balance(ends(h1, h3, m_hot, m_cold)));
            }
        }

        match (pb.h_hot_out, pb.h_cold_out) {
            (None, None) => match (pb.hot.mdot, pb.cold.mdot) {
                (Some(_), Some(_)) => pb.solve_ranked(&Strategy::RANKED).map(Closure::Shot),
                _ => Err(SimError::input(
                    unit,
                    "both outlets open needs both mass flows",
                )),
            },
            (Some(h2), None) => match (pb.hot.mdot, pb.cold.mdot, duty) {
                (Some(m_hot), Some(m_cold), _) => {
                    let h4 = h3 + ratio(unit, m_hot * (h1 - h2), m_cold)?;
                    Ok(Closure::Balance(ends(h2, h4, m_hot, m_cold)))
                }
                (None, Some(m_cold), Some(q)) => {
                    let m_hot = ratio(unit, q, h1 - h2)?;
                    let h4 = h3 + ratio(unit, q, m_cold)?;
                    Ok(Closure::Balance(ends(h2, h4, m_hot, m_cold)))
                }
                (None, Some(_), None) => pb.solve(Strategy::HotFlow).map(Closure::Shot),
                (Some(_), None, _) => pb.solve(Strategy::ColdFlow).map(Closure::Shot),
                (None, None, Some(q)) => {
                    pb.hot.mdot = Some(ratio(unit, q, h1 - h2)?);
                    pb.solve(Strategy::ColdFlow).map(Closure::Shot)
                }
                (None, None, None) => Err(SimError::input(
                    unit,
                    "hot outlet alone needs a mass flow or a duty",
                )),
            },
            (None, Some(h4)) => match (pb.hot.mdot, pb.cold.mdot, duty) {
                (Some(m_hot), Some(m_cold), _) => {
                    let h2 = h1 - ratio(unit, m_cold * (h4 - h3), m_hot)?;
                    Ok(Closure::Balance(ends(h2, h4, m_hot, m_cold)))
                }
                (Some(m_hot), None, Some(q)) => {
                    let m_cold = ratio(unit, q, h4 - h3)?;
                    let h2 = h1 - ratio(unit, q, m_hot)?;
                    Ok(Closure::Balance(ends(h2, h4, m_hot, m_cold)))
                }
                (Some(_), None, None) => pb.solve(Strategy::ColdFlow).map(Closure::Shot),
                (None, Some(_), _) => pb.solve(Strategy::HotFlow).map(Closure::Shot),
                (None, None, Some(q)) => {
                    pb.cold.mdot = Some(ratio(unit, q, h4 - h3)?);
                    pb.solve(Strategy::HotFlow).map(Closure::Shot)
                }
                (None, None, None) => Err(SimError::input(
                    unit,
                    "cold outlet alone needs a mass flow or a duty",
                )),
            },
            (Some(h2), Some(h4)) => match (pb.hot.mdot, pb.cold.mdot, duty) {
                (Some(m_hot), Some(m_cold), _) => {
                    let q_hot = m_hot * (h1 - h2);
                    let q_cold = m_cold * (h4 - h3);
                    if !nearly_equal(q_hot, q_cold, DUTY_TOL) {
                        return Err(SimError::input(
                            unit,
                            format!(
                                "fixed outlets do not balance: {q_hot} W released, \
                                 {q_cold} W absorbed"
                            ),
                        ));
                    }
                    Ok(Closure::OverSpecified(ends(h2, h4, m_hot, m_cold)))
                }
                (Some(m_hot), None, _) => {
                    let m_cold = ratio(unit, m_hot * (h1 - h2), h4 - h3)?;
                    Ok(Closure::Balance(ends(h2, h4, m_hot, m_cold)))
                }
                (None, Some(m_cold), _) => {
                    let m_hot = ratio(unit, m_cold * (h4 - h3), h1 - h2)?;
                    Ok(Closure::Balance(ends(h2, h4, m_hot, m_cold)))
                }
                (None, None, Some(q)) => {
                    let m_hot = ratio(unit, q, h1 - h2)?;
                    let m_cold = ratio(unit, q, h4 - h3)?;
                    Ok(Closure::Balance(ends(h2, h4, m_hot, m_cold)))
                }
                (None, None, None) => Err(SimError::input(
                    unit,
                    "both outlets known needs a mass flow or a duty",
                )),
            },
        }
    }
}

fn ratio(unit: &str, num: f64, den: f64) -> SimResult<f64> {
    let v = num / den;
    if den == 0.0 || !v.is_finite() {
        return Err(SimError::input(
            unit,
            "zero enthalpy change leaves the exchanger balance undefined",
        ));
    }
    Ok(v)
}

impl UnitOperation for PinchHex {
    fn kind(&self) -> &'static str {
        "pinch_hex"
    }

    fn arity(&self) -> Arity {
        Arity::new(2, 2)
    }

    fn calc(&self, ctx: &mut CalcContext<'_>) -> SimResult<()> {
        let n_hot_in = ctx.inlet(0)?;
        let n_cold_in = ctx.inlet(1)?;
        let n_hot_out = ctx.outlet(0)?;
        let n_cold_out = ctx.outlet(1)?;
        let sides = [(n_hot_in, n_hot_out), (n_cold_in, n_cold_out)];

        let hot_st = ctx.resolve(n_hot_in)?;
        let cold_st = ctx.resolve(n_cold_in)?;
        for (src, dst) in sides {
            let s = ctx.node(src)?.clone();
            let d = ctx.node_mut(dst)?;
            d.inherit_tags(&s);
            d.p = s.p;
            if s.mdot.is_some() {
                d.mdot = s.mdot;
            }
        }

        if hot_st.t.value < cold_st.t.value {
            for (src, dst) in sides {
                let s = ctx.node(src)?.clone();
                ctx.node_mut(dst)?.copy_intensive(&s);
            }
            ctx.warn(SimWarning::ExchangerBypassed {
                unit: ctx.name().to_string(),
                t_hot_in: hot_st.t.value,
                t_cold_in: cold_st.t.value,
            });
            return Ok(());
        }

        let hot = ExchangerStream {
            fluid: ctx.fluid(n_hot_in)?,
            p: hot_st.p,
            h_in: hot_st.h,
            t_in: hot_st.t.value,
            mdot: ctx.node(n_hot_out)?.mdot_kgps(),
        };
        let cold = ExchangerStream {
            fluid: ctx.fluid(n_cold_in)?,
            p: cold_st.p,
            h_in: cold_st.h,
            t_in: cold_st.t.value,
            mdot: ctx.node(n_cold_out)?.mdot_kgps(),
        };

        // outlets given by the caller may not reverse the heat flow
        let h_hot_out = match ctx.try_resolve(n_hot_out)? {
            Some(st) if st.h > hot.h_in => {
                Some(ctx.resolve_as(n_hot_out, StateInput::PH { p: hot.p, h: hot.h_in })?.h)
            }
            st => st.map(|st| st.h),
        };
        let h_cold_out = match ctx.try_resolve(n_cold_out)? {
            Some(st) if st.h < cold.h_in => {
                Some(ctx.resolve_as(n_cold_out, StateInput::PH { p: cold.p, h: cold.h_in })?.h)
            }
            st => st.map(|st| st.h),
        };

        let unit = ctx.name().to_string();
        let oracle = ctx.oracle();
        let mut problem = ShootingProblem {
            unit: &unit,
            oracle: oracle.as_ref(),
            config: &self.config,
            hot,
            cold,
            h_hot_out,
            h_cold_out,
        };
        let closure = self.close(&mut problem)?;
        let ends = closure.ends();

        write_side(ctx, n_hot_in, n_hot_out, problem.hot.p, ends.h_hot_out, ends.m_hot)?;
        write_side(ctx, n_cold_in, n_cold_out, problem.cold.p, ends.h_cold_out, ends.m_cold)?;

        let profile = check(
            oracle.as_ref(),
            &problem.hot,
            &problem.cold,
            &ends,
            self.config.segments,
        )?;
        debug!(
            unit = %unit,
            dt_min = profile.dt_min,
            fraction = profile.fraction,
            duty = profile.duty,
            "pinch profile"
        );

        let (strategy, trials) = match &closure {
            Closure::Shot(sol) => {
                if let Some(t_min) = sol.medium_limit {
                    ctx.warn(SimWarning::MediumLimit {
                        unit: unit.clone(),
                        t: t_min,
                        t_min,
                    });
                }
                (Some(sol.strategy), sol.trials)
            }
            Closure::OverSpecified(_) => {
                ctx.warn(SimWarning::OverSpecified { unit: unit.clone() });
                (None, 0)
            }
            Closure::Balance(_) => (None, 0),
        };
        if profile.duty > 0.0 && (profile.dt_min - self.config.dt_min).abs() > PINCH_REPORT_TOL {
            ctx.warn(SimWarning::PinchNotEnforced {
                unit: unit.clone(),
                achieved: profile.dt_min,
                target: self.config.dt_min,
            });
        }

        ctx.publish(&PinchResult {
            strategy,
            trials,
            profile,
        })
    }
}

fn write_side(
    ctx: &mut CalcContext<'_>,
    inlet: NodeId,
    outlet: NodeId,
    p: Pressure,
    h: f64,
    mdot: f64,
) -> SimResult<()> {
    ctx.node_mut(inlet)?.set_mdot_kgps(mdot);
    ctx.node_mut(outlet)?.set_mdot_kgps(mdot);
    ctx.resolve_as(outlet, StateInput::PH { p, h })?;
    Ok(())
}
