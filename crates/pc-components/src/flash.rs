//! Flash separator: splits a two-phase stream into saturated vapour and
//! liquid.

use pc_core::ConvergenceVariable;
use pc_core::units::{Pressure, Temperature};
use pc_fluids::{FluidResult, PropertyOracle, StateInput};
use pc_graph::{Arity, CalcContext, SimError, SimResult, SimWarning, UnitOperation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ComponentError, ComponentResult};

/// Species-balance correction settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlashConfig {
    /// Absolute closure of the light-component balance [mass fraction]
    pub tolerance: f64,
    /// Correction steps before the best value found is accepted
    pub max_iter: usize,
}

impl Default for FlashConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-5,
            max_iter: 10,
        }
    }
}

/// Published by [`FlashSeparator`] under its unit name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlashResult {
    /// Inlet quality as resolved, before clamping
    pub quality_raw: f64,
    pub quality: f64,
    pub y_vap: f64,
    pub y_liq: f64,
    /// Light-component imbalance per unit inlet flow
    pub balance_residual: f64,
    pub iterations: usize,
}

/// Adiabatic flash drum.
///
/// Outlet 0 carries the vapour (flow `q·m` at the dew-side composition),
/// outlet 1 the liquid (flow `(1 - q)·m` at the bubble-side composition).
/// An inlet outside the dome is clamped to the nearest edge with a warning.
#[derive(Debug, Clone, Default)]
pub struct FlashSeparator {
    config: FlashConfig,
}

impl FlashSeparator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FlashConfig) -> ComponentResult<Self> {
        if !config.tolerance.is_finite() || config.tolerance <= 0.0 {
            return Err(ComponentError::InvalidArg {
                what: "flash tolerance must be positive",
            });
        }
        if config.max_iter == 0 {
            return Err(ComponentError::InvalidArg {
                what: "flash needs at least one correction step",
            });
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &FlashConfig {
        &self.config
    }

    /// Nudge the vapour composition until the light-component balance over
    /// the drum closes, starting from the dew-side edge. Returns the best
    /// composition found, its residual and the number of trials.
    fn close_balance(
        &self,
        name: &str,
        oracle: &dyn PropertyOracle,
        drum: &Drum,
        start: f64,
    ) -> SimResult<(f64, f64, usize)> {
        let tol = self.config.tolerance;
        let mut var =
            ConvergenceVariable::new(format!("{name} vapour composition"), 0.0, 1.0, tol)?;
        let mut guess = start;
        let (mut y, mut residual) = drum.imbalance(oracle, guess)?;
        let mut best = (y, residual);
        let mut steps = 1;
        var.record(guess, residual);
        debug!(unit = name, step = steps, guess, residual, "flash balance");

        while residual.abs() > tol && steps < self.config.max_iter {
            guess = var.optimize(guess, false);
            (y, residual) = drum.imbalance(oracle, guess)?;
            var.record(guess, residual);
            steps += 1;
            debug!(unit = name, step = steps, guess, residual, "flash balance");
            if residual.abs() < best.1.abs() {
                best = (y, residual);
            }
        }
        Ok((best.0, best.1, steps))
    }
}

/// Drum conditions the outlets are resolved at.
struct Drum {
    p: Pressure,
    t: Temperature,
    z: f64,
    quality: f64,
    y_liq: f64,
}

impl Drum {
    /// Light-component imbalance per unit inlet flow when the vapour outlet
    /// is resolved at composition `y_vap`. Returns the composition the
    /// oracle reports along with the imbalance.
    fn imbalance(&self, oracle: &dyn PropertyOracle, y_vap: f64) -> FluidResult<(f64, f64)> {
        let st = oracle.resolve(StateInput::PT { p: self.p, t: self.t }, y_vap)?;
        let residual = self.z - self.quality * st.y - (1.0 - self.quality) * self.y_liq;
        Ok((st.y, residual))
    }
}

impl UnitOperation for FlashSeparator {
    fn kind(&self) -> &'static str {
        "flash"
    }

    fn arity(&self) -> Arity {
        Arity::new(1, 2)
    }

    fn calc(&self, ctx: &mut CalcContext<'_>) -> SimResult<()> {
        let n_in = ctx.inlet(0)?;
        let n_vap = ctx.outlet(0)?;
        let n_liq = ctx.outlet(1)?;

        let st = ctx.resolve(n_in)?;
        let m = ctx.require(n_in, "mass flow", |n| n.mdot_kgps())?;
        let quality_raw = st
            .q
            .ok_or_else(|| SimError::input(ctx.name(), "inlet has no vapour quality"))?;
        let quality = quality_raw.clamp(0.0, 1.0);
        let clamped = quality != quality_raw;
        if clamped {
            ctx.warn(SimWarning::QualityClamped {
                unit: ctx.name().to_string(),
                quality: quality_raw,
            });
        }

        let z = st.y;
        let (mut y_vap, y_liq) = if clamped {
            (z, z)
        } else {
            (st.y_vap.unwrap_or(z), st.y_liq.unwrap_or(z))
        };
        let m_vap = quality * m;
        let m_liq = m - m_vap;

        let mut balance_residual = 0.0;
        let mut iterations = 0;
        if m > 0.0 {
            let drum = Drum {
                p: st.p,
                t: st.t,
                z,
                quality,
                y_liq,
            };
            let oracle = ctx.oracle();
            let (y, residual, steps) =
                self.close_balance(ctx.name(), oracle.as_ref(), &drum, y_vap)?;
            y_vap = y;
            balance_residual = residual;
            iterations = steps;
            if balance_residual.abs() > self.config.tolerance {
                ctx.warn(SimWarning::FlashBalanceNotClosed {
                    unit: ctx.name().to_string(),
                    residual: balance_residual,
                });
            }
        }

        for (id, y, flow) in [(n_vap, y_vap, m_vap), (n_liq, y_liq, m_liq)] {
            let dst = ctx.node_mut(id)?;
            dst.y = Some(y);
            dst.set_mdot_kgps(flow);
            ctx.resolve_as(id, StateInput::PT { p: st.p, t: st.t })?;
        }

        ctx.publish(&FlashResult {
            quality_raw,
            quality,
            y_vap,
            y_liq,
            balance_residual,
            iterations,
        })
    }
}
