//! Liquid feed pump.

use pc_fluids::StateInput;
use pc_graph::{Arity, CalcContext, SimError, SimResult, SimWarning, UnitOperation};
use serde::{Deserialize, Serialize};

use crate::common::check_efficiency;
use crate::error::ComponentResult;

/// Inlet quality above this is reported as vapour at the pump suction.
const LIQUID_QUALITY_EPS: f64 = 1e-6;

/// Published by [`Pump`] under its unit name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PumpResult {
    /// Shaft power absorbed [W], if the mass flow is known
    pub power: Option<f64>,
    pub h_isentropic: f64,
}

/// Adiabatic compression of a liquid to a pressure set on the outlet node.
///
/// ```text
/// h_s   = h(p_out, s_in)
/// h_out = h_in + (h_s - h_in) / eta
/// ```
///
/// The default efficiency of 1 gives the ideal isentropic pump.
#[derive(Debug, Clone)]
pub struct Pump {
    /// Isentropic efficiency (0 < eta <= 1)
    pub eta: f64,
}

impl Default for Pump {
    fn default() -> Self {
        Self { eta: 1.0 }
    }
}

impl Pump {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_efficiency(eta: f64) -> ComponentResult<Self> {
        Ok(Self {
            eta: check_efficiency(eta, "pump efficiency must be in (0,1]")?,
        })
    }
}

impl UnitOperation for Pump {
    fn kind(&self) -> &'static str {
        "pump"
    }

    fn arity(&self) -> Arity {
        Arity::new(1, 1)
    }

    fn calc(&self, ctx: &mut CalcContext<'_>) -> SimResult<()> {
        let n_in = ctx.inlet(0)?;
        let n_out = ctx.outlet(0)?;

        let st_in = ctx.resolve(n_in)?;
        if let Some(q) = st_in.q.filter(|&q| q > LIQUID_QUALITY_EPS) {
            ctx.warn(SimWarning::PumpInletNotLiquid {
                unit: ctx.name().to_string(),
                quality: q,
            });
        }
        let p_out = ctx
            .node(n_out)?
            .p
            .ok_or_else(|| SimError::input(ctx.name(), "outlet pressure must be set"))?;
        if p_out.value < st_in.p.value {
            return Err(SimError::input(
                ctx.name(),
                "outlet pressure below inlet pressure",
            ));
        }

        let fluid = ctx.fluid(n_in)?;
        let oracle = ctx.oracle();
        let h_isentropic = fluid
            .resolve(oracle.as_ref(), StateInput::PS { p: p_out, s: st_in.s })?
            .h;
        let h_out = st_in.h + (h_isentropic - st_in.h) / self.eta;

        let src = ctx.node(n_in)?.clone();
        let dst = ctx.node_mut(n_out)?;
        dst.inherit_tags(&src);
        dst.mdot = src.mdot;
        ctx.resolve_as(n_out, StateInput::PH { p: p_out, h: h_out })?;

        ctx.publish(&PumpResult {
            power: src.mdot_kgps().map(|m| m * (h_out - st_in.h)),
            h_isentropic,
        })
    }
}
