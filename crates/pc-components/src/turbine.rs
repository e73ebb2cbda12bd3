//! Expansion turbine.

use pc_fluids::StateInput;
use pc_graph::{Arity, CalcContext, SimError, SimResult, SimWarning, UnitOperation};
use serde::{Deserialize, Serialize};

use crate::common::{check_efficiency, check_finite};
use crate::error::ComponentResult;

/// Exit quality below which blade erosion becomes a concern.
pub const DEFAULT_MOISTURE_LIMIT: f64 = 0.85;

/// Published by [`Turbine`] under its unit name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurbineResult {
    /// Shaft power delivered [W], if the mass flow is known
    pub power: Option<f64>,
    /// Isentropic outlet enthalpy [J/kg]
    pub h_isentropic: f64,
    pub exit_quality: Option<f64>,
}

/// Adiabatic expansion to a pressure set on the outlet node.
///
/// ## Model
///
/// ```text
/// h_s   = h(p_out, s_in)
/// h_out = h_in - eta * (h_in - h_s)
/// W     = mdot * (h_in - h_out)
/// ```
///
/// `eta = 1` reproduces the isentropic expansion.
#[derive(Debug, Clone)]
pub struct Turbine {
    /// Isentropic efficiency (0 < eta <= 1)
    pub eta: f64,
    /// Exit quality that triggers a moisture warning
    pub moisture_limit: f64,
}

impl Default for Turbine {
    fn default() -> Self {
        Self {
            eta: 1.0,
            moisture_limit: DEFAULT_MOISTURE_LIMIT,
        }
    }
}

impl Turbine {
    /// Isentropic turbine.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_efficiency(eta: f64) -> ComponentResult<Self> {
        Ok(Self {
            eta: check_efficiency(eta, "turbine efficiency must be in (0,1]")?,
            ..Self::default()
        })
    }

    pub fn with_moisture_limit(mut self, limit: f64) -> ComponentResult<Self> {
        self.moisture_limit = check_finite(limit, "moisture limit")?;
        Ok(self)
    }
}

impl UnitOperation for Turbine {
    fn kind(&self) -> &'static str {
        "turbine"
    }

    fn arity(&self) -> Arity {
        Arity::new(1, 1)
    }

    fn calc(&self, ctx: &mut CalcContext<'_>) -> SimResult<()> {
        let n_in = ctx.inlet(0)?;
        let n_out = ctx.outlet(0)?;

        let st_in = ctx.resolve(n_in)?;
        let p_out = ctx
            .node(n_out)?
            .p
            .ok_or_else(|| SimError::input(ctx.name(), "outlet pressure must be set"))?;
        if p_out.value > st_in.p.value {
            return Err(SimError::input(
                ctx.name(),
                "outlet pressure above inlet pressure",
            ));
        }

        let fluid = ctx.fluid(n_in)?;
        let oracle = ctx.oracle();
        let h_isentropic = fluid
            .resolve(oracle.as_ref(), StateInput::PS { p: p_out, s: st_in.s })?
            .h;
        let h_out = st_in.h - self.eta * (st_in.h - h_isentropic);

        let src = ctx.node(n_in)?.clone();
        let dst = ctx.node_mut(n_out)?;
        dst.inherit_tags(&src);
        dst.mdot = src.mdot;
        let st_out = ctx.resolve_as(n_out, StateInput::PH { p: p_out, h: h_out })?;

        // Sub-cooled exits report negative quality and carry no moisture.
        if let Some(q) = st_out.q.filter(|&q| (0.0..self.moisture_limit).contains(&q)) {
            ctx.warn(SimWarning::ExcessMoisture {
                unit: ctx.name().to_string(),
                quality: q,
                limit: self.moisture_limit,
            });
        }

        ctx.publish(&TurbineResult {
            power: src.mdot_kgps().map(|m| m * (st_in.h - h_out)),
            h_isentropic,
            exit_quality: st_out.q,
        })
    }
}
