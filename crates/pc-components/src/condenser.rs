//! Total condenser.

use pc_fluids::StateInput;
use pc_graph::{Arity, CalcContext, SimResult, UnitOperation};
use serde::{Deserialize, Serialize};

/// Published by [`Condenser`] under its unit name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CondenserResult {
    /// Heat removed from the stream [W], if the mass flow is known
    pub heat_rejected: Option<f64>,
    /// Bubble-point temperature at the condenser pressure [K]
    pub t_saturation: f64,
    pub subcooled_inlet: bool,
}

/// Condenses a stream to saturated liquid at its own pressure.
///
/// A stream that arrives already sub-cooled passes through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Condenser;

impl Condenser {
    pub fn new() -> Self {
        Self
    }
}

impl UnitOperation for Condenser {
    fn kind(&self) -> &'static str {
        "condenser"
    }

    fn arity(&self) -> Arity {
        Arity::new(1, 1)
    }

    fn calc(&self, ctx: &mut CalcContext<'_>) -> SimResult<()> {
        let n_in = ctx.inlet(0)?;
        let n_out = ctx.outlet(0)?;

        let st_in = ctx.resolve(n_in)?;
        let fluid = ctx.fluid(n_in)?;
        let oracle = ctx.oracle();
        let sat = fluid.resolve(oracle.as_ref(), StateInput::PQ { p: st_in.p, q: 0.0 })?;
        let subcooled_inlet = st_in.t.value < sat.t.value;

        let src = ctx.node(n_in)?.clone();
        let dst = ctx.node_mut(n_out)?;
        dst.inherit_tags(&src);
        dst.mdot = src.mdot;
        let h_out = if subcooled_inlet {
            ctx.resolve_as(n_out, StateInput::PH { p: st_in.p, h: st_in.h })?.h
        } else {
            ctx.resolve_as(n_out, StateInput::PQ { p: st_in.p, q: 0.0 })?.h
        };

        ctx.publish(&CondenserResult {
            heat_rejected: src.mdot_kgps().map(|m| m * (st_in.h - h_out)),
            t_saturation: sat.t.value,
            subcooled_inlet,
        })
    }
}
