//! Solar receiver with a fixed heat input.

use pc_core::units::Power;
use pc_fluids::StateInput;
use pc_graph::{Arity, CalcContext, SimError, SimResult, UnitOperation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::common::check_finite;
use crate::error::ComponentResult;

/// Published by [`Receiver`] under its unit name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiverResult {
    /// Heat absorbed by the stream [W]
    pub heat_input: f64,
    pub mdot: f64,
    /// Which quantity the balance was closed on
    pub solved: ReceiverUnknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiverUnknown {
    MassFlow,
    InletTemperature,
    OutletTemperature,
    /// Everything was given; the implied heat input is reported instead.
    HeatInput,
}

/// Heats a stream at constant pressure by a fixed duty `Q`.
///
/// `Q = mdot * (h_out - h_in)` is closed on whichever of the mass flow, the
/// inlet temperature or the outlet temperature is unknown.
#[derive(Debug, Clone)]
pub struct Receiver {
    heat_input: Power,
}

impl Receiver {
    pub fn new(heat_input: Power) -> ComponentResult<Self> {
        check_finite(heat_input.value, "receiver heat input")?;
        Ok(Self { heat_input })
    }

    pub fn heat_input(&self) -> Power {
        self.heat_input
    }
}

impl UnitOperation for Receiver {
    fn kind(&self) -> &'static str {
        "receiver"
    }

    fn arity(&self) -> Arity {
        Arity::new(1, 1)
    }

    fn calc(&self, ctx: &mut CalcContext<'_>) -> SimResult<()> {
        let n_in = ctx.inlet(0)?;
        let n_out = ctx.outlet(0)?;
        let q_in = self.heat_input.value;

        let p = ctx.require(n_in, "pressure", |n| n.p)?;
        ctx.try_resolve(n_in)?;
        let src = ctx.node(n_in)?.clone();
        let dst = ctx.node_mut(n_out)?;
        dst.inherit_tags(&src);
        dst.p = Some(p);
        ctx.try_resolve(n_out)?;
        let h_in = src.h;
        let out = ctx.node(n_out)?;
        let h_out = out.h;
        let m_known = src.mdot_kgps().or(out.mdot_kgps());

        let (mdot, heat_input, solved) = match (m_known, h_in, h_out) {
            (None, Some(h_in), Some(h_out)) => {
                let dh = h_out - h_in;
                if dh == 0.0 {
                    return Err(SimError::input(
                        ctx.name(),
                        "equal inlet and outlet temperatures leave the mass flow undefined",
                    ));
                }
                let m = q_in / dh;
                (m, q_in, ReceiverUnknown::MassFlow)
            }
            (Some(m), None, Some(h_out)) => {
                if m == 0.0 {
                    return Err(SimError::input(ctx.name(), "zero mass flow"));
                }
                ctx.resolve_as(n_in, StateInput::PH { p, h: h_out - q_in / m })?;
                (m, q_in, ReceiverUnknown::InletTemperature)
            }
            (Some(m), Some(h_in), None) => {
                if m == 0.0 {
                    return Err(SimError::input(ctx.name(), "zero mass flow"));
                }
                ctx.resolve_as(n_out, StateInput::PH { p, h: h_in + q_in / m })?;
                (m, q_in, ReceiverUnknown::OutletTemperature)
            }
            (Some(m), Some(h_in), Some(h_out)) => {
                (m, m * (h_out - h_in), ReceiverUnknown::HeatInput)
            }
            _ => {
                return Err(SimError::input(
                    ctx.name(),
                    "two of mass flow, inlet temperature and outlet temperature must be known",
                ));
            }
        };
        for id in [n_in, n_out] {
            ctx.node_mut(id)?.set_mdot_kgps(mdot);
        }
        debug!(unit = ctx.name(), ?solved, heat_input, mdot, "receiver balance");

        ctx.publish(&ReceiverResult {
            heat_input,
            mdot,
            solved,
        })
    }
}
