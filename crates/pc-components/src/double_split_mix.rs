//! Split two streams and remix them at requested compositions.

use pc_core::numeric::nearly_equal;
use pc_fluids::StateInput;
use pc_graph::{Arity, CalcContext, SimError, SimResult, SimWarning, UnitOperation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::common::{FLOW_TOL, pressures_match, weighted_mean};

/// Published by [`DoubleSplitMix`] under its unit name.
///
/// `a1` is the flow drawn from inlet A into outlet 1, and so on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoubleSplitMixResult {
    pub a1: f64,
    pub b1: f64,
    pub a2: f64,
    pub b2: f64,
    /// Outlet compositions after the species balance
    pub y1: f64,
    pub y2: f64,
}

/// Two inlets `[a, b]` at equal pressure recombined into two outlets
/// `[1, 2]` whose compositions are set by the caller.
///
/// ```text
/// m1 + m2       = m_a + m_b
/// m1*y1 + m2*y2 = m_a*y_a + m_b*y_b
/// a1 = m1 * (y1 - y_b) / (y_a - y_b),  b1 = m1 - a1
/// ```
///
/// Outlet flows left open are solved from the two balances. When both are
/// given and the species balance does not close, outlet 2's composition is
/// corrected. The warning is raised only once the split is known to be
/// reachable.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleSplitMix;

impl DoubleSplitMix {
    pub fn new() -> Self {
        Self
    }
}

impl UnitOperation for DoubleSplitMix {
    fn kind(&self) -> &'static str {
        "double_split_mix"
    }

    fn arity(&self) -> Arity {
        Arity::new(2, 2)
    }

    fn calc(&self, ctx: &mut CalcContext<'_>) -> SimResult<()> {
        let n_a = ctx.inlet(0)?;
        let n_b = ctx.inlet(1)?;
        let n_1 = ctx.outlet(0)?;
        let n_2 = ctx.outlet(1)?;
        let unit = ctx.name().to_string();

        let p = ctx.require(n_a, "pressure", |n| n.p)?;
        let p_b = ctx.require(n_b, "pressure", |n| n.p)?;
        if !pressures_match(p.value, p_b.value) {
            return Err(SimError::input(
                &unit,
                format!("inlet pressures differ: {} Pa and {} Pa", p.value, p_b.value),
            ));
        }

        let m_a = ctx.require(n_a, "mass flow", |n| n.mdot_kgps())?;
        let m_b = ctx.require(n_b, "mass flow", |n| n.mdot_kgps())?;
        let y_a = ctx.require(n_a, "composition", |n| n.y)?;
        let y_b = ctx.require(n_b, "composition", |n| n.y)?;
        let y1 = ctx.require(n_1, "composition", |n| n.y)?;
        let mut y2 = ctx.require(n_2, "composition", |n| n.y)?;
        let h_a = ctx.resolve(n_a)?.h;
        let h_b = ctx.resolve(n_b)?.h;

        let total = m_a + m_b;
        let species = m_a * y_a + m_b * y_b;
        let (m1, m2) = match (ctx.node(n_1)?.mdot_kgps(), ctx.node(n_2)?.mdot_kgps()) {
            (None, None) => {
                if y1 == y2 {
                    return Err(SimError::input(
                        &unit,
                        "equal outlet compositions leave the split undefined",
                    ));
                }
                let m1 = (species - total * y2) / (y1 - y2);
                (m1, total - m1)
            }
            (Some(m1), None) => (m1, total - m1),
            (None, Some(m2)) => (total - m2, m2),
            (Some(m1), Some(m2)) => {
                if !nearly_equal(m1 + m2, total, FLOW_TOL) {
                    return Err(SimError::input(
                        &unit,
                        format!("outlet flows {m1} + {m2} do not match inlet total {total}"),
                    ));
                }
                (m1, m2)
            }
        };
        if m1 < -FLOW_TOL.abs || m2 < -FLOW_TOL.abs {
            return Err(SimError::input(
                &unit,
                format!("requested compositions need negative outlet flows ({m1}, {m2})"),
            ));
        }

        let mut mismatch = None;
        if m2 > 0.0 && !nearly_equal(m1 * y1 + m2 * y2, species, FLOW_TOL) {
            let expected = (species - m1 * y1) / m2;
            mismatch = Some(SimWarning::CompositionMismatch {
                unit: unit.clone(),
                node: ctx.label(n_2),
                expected,
                actual: y2,
            });
            y2 = expected;
        }

        let a1 = if y_a == y_b {
            if total > 0.0 { m1 * m_a / total } else { 0.0 }
        } else {
            m1 * (y1 - y_b) / (y_a - y_b)
        };
        let b1 = m1 - a1;
        let (a2, b2) = (m_a - a1, m_b - b1);
        let eps = FLOW_TOL.abs + FLOW_TOL.rel * total;
        if [a1, b1, a2, b2].iter().any(|&m| m < -eps) {
            return Err(SimError::input(
                &unit,
                format!("outlet compositions {y1} and {y2} cannot be reached from {y_a} and {y_b}"),
            ));
        }
        debug!(unit = %unit, a1, b1, a2, b2, "double split");

        let src = ctx.node(n_a)?.clone();
        for (id, y, flow, h) in [
            (n_1, y1, m1, weighted_mean(a1, h_a, b1, h_b)),
            (n_2, y2, m2, weighted_mean(a2, h_a, b2, h_b)),
        ] {
            let dst = ctx.node_mut(id)?;
            dst.inherit_tags(&src);
            dst.y = Some(y);
            dst.set_mdot_kgps(flow);
            ctx.resolve_as(id, StateInput::PH { p, h })?;
        }
        if let Some(warning) = mismatch {
            ctx.warn(warning);
        }

        ctx.publish(&DoubleSplitMixResult {
            a1,
            b1,
            a2,
            b2,
            y1,
            y2,
        })
    }
}
