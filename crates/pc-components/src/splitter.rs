//! Two-way flow splitter.

use pc_graph::{Arity, CalcContext, SimResult, UnitOperation};

use crate::common::flow_balance;

/// One inlet divided into two outlets of identical state.
///
/// Only the mass flow differs between the outlets. Any two of the three
/// flows determine the third, which is written back to its node.
#[derive(Debug, Clone, Copy, Default)]
pub struct Splitter;

impl Splitter {
    pub fn new() -> Self {
        Self
    }
}

impl UnitOperation for Splitter {
    fn kind(&self) -> &'static str {
        "splitter"
    }

    fn arity(&self) -> Arity {
        Arity::new(1, 2)
    }

    fn calc(&self, ctx: &mut CalcContext<'_>) -> SimResult<()> {
        let n_in = ctx.inlet(0)?;
        let n_a = ctx.outlet(0)?;
        let n_b = ctx.outlet(1)?;

        let (m_in, m_a, m_b) = flow_balance(
            ctx.name(),
            ctx.node(n_in)?.mdot_kgps(),
            ctx.node(n_a)?.mdot_kgps(),
            ctx.node(n_b)?.mdot_kgps(),
        )?;

        ctx.resolve(n_in)?;
        let src = ctx.node(n_in)?.clone();
        for (id, m) in [(n_a, m_a), (n_b, m_b)] {
            let dst = ctx.node_mut(id)?;
            dst.copy_intensive(&src);
            dst.set_mdot_kgps(m);
        }
        if src.mdot.is_none() {
            ctx.node_mut(n_in)?.set_mdot_kgps(m_in);
        }
        Ok(())
    }
}
