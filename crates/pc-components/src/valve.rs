//! Throttling valve.

use pc_fluids::StateInput;
use pc_graph::{Arity, CalcContext, SimError, SimResult, UnitOperation};

/// Isenthalpic expansion to a pressure set on the outlet node.
///
/// Mass flow and composition pass through unchanged. The outlet pressure is a
/// boundary condition supplied by the caller and must not exceed the inlet
/// pressure.
#[derive(Debug, Clone, Copy, Default)]
pub struct Valve;

impl Valve {
    pub fn new() -> Self {
        Self
    }
}

impl UnitOperation for Valve {
    fn kind(&self) -> &'static str {
        "valve"
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
                format!(
                    "outlet pressure {} Pa above inlet pressure {} Pa",
                    p_out.value, st_in.p.value
                ),
            ));
        }

        let src = ctx.node(n_in)?.clone();
        let dst = ctx.node_mut(n_out)?;
        dst.inherit_tags(&src);
        dst.mdot = src.mdot;
        ctx.resolve_as(n_out, StateInput::PH { p: p_out, h: st_in.h })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::binary_graph;
    use pc_core::units::{bar, celsius, kgps};

    #[test]
    fn throttling_keeps_enthalpy_and_flow() {
        let mut g = binary_graph();
        g.add_component("v", Valve::new()).unwrap().nodes([1], [2]).unwrap();
        g.node(1)
            .set_p(bar(20.0))
            .set_t(celsius(80.0))
            .set_y(0.5)
            .set_mdot(kgps(1.2));
        g.node(2).set_p(bar(5.0));
        g.calc("v").unwrap();

        let n1 = g.get_node(1).unwrap().clone();
        let n2 = g.get_node(2).unwrap();
        assert!((n2.h.unwrap() - n1.h.unwrap()).abs() < 1e-3);
        assert_eq!(n2.mdot_kgps(), Some(1.2));
        assert_eq!(n2.y, Some(0.5));
        // flashing across the valve cools the stream
        assert!(n2.t_k().unwrap() < n1.t_k().unwrap());
    }

    #[test]
    fn missing_outlet_pressure_is_an_input_error() {
        let mut g = binary_graph();
        g.add_component("v", Valve::new()).unwrap().nodes([1], [2]).unwrap();
        g.node(1).set_p(bar(20.0)).set_t(celsius(80.0)).set_y(0.5);
        assert!(matches!(g.calc("v"), Err(SimError::Input { .. })));

        g.node(2).set_p(bar(30.0));
        assert!(matches!(g.calc("v"), Err(SimError::Input { .. })));
    }
}
