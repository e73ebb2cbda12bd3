//! Adiabatic two-stream mixer.

use pc_fluids::StateInput;
use pc_graph::{Arity, CalcContext, SimError, SimResult, UnitOperation};

use crate::common::{flow_balance, pressures_match, weighted_mean};

/// Two inlets at the same pressure mixed into one outlet.
///
/// Any two of the three mass flows determine the third, which is written
/// back to its node. Outlet composition and enthalpy are flow-weighted
/// averages of the inlets.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mixer;

impl Mixer {
    pub fn new() -> Self {
        Self
    }
}

impl UnitOperation for Mixer {
    fn kind(&self) -> &'static str {
        "mixer"
    }

    fn arity(&self) -> Arity {
        Arity::new(2, 1)
    }

    fn calc(&self, ctx: &mut CalcContext<'_>) -> SimResult<()> {
        let n_a = ctx.inlet(0)?;
        let n_b = ctx.inlet(1)?;
        let n_out = ctx.outlet(0)?;

        let p_a = ctx.require(n_a, "pressure", |n| n.p)?;
        let p_b = ctx.require(n_b, "pressure", |n| n.p)?;
        if !pressures_match(p_a.value, p_b.value) {
            return Err(SimError::input(
                ctx.name(),
                format!(
                    "inlet pressures differ: {} Pa and {} Pa",
                    p_a.value, p_b.value
                ),
            ));
        }

        let (m_out, m_a, m_b) = flow_balance(
            ctx.name(),
            ctx.node(n_out)?.mdot_kgps(),
            ctx.node(n_a)?.mdot_kgps(),
            ctx.node(n_b)?.mdot_kgps(),
        )?;

        let h_a = ctx.resolve(n_a)?.h;
        let h_b = ctx.resolve(n_b)?.h;
        let a = ctx.node(n_a)?.clone();
        let b = ctx.node(n_b)?.clone();
        let y = match (a.y, b.y) {
            (Some(y_a), Some(y_b)) => Some(weighted_mean(m_a, y_a, m_b, y_b)),
            _ => None,
        };
        let h = weighted_mean(m_a, h_a, m_b, h_b);

        for (id, m) in [(n_a, m_a), (n_b, m_b)] {
            let node = ctx.node_mut(id)?;
            if node.mdot.is_none() {
                node.set_mdot_kgps(m);
            }
        }
        let dst = ctx.node_mut(n_out)?;
        dst.inherit_tags(&a);
        dst.y = y;
        dst.set_mdot_kgps(m_out);
        ctx.resolve_as(n_out, StateInput::PH { p: p_a, h })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::binary_graph;
    use pc_core::units::{bar, celsius, kgps};

    #[test]
    fn mixes_composition_and_enthalpy_by_flow() {
        let mut g = binary_graph();
        g.add_component("mix", Mixer::new())
            .unwrap()
            .nodes([1, 2], [3])
            .unwrap();
        g.node(1)
            .set_p(bar(10.0))
            .set_t(celsius(30.0))
            .set_y(0.3)
            .set_mdot(kgps(1.0));
        g.node(2)
            .set_p(bar(10.0))
            .set_t(celsius(50.0))
            .set_y(0.6)
            .set_mdot(kgps(3.0));
        g.calc("mix").unwrap();

        let h1 = g.get_node(1).unwrap().h.unwrap();
        let h2 = g.get_node(2).unwrap().h.unwrap();
        let n3 = g.get_node(3).unwrap();
        assert_eq!(n3.mdot_kgps(), Some(4.0));
        assert!((n3.y.unwrap() - 0.525).abs() < 1e-12);
        assert!((n3.h.unwrap() - (h1 + 3.0 * h2) / 4.0).abs() < 1e-6);
        assert!(n3.t.is_some());
    }

    #[test]
    fn solves_a_missing_inlet_flow() {
        let mut g = binary_graph();
        g.add_component("mix", Mixer::new())
            .unwrap()
            .nodes([1, 2], [3])
            .unwrap();
        g.node(1).set_p(bar(10.0)).set_t(celsius(30.0)).set_y(0.5);
        g.node(2)
            .set_p(bar(10.0))
            .set_t(celsius(30.0))
            .set_y(0.5)
            .set_mdot(kgps(0.5));
        g.node(3).set_mdot(kgps(2.0));
        g.calc("mix").unwrap();
        assert_eq!(g.get_node(3).unwrap().mdot_kgps(), Some(2.0));
        assert_eq!(g.get_node(1).unwrap().mdot_kgps(), Some(1.5));
    }

    #[test]
    fn unequal_pressures_leave_outlet_untouched() {
        let mut g = binary_graph();
        g.add_component("mix", Mixer::new())
            .unwrap()
            .nodes([1, 2], [3])
            .unwrap();
        g.node(1)
            .set_p(bar(10.0))
            .set_t(celsius(30.0))
            .set_y(0.5)
            .set_mdot(kgps(1.0));
        g.node(2)
            .set_p(bar(9.0))
            .set_t(celsius(30.0))
            .set_y(0.5)
            .set_mdot(kgps(1.0));
        let before = g.get_node(3).unwrap().clone();
        assert!(matches!(g.calc("mix"), Err(SimError::Input { .. })));
        assert_eq!(g.get_node(3).unwrap(), &before);
    }

    #[test]
    fn zero_total_flow_uses_plain_mean() {
        let mut g = binary_graph();
        g.add_component("mix", Mixer::new())
            .unwrap()
            .nodes([1, 2], [3])
            .unwrap();
        for (label, y) in [(1, 0.2), (2, 0.4)] {
            g.node(label)
                .set_p(bar(10.0))
                .set_t(celsius(30.0))
                .set_y(y)
                .set_mdot(kgps(0.0));
        }
        g.calc("mix").unwrap();
        assert!((g.get_node(3).unwrap().y.unwrap() - 0.3).abs() < 1e-12);
    }
}
