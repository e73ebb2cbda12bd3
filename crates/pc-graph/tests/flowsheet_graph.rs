//! Integration tests for pc-graph with the bundled binary-mixture model.

use std::sync::Arc;

use pc_core::units::{bar, celsius, kgps};
use pc_fluids::{IdealBinaryModel, StateInput};
use pc_graph::{
    Arity, CalcContext, FlowsheetGraph, NodeLabel, SimError, SimResult, SimWarning, UnitOperation,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Heats its inlet to a fixed outlet temperature at constant pressure and
/// flags a superheated exit so the warning path gets exercised.
struct Heater {
    t_out_c: f64,
}

impl UnitOperation for Heater {
    fn kind(&self) -> &'static str {
        "heater"
    }

    fn arity(&self) -> Arity {
        Arity::new(1, 1)
    }

    fn calc(&self, ctx: &mut CalcContext<'_>) -> SimResult<()> {
        let n_in = ctx.inlet(0)?;
        let n_out = ctx.outlet(0)?;
        let inlet = ctx.resolve(n_in)?;
        let mdot = ctx.require(n_in, "mass flow", |n| n.mdot_kgps())?;
        let src = ctx.node(n_in)?.clone();
        {
            let out = ctx.node_mut(n_out)?;
            out.inherit_tags(&src);
            out.set_mdot_kgps(mdot);
        }
        let outlet = ctx.resolve_as(
            n_out,
            StateInput::PT {
                p: inlet.p,
                t: celsius(self.t_out_c),
            },
        )?;
        if outlet.q.is_some_and(|q| q > 1.0) {
            ctx.warn(SimWarning::OverSpecified {
                unit: ctx.name().to_string(),
            });
        }
        ctx.publish(&(mdot * (outlet.h - inlet.h)))
    }
}

fn build() -> FlowsheetGraph {
    let mut g = FlowsheetGraph::new(Arc::new(IdealBinaryModel::default()));
    g.add_component("pre", Heater { t_out_c: 80.0 })
        .unwrap()
        .nodes(["feed"], [2])
        .unwrap();
    g.add_component("boil", Heater { t_out_c: 220.0 })
        .unwrap()
        .nodes([2], [3])
        .unwrap();
    g.node("feed")
        .set_p(bar(10.0))
        .set_t(celsius(40.0))
        .set_y(0.5)
        .set_mdot(kgps(2.0));
    g
}

#[test]
fn chain_propagates_state_and_results() {
    init_tracing();
    let mut g = build();
    g.calc_all(["pre", "boil"]).unwrap();

    let out = g.get_node(3).unwrap();
    assert_eq!(out.y, Some(0.5));
    assert_eq!(out.mdot_kgps(), Some(2.0));
    assert!(out.q.unwrap() > 1.0, "superheated at 220 C");

    let q_pre: f64 = g.result("pre").unwrap();
    let q_boil: f64 = g.result("boil").unwrap();
    assert!(q_pre > 0.0 && q_boil > q_pre);
    assert_eq!(g.warnings().len(), 1);
}

#[test]
fn fresh_graphs_evaluate_identically() {
    let mut a = build();
    let mut b = build();
    a.calc_all(["pre", "boil"]).unwrap();
    b.calc_all(["pre", "boil"]).unwrap();
    assert_eq!(a.node_table(), b.node_table());
}

#[test]
fn missing_composition_is_reported() {
    let mut g = FlowsheetGraph::new(Arc::new(IdealBinaryModel::default()));
    g.add_component("pre", Heater { t_out_c: 80.0 })
        .unwrap()
        .nodes([1], [2])
        .unwrap();
    g.node(1).set_p(bar(10.0)).set_t(celsius(40.0));
    let err = g.calc("pre").unwrap_err();
    assert!(matches!(err, SimError::Missing { .. }), "{err}");
}

#[test]
fn export_contains_nodes_results_and_warnings() {
    let mut g = build();
    g.calc_all(["pre", "boil"]).unwrap();
    let export = g.export();
    assert_eq!(export.nodes.len(), 3);
    assert_eq!(export.nodes[0].label, NodeLabel::Index(2));
    assert_eq!(export.nodes[0].producer.as_deref(), Some("pre"));
    assert!(export.results.contains_key("boil"));
    let json = g.export_json().unwrap();
    assert_eq!(json["warnings"][0]["kind"], "over_specified");
}
