//! Integration tests for pc-components on a shared flowsheet graph.

use std::sync::Arc;

use pc_components::pinch::{ExchangerStream, Terminals, check};
use pc_components::{FlashResult, FlashSeparator, Mixer, PinchHex, PinchResult, Splitter, Valve};
use pc_core::units::{T_ZERO_K, bar, celsius, kgps};
use pc_fluids::{ConstantCpModel, IdealBinaryModel, StreamFluid};
use pc_graph::{FlowsheetGraph, SimError, SimWarning};
use proptest::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn graph() -> FlowsheetGraph {
    FlowsheetGraph::new(Arc::new(IdealBinaryModel::default()))
}

fn water_stream(t_c: f64, mdot: f64) -> ExchangerStream {
    let model = ConstantCpModel::new("water", 4180.0).unwrap();
    ExchangerStream {
        h_in: model.h_at(t_c + T_ZERO_K),
        fluid: StreamFluid::Secondary(model),
        p: bar(1.0),
        t_in: t_c + T_ZERO_K,
        mdot: Some(mdot),
    }
}

#[test]
fn constant_cp_profile_pinches_at_the_cold_end() {
    let oracle = IdealBinaryModel::default();
    let hot = water_stream(150.0, 1.0);
    let cold = water_stream(95.0, 50.0 / 45.0);
    let ends = Terminals {
        h_hot_out: 4180.0 * 100.0,
        h_cold_out: 4180.0 * 140.0,
        m_hot: 1.0,
        m_cold: 50.0 / 45.0,
    };

    for segments in [10, 20, 50] {
        let profile = check(&oracle, &hot, &cold, &ends, segments).unwrap();
        assert!((profile.dt_min - 5.0).abs() < 1e-9, "N = {segments}");
        assert_eq!(profile.fraction, 1.0);
        assert_eq!(profile.t_cold.len(), segments + 1);
    }
}

#[test]
fn profile_check_is_deterministic() {
    let oracle = IdealBinaryModel::default();
    let hot = water_stream(180.0, 2.0);
    let cold = water_stream(40.0, 1.5);
    let ends = Terminals {
        h_hot_out: 4180.0 * 120.0,
        h_cold_out: 4180.0 * 120.0,
        m_hot: 2.0,
        m_cold: 1.5,
    };
    let a = check(&oracle, &hot, &cold, &ends, 11).unwrap();
    let b = check(&oracle, &hot, &cold, &ends, 11).unwrap();
    assert_eq!(a, b);
}

#[test]
fn mixer_rejects_unequal_pressures_without_touching_the_outlet() {
    init_tracing();
    let mut g = graph();
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
        .set_p(bar(12.0))
        .set_t(celsius(30.0))
        .set_y(0.5)
        .set_mdot(kgps(1.0));

    assert!(matches!(g.calc("mix"), Err(SimError::Input { .. })));
    let out = g.get_node(3).unwrap();
    assert!(out.mdot.is_none());
    assert!(out.h.is_none());
}

#[test]
fn superheated_flash_sends_everything_overhead() {
    init_tracing();
    let mut g = graph();
    g.add_component("flash", FlashSeparator::new())
        .unwrap()
        .nodes([1], [2, 3])
        .unwrap();
    g.node(1)
        .set_p(bar(2.0))
        .set_t(celsius(250.0))
        .set_y(0.5)
        .set_mdot(kgps(1.0));
    g.calc("flash").unwrap();

    let vap = g.get_node(2).unwrap();
    assert_eq!(vap.mdot_kgps(), Some(1.0));
    assert!((vap.y.unwrap() - 0.5).abs() < 1e-5);
    assert_eq!(g.get_node(3).unwrap().mdot_kgps(), Some(0.0));
    assert!(matches!(g.warnings(), [SimWarning::QualityClamped { .. }]));
    let r: FlashResult = g.result("flash").unwrap();
    assert_eq!(r.quality, 1.0);
}

#[test]
fn throttle_then_cool_against_water() {
    init_tracing();
    let mut g = graph();
    g.add_component("v", Valve::new())
        .unwrap()
        .nodes([1], [2])
        .unwrap();
    g.add_component("hx", PinchHex::new())
        .unwrap()
        .nodes([2, 10], [3, 11])
        .unwrap();
    g.node(1)
        .set_p(bar(20.0))
        .set_t(celsius(40.0))
        .set_y(0.5)
        .set_mdot(kgps(0.5));
    g.node(2).set_p(bar(12.0));
    g.node(10)
        .set_cp(4180.0)
        .set_p(bar(2.0))
        .set_t(celsius(10.0))
        .set_mdot(kgps(1.0));
    g.calc_all(["v", "hx"]).unwrap();

    // still liquid after the valve, so the profile is linear and pinches
    // at the cold end
    assert!(g.get_node(2).unwrap().q.unwrap() < 0.0);
    let t_out = g.get_node(3).unwrap().t_k().unwrap();
    assert!((t_out - celsius(15.0).value).abs() < 0.1);
    let r: PinchResult = g.result("hx").unwrap();
    assert!((r.profile.dt_min - 5.0).abs() < 0.1);
    assert!(g.warnings().is_empty());

    // energy leaves the hot side and arrives on the cold side
    let h2 = g.get_node(2).unwrap().h.unwrap();
    let h3 = g.get_node(3).unwrap().h.unwrap();
    let h10 = g.get_node(10).unwrap().h.unwrap();
    let h11 = g.get_node(11).unwrap().h.unwrap();
    let q_hot = 0.5 * (h2 - h3);
    let q_cold = h11 - h10;
    assert!(q_hot > 0.0);
    assert!((q_hot - q_cold).abs() < 1e-6 * q_hot);
}

/// Flows for a three-port junction `total = a + b` with the one at index
/// `open` (0 = total, 1 = a, 2 = b) left unspecified.
fn two_of_three(total: f64, a: f64, b: f64, open: usize) -> [Option<f64>; 3] {
    let mut flows = [Some(total), Some(a), Some(b)];
    flows[open] = None;
    flows
}

proptest! {
    #[test]
    fn mixer_conserves_mass_and_species(
        m_a in 0.01f64..10.0,
        m_b in 0.01f64..10.0,
        y_a in 0.05f64..0.95,
        y_b in 0.05f64..0.95,
        open in 0usize..3,
    ) {
        let [m_out, m_1, m_2] = two_of_three(m_a + m_b, m_a, m_b, open);
        let mut g = graph();
        g.add_component("mix", Mixer::new()).unwrap().nodes([1, 2], [3]).unwrap();
        g.node(1).set_p(bar(10.0)).set_t(celsius(30.0)).set_y(y_a);
        g.node(2).set_p(bar(10.0)).set_t(celsius(30.0)).set_y(y_b);
        for (label, m) in [(1, m_1), (2, m_2), (3, m_out)] {
            if let Some(m) = m {
                g.node(label).set_mdot(kgps(m));
            }
        }
        g.calc("mix").unwrap();

        let flow = |label: i32| g.get_node(label).unwrap().mdot_kgps().unwrap();
        let (a, b, total) = (flow(1), flow(2), flow(3));
        prop_assert!((a + b - total).abs() <= 1e-9 * total);
        let out_y = g.get_node(3).unwrap().y.unwrap();
        prop_assert!((total * out_y - (a * y_a + b * y_b)).abs() <= 1e-9 * total);
    }

    #[test]
    fn splitter_outlets_sum_to_inlet(
        m_a in 0.01f64..10.0,
        m_b in 0.0f64..10.0,
        open in 0usize..3,
    ) {
        let [m_in, m_1, m_2] = two_of_three(m_a + m_b, m_a, m_b, open);
        let mut g = graph();
        g.add_component("split", Splitter::new()).unwrap().nodes([1], [2, 3]).unwrap();
        g.node(1).set_p(bar(10.0)).set_t(celsius(30.0)).set_y(0.5);
        for (label, m) in [(1, m_in), (2, m_1), (3, m_2)] {
            if let Some(m) = m {
                g.node(label).set_mdot(kgps(m));
            }
        }
        g.calc("split").unwrap();

        let flow = |label: i32| g.get_node(label).unwrap().mdot_kgps().unwrap();
        let (total, a, b) = (flow(1), flow(2), flow(3));
        prop_assert!((a + b - total).abs() <= 1e-9 * total);
        prop_assert_eq!(g.get_node(2).unwrap().h, g.get_node(1).unwrap().h);
        prop_assert_eq!(g.get_node(3).unwrap().h, g.get_node(1).unwrap().h);
    }
}
