//! End-to-end convergence of a flowsheet with two recycle unknowns.
//!
//! ```text
//! feed ──► mix ──► rcv ──► flash ──► vapour
//!           ▲                 │
//!           │              liquid ──► split ──► purge
//!           │                           │
//!      recycle (tear)     recycle_out ◄─ cooler ◄── loop
//!                                         ▲
//!                                      coolant
//! ```
//!
//! The recycle stream's composition and temperature are torn: each pass
//! writes the guesses onto `recycle` and compares them with what arrives at
//! `recycle_out`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use pc_components::{FlashSeparator, Mixer, PinchHex, Receiver, Splitter};
use pc_core::units::{bar, celsius, k, kgps, watts};
use pc_fluids::IdealBinaryModel;
use pc_graph::{FlowsheetGraph, SimError, SimResult};
use pc_solver::{
    ConvergenceEngine, EngineEvent, EngineStatus, Flowsheet, Residuals, SolverError, TearGuesses,
    TearVariable,
};

const ORDER: [&str; 5] = ["mix", "rcv", "flash", "split", "cooler"];
const RECYCLE_FLOW: f64 = 0.3;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

struct RecycleLoop {
    oracle: Arc<IdealBinaryModel>,
    /// Pressure of the torn stream [bar]
    recycle_bar: f64,
}

impl Default for RecycleLoop {
    fn default() -> Self {
        Self {
            oracle: Arc::new(IdealBinaryModel::default()),
            recycle_bar: 10.0,
        }
    }
}

impl Flowsheet for RecycleLoop {
    fn tears(&self) -> Vec<TearVariable> {
        vec![
            TearVariable::new("recycle y", 0.2, 0.0, 1.0, 1e-6),
            TearVariable::new("recycle t", celsius(45.0).value, 250.0, 500.0, 1e-6),
        ]
    }

    fn build(&self) -> SimResult<FlowsheetGraph> {
        let mut g = FlowsheetGraph::new(self.oracle.clone());
        g.add_component("mix", Mixer::new())?
            .nodes(["feed", "recycle"], ["mixed"])?;
        g.add_component("rcv", Receiver::new(watts(1.5e6))?)?
            .nodes(["mixed"], ["heated"])?;
        g.add_component("flash", FlashSeparator::new())?
            .nodes(["heated"], ["vapour", "liquid"])?;
        g.add_component("split", Splitter::new())?
            .nodes(["liquid"], ["loop", "purge"])?;
        g.add_component("cooler", PinchHex::new())?
            .nodes(["loop", "coolant"], ["recycle_out", "coolant_out"])?;
        Ok(g)
    }

    fn evaluate(&self, g: &mut FlowsheetGraph, guesses: &TearGuesses) -> SimResult<Residuals> {
        let y = guesses.require("recycle y")?;
        let t = guesses.require("recycle t")?;

        g.node("feed")
            .set_p(bar(10.0))
            .set_t(celsius(40.0))
            .set_y(0.5)
            .set_mdot(kgps(1.0));
        g.node("recycle")
            .set_p(bar(self.recycle_bar))
            .set_t(k(t))
            .set_y(y)
            .set_mdot(kgps(RECYCLE_FLOW));
        g.node("loop").set_mdot(kgps(RECYCLE_FLOW));
        g.node("coolant")
            .set_cp(4180.0)
            .set_p(bar(2.0))
            .set_t(celsius(20.0))
            .set_mdot(kgps(1.0));
        g.calc_all(ORDER)?;

        let out = g
            .get_node("recycle_out")
            .ok_or_else(|| SimError::UnknownNode {
                label: "recycle_out".into(),
            })?;
        let y_out = out.y.ok_or_else(|| SimError::Missing {
            node: "recycle_out".into(),
            what: "composition",
        })?;
        let t_out = out.t_k().ok_or_else(|| SimError::Missing {
            node: "recycle_out".into(),
            what: "temperature",
        })?;

        let mut r = Residuals::new();
        r.gap("recycle y", y_out, y);
        r.gap("recycle t", t_out, t);
        Ok(r)
    }
}

#[test]
fn two_tear_recycle_converges() {
    init_tracing();
    let fs = RecycleLoop::default();
    let out = ConvergenceEngine::new(&fs).run().unwrap();

    assert_eq!(out.status, EngineStatus::Converged);
    assert!(out.iterations <= 30);
    assert!(out.max_residual < 1e-4);
    assert!(out.residuals.get("recycle y").unwrap().abs() < 1e-4);
    assert!(out.residuals.get("recycle t").unwrap().abs() < 1e-4);

    // the cooler holds the recycle 5 K above the coolant inlet
    let t = out.guesses.get("recycle t").unwrap();
    assert!((t - celsius(25.0).value).abs() < 0.1);

    let g = &out.graph;
    let feed = g.get_node("feed").unwrap().mdot_kgps().unwrap();
    let vapour = g.get_node("vapour").unwrap().mdot_kgps().unwrap();
    let purge = g.get_node("purge").unwrap().mdot_kgps().unwrap();
    assert!((vapour + purge - feed).abs() < 1e-9);
    assert!(g.warnings().is_empty(), "{:?}", g.warnings());
}

#[test]
fn rerun_reproduces_the_node_table() {
    init_tracing();
    let fs = RecycleLoop::default();
    let first = ConvergenceEngine::new(&fs).run().unwrap();
    let second = ConvergenceEngine::new(&fs).run().unwrap();

    assert_eq!(first.iterations, second.iterations);
    assert_eq!(first.graph.node_table(), second.graph.node_table());
    assert_eq!(
        first.graph.export_json().unwrap(),
        second.graph.export_json().unwrap()
    );
}

#[test]
fn interrupt_from_progress_returns_last_pass() {
    init_tracing();
    let fs = RecycleLoop::default();
    let flag = Arc::new(AtomicBool::new(false));
    let raise = flag.clone();
    let out = ConvergenceEngine::new(&fs)
        .with_interrupt(flag)
        .run_with_progress(&mut |event| {
            if let EngineEvent::PassCompleted { iteration: 1, .. } = event {
                raise.store(true, Ordering::Relaxed);
            }
        })
        .unwrap();

    assert_eq!(out.status, EngineStatus::Interrupted);
    assert_eq!(out.iterations, 1);
    // the returned graph is a complete evaluation
    assert!(out.graph.get_node("recycle_out").unwrap().t.is_some());
    assert_eq!(out.variables.len(), 2);
}

#[test]
fn evaluation_errors_propagate() {
    init_tracing();
    let fs = RecycleLoop {
        recycle_bar: 12.0,
        ..RecycleLoop::default()
    };
    let err = ConvergenceEngine::new(&fs).run().err().unwrap();
    assert!(matches!(err, SolverError::Sim(SimError::Input { .. })));
}
