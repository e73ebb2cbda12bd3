//! pc-components: unit operations for powercycle flowsheets.
//!
//! Provides:
//! - Pressure changers: valve, pump, turbine
//! - Stream junctions: mixer, splitter, double split-mix
//! - Phase separation and condensation: flash separator, condenser
//! - Heat input and exchange: receiver, pinch-constrained exchanger
//!
//! Every unit implements `pc_graph::UnitOperation`. A `calc` reads what its
//! inlet and outlet nodes already know, closes its balances and writes the
//! result back to the nodes, so repeated calls converge on the same state.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use pc_components::Valve;
//! use pc_core::units::{bar, celsius, kgps};
//! use pc_fluids::IdealBinaryModel;
//! use pc_graph::FlowsheetGraph;
//!
//! let mut graph = FlowsheetGraph::new(Arc::new(IdealBinaryModel::default()));
//! graph.add_component("v1", Valve::new()).unwrap().nodes([1], [2]).unwrap();
//! graph
//!     .node(1)
//!     .set_p(bar(20.0))
//!     .set_t(celsius(60.0))
//!     .set_y(0.5)
//!     .set_mdot(kgps(1.0));
//! graph.node(2).set_p(bar(5.0));
//! graph.calc("v1").unwrap();
//!
//! let h_in = graph.get_node(1).unwrap().h.unwrap();
//! let out = graph.get_node(2).unwrap();
//! assert!((out.h.unwrap() - h_in).abs() < 1e-3);
//! assert_eq!(out.mdot_kgps(), Some(1.0));
//! ```

pub mod common;
pub mod condenser;
pub mod double_split_mix;
pub mod error;
pub mod flash;
pub mod mixer;
pub mod pinch;
pub mod pump;
pub mod receiver;
pub mod splitter;
pub mod turbine;
pub mod valve;

#[cfg(test)]
mod testing;

// Re-exports
pub use condenser::{Condenser, CondenserResult};
pub use double_split_mix::{DoubleSplitMix, DoubleSplitMixResult};
pub use error::{ComponentError, ComponentResult};
pub use flash::{FlashConfig, FlashResult, FlashSeparator};
pub use mixer::Mixer;
pub use pinch::{PinchConfig, PinchHex, PinchProfile, PinchResult, Strategy};
pub use pump::{Pump, PumpResult};
pub use receiver::{Receiver, ReceiverResult, ReceiverUnknown};
pub use splitter::Splitter;
pub use turbine::{DEFAULT_MOISTURE_LIMIT, Turbine, TurbineResult};
pub use valve::Valve;
