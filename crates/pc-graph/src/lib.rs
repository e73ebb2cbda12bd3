//! pc-graph: flowsheet model layer for the powercycle solver.
//!
//! Provides:
//! - Stream nodes with option-typed state, created lazily by label
//! - The `UnitOperation` trait implemented by every piece of equipment
//! - `FlowsheetGraph`: unit registry, node arena, result store and warnings
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use pc_core::units::{bar, celsius};
//! use pc_fluids::IdealBinaryModel;
//! use pc_graph::FlowsheetGraph;
//!
//! let mut graph = FlowsheetGraph::new(Arc::new(IdealBinaryModel::default()));
//! graph.node(1).set_p(bar(10.0)).set_t(celsius(40.0)).set_y(0.5);
//! let state = graph.resolve_node(1).unwrap();
//!
//! assert!(state.h > 0.0);
//! assert_eq!(graph.node_table().len(), 1);
//! ```

pub mod arena;
pub mod error;
pub mod graph;
pub mod node;
pub mod traits;
pub mod warning;

// Re-exports for ergonomics
pub use arena::NodeArena;
pub use error::{SimError, SimResult};
pub use graph::{CalcContext, FlowsheetExport, FlowsheetGraph, ResultEntry, UnitWire, Wiring};
pub use node::{NodeLabel, NodeRecord, StreamNode};
pub use traits::{Arity, UnitOperation};
pub use warning::SimWarning;
