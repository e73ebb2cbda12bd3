//! Shared fixtures for unit tests.

use std::sync::Arc;

use pc_fluids::IdealBinaryModel;
use pc_graph::FlowsheetGraph;

pub fn binary_graph() -> FlowsheetGraph {
    FlowsheetGraph::new(Arc::new(IdealBinaryModel::default()))
}
