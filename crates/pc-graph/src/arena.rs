//! Node arena with stable handles.
//!
//! Nodes are created lazily the first time a label is referenced and are never
//! removed, so a `NodeId` stays valid for the lifetime of its graph.

use std::collections::BTreeMap;

use pc_core::NodeId;

use crate::error::{SimError, SimResult};
use crate::node::{NodeLabel, StreamNode};

#[derive(Debug, Clone, Default)]
pub struct NodeArena {
    nodes: Vec<StreamNode>,
    by_label: BTreeMap<NodeLabel, NodeId>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the handle for `label`, creating the node on first use.
    pub fn ensure(&mut self, label: NodeLabel) -> NodeId {
        if let Some(&id) = self.by_label.get(&label) {
            return id;
        }
        let id = NodeId::from_index(self.nodes.len() as u32);
        self.nodes.push(StreamNode::new(label.clone()));
        self.by_label.insert(label, id);
        id
    }

    pub fn ensure_mut(&mut self, label: NodeLabel) -> &mut StreamNode {
        let id = self.ensure(label);
        &mut self.nodes[id.slot()]
    }

    pub fn find(&self, label: &NodeLabel) -> Option<NodeId> {
        self.by_label.get(label).copied()
    }

    pub fn get(&self, id: NodeId) -> SimResult<&StreamNode> {
        self.nodes.get(id.slot()).ok_or_else(|| SimError::UnknownNode {
            label: format!("#{id}"),
        })
    }

    pub fn get_mut(&mut self, id: NodeId) -> SimResult<&mut StreamNode> {
        self.nodes.get_mut(id.slot()).ok_or_else(|| SimError::UnknownNode {
            label: format!("#{id}"),
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in label order.
    pub fn iter_sorted(&self) -> impl Iterator<Item = &StreamNode> {
        self.by_label.values().map(|id| &self.nodes[id.slot()])
    }
}
