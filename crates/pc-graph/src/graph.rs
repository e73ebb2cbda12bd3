//! The flowsheet graph: unit registry, node arena and published results.

use std::collections::BTreeMap;
use std::sync::Arc;

use pc_core::{NodeId, UnitId};
use pc_fluids::{FluidState, PropertyOracle, StateInput, StreamFluid};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::arena::NodeArena;
use crate::error::{SimError, SimResult};
use crate::node::{NodeLabel, NodeRecord, StreamNode};
use crate::traits::UnitOperation;
use crate::warning::SimWarning;

/// Node handles a unit is attached to, in port order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wiring {
    pub inlets: Vec<NodeId>,
    pub outlets: Vec<NodeId>,
}

struct UnitEntry {
    name: String,
    unit: Box<dyn UnitOperation>,
    wiring: Option<Wiring>,
    labels: Option<(Vec<NodeLabel>, Vec<NodeLabel>)>,
}

/// A published diagnostic payload and the unit that owns it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultEntry {
    pub owner: String,
    pub payload: Value,
}

/// Mutable evaluation state shared by all units of one graph.
struct FlowState {
    oracle: Arc<dyn PropertyOracle>,
    nodes: NodeArena,
    results: BTreeMap<String, ResultEntry>,
    warnings: Vec<SimWarning>,
}

impl FlowState {
    fn store(&mut self, owner: &str, name: &str, payload: Value) -> SimResult<()> {
        match self.results.get_mut(name) {
            Some(entry) if entry.owner != owner => Err(SimError::ResultClash {
                name: name.to_string(),
                owner: entry.owner.clone(),
            }),
            Some(entry) => {
                entry.payload = payload;
                Ok(())
            }
            None => {
                self.results.insert(
                    name.to_string(),
                    ResultEntry {
                        owner: owner.to_string(),
                        payload,
                    },
                );
                Ok(())
            }
        }
    }

    fn warn(&mut self, warning: SimWarning) {
        warn!(unit = warning.unit(), "{warning}");
        self.warnings.push(warning);
    }

    fn try_resolve(&mut self, id: NodeId) -> SimResult<Option<FluidState>> {
        let node = self.nodes.get(id)?;
        let Some(fluid) = node.fluid() else {
            return Ok(None);
        };
        let Some(input) = node.state_input(&fluid) else {
            return Ok(None);
        };
        let st = fluid.resolve(self.oracle.as_ref(), input)?;
        self.nodes.get_mut(id)?.apply(&st);
        Ok(Some(st))
    }
}

/// Handle passed to [`UnitOperation::calc`].
///
/// Gives a unit access to its own ports, the node arena, the property oracle,
/// the result store (under its own name) and the warning list.
pub struct CalcContext<'a> {
    name: &'a str,
    wiring: &'a Wiring,
    state: &'a mut FlowState,
}

impl<'a> CalcContext<'a> {
    pub fn name(&self) -> &str {
        self.name
    }

    pub fn inlet(&self, port: usize) -> SimResult<NodeId> {
        self.wiring.inlets.get(port).copied().ok_or_else(|| {
            SimError::input(self.name, format!("no inlet port {port}"))
        })
    }

    pub fn outlet(&self, port: usize) -> SimResult<NodeId> {
        self.wiring.outlets.get(port).copied().ok_or_else(|| {
            SimError::input(self.name, format!("no outlet port {port}"))
        })
    }

    pub fn node(&self, id: NodeId) -> SimResult<&StreamNode> {
        self.state.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> SimResult<&mut StreamNode> {
        self.state.nodes.get_mut(id)
    }

    /// Label of a node as a string, for error messages.
    pub fn label(&self, id: NodeId) -> String {
        self.state
            .nodes
            .get(id)
            .map(|n| n.label().to_string())
            .unwrap_or_else(|_| format!("#{id}"))
    }

    pub fn oracle(&self) -> Arc<dyn PropertyOracle> {
        Arc::clone(&self.state.oracle)
    }

    /// Read one attribute of a node, failing with `Missing` if unset.
    pub fn require<T>(
        &self,
        id: NodeId,
        what: &'static str,
        get: impl Fn(&StreamNode) -> Option<T>,
    ) -> SimResult<T> {
        get(self.node(id)?).ok_or_else(|| SimError::Missing {
            node: self.label(id),
            what,
        })
    }

    pub fn fluid(&self, id: NodeId) -> SimResult<StreamFluid> {
        self.require(id, "composition or medium", StreamNode::fluid)
    }

    /// Resolve a node from whatever it already knows, if that is enough.
    pub fn try_resolve(&mut self, id: NodeId) -> SimResult<Option<FluidState>> {
        self.state.try_resolve(id)
    }

    /// Resolve a node from whatever it already knows.
    pub fn resolve(&mut self, id: NodeId) -> SimResult<FluidState> {
        self.state.try_resolve(id)?.ok_or_else(|| SimError::Missing {
            node: self.label(id),
            what: "two independent state properties",
        })
    }

    /// Resolve a node from an explicit input pair and store the result on it.
    pub fn resolve_as(&mut self, id: NodeId, input: StateInput) -> SimResult<FluidState> {
        let fluid = self.fluid(id)?;
        let st = fluid.resolve(self.state.oracle.as_ref(), input)?;
        self.node_mut(id)?.apply(&st);
        Ok(st)
    }

    /// Publish this unit's diagnostic payload under its own name.
    pub fn publish<T: Serialize>(&mut self, payload: &T) -> SimResult<()> {
        let value = serde_json::to_value(payload)?;
        self.state.store(self.name, self.name, value)
    }

    pub fn warn(&mut self, warning: SimWarning) {
        self.state.warn(warning);
    }
}

/// Everything one evaluation produced, in a serialisable form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowsheetExport {
    pub nodes: Vec<NodeRecord>,
    pub results: BTreeMap<String, Value>,
    pub warnings: Vec<SimWarning>,
}

/// One flowsheet evaluation.
///
/// Units are registered by name, wired to nodes by label, then run in the
/// order the caller chooses. The graph is thrown away after the evaluation;
/// an outer iteration builds a fresh one.
pub struct FlowsheetGraph {
    units: Vec<UnitEntry>,
    by_name: BTreeMap<String, UnitId>,
    state: FlowState,
}

/// Returned by [`FlowsheetGraph::add_component`] to attach the new unit to
/// its nodes.
pub struct UnitWire<'g> {
    graph: &'g mut FlowsheetGraph,
    id: UnitId,
}

impl UnitWire<'_> {
    pub fn id(&self) -> UnitId {
        self.id
    }

    /// Attach the unit to inlet and outlet nodes, creating them as needed.
    pub fn nodes<I, A, O, B>(self, inlets: I, outlets: O) -> SimResult<UnitId>
    where
        I: IntoIterator<Item = A>,
        A: Into<NodeLabel>,
        O: IntoIterator<Item = B>,
        B: Into<NodeLabel>,
    {
        let inlets = inlets.into_iter().map(Into::into).collect();
        let outlets = outlets.into_iter().map(Into::into).collect();
        self.graph.wire(self.id, inlets, outlets)
    }
}

impl FlowsheetGraph {
    pub fn new(oracle: Arc<dyn PropertyOracle>) -> Self {
        Self {
            units: Vec::new(),
            by_name: BTreeMap::new(),
            state: FlowState {
                oracle,
                nodes: NodeArena::new(),
                results: BTreeMap::new(),
                warnings: Vec::new(),
            },
        }
    }

    pub fn oracle(&self) -> &Arc<dyn PropertyOracle> {
        &self.state.oracle
    }

    /// Register a unit under a unique name.
    pub fn add_component(
        &mut self,
        name: impl Into<String>,
        unit: impl UnitOperation + 'static,
    ) -> SimResult<UnitWire<'_>> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(SimError::NameClash { name });
        }
        let id = UnitId::from_index(self.units.len() as u32);
        debug!(unit = %name, kind = unit.kind(), "register");
        self.by_name.insert(name.clone(), id);
        self.units.push(UnitEntry {
            name,
            unit: Box::new(unit),
            wiring: None,
            labels: None,
        });
        Ok(UnitWire { graph: self, id })
    }

    /// Wire a registered unit. Repeating the same wiring is a no-op.
    pub fn wire(
        &mut self,
        id: UnitId,
        inlets: Vec<NodeLabel>,
        outlets: Vec<NodeLabel>,
    ) -> SimResult<UnitId> {
        let entry = self.units.get(id.slot()).ok_or_else(|| SimError::UnknownUnit {
            name: format!("#{id}"),
        })?;
        let arity = entry.unit.arity();
        if inlets.len() != arity.inlets || outlets.len() != arity.outlets {
            return Err(SimError::input(
                &entry.name,
                format!(
                    "expected {} inlet(s) and {} outlet(s), got {} and {}",
                    arity.inlets,
                    arity.outlets,
                    inlets.len(),
                    outlets.len()
                ),
            ));
        }
        if let Some((old_in, old_out)) = &entry.labels {
            if *old_in == inlets && *old_out == outlets {
                return Ok(id);
            }
            return Err(SimError::input(&entry.name, "already wired to other nodes"));
        }
        let name = entry.name.clone();

        let nodes = &mut self.state.nodes;
        let mut in_ids = Vec::with_capacity(inlets.len());
        for label in &inlets {
            let nid = nodes.ensure(label.clone());
            nodes.get_mut(nid)?.add_consumer(&name);
            in_ids.push(nid);
        }
        let mut out_ids = Vec::with_capacity(outlets.len());
        for label in &outlets {
            let nid = nodes.ensure(label.clone());
            nodes.get_mut(nid)?.set_producer(&name);
            out_ids.push(nid);
        }

        let entry = &mut self.units[id.slot()];
        entry.wiring = Some(Wiring {
            inlets: in_ids,
            outlets: out_ids,
        });
        entry.labels = Some((inlets, outlets));
        Ok(id)
    }

    /// The node for `label`, created empty on first access.
    pub fn node(&mut self, label: impl Into<NodeLabel>) -> &mut StreamNode {
        self.state.nodes.ensure_mut(label.into())
    }

    /// Non-creating lookup.
    pub fn get_node(&self, label: impl Into<NodeLabel>) -> Option<&StreamNode> {
        let id = self.state.nodes.find(&label.into())?;
        self.state.nodes.get(id).ok()
    }

    pub fn node_id(&self, label: impl Into<NodeLabel>) -> Option<NodeId> {
        self.state.nodes.find(&label.into())
    }

    /// Resolve a node from whatever it already knows.
    pub fn resolve_node(&mut self, label: impl Into<NodeLabel>) -> SimResult<FluidState> {
        let label = label.into();
        let id = self.state.nodes.ensure(label.clone());
        self.state.try_resolve(id)?.ok_or_else(|| SimError::Missing {
            node: label.to_string(),
            what: "two independent state properties",
        })
    }

    /// Run one unit's balance.
    pub fn calc(&mut self, name: &str) -> SimResult<()> {
        let id = self
            .by_name
            .get(name)
            .copied()
            .ok_or_else(|| SimError::UnknownUnit {
                name: name.to_string(),
            })?;
        let entry = &self.units[id.slot()];
        let wiring = entry
            .wiring
            .as_ref()
            .ok_or_else(|| SimError::input(name, "not wired to any nodes"))?;
        debug!(unit = name, kind = entry.unit.kind(), "calc");
        let mut ctx = CalcContext {
            name: &entry.name,
            wiring,
            state: &mut self.state,
        };
        entry.unit.calc(&mut ctx)
    }

    /// Run units strictly in the given order.
    pub fn calc_all<I, S>(&mut self, order: I) -> SimResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in order {
            self.calc(name.as_ref())?;
        }
        Ok(())
    }

    pub fn unit_names(&self) -> impl Iterator<Item = &str> {
        self.units.iter().map(|u| u.name.as_str())
    }

    pub fn unit_kind(&self, name: &str) -> Option<&'static str> {
        let id = self.by_name.get(name)?;
        Some(self.units[id.slot()].unit.kind())
    }

    /// Publish a payload on behalf of `publisher`.
    ///
    /// A publisher may overwrite its own entry; a different publisher under
    /// the same name is a `ResultClash`.
    pub fn store_result<T: Serialize>(
        &mut self,
        publisher: &str,
        name: &str,
        payload: &T,
    ) -> SimResult<()> {
        let value = serde_json::to_value(payload)?;
        self.state.store(publisher, name, value)
    }

    /// Typed retrieval of a published payload.
    pub fn result<T: DeserializeOwned>(&self, name: &str) -> SimResult<T> {
        let entry = self
            .state
            .results
            .get(name)
            .ok_or_else(|| SimError::MissingResult {
                name: name.to_string(),
            })?;
        Ok(serde_json::from_value(entry.payload.clone())?)
    }

    pub fn result_value(&self, name: &str) -> Option<&Value> {
        self.state.results.get(name).map(|e| &e.payload)
    }

    pub fn results(&self) -> &BTreeMap<String, ResultEntry> {
        &self.state.results
    }

    pub fn warnings(&self) -> &[SimWarning] {
        &self.state.warnings
    }

    /// Record a caller-level warning (e.g. from a flowsheet script).
    pub fn warn(&mut self, warning: SimWarning) {
        self.state.warn(warning);
    }

    /// All nodes in label order.
    pub fn node_table(&self) -> Vec<NodeRecord> {
        self.state.nodes.iter_sorted().map(StreamNode::record).collect()
    }

    pub fn export(&self) -> FlowsheetExport {
        FlowsheetExport {
            nodes: self.node_table(),
            results: self
                .state
                .results
                .iter()
                .map(|(k, v)| (k.clone(), v.payload.clone()))
                .collect(),
            warnings: self.state.warnings.clone(),
        }
    }

    pub fn export_json(&self) -> SimResult<Value> {
        Ok(serde_json::to_value(self.export())?)
    }
}
