//! Stream nodes: the state points between unit operations.

use core::fmt;
use pc_core::units::{Density, MassRate, Pressure, Temperature, k, kgps, pa};
use pc_fluids::{FluidState, StateInput, StreamFluid};
use serde::{Deserialize, Serialize};

/// Caller-facing identifier of a stream node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeLabel {
    Index(i64),
    Name(String),
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeLabel::Index(i) => write!(f, "{i}"),
            NodeLabel::Name(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for NodeLabel {
    fn from(v: i64) -> Self {
        NodeLabel::Index(v)
    }
}

impl From<i32> for NodeLabel {
    fn from(v: i32) -> Self {
        NodeLabel::Index(v.into())
    }
}

impl From<u32> for NodeLabel {
    fn from(v: u32) -> Self {
        NodeLabel::Index(v.into())
    }
}

impl From<&str> for NodeLabel {
    fn from(v: &str) -> Self {
        NodeLabel::Name(v.to_string())
    }
}

impl From<String> for NodeLabel {
    fn from(v: String) -> Self {
        NodeLabel::Name(v)
    }
}

impl From<&NodeLabel> for NodeLabel {
    fn from(v: &NodeLabel) -> Self {
        v.clone()
    }
}

/// One stream state point.
///
/// Every attribute starts unknown and is filled in by the caller (boundary
/// conditions and tear guesses), by unit operations, or by resolving the node
/// through the property oracle.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamNode {
    label: NodeLabel,
    pub p: Option<Pressure>,
    pub t: Option<Temperature>,
    /// Specific enthalpy [J/kg]
    pub h: Option<f64>,
    /// Specific internal energy [J/kg]
    pub e: Option<f64>,
    /// Specific entropy [J/(kg·K)]
    pub s: Option<f64>,
    /// Vapour quality, extrapolated outside the dome
    pub q: Option<f64>,
    pub rho: Option<Density>,
    pub mdot: Option<MassRate>,
    /// Mass fraction of the light component
    pub y: Option<f64>,
    pub y_vap: Option<f64>,
    pub y_liq: Option<f64>,
    /// Heat-capacity override [J/(kg·K)] for ad-hoc constant-cp media
    pub cp: Option<f64>,
    /// Secondary medium tag, e.g. `hitecxl`
    pub medium: Option<String>,
    producer: Option<String>,
    consumers: Vec<String>,
}

impl StreamNode {
    pub fn new(label: NodeLabel) -> Self {
        Self {
            label,
            p: None,
            t: None,
            h: None,
            e: None,
            s: None,
            q: None,
            rho: None,
            mdot: None,
            y: None,
            y_vap: None,
            y_liq: None,
            cp: None,
            medium: None,
            producer: None,
            consumers: Vec::new(),
        }
    }

    pub fn label(&self) -> &NodeLabel {
        &self.label
    }

    pub fn producer(&self) -> Option<&str> {
        self.producer.as_deref()
    }

    pub fn consumers(&self) -> &[String] {
        &self.consumers
    }

    pub(crate) fn set_producer(&mut self, unit: &str) {
        self.producer = Some(unit.to_string());
    }

    pub(crate) fn add_consumer(&mut self, unit: &str) {
        if !self.consumers.iter().any(|c| c == unit) {
            self.consumers.push(unit.to_string());
        }
    }

    pub fn set_p(&mut self, p: Pressure) -> &mut Self {
        self.p = Some(p);
        self
    }

    pub fn set_t(&mut self, t: Temperature) -> &mut Self {
        self.t = Some(t);
        self
    }

    pub fn set_h(&mut self, h: f64) -> &mut Self {
        self.h = Some(h);
        self
    }

    pub fn set_s(&mut self, s: f64) -> &mut Self {
        self.s = Some(s);
        self
    }

    pub fn set_q(&mut self, q: f64) -> &mut Self {
        self.q = Some(q);
        self
    }

    pub fn set_mdot(&mut self, mdot: MassRate) -> &mut Self {
        self.mdot = Some(mdot);
        self
    }

    pub fn set_y(&mut self, y: f64) -> &mut Self {
        self.y = Some(y);
        self
    }

    pub fn set_cp(&mut self, cp: f64) -> &mut Self {
        self.cp = Some(cp);
        self
    }

    pub fn set_medium(&mut self, medium: impl Into<String>) -> &mut Self {
        self.medium = Some(medium.into());
        self
    }

    pub fn p_pa(&self) -> Option<f64> {
        self.p.map(|p| p.value)
    }

    pub fn t_k(&self) -> Option<f64> {
        self.t.map(|t| t.value)
    }

    pub fn mdot_kgps(&self) -> Option<f64> {
        self.mdot.map(|m| m.value)
    }

    pub fn set_p_pa(&mut self, p: f64) {
        self.p = Some(pa(p));
    }

    pub fn set_t_k(&mut self, t: f64) {
        self.t = Some(k(t));
    }

    pub fn set_mdot_kgps(&mut self, m: f64) {
        self.mdot = Some(kgps(m));
    }

    /// Property route for this stream, if enough tags are known.
    pub fn fluid(&self) -> Option<StreamFluid> {
        StreamFluid::from_tags(self.medium.as_deref(), self.cp, self.y)
    }

    /// Pick the input pair to resolve from.
    ///
    /// Working fluid priority: PH, PE, PS, PQ, PT, TQ. Secondary media only
    /// resolve from h, then T, then s.
    pub fn state_input(&self, fluid: &StreamFluid) -> Option<StateInput> {
        let p = self.p;
        if fluid.is_secondary() {
            return match (p, self.h, self.t, self.s) {
                (Some(p), Some(h), _, _) => Some(StateInput::PH { p, h }),
                (Some(p), None, Some(t), _) => Some(StateInput::PT { p, t }),
                (Some(p), None, None, Some(s)) => Some(StateInput::PS { p, s }),
                _ => None,
            };
        }
        if let Some(p) = p {
            if let Some(h) = self.h {
                return Some(StateInput::PH { p, h });
            }
            if let Some(e) = self.e {
                return Some(StateInput::PE { p, e });
            }
            if let Some(s) = self.s {
                return Some(StateInput::PS { p, s });
            }
            if let Some(q) = self.q {
                return Some(StateInput::PQ { p, q });
            }
            if let Some(t) = self.t {
                return Some(StateInput::PT { p, t });
            }
        }
        match (self.t, self.q) {
            (Some(t), Some(q)) => Some(StateInput::TQ { t, q }),
            _ => None,
        }
    }

    /// Copy a resolved state onto the node. Composition stays as given.
    pub fn apply(&mut self, st: &FluidState) {
        self.p = Some(st.p);
        self.t = Some(st.t);
        self.h = Some(st.h);
        self.s = Some(st.s);
        if st.e.is_some() {
            self.e = st.e;
        }
        if st.rho.is_some() {
            self.rho = st.rho;
        }
        if st.q.is_some() {
            self.q = st.q;
        }
        if st.y_vap.is_some() {
            self.y_vap = st.y_vap;
        }
        if st.y_liq.is_some() {
            self.y_liq = st.y_liq;
        }
    }

    /// Copy composition and medium tags from another node.
    pub fn inherit_tags(&mut self, from: &StreamNode) {
        if from.y.is_some() {
            self.y = from.y;
        }
        if from.medium.is_some() {
            self.medium = from.medium.clone();
        }
        if from.cp.is_some() {
            self.cp = from.cp;
        }
    }

    /// Copy every intensive property of another node (flow excluded).
    pub fn copy_intensive(&mut self, from: &StreamNode) {
        self.inherit_tags(from);
        self.p = from.p;
        self.t = from.t;
        self.h = from.h;
        self.e = from.e;
        self.s = from.s;
        self.q = from.q;
        self.rho = from.rho;
        self.y_vap = from.y_vap;
        self.y_liq = from.y_liq;
    }

    pub fn record(&self) -> NodeRecord {
        NodeRecord {
            label: self.label.clone(),
            p: self.p_pa(),
            t: self.t_k(),
            h: self.h,
            e: self.e,
            s: self.s,
            q: self.q,
            rho: self.rho.map(|r| r.value),
            mdot: self.mdot_kgps(),
            y: self.y,
            y_vap: self.y_vap,
            y_liq: self.y_liq,
            cp: self.cp,
            medium: self.medium.clone(),
            producer: self.producer.clone(),
            consumers: self.consumers.clone(),
        }
    }
}

/// Flat, serialisable view of a node in SI units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub label: NodeLabel,
    pub p: Option<f64>,
    pub t: Option<f64>,
    pub h: Option<f64>,
    pub e: Option<f64>,
    pub s: Option<f64>,
    pub q: Option<f64>,
    pub rho: Option<f64>,
    pub mdot: Option<f64>,
    pub y: Option<f64>,
    pub y_vap: Option<f64>,
    pub y_liq: Option<f64>,
    pub cp: Option<f64>,
    pub medium: Option<String>,
    pub producer: Option<String>,
    pub consumers: Vec<String>,
}
