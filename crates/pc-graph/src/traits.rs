//! Unit operation contract.

use crate::error::SimResult;
use crate::graph::CalcContext;

/// Declared port counts of a unit operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub inlets: usize,
    pub outlets: usize,
}

impl Arity {
    pub const fn new(inlets: usize, outlets: usize) -> Self {
        Self { inlets, outlets }
    }
}

/// A steady-state balance over one piece of equipment.
///
/// Parameters are fixed at construction. `calc` reads inlet attributes, may
/// query the property oracle, and writes outlet attributes through the
/// context. It must be safe to call repeatedly on the same graph: there is no
/// hidden state carried between calls.
pub trait UnitOperation: Send + Sync {
    /// Short type tag used in logs and exports (e.g. `"turbine"`).
    fn kind(&self) -> &'static str;

    /// Number of inlet and outlet ports.
    fn arity(&self) -> Arity;

    /// Run the balance once.
    fn calc(&self, ctx: &mut CalcContext<'_>) -> SimResult<()>;
}
