//! The caller's side of a convergence run.
//!
//! A [`Flowsheet`] declares its recycle unknowns ("tears"), builds a fresh
//! graph on request and evaluates it for one set of tear guesses. Guesses are
//! passed in explicitly; the flowsheet writes them onto whichever nodes it
//! likes before running its units in order.

use std::collections::BTreeMap;

use pc_graph::{FlowsheetGraph, SimError, SimResult};
use serde::{Deserialize, Serialize};

/// Declaration of one recycle unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TearVariable {
    pub name: String,
    /// Guess used for the first evaluation
    pub initial: f64,
    /// Valid range of the guess
    pub lo: f64,
    pub hi: f64,
    /// Largest |residual| at which this tear counts as closed
    pub tolerance: f64,
}

impl TearVariable {
    pub fn new(name: impl Into<String>, initial: f64, lo: f64, hi: f64, tolerance: f64) -> Self {
        Self {
            name: name.into(),
            initial,
            lo,
            hi,
            tolerance,
        }
    }
}

/// Current guess for every declared tear, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TearGuesses(BTreeMap<String, f64>);

impl TearGuesses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    /// Guess for `name`, or `SimError::Missing` naming the tear.
    pub fn require(&self, name: &str) -> SimResult<f64> {
        self.get(name).ok_or_else(|| SimError::Missing {
            node: name.to_string(),
            what: "tear guess",
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, &v)| (k.as_str(), v))
    }
}

/// Residual of every tear after one evaluation.
///
/// Residuals follow `r = computed - guessed`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Residuals(BTreeMap<String, f64>);

impl Residuals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, residual: f64) {
        self.0.insert(name.into(), residual);
    }

    /// Record the gap between the value a pass produced and its guess.
    pub fn gap(&mut self, name: impl Into<String>, computed: f64, guessed: f64) {
        self.set(name, computed - guessed);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn max_abs(&self) -> f64 {
        self.0.values().fold(0.0_f64, |m, r| m.max(r.abs()))
    }
}

/// A sequential-modular flowsheet driven by the convergence engine.
pub trait Flowsheet {
    /// Recycle unknowns, in the order they are reported.
    fn tears(&self) -> Vec<TearVariable>;

    /// A fresh graph with every unit registered and wired.
    fn build(&self) -> SimResult<FlowsheetGraph>;

    /// Write the guesses, run the units in order and report one residual per
    /// declared tear.
    fn evaluate(&self, graph: &mut FlowsheetGraph, guesses: &TearGuesses) -> SimResult<Residuals>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn residuals_follow_computed_minus_guessed() {
        let mut r = Residuals::new();
        r.gap("t", 300.0, 310.0);
        r.set("y", 0.02);
        assert_eq!(r.get("t"), Some(-10.0));
        assert_eq!(r.max_abs(), 10.0);
        assert_eq!(r.get("missing"), None);
    }

    #[test]
    fn missing_guess_names_the_tear() {
        let guesses = TearGuesses::new();
        let err = guesses.require("recycle y").unwrap_err();
        assert!(err.to_string().contains("recycle y"));
    }

    #[test]
    fn tear_declarations_load_from_json() {
        let json = r#"{"name":"t","initial":300.0,"lo":250.0,"hi":500.0,"tolerance":1e-6}"#;
        let tear: TearVariable = serde_json::from_str(json).unwrap();
        assert_eq!(tear, TearVariable::new("t", 300.0, 250.0, 500.0, 1e-6));
    }
}
