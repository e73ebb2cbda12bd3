//! Outer recycle loop.
//!
//! Each pass builds a fresh graph, evaluates it for the current tear guesses
//! and records one `(guess, residual)` sample per tear. Open tears get a new
//! guess from their [`ConvergenceVariable`]; with fewer than two tears open
//! every step is taken in careful mode. A tear that closes has its history
//! reset to the closing sample so that stale points do not bias it if a later
//! pass re-opens it.
//!
//! A tear counts as closed only within the tighter of its own tolerance and
//! [`EngineConfig::tolerance`], so the run stops exactly when the largest
//! residual meets the run tolerance.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use pc_core::{ConvergenceVariable, ConvergenceVariableSnapshot};
use pc_graph::{FlowsheetGraph, SimError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{SolverError, SolverResult};
use crate::flowsheet::{Flowsheet, Residuals, TearGuesses};

/// Outer loop settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Re-evaluations after the first pass
    pub max_iterations: usize,
    /// Largest |residual| over all tears at which the run stops
    pub tolerance: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_iterations: 30,
            tolerance: 1e-4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineStatus {
    Converged,
    IterationCap,
    /// Stopped on request; the outcome holds the last completed pass.
    Interrupted,
}

/// Progress notifications, one per completed pass.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    PassCompleted {
        iteration: usize,
        max_residual: f64,
        open: usize,
    },
    Finished {
        status: EngineStatus,
        iterations: usize,
        max_residual: f64,
    },
}

/// Result of [`ConvergenceEngine::run`].
pub struct EngineOutcome {
    /// Graph of the last completed pass
    pub graph: FlowsheetGraph,
    pub status: EngineStatus,
    /// Re-evaluations performed after the first pass
    pub iterations: usize,
    pub max_residual: f64,
    /// Guesses the returned graph was evaluated with
    pub guesses: TearGuesses,
    pub residuals: Residuals,
    pub variables: Vec<ConvergenceVariableSnapshot>,
}

impl EngineOutcome {
    pub fn converged(&self) -> bool {
        self.status == EngineStatus::Converged
    }
}

/// One completed evaluation.
struct Pass {
    graph: FlowsheetGraph,
    guesses: TearGuesses,
    residuals: Residuals,
}

pub struct ConvergenceEngine<'f, F: Flowsheet + ?Sized> {
    flowsheet: &'f F,
    config: EngineConfig,
    interrupt: Option<Arc<AtomicBool>>,
}

impl<'f, F: Flowsheet + ?Sized> ConvergenceEngine<'f, F> {
    pub fn new(flowsheet: &'f F) -> Self {
        Self {
            flowsheet,
            config: EngineConfig::default(),
            interrupt: None,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Stop between passes once `flag` is set.
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn run(&self) -> SolverResult<EngineOutcome> {
        self.run_with_progress(&mut |_| {})
    }

    /// Run the loop, reporting each completed pass to `progress`.
    ///
    /// An interrupt, either through the flag or a `SimError::Interrupted`
    /// from the flowsheet, returns the last completed pass. If no pass has
    /// completed yet the interrupt is returned as an error.
    pub fn run_with_progress(
        &self,
        progress: &mut dyn FnMut(EngineEvent),
    ) -> SolverResult<EngineOutcome> {
        if !self.config.tolerance.is_finite() || self.config.tolerance <= 0.0 {
            return Err(SolverError::Setup {
                what: format!("engine tolerance must be positive, got {}", self.config.tolerance),
            });
        }
        let mut vars = self.declare()?;
        let mut guesses = TearGuesses::new();
        for (var, tear) in vars.iter().zip(self.flowsheet.tears()) {
            guesses.set(tear.name, var.clamp_to_range(tear.initial));
        }
        info!(
            tears = vars.len(),
            max_iterations = self.config.max_iterations,
            tolerance = self.config.tolerance,
            "convergence run started"
        );

        if self.interrupted() {
            return Err(SimError::Interrupted.into());
        }
        let mut last = self.evaluate(guesses)?;
        for var in &mut vars {
            let r = residual_for(&last.residuals, var.name())?;
            let x = last.guesses.get(var.name()).unwrap_or_default();
            var.record(x, r);
        }

        let mut iterations = 0;
        let status = loop {
            let max_residual = max_residual(&vars);
            let open: Vec<usize> = (0..vars.len()).filter(|&i| !vars[i].is_converged()).collect();
            progress(EngineEvent::PassCompleted {
                iteration: iterations,
                max_residual,
                open: open.len(),
            });
            debug!(iteration = iterations, max_residual, open = open.len(), "pass completed");

            if max_residual <= self.config.tolerance {
                break EngineStatus::Converged;
            }
            if iterations >= self.config.max_iterations {
                break EngineStatus::IterationCap;
            }
            if self.interrupted() {
                break EngineStatus::Interrupted;
            }

            let careful = open.len() < 2;
            let mut next = last.guesses.clone();
            for &i in &open {
                let var = &vars[i];
                let current = last.guesses.get(var.name()).unwrap_or_default();
                let proposed = var.optimize(current, careful);
                debug!(tear = var.name(), current, proposed, careful, "new guess");
                next.set(var.name(), proposed);
            }

            let pass = match self.evaluate(next) {
                Ok(pass) => pass,
                Err(SolverError::Sim(SimError::Interrupted)) => break EngineStatus::Interrupted,
                Err(err) => return Err(err),
            };
            iterations += 1;
            for var in &mut vars {
                let r = residual_for(&pass.residuals, var.name())?;
                let x = pass.guesses.get(var.name()).unwrap_or_default();
                let was_open = !var.is_converged();
                var.record(x, r);
                if was_open && var.is_converged() {
                    debug!(tear = var.name(), guess = x, residual = r, "tear closed");
                    var.clear();
                    var.record(x, r);
                }
            }
            last = pass;
        };

        let max_residual = max_residual(&vars);
        info!(?status, iterations, max_residual, "convergence run finished");
        progress(EngineEvent::Finished {
            status,
            iterations,
            max_residual,
        });
        Ok(EngineOutcome {
            graph: last.graph,
            status,
            iterations,
            max_residual,
            guesses: last.guesses,
            residuals: last.residuals,
            variables: vars.iter().map(ConvergenceVariable::snapshot).collect(),
        })
    }

    fn declare(&self) -> SolverResult<Vec<ConvergenceVariable>> {
        let mut seen = BTreeSet::new();
        self.flowsheet
            .tears()
            .into_iter()
            .map(|tear| {
                if !seen.insert(tear.name.clone()) {
                    return Err(SolverError::Setup {
                        what: format!("tear '{}' declared twice", tear.name),
                    });
                }
                if !tear.initial.is_finite() {
                    return Err(SolverError::Setup {
                        what: format!("tear '{}' has a non-finite initial guess", tear.name),
                    });
                }
                let tolerance = tear.tolerance.min(self.config.tolerance);
                Ok(ConvergenceVariable::new(tear.name, tear.lo, tear.hi, tolerance)?)
            })
            .collect()
    }

    fn evaluate(&self, guesses: TearGuesses) -> SolverResult<Pass> {
        let mut graph = self.flowsheet.build()?;
        let residuals = self.flowsheet.evaluate(&mut graph, &guesses)?;
        Ok(Pass {
            graph,
            guesses,
            residuals,
        })
    }

    fn interrupted(&self) -> bool {
        self.interrupt
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

fn residual_for(residuals: &Residuals, name: &str) -> SolverResult<f64> {
    residuals
        .get(name)
        .ok_or_else(|| SolverError::MissingResidual {
            name: name.to_string(),
        })
}

fn max_residual(vars: &[ConvergenceVariable]) -> f64 {
    vars.iter()
        .filter_map(ConvergenceVariable::latest_residual)
        .fold(0.0_f64, |m, r| m.max(r.abs()))
}
