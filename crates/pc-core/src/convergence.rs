//! Adaptive one-dimensional root tracking for recycle unknowns.
//!
//! A [`ConvergenceVariable`] keeps a short history of `(guess, residual)`
//! samples for one scalar condition and proposes the next guess. Residuals
//! follow the fixed-point convention `r = computed - guessed`, so a positive
//! residual means the guess should move up.
//!
//! Step selection:
//! 1. residual already inside tolerance: keep the current guess;
//! 2. fewer than two samples, or careful mode: damped manual step `x + k*r`;
//! 3. the last two residuals straddle zero or shrank by at least 10%:
//!    least-squares polynomial fit `r(x)` and a Newton root from the current
//!    guess, falling back to the manual step if the fit is singular;
//! 4. otherwise the manual step.
//!
//! The proposal is clamped into the declared range. When clamping bites, the
//! undamped step `x + r` is clamped instead.

use crate::error::{CoreError, CoreResult};
use crate::numeric::clamp;
use nalgebra::{DMatrix, DVector};
use tracing::debug;

/// Default number of samples kept per variable.
pub const DEFAULT_HISTORY_CAP: usize = 5;

const MAX_FIT_ORDER: usize = 3;
const NEWTON_MAX_ITER: usize = 50;

/// Snapshot of a variable, returned with engine outcomes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConvergenceVariableSnapshot {
    pub name: String,
    pub lo: f64,
    pub hi: f64,
    pub tolerance: f64,
    pub history: Vec<(f64, f64)>,
}

impl ConvergenceVariableSnapshot {
    pub fn last_residual(&self) -> Option<f64> {
        self.history.last().map(|&(_, r)| r)
    }

    pub fn last_guess(&self) -> Option<f64> {
        self.history.last().map(|&(x, _)| x)
    }
}

#[derive(Debug, Clone)]
pub struct ConvergenceVariable {
    name: String,
    lo: f64,
    hi: f64,
    tolerance: f64,
    history_cap: usize,
    history: Vec<(f64, f64)>,
}

impl ConvergenceVariable {
    /// Create a variable bounded to `[lo, hi]` that counts as converged once
    /// `|residual| <= tolerance`.
    pub fn new(name: impl Into<String>, lo: f64, hi: f64, tolerance: f64) -> CoreResult<Self> {
        let name = name.into();
        if !lo.is_finite() || !hi.is_finite() || lo > hi {
            return Err(CoreError::InvalidRange { what: name, lo, hi });
        }
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(CoreError::InvalidArg {
                what: "convergence tolerance must be positive and finite",
            });
        }
        Ok(Self {
            name,
            lo,
            hi,
            tolerance,
            history_cap: DEFAULT_HISTORY_CAP,
            history: Vec::with_capacity(DEFAULT_HISTORY_CAP + 1),
        })
    }

    /// Override the history cap (at least two samples are always kept).
    pub fn with_history_cap(mut self, cap: usize) -> Self {
        self.history_cap = cap.max(2);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn range(&self) -> (f64, f64) {
        (self.lo, self.hi)
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn history(&self) -> &[(f64, f64)] {
        &self.history
    }

    pub fn latest(&self) -> Option<(f64, f64)> {
        self.history.last().copied()
    }

    pub fn latest_residual(&self) -> Option<f64> {
        self.latest().map(|(_, r)| r)
    }

    /// True once the newest residual is inside tolerance.
    pub fn is_converged(&self) -> bool {
        self.latest_residual()
            .is_some_and(|r| r.abs() <= self.tolerance)
    }

    /// Append a sample. Past the cap, the sample with the largest |residual|
    /// is dropped, never the newest one.
    pub fn record(&mut self, guess: f64, residual: f64) {
        self.history.push((guess, residual));
        while self.history.len() > self.history_cap {
            let newest = self.history.len() - 1;
            let worst = self.history[..newest]
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.1.abs().total_cmp(&b.1.1.abs()))
                .map(|(i, _)| i)
                .unwrap_or(0);
            self.history.remove(worst);
        }
    }

    /// Forget all samples. Used once a variable has converged so that stale
    /// points do not bias a later re-opening.
    pub fn clear(&mut self) {
        self.history.clear();
    }

    pub fn clamp_to_range(&self, x: f64) -> f64 {
        clamp(x, self.lo, self.hi)
    }

    /// Propose the next guess given the current one.
    pub fn optimize(&self, current: f64, careful: bool) -> f64 {
        let Some((_, r_last)) = self.latest() else {
            return current;
        };
        if r_last.abs() <= self.tolerance {
            return current;
        }

        let raw = if self.history.len() < 2 || careful {
            manual_step(current, r_last)
        } else {
            let r_prev = self.history[self.history.len() - 2].1;
            let straddles = r_prev.signum() != r_last.signum();
            let improving = r_last.abs() <= 0.9 * r_prev.abs();
            if straddles || improving {
                match self.polynomial_root(current) {
                    Some(x) => x,
                    None => {
                        debug!(var = %self.name, "polynomial fit failed, manual step");
                        manual_step(current, r_last)
                    }
                }
            } else {
                manual_step(current, r_last)
            }
        };

        let proposed = self.clamp_to_range(raw);
        if proposed != raw {
            let fallback = self.clamp_to_range(current + r_last);
            debug!(var = %self.name, raw, fallback, "guess clamped into range");
            return fallback;
        }
        proposed
    }

    /// Fit `r(x)` over the history with increasing order until the RMS misfit
    /// is inside tolerance, then find the root nearest `current`.
    fn polynomial_root(&self, current: f64) -> Option<f64> {
        let n = self.history.len();
        let mean = self.history.iter().map(|&(x, _)| x).sum::<f64>() / n as f64;
        let scale = self
            .history
            .iter()
            .map(|&(x, _)| (x - mean).abs())
            .fold(0.0_f64, f64::max);
        if scale <= f64::EPSILON * mean.abs().max(1.0) {
            return None;
        }

        let z: Vec<f64> = self.history.iter().map(|&(x, _)| (x - mean) / scale).collect();
        let r = DVector::from_iterator(n, self.history.iter().map(|&(_, r)| r));
        let max_order = (n - 1).min(MAX_FIT_ORDER);

        let mut coeffs = None;
        for order in 1..=max_order {
            let a = DMatrix::from_fn(n, order + 1, |i, j| z[i].powi(j as i32));
            let ata = a.transpose() * &a;
            let atr = a.transpose() * &r;
            let Some(c) = ata.lu().solve(&atr) else {
                break;
            };
            let misfit = &a * &c - &r;
            let rms = (misfit.norm_squared() / n as f64).sqrt();
            coeffs = Some(c);
            if rms <= self.tolerance {
                break;
            }
        }
        let c = coeffs?;

        let mut zk = (current - mean) / scale;
        for _ in 0..NEWTON_MAX_ITER {
            let (p, dp) = eval_poly(&c, zk);
            if !p.is_finite() || !dp.is_finite() || dp.abs() < 1e-300 {
                return None;
            }
            let step = p / dp;
            zk -= step;
            if step.abs() <= 1e-12 * zk.abs().max(1.0) {
                let x = mean + scale * zk;
                return x.is_finite().then_some(x);
            }
        }
        None
    }

    pub fn snapshot(&self) -> ConvergenceVariableSnapshot {
        ConvergenceVariableSnapshot {
            name: self.name.clone(),
            lo: self.lo,
            hi: self.hi,
            tolerance: self.tolerance,
            history: self.history.clone(),
        }
    }
}

/// Damped fixed-point step; smaller gain for small-magnitude guesses such as
/// mass fractions.
fn manual_step(current: f64, residual: f64) -> f64 {
    let gain = if current.abs() < 1.0 { 0.25 } else { 0.5 };
    current + gain * residual
}

/// Horner evaluation of a polynomial and its derivative.
fn eval_poly(c: &DVector<f64>, z: f64) -> (f64, f64) {
    let mut p = 0.0;
    let mut dp = 0.0;
    for k in (0..c.len()).rev() {
        dp = dp * z + p;
        p = p * z + c[k];
    }
    (p, dp)
}
