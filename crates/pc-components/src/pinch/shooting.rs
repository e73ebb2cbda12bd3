//! Shooting strategies that place the pinch at the requested approach.
//!
//! Every strategy guesses one outlet temperature through an offset `x` in
//! `[-(T_hot_in - T_cold_in), 0]` and closes the energy balance for the
//! rest. While the terminal at the other end of the exchanger violates the
//! approach, that violation is the residual; once it holds, the residual is
//! the internal pinch minus `dt_min` from [`check`].

use core::fmt;

use pc_core::ConvergenceVariable;
use pc_fluids::{FluidError, FluidResult, PropertyOracle};
use pc_graph::{SimError, SimResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::PinchConfig;
use super::profile::{ExchangerStream, Terminals, check};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Both flows known. Shoot the cold outlet, `x = T_cold_out - T_hot_in`.
    HotSide,
    /// Both flows known. Shoot the hot outlet, `x = T_cold_in - T_hot_out`.
    ColdSide,
    /// Hot flow unknown, one outlet fixed. Shoot the open outlet and derive
    /// the hot flow from the balance.
    HotFlow,
    /// Cold flow unknown, one outlet fixed.
    ColdFlow,
}

impl Strategy {
    /// Order tried when both flows are known.
    pub const RANKED: [Strategy; 2] = [Strategy::HotSide, Strategy::ColdSide];
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Strategy::HotSide => "hot-side",
            Strategy::ColdSide => "cold-side",
            Strategy::HotFlow => "hot-flow",
            Strategy::ColdFlow => "cold-flow",
        };
        f.write_str(s)
    }
}

/// Outcome of a successful strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct ShootingSolution {
    pub strategy: Strategy,
    pub ends: Terminals,
    pub trials: usize,
    /// Set when the hot outlet was held at the hot medium's minimum [K]
    pub medium_limit: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Outlet {
    Hot(f64),
    Cold(f64),
}

/// Knowns a strategy runs with.
#[derive(Debug, Clone, Copy)]
enum Setup {
    Balanced {
        m_hot: f64,
        m_cold: f64,
        shoot_hot: bool,
    },
    OpenFlow {
        fixed: Outlet,
        /// Flow of the side whose flow is known
        m_known: f64,
        hot_open: bool,
    },
}

impl Setup {
    fn shoots_hot(&self) -> bool {
        match *self {
            Setup::Balanced { shoot_hot, .. } => shoot_hot,
            Setup::OpenFlow { fixed, .. } => matches!(fixed, Outlet::Cold(_)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Trial {
    x: f64,
    ends: Terminals,
    /// Approach at the end opposite the shot outlet, minus `dt_min`
    deviation: f64,
    medium_limit: Option<f64>,
}

/// Everything a strategy needs about one exchanger.
pub struct ShootingProblem<'a> {
    pub unit: &'a str,
    pub oracle: &'a dyn PropertyOracle,
    pub config: &'a PinchConfig,
    pub hot: ExchangerStream,
    pub cold: ExchangerStream,
    /// Outlet enthalpies fixed before shooting
    pub h_hot_out: Option<f64>,
    pub h_cold_out: Option<f64>,
}

impl ShootingProblem<'_> {
    /// Try strategies in order, moving on after recoverable failures.
    pub fn solve_ranked(&self, strategies: &[Strategy]) -> SimResult<ShootingSolution> {
        first_success(self.unit, strategies, |s| self.solve(s))
    }

    pub fn solve(&self, strategy: Strategy) -> SimResult<ShootingSolution> {
        let setup = self.setup(strategy)?;
        let cfg = self.config;
        let span = self.hot.t_in - self.cold.t_in;
        let mut var = ConvergenceVariable::new(
            format!("{} {strategy}", self.unit),
            -span,
            0.0,
            cfg.tolerance,
        )?;
        let start = if setup.shoots_hot() {
            -cfg.dt_min
        } else {
            -0.25 * span
        };
        let mut x = var.clamp_to_range(start);
        let mut last_feasible = None;
        let mut infeasible = 0;

        for trial in 1..=cfg.max_iter {
            let attempt = self.trial(setup, x).and_then(|t| {
                if t.deviation < -cfg.tolerance {
                    return Ok((t, None));
                }
                let profile = check(self.oracle, &self.hot, &self.cold, &t.ends, cfg.segments)?;
                Ok((t, Some(profile.dt_min - cfg.dt_min)))
            });
            let (t, pinch_residual) = match attempt {
                Ok(found) => found,
                Err(err) => {
                    infeasible += 1;
                    debug!(unit = self.unit, %strategy, trial, x, %err, "infeasible trial");
                    if infeasible >= cfg.max_infeasible {
                        return Err(err.into());
                    }
                    x = 0.5 * (x + last_feasible.unwrap_or(-span));
                    continue;
                }
            };
            if matches!(setup, Setup::OpenFlow { .. }) && pinch_residual.is_none() {
                return Err(SimError::input(
                    self.unit,
                    format!(
                        "fixed terminal approach {:.3} K is below {:.3} K",
                        t.deviation + cfg.dt_min,
                        cfg.dt_min
                    ),
                ));
            }

            let residual = pinch_residual.unwrap_or(t.deviation);
            var.record(t.x, residual);
            last_feasible = Some(t.x);
            debug!(unit = self.unit, %strategy, trial, x = t.x, residual, "pinch trial");

            let held = t.medium_limit.is_some() && residual >= -cfg.tolerance;
            if residual.abs() <= cfg.tolerance || held {
                return Ok(ShootingSolution {
                    strategy,
                    ends: t.ends,
                    trials: trial,
                    medium_limit: t.medium_limit,
                });
            }
            x = var.optimize(t.x, false);
        }

        Err(SimError::convergence(
            self.unit,
            format!(
                "{strategy}: pinch not within {} K after {} trials",
                cfg.tolerance, cfg.max_iter
            ),
        ))
    }

    fn setup(&self, strategy: Strategy) -> SimResult<Setup> {
        let fixed = match (self.h_hot_out, self.h_cold_out) {
            (Some(h), None) => Some(Outlet::Hot(h)),
            (None, Some(h)) => Some(Outlet::Cold(h)),
            _ => None,
        };
        let flow = |m: Option<f64>, side: &str| {
            m.ok_or_else(|| {
                SimError::input(self.unit, format!("{strategy} needs the {side} mass flow"))
            })
        };
        match strategy {
            Strategy::HotSide | Strategy::ColdSide => Ok(Setup::Balanced {
                m_hot: flow(self.hot.mdot, "hot")?,
                m_cold: flow(self.cold.mdot, "cold")?,
                shoot_hot: strategy == Strategy::ColdSide,
            }),
            Strategy::HotFlow | Strategy::ColdFlow => {
                let hot_open = strategy == Strategy::HotFlow;
                let m_known = if hot_open {
                    flow(self.cold.mdot, "cold")?
                } else {
                    flow(self.hot.mdot, "hot")?
                };
                let fixed = fixed.ok_or_else(|| {
                    SimError::input(self.unit, format!("{strategy} needs exactly one fixed outlet"))
                })?;
                Ok(Setup::OpenFlow {
                    fixed,
                    m_known,
                    hot_open,
                })
            }
        }
    }

    fn trial(&self, setup: Setup, x: f64) -> FluidResult<Trial> {
        let (hot, cold, oracle) = (&self.hot, &self.cold, self.oracle);
        let shoot_cold = |x: f64| cold.h_at(oracle, hot.t_in + x);

        let (h_hot_out, h_cold_out, x, medium_limit) = match setup {
            Setup::Balanced {
                m_hot,
                m_cold,
                shoot_hot: true,
            } => {
                let (h2, x, _) = self.shoot_hot(x, false)?;
                (h2, cold.h_in + m_hot * (hot.h_in - h2) / m_cold, x, None)
            }
            Setup::Balanced {
                m_hot,
                m_cold,
                shoot_hot: false,
            } => {
                let h4 = shoot_cold(x)?;
                (hot.h_in - m_cold * (h4 - cold.h_in) / m_hot, h4, x, None)
            }
            Setup::OpenFlow {
                fixed: Outlet::Cold(h4),
                ..
            } => {
                let (h2, x, limit) = self.shoot_hot(x, true)?;
                (h2, h4, x, limit)
            }
            Setup::OpenFlow {
                fixed: Outlet::Hot(h2),
                ..
            } => (h2, shoot_cold(x)?, x, None),
        };

        let (m_hot, m_cold) = match setup {
            Setup::Balanced { m_hot, m_cold, .. } => (m_hot, m_cold),
            Setup::OpenFlow {
                m_known,
                hot_open: true,
                ..
            } => (derived_flow(m_known * (h_cold_out - cold.h_in), hot.h_in - h_hot_out)?, m_known),
            Setup::OpenFlow {
                m_known,
                hot_open: false,
                ..
            } => (m_known, derived_flow(m_known * (hot.h_in - h_hot_out), h_cold_out - cold.h_in)?),
        };

        let dt_min = self.config.dt_min;
        let deviation = if setup.shoots_hot() {
            hot.t_in - (cold.t_at(oracle, h_cold_out)? + dt_min)
        } else {
            hot.t_at(oracle, h_hot_out)? - (cold.t_in + dt_min)
        };

        Ok(Trial {
            x,
            ends: Terminals {
                h_hot_out,
                h_cold_out,
                m_hot,
                m_cold,
            },
            deviation,
            medium_limit,
        })
    }

    /// Hot outlet enthalpy for offset `x`, optionally held at the hot
    /// medium's minimum temperature. Returns the offset actually used.
    fn shoot_hot(&self, x: f64, respect_limit: bool) -> FluidResult<(f64, f64, Option<f64>)> {
        let t_hot_out = self.cold.t_in - x;
        let limit = self
            .hot
            .fluid
            .t_min()
            .filter(|&t_min| respect_limit && t_hot_out < t_min);
        let (t_hot_out, x) = match limit {
            Some(t_min) => (t_min, self.cold.t_in - t_min),
            None => (t_hot_out, x),
        };
        Ok((self.hot.h_at(self.oracle, t_hot_out)?, x, limit))
    }
}

fn derived_flow(duty: f64, dh: f64) -> FluidResult<f64> {
    let m = duty / dh;
    if dh <= 0.0 || !m.is_finite() || m <= 0.0 {
        return Err(FluidError::NonPhysical {
            what: "mass flow derived from the exchanger balance",
        });
    }
    Ok(m)
}

/// Run `attempt` for each strategy until one succeeds. Recoverable errors
/// move on to the next strategy; the last one is returned if all fail.
pub fn first_success<T>(
    unit: &str,
    strategies: &[Strategy],
    mut attempt: impl FnMut(Strategy) -> SimResult<T>,
) -> SimResult<T> {
    let mut last = None;
    for &strategy in strategies {
        match attempt(strategy) {
            Ok(found) => return Ok(found),
            Err(err) if err.is_recoverable() => {
                debug!(unit, %strategy, %err, "strategy failed, trying next");
                last = Some(err);
            }
            Err(err) => return Err(err),
        }
    }
    Err(last.unwrap_or_else(|| SimError::input(unit, "no shooting strategy to try")))
}
