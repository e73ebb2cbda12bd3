//! Common utilities for unit-operation balances.

use crate::error::{ComponentError, ComponentResult};
use pc_core::numeric::{Tolerances, ensure_finite, nearly_equal};
use pc_graph::{SimError, SimResult};

/// Inlet pressures closer than this are treated as equal.
pub const PRESSURE_TOL: Tolerances = Tolerances {
    abs: 1e-6,
    rel: 1e-9,
};

/// Mass-flow closure tolerance for over-specified balances.
pub const FLOW_TOL: Tolerances = Tolerances {
    abs: 1e-9,
    rel: 1e-9,
};

/// Hot and cold duties of a fully specified exchanger must agree this well.
pub const DUTY_TOL: Tolerances = Tolerances {
    abs: 1e-3,
    rel: 1e-6,
};

/// Ensure a construction parameter is finite.
pub fn check_finite(value: f64, what: &'static str) -> ComponentResult<f64> {
    ensure_finite(value, what).map_err(|_| ComponentError::NonPhysical { what })
}

/// Ensure an efficiency lies in (0, 1].
pub fn check_efficiency(eta: f64, what: &'static str) -> ComponentResult<f64> {
    check_finite(eta, what)?;
    if eta <= 0.0 || eta > 1.0 {
        return Err(ComponentError::InvalidArg { what });
    }
    Ok(eta)
}

pub fn pressures_match(a: f64, b: f64) -> bool {
    nearly_equal(a, b, PRESSURE_TOL)
}

/// Close `total = a + b` when at most one of the three flows is unknown.
///
/// Returns `(total, a, b)`. All three known must agree within [`FLOW_TOL`];
/// a solved flow must not be negative.
pub fn flow_balance(
    unit: &str,
    total: Option<f64>,
    a: Option<f64>,
    b: Option<f64>,
) -> SimResult<(f64, f64, f64)> {
    let solved = match (total, a, b) {
        (Some(t), Some(a), Some(b)) => {
            if !nearly_equal(t, a + b, FLOW_TOL) {
                return Err(SimError::input(
                    unit,
                    format!("mass flows do not balance: {t} != {a} + {b}"),
                ));
            }
            return Ok((t, a, b));
        }
        (None, Some(a), Some(b)) => (a + b, a, b),
        (Some(t), None, Some(b)) => (t, t - b, b),
        (Some(t), Some(a), None) => (t, a, t - a),
        _ => {
            return Err(SimError::input(
                unit,
                "at least two of the three mass flows must be known",
            ));
        }
    };
    let (t, a, b) = solved;
    if a < -FLOW_TOL.abs || b < -FLOW_TOL.abs || t < -FLOW_TOL.abs {
        return Err(SimError::input(
            unit,
            format!("flow split infeasible: {t} = {a} + {b}"),
        ));
    }
    Ok(solved)
}

/// Flow-weighted average of two values; the plain mean when both flows are
/// zero.
pub fn weighted_mean(m_a: f64, v_a: f64, m_b: f64, v_b: f64) -> f64 {
    let m = m_a + m_b;
    if m == 0.0 {
        0.5 * (v_a + v_b)
    } else {
        (m_a * v_a + m_b * v_b) / m
    }
}
