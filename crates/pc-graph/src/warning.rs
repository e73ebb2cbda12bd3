//! Non-fatal anomalies raised during evaluation.

use core::fmt;
use serde::Serialize;

/// A condition worth reporting that did not stop the evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SimWarning {
    /// Flash inlet quality outside [0, 1], clamped to the nearest bound.
    QualityClamped { unit: String, quality: f64 },
    /// Turbine exit wetter than the erosion limit.
    ExcessMoisture {
        unit: String,
        quality: f64,
        limit: f64,
    },
    /// Pump inlet contains vapour.
    PumpInletNotLiquid { unit: String, quality: f64 },
    /// Cold inlet hotter than hot inlet; no heat exchanged.
    ExchangerBypassed {
        unit: String,
        t_hot_in: f64,
        t_cold_in: f64,
    },
    /// Achieved pinch deviates from the requested approach.
    PinchNotEnforced {
        unit: String,
        achieved: f64,
        target: f64,
    },
    /// Flash species balance did not close within its iteration cap.
    FlashBalanceNotClosed { unit: String, residual: f64 },
    /// Every outlet was already specified; nothing left to solve.
    OverSpecified { unit: String },
    /// Outlet composition implied by the balances differs from the one set.
    CompositionMismatch {
        unit: String,
        node: String,
        expected: f64,
        actual: f64,
    },
    /// Outlet temperature held at the secondary medium's lower limit.
    MediumLimit {
        unit: String,
        t: f64,
        t_min: f64,
    },
}

impl SimWarning {
    pub fn unit(&self) -> &str {
        match self {
            SimWarning::QualityClamped { unit, .. }
            | SimWarning::ExcessMoisture { unit, .. }
            | SimWarning::PumpInletNotLiquid { unit, .. }
            | SimWarning::ExchangerBypassed { unit, .. }
            | SimWarning::PinchNotEnforced { unit, .. }
            | SimWarning::FlashBalanceNotClosed { unit, .. }
            | SimWarning::OverSpecified { unit }
            | SimWarning::CompositionMismatch { unit, .. }
            | SimWarning::MediumLimit { unit, .. } => unit,
        }
    }
}

impl fmt::Display for SimWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimWarning::QualityClamped { unit, quality } => {
                write!(f, "{unit}: inlet quality {quality:.4} outside [0,1], clamped")
            }
            SimWarning::ExcessMoisture {
                unit,
                quality,
                limit,
            } => write!(f, "{unit}: exit quality {quality:.4} below {limit}"),
            SimWarning::PumpInletNotLiquid { unit, quality } => {
                write!(f, "{unit}: inlet quality {quality:.4}, not liquid")
            }
            SimWarning::ExchangerBypassed {
                unit,
                t_hot_in,
                t_cold_in,
            } => write!(
                f,
                "{unit}: cold inlet {t_cold_in:.2} K above hot inlet {t_hot_in:.2} K, bypassed"
            ),
            SimWarning::PinchNotEnforced {
                unit,
                achieved,
                target,
            } => write!(f, "{unit}: pinch {achieved:.3} K, requested {target:.3} K"),
            SimWarning::FlashBalanceNotClosed { unit, residual } => {
                write!(f, "{unit}: species balance residual {residual:.3e}")
            }
            SimWarning::OverSpecified { unit } => {
                write!(f, "{unit}: all outlets specified, nothing solved")
            }
            SimWarning::CompositionMismatch {
                unit,
                node,
                expected,
                actual,
            } => write!(
                f,
                "{unit}: node {node} composition {actual:.5}, balance gives {expected:.5}"
            ),
            SimWarning::MediumLimit { unit, t, t_min } => {
                write!(f, "{unit}: outlet {t:.2} K held at medium minimum {t_min:.2} K")
            }
        }
    }
}
