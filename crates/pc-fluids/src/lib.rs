//! pc-fluids: property models for the powercycle flowsheet solver.
//!
//! Provides:
//! - Thermodynamic state inputs and resolved states
//! - `PropertyOracle` trait for working-fluid property calculations
//! - Registered secondary media (molten salts) with constant heat capacity
//! - An ideal binary-mixture model with a temperature-glide phase envelope
//!
//! # Architecture
//!
//! The rest of the workspace only talks to the `PropertyOracle` trait, so a
//! real equation-of-state backend can be dropped in without touching unit
//! operations. Streams that carry a secondary medium are routed around the
//! oracle through [`StreamFluid`].
//!
//! # Example
//!
//! ```
//! use pc_fluids::{IdealBinaryModel, PropertyOracle, StateInput};
//! use pc_core::units::{bar, celsius};
//!
//! let model = IdealBinaryModel::default();
//! let input = StateInput::PT {
//!     p: bar(10.0),
//!     t: celsius(40.0),
//! };
//!
//! let state = model.resolve(input, 0.5).unwrap();
//! assert!(state.q.unwrap() < 0.0);
//! ```

pub mod binary;
pub mod error;
pub mod media;
pub mod model;
pub mod state;

// Re-exports for ergonomics
pub use binary::{IdealBinaryModel, Volatile};
pub use error::{FluidError, FluidResult};
pub use media::{ConstantCpModel, HITEC, HITEC_XL, MEDIA, Medium, StreamFluid, lookup_medium};
pub use model::PropertyOracle;
pub use state::{
    FluidState, MassFraction, SpecEnthalpy, SpecEntropy, SpecHeatCapacity, SpecInternalEnergy,
    StateInput,
};
