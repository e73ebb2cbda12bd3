//! Integration tests for the bundled property models.
//!
//! Broad physical plausibility checks plus a couple of property-based sweeps
//! over the phase envelope.

use pc_core::units::{bar, celsius, pa};
use pc_fluids::{
    ConstantCpModel, FluidError, IdealBinaryModel, PropertyOracle, StateInput, StreamFluid,
};
use proptest::prelude::*;

#[test]
fn saturated_liquid_is_denser_than_saturated_vapour() {
    let model = IdealBinaryModel::default();
    let liq = model
        .resolve(StateInput::PQ { p: bar(10.0), q: 0.0 }, 0.5)
        .unwrap();
    let vap = model
        .resolve(StateInput::PQ { p: bar(10.0), q: 1.0 }, 0.5)
        .unwrap();

    assert!(vap.t.value > liq.t.value, "dew point above bubble point");
    assert!(liq.rho.unwrap().value > 10.0 * vap.rho.unwrap().value);
    // Saturated phases sit on opposite edges of the dome
    assert!((liq.y_liq.unwrap() - 0.5).abs() < 1e-6);
    assert!((vap.y_vap.unwrap() - 0.5).abs() < 1e-6);
}

#[test]
fn oracle_helpers_match_resolve() {
    let model = IdealBinaryModel::default();
    let h = model.h_pt(bar(10.0), celsius(40.0), 0.5).unwrap();
    let t = model.t_ph(bar(10.0), h, 0.5).unwrap();
    assert!((t.value - celsius(40.0).value).abs() < 1e-9);
}

#[test]
fn secondary_media_bypass_the_oracle() {
    let oracle = IdealBinaryModel::default();
    let salt = StreamFluid::from_tags(Some("hitecxl"), None, None).unwrap();

    // Resolved from cp alone, never through the binary model
    let st = salt
        .resolve(
            &oracle,
            StateInput::PT {
                p: pa(1e5),
                t: celsius(300.0),
            },
        )
        .unwrap();
    assert!((st.h - 1447.0 * 300.0).abs() < 1e-6);
    assert_eq!(salt.t_min(), Some(403.15));
}

#[test]
fn constant_cp_model_as_oracle() {
    let water = ConstantCpModel::new("coolant", 4180.0).unwrap();
    let h = water.h_pt(pa(2e5), celsius(20.0), 0.0).unwrap();
    assert!((h - 4180.0 * 20.0).abs() < 1e-6);
    assert!(matches!(
        ConstantCpModel::new("broken", -1.0),
        Err(FluidError::NonPhysical { .. })
    ));
}

proptest! {
    #[test]
    fn ph_round_trip_across_the_envelope(
        t_c in 0.0..300.0f64,
        p_bar in 2.0..40.0f64,
        y in 0.05..0.95f64,
    ) {
        let model = IdealBinaryModel::default();
        let st = model
            .resolve(StateInput::PT { p: bar(p_bar), t: celsius(t_c) }, y)
            .unwrap();
        let back = model
            .resolve(StateInput::PH { p: bar(p_bar), h: st.h }, y)
            .unwrap();
        prop_assert!((back.t.value - st.t.value).abs() < 1e-6);
    }

    #[test]
    fn enthalpy_rises_with_temperature(
        t_c in 0.0..300.0f64,
        dt in 0.5..20.0f64,
        y in 0.05..0.95f64,
    ) {
        let model = IdealBinaryModel::default();
        let p = bar(10.0);
        let a = model.h_pt(p, celsius(t_c), y).unwrap();
        let b = model.h_pt(p, celsius(t_c + dt), y).unwrap();
        prop_assert!(b > a);
    }
}
