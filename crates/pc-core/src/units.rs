//! SI quantities at the public API.
//!
//! Node state is stored as raw SI `f64`; these types only appear where a
//! caller sets or reads a stream attribute.

use uom::si::f64::{
    MassDensity as UomMassDensity, MassRate as UomMassRate, Power as UomPower,
    Pressure as UomPressure, ThermodynamicTemperature as UomThermodynamicTemperature,
};

pub type Density = UomMassDensity;
pub type MassRate = UomMassRate;
pub type Power = UomPower;
pub type Pressure = UomPressure;
pub type Temperature = UomThermodynamicTemperature;

/// Ice point, the zero of sensible enthalpy for secondary media [K].
pub const T_ZERO_K: f64 = 273.15;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn bar(v: f64) -> Pressure {
    use uom::si::pressure::bar;
    Pressure::new::<bar>(v)
}

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn celsius(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::degree_celsius;
    Temperature::new::<degree_celsius>(v)
}

#[inline]
pub fn kgps(v: f64) -> MassRate {
    use uom::si::mass_rate::kilogram_per_second;
    MassRate::new::<kilogram_per_second>(v)
}

#[inline]
pub fn watts(v: f64) -> Power {
    use uom::si::power::watt;
    Power::new::<watt>(v)
}

#[inline]
pub fn kg_per_m3(v: f64) -> Density {
    use uom::si::mass_density::kilogram_per_cubic_meter;
    Density::new::<kilogram_per_cubic_meter>(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_units_are_stored_in_si() {
        assert!((celsius(20.0).value - 293.15).abs() < 1e-9);
        assert!((celsius(0.0).value - T_ZERO_K).abs() < 1e-12);
        assert!((bar(10.0).value - 1.0e6).abs() < 1e-6);
        assert_eq!(pa(101_325.0).value, 101_325.0);
        assert_eq!(kgps(1.2).value, 1.2);
        assert_eq!(watts(5.0e5).value, 5.0e5);
        assert_eq!(kg_per_m3(800.0).value, 800.0);
    }
}
