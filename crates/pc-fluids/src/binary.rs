//! Ideal binary-mixture property model.
//!
//! A light, volatile component (ammonia-like) dissolved in a heavy one
//! (water-like). Vapour-liquid equilibrium follows Raoult's law on a mass
//! basis with Clausius-Clapeyron vapour pressures:
//!
//! ```text
//! psat_i(T) = P_ref * exp(B_i * (1/Tb_i - 1/T))
//! K_i       = psat_i(T) / P
//! ```
//!
//! Caloric properties use constant liquid and vapour heat capacities with
//! latent heats referenced to the ice point:
//!
//! ```text
//! h_L = cpL * (T - T0) + (P - P_ref) / rho_L
//! h_V = yv*L_A + (1 - yv)*L_B + cpV * (T - T0)
//! s_L = cpL * ln(T/T0)
//! s_V = (yv*L_A + (1 - yv)*L_B)/T0 + cpV * ln(T/T0) - Rv * ln(P/P_ref)
//! ```
//!
//! The model is not meant to reproduce real ammonia-water tables. It has the
//! right qualitative shape (temperature glide, composition shift across the
//! dome, isentropic wetness on expansion) so flowsheets can be exercised
//! without an external equation of state.

use crate::error::{FluidError, FluidResult};
use crate::model::{PropertyOracle, validation};
use crate::state::{FluidState, MassFraction, StateInput};
use pc_core::numeric::bisect;
use pc_core::units::{Pressure, T_ZERO_K, k, kg_per_m3, pa};

const P_REF: f64 = 101_325.0;
const T_MIN: f64 = 200.0;
const T_MAX: f64 = 1000.0;
const P_MAX: f64 = 5.0e7;
const PURE_EPS: f64 = 1e-9;
const T_TOL: f64 = 1e-10;
const MAX_BISECT: usize = 200;

/// One volatile component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Volatile {
    /// Normal boiling point [K]
    pub tb: f64,
    /// Clausius-Clapeyron slope L/R [K]
    pub b: f64,
    /// Latent heat at the ice point [J/kg]
    pub latent: f64,
}

impl Volatile {
    fn psat(&self, t: f64) -> f64 {
        P_REF * (self.b * (1.0 / self.tb - 1.0 / t)).exp()
    }

    fn tsat(&self, p: f64) -> f64 {
        1.0 / (1.0 / self.tb - (p / P_REF).ln() / self.b)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IdealBinaryModel {
    pub light: Volatile,
    pub heavy: Volatile,
    /// Liquid heat capacity [J/(kg·K)]
    pub cp_liq: f64,
    /// Vapour heat capacity [J/(kg·K)]
    pub cp_vap: f64,
    /// Vapour gas constant [J/(kg·K)]
    pub r_vap: f64,
    /// Liquid density [kg/m³]
    pub rho_liq: f64,
}

impl Default for IdealBinaryModel {
    fn default() -> Self {
        Self::ammonia_water()
    }
}

/// Saturation boundaries at one pressure and overall composition.
#[derive(Debug, Clone, Copy)]
struct Dome {
    t_bub: f64,
    t_dew: f64,
    h_bub: f64,
    h_dew: f64,
    s_bub: f64,
    s_dew: f64,
    pure: bool,
}

impl IdealBinaryModel {
    pub fn ammonia_water() -> Self {
        Self {
            light: Volatile {
                tb: 239.8,
                b: 2800.0,
                latent: 1.26e6,
            },
            heavy: Volatile {
                tb: 373.15,
                b: 4900.0,
                latent: 2.5e6,
            },
            cp_liq: 4200.0,
            cp_vap: 2000.0,
            r_vap: 470.0,
            rho_liq: 800.0,
        }
    }

    /// Bubble-point temperature [K].
    pub fn bubble_t(&self, p: Pressure, z: MassFraction) -> FluidResult<f64> {
        validation::validate_pressure(p)?;
        validation::validate_fraction(z)?;
        Ok(self.dome(p.value, z)?.t_bub)
    }

    /// Dew-point temperature [K].
    pub fn dew_t(&self, p: Pressure, z: MassFraction) -> FluidResult<f64> {
        validation::validate_pressure(p)?;
        validation::validate_fraction(z)?;
        Ok(self.dome(p.value, z)?.t_dew)
    }

    fn latent_mix(&self, yv: f64) -> f64 {
        yv * self.light.latent + (1.0 - yv) * self.heavy.latent
    }

    /// Incompressible liquid including flow work.
    fn h_liq(&self, p: f64, t: f64) -> f64 {
        self.cp_liq * (t - T_ZERO_K) + (p - P_REF) / self.rho_liq
    }

    fn h_vap(&self, t: f64, yv: f64) -> f64 {
        self.latent_mix(yv) + self.cp_vap * (t - T_ZERO_K)
    }

    fn s_liq(&self, t: f64) -> f64 {
        self.cp_liq * (t / T_ZERO_K).ln()
    }

    fn s_vap(&self, p: f64, t: f64, yv: f64) -> f64 {
        self.latent_mix(yv) / T_ZERO_K + self.cp_vap * (t / T_ZERO_K).ln()
            - self.r_vap * (p / P_REF).ln()
    }

    fn rho_vap(&self, p: f64, t: f64) -> f64 {
        p / (self.r_vap * t)
    }

    fn is_pure(z: f64) -> bool {
        z <= PURE_EPS || z >= 1.0 - PURE_EPS
    }

    fn pure_component(&self, z: f64) -> &Volatile {
        if z >= 0.5 { &self.light } else { &self.heavy }
    }

    fn dome(&self, p: f64, z: f64) -> FluidResult<Dome> {
        let (t_bub, t_dew, pure) = if Self::is_pure(z) {
            let t = self.pure_component(z).tsat(p);
            (t, t, true)
        } else {
            let t_a = self.light.tsat(p);
            let t_b = self.heavy.tsat(p);
            let bub = bisect(
                |t| {
                    (z * self.light.psat(t) + (1.0 - z) * self.heavy.psat(t)) / p - 1.0
                },
                t_a,
                t_b,
                T_TOL,
                MAX_BISECT,
            )
            .ok_or(FluidError::ConvergenceFailed {
                what: "bubble-point temperature",
            })?;
            let dew = bisect(
                |t| p * (z / self.light.psat(t) + (1.0 - z) / self.heavy.psat(t)) - 1.0,
                t_a,
                t_b,
                T_TOL,
                MAX_BISECT,
            )
            .ok_or(FluidError::ConvergenceFailed {
                what: "dew-point temperature",
            })?;
            (bub, dew, false)
        };
        if !t_bub.is_finite() || !t_dew.is_finite() || t_bub <= 0.0 {
            return Err(FluidError::OutOfRange {
                what: "saturation temperature",
                value: t_bub,
            });
        }
        Ok(Dome {
            t_bub,
            t_dew,
            h_bub: self.h_liq(p, t_bub),
            h_dew: self.h_vap(t_dew, z),
            s_bub: self.s_liq(t_bub),
            s_dew: self.s_vap(p, t_dew, z),
            pure,
        })
    }

    /// Equilibrium phase compositions at (P, T) inside the mixture dome.
    fn split(&self, p: f64, t: f64) -> (f64, f64) {
        let ka = self.light.psat(t) / p;
        let kb = self.heavy.psat(t) / p;
        let x = ((1.0 - kb) / (ka - kb)).clamp(0.0, 1.0);
        let yv = (ka * x).clamp(0.0, 1.0);
        (x, yv)
    }

    fn finish(
        &self,
        p: f64,
        t: f64,
        parts: Phases,
        z: f64,
    ) -> FluidResult<FluidState> {
        if !(T_MIN..=T_MAX).contains(&t) {
            return Err(FluidError::OutOfRange {
                what: "temperature",
                value: t,
            });
        }
        let Phases { h, s, rho, q, y_vap, y_liq } = parts;
        validation::validate_caloric(h, "enthalpy must be finite")?;
        validation::validate_caloric(s, "entropy must be finite")?;
        Ok(FluidState {
            p: pa(p),
            t: k(t),
            h,
            e: Some(h - p / rho),
            s,
            rho: Some(kg_per_m3(rho)),
            q: Some(q),
            y: z,
            y_vap: Some(y_vap),
            y_liq: Some(y_liq),
        })
    }

    fn extrapolated_q(dome: &Dome, h: f64) -> f64 {
        let span = dome.h_dew - dome.h_bub;
        if span.abs() < f64::EPSILON {
            return if h <= dome.h_bub { 0.0 } else { 1.0 };
        }
        (h - dome.h_bub) / span
    }

    fn liquid(&self, p: f64, t: f64, z: f64, dome: &Dome) -> FluidResult<FluidState> {
        let h = self.h_liq(p, t);
        let parts = Phases {
            h,
            s: self.s_liq(t),
            rho: self.rho_liq,
            q: Self::extrapolated_q(dome, h).min(0.0),
            y_vap: z,
            y_liq: z,
        };
        self.finish(p, t, parts, z)
    }

    fn vapour(&self, p: f64, t: f64, z: f64, dome: &Dome) -> FluidResult<FluidState> {
        let h = self.h_vap(t, z);
        let parts = Phases {
            h,
            s: self.s_vap(p, t, z),
            rho: self.rho_vap(p, t),
            q: Self::extrapolated_q(dome, h).max(1.0),
            y_vap: z,
            y_liq: z,
        };
        self.finish(p, t, parts, z)
    }

    fn two_phase_parts(&self, p: f64, t: f64, z: f64) -> Phases {
        let (x, yv) = self.split(p, t);
        let q = if (yv - x).abs() < f64::EPSILON {
            0.0
        } else {
            ((z - x) / (yv - x)).clamp(0.0, 1.0)
        };
        let rho_v = self.rho_vap(p, t);
        Phases {
            h: (1.0 - q) * self.h_liq(p, t) + q * self.h_vap(t, yv),
            s: (1.0 - q) * self.s_liq(t) + q * self.s_vap(p, t, yv),
            rho: 1.0 / (q / rho_v + (1.0 - q) / self.rho_liq),
            q,
            y_vap: yv,
            y_liq: x,
        }
    }

    fn pure_two_phase(&self, p: f64, z: f64, q: f64, dome: &Dome) -> FluidResult<FluidState> {
        let t = dome.t_bub;
        let rho_v = self.rho_vap(p, t);
        let parts = Phases {
            h: (1.0 - q) * dome.h_bub + q * dome.h_dew,
            s: (1.0 - q) * dome.s_bub + q * dome.s_dew,
            rho: 1.0 / (q / rho_v + (1.0 - q) / self.rho_liq),
            q,
            y_vap: z,
            y_liq: z,
        };
        self.finish(p, t, parts, z)
    }

    fn solve_pt(&self, p: f64, t: f64, z: f64) -> FluidResult<FluidState> {
        let dome = self.dome(p, z)?;
        if t <= dome.t_bub {
            self.liquid(p, t, z, &dome)
        } else if t >= dome.t_dew {
            self.vapour(p, t, z, &dome)
        } else {
            self.finish(p, t, self.two_phase_parts(p, t, z), z)
        }
    }

    fn solve_ph(&self, p: f64, h: f64, z: f64) -> FluidResult<FluidState> {
        let dome = self.dome(p, z)?;
        if h <= dome.h_bub {
            let t = T_ZERO_K + (h - (p - P_REF) / self.rho_liq) / self.cp_liq;
            return self.liquid(p, t, z, &dome);
        }
        if h >= dome.h_dew {
            let t = T_ZERO_K + (h - self.latent_mix(z)) / self.cp_vap;
            return self.vapour(p, t, z, &dome);
        }
        if dome.pure {
            let q = Self::extrapolated_q(&dome, h);
            return self.pure_two_phase(p, z, q, &dome);
        }
        let t = bisect(
            |t| self.two_phase_parts(p, t, z).h - h,
            dome.t_bub,
            dome.t_dew,
            T_TOL,
            MAX_BISECT,
        )
        .ok_or(FluidError::ConvergenceFailed {
            what: "two-phase temperature from enthalpy",
        })?;
        self.finish(p, t, self.two_phase_parts(p, t, z), z)
    }

    fn solve_ps(&self, p: f64, s: f64, z: f64) -> FluidResult<FluidState> {
        let dome = self.dome(p, z)?;
        if s <= dome.s_bub {
            let t = T_ZERO_K * (s / self.cp_liq).exp();
            return self.liquid(p, t, z, &dome);
        }
        if s >= dome.s_dew {
            let ln_t = (s - self.latent_mix(z) / T_ZERO_K + self.r_vap * (p / P_REF).ln())
                / self.cp_vap;
            return self.vapour(p, T_ZERO_K * ln_t.exp(), z, &dome);
        }
        if dome.pure {
            let q = (s - dome.s_bub) / (dome.s_dew - dome.s_bub);
            return self.pure_two_phase(p, z, q, &dome);
        }
        let t = bisect(
            |t| self.two_phase_parts(p, t, z).s - s,
            dome.t_bub,
            dome.t_dew,
            T_TOL,
            MAX_BISECT,
        )
        .ok_or(FluidError::ConvergenceFailed {
            what: "two-phase temperature from entropy",
        })?;
        self.finish(p, t, self.two_phase_parts(p, t, z), z)
    }

    fn solve_pq(&self, p: f64, q: f64, z: f64) -> FluidResult<FluidState> {
        validation::validate_quality(q)?;
        let dome = self.dome(p, z)?;
        if dome.pure {
            return self.pure_two_phase(p, z, q, &dome);
        }
        let t = if q <= 0.0 {
            dome.t_bub
        } else if q >= 1.0 {
            dome.t_dew
        } else {
            bisect(
                |t| self.two_phase_parts(p, t, z).q - q,
                dome.t_bub,
                dome.t_dew,
                T_TOL,
                MAX_BISECT,
            )
            .ok_or(FluidError::ConvergenceFailed {
                what: "temperature from quality",
            })?
        };
        let mut parts = self.two_phase_parts(p, t, z);
        parts.q = q;
        self.finish(p, t, parts, z)
    }

    fn solve_tq(&self, t: f64, q: f64, z: f64) -> FluidResult<FluidState> {
        validation::validate_quality(q)?;
        let p = if Self::is_pure(z) {
            self.pure_component(z).psat(t)
        } else {
            let ps_a = self.light.psat(t);
            let ps_b = self.heavy.psat(t);
            let p_bub = z * ps_a + (1.0 - z) * ps_b;
            let p_dew = 1.0 / (z / ps_a + (1.0 - z) / ps_b);
            if q <= 0.0 {
                p_bub
            } else if q >= 1.0 {
                p_dew
            } else {
                bisect(
                    |p| self.two_phase_parts(p, t, z).q - q,
                    p_dew,
                    p_bub,
                    1e-9 * p_bub,
                    MAX_BISECT,
                )
                .ok_or(FluidError::ConvergenceFailed {
                    what: "pressure from quality",
                })?
            }
        };
        check_pressure(p)?;
        if Self::is_pure(z) {
            let dome = self.dome(p, z)?;
            return self.pure_two_phase(p, z, q, &dome);
        }
        let mut parts = self.two_phase_parts(p, t, z);
        parts.q = q;
        self.finish(p, t, parts, z)
    }

    fn solve_pe(&self, p: f64, e: f64, z: f64) -> FluidResult<FluidState> {
        let e_at = |h: f64| -> f64 {
            match self.solve_ph(p, h, z) {
                Ok(st) => st.e.unwrap_or(f64::NAN) - e,
                // Outside the temperature window: steer bisection inwards.
                Err(FluidError::OutOfRange { value, .. }) if value < T_MIN => -1.0,
                Err(_) => 1.0,
            }
        };
        let h_lo = self.solve_pt(p, T_MIN, z)?.h;
        let h_hi = self.solve_pt(p, T_MAX, z)?.h;
        let h = bisect(e_at, h_lo, h_hi, 1e-9 * (h_hi - h_lo).abs(), MAX_BISECT).ok_or(
            FluidError::OutOfRange {
                what: "internal energy",
                value: e,
            },
        )?;
        self.solve_ph(p, h, z)
    }
}

/// Caloric and phase-split properties assembled before range checks.
#[derive(Debug, Clone, Copy)]
struct Phases {
    h: f64,
    s: f64,
    rho: f64,
    q: f64,
    y_vap: f64,
    y_liq: f64,
}

fn check_pressure(p: f64) -> FluidResult<()> {
    validation::validate_pressure(pa(p))?;
    if p > P_MAX {
        return Err(FluidError::OutOfRange {
            what: "pressure",
            value: p,
        });
    }
    Ok(())
}

impl PropertyOracle for IdealBinaryModel {
    fn name(&self) -> &str {
        "ideal-binary"
    }

    fn resolve(&self, input: StateInput, y: MassFraction) -> FluidResult<FluidState> {
        validation::validate_fraction(y)?;
        match input {
            StateInput::PT { p, t } => {
                check_pressure(p.value)?;
                validation::validate_temperature(t)?;
                self.solve_pt(p.value, t.value, y)
            }
            StateInput::PH { p, h } => {
                check_pressure(p.value)?;
                validation::validate_caloric(h, "enthalpy must be finite")?;
                self.solve_ph(p.value, h, y)
            }
            StateInput::PS { p, s } => {
                check_pressure(p.value)?;
                validation::validate_caloric(s, "entropy must be finite")?;
                self.solve_ps(p.value, s, y)
            }
            StateInput::PQ { p, q } => {
                check_pressure(p.value)?;
                self.solve_pq(p.value, q, y)
            }
            StateInput::TQ { t, q } => {
                validation::validate_temperature(t)?;
                self.solve_tq(t.value, q, y)
            }
            StateInput::PE { p, e } => {
                check_pressure(p.value)?;
                validation::validate_caloric(e, "internal energy must be finite")?;
                self.solve_pe(p.value, e, y)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pc_core::units::{bar, celsius};

    fn model() -> IdealBinaryModel {
        IdealBinaryModel::default()
    }

    #[test]
    fn pure_water_boils_near_100c_at_one_atmosphere() {
        let t = model().bubble_t(pa(P_REF), 0.0).unwrap();
        assert!((t - 373.15).abs() < 1e-9);
    }

    #[test]
    fn mixture_has_temperature_glide() {
        let m = model();
        let t_bub = m.bubble_t(bar(10.0), 0.5).unwrap();
        let t_dew = m.dew_t(bar(10.0), 0.5).unwrap();
        assert!(t_dew > t_bub + 50.0, "bub {t_bub} dew {t_dew}");
    }

    #[test]
    fn ph_inverts_pt_in_each_region() {
        let m = model();
        for t_c in [20.0, 90.0, 200.0] {
            let st = m
                .resolve(
                    StateInput::PT {
                        p: bar(10.0),
                        t: celsius(t_c),
                    },
                    0.5,
                )
                .unwrap();
            let back = m.resolve(StateInput::PH { p: bar(10.0), h: st.h }, 0.5).unwrap();
            assert!((back.t.value - st.t.value).abs() < 1e-6, "t_c = {t_c}");
            let from_s = m.resolve(StateInput::PS { p: bar(10.0), s: st.s }, 0.5).unwrap();
            assert!((from_s.t.value - st.t.value).abs() < 1e-6, "t_c = {t_c}");
        }
    }

    #[test]
    fn quality_extrapolates_outside_the_dome() {
        let m = model();
        let cold = m
            .resolve(
                StateInput::PT {
                    p: bar(10.0),
                    t: celsius(20.0),
                },
                0.5,
            )
            .unwrap();
        let hot = m
            .resolve(
                StateInput::PT {
                    p: bar(10.0),
                    t: celsius(250.0),
                },
                0.5,
            )
            .unwrap();
        assert!(cold.q.unwrap() < 0.0);
        assert!(hot.q.unwrap() > 1.0);
    }

    #[test]
    fn two_phase_split_brackets_feed_composition() {
        let st = model()
            .resolve(
                StateInput::PT {
                    p: bar(10.0),
                    t: celsius(90.0),
                },
                0.5,
            )
            .unwrap();
        let (x, yv, q) = (st.y_liq.unwrap(), st.y_vap.unwrap(), st.q.unwrap());
        assert!(x < 0.5 && yv > 0.5);
        assert!((0.0..=1.0).contains(&q));
        // species balance over the split
        assert!((q * yv + (1.0 - q) * x - 0.5).abs() < 1e-9);
    }

    #[test]
    fn pq_and_tq_agree() {
        let m = model();
        let st = m.resolve(StateInput::PQ { p: bar(10.0), q: 0.3 }, 0.5).unwrap();
        let back = m.resolve(StateInput::TQ { t: st.t, q: 0.3 }, 0.5).unwrap();
        assert!((back.p.value - 1.0e6).abs() / 1.0e6 < 1e-6);
    }

    #[test]
    fn pe_recovers_enthalpy() {
        let m = model();
        let st = m
            .resolve(
                StateInput::PT {
                    p: bar(5.0),
                    t: celsius(160.0),
                },
                0.7,
            )
            .unwrap();
        let back = m
            .resolve(
                StateInput::PE {
                    p: bar(5.0),
                    e: st.e.unwrap(),
                },
                0.7,
            )
            .unwrap();
        assert!((back.h - st.h).abs() < 1e-3 * st.h.abs().max(1.0));
    }

    #[test]
    fn pure_component_two_phase_uses_lever_rule() {
        let m = model();
        let st = m.resolve(StateInput::PQ { p: pa(P_REF), q: 0.5 }, 0.0).unwrap();
        assert!((st.t.value - 373.15).abs() < 1e-9);
        let sat_l = m.resolve(StateInput::PQ { p: pa(P_REF), q: 0.0 }, 0.0).unwrap();
        let sat_v = m.resolve(StateInput::PQ { p: pa(P_REF), q: 1.0 }, 0.0).unwrap();
        assert!((st.h - 0.5 * (sat_l.h + sat_v.h)).abs() < 1e-6);
    }

    #[test]
    fn isentropic_expansion_cools_vapour() {
        let m = model();
        let hot = m
            .resolve(
                StateInput::PT {
                    p: bar(30.0),
                    t: celsius(400.0),
                },
                0.9,
            )
            .unwrap();
        let out = m.resolve(StateInput::PS { p: bar(3.0), s: hot.s }, 0.9).unwrap();
        assert!(out.t.value < hot.t.value);
        assert!(out.h < hot.h);
    }

    #[test]
    fn out_of_range_inputs_fail() {
        let m = model();
        assert!(matches!(
            m.resolve(
                StateInput::PT {
                    p: bar(10.0),
                    t: k(1500.0)
                },
                0.5
            ),
            Err(FluidError::OutOfRange { .. })
        ));
        assert!(m.resolve(StateInput::PQ { p: bar(10.0), q: 1.5 }, 0.5).is_err());
        assert!(m.resolve(StateInput::PH { p: bar(10.0), h: 1e5 }, 1.2).is_err());
        assert!(m.resolve(StateInput::PH { p: pa(6e7), h: 1e5 }, 0.5).is_err());
    }
}
