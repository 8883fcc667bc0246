//! Radiation-dominated background: photons, thermal e± pairs and decoupled
//! neutrinos. Supplies the baryon density and the time map dt/du for the
//! network, where u = -ln T9 is the integration variable.

use crate::config::CosmologicalState;
use std::f64::consts::PI;

/// Electron mass in MeV.
pub const ELECTRON_MASS: f64 = 0.51099895;
/// T9 per MeV.
pub const T9_PER_MEV: f64 = 11.60451812;
/// Newton's constant in MeV^-2 (natural units).
pub const NEWTON_G: f64 = 6.70883e-45;
/// Conversion from MeV (as inverse time) to s^-1.
pub const MEV_PER_S: f64 = 1.519267e21;
/// hbar*c in MeV cm.
pub const HBAR_C_CM: f64 = 1.97326980e-11;
pub const AMU_GRAMS: f64 = 1.66053907e-24;
pub const AMU_MEV: f64 = 931.494;
/// Neutron-proton mass difference in MeV.
pub const NEUTRON_PROTON_Q: f64 = 1.293;
const ZETA3: f64 = 1.2020569;
const PAIR_SERIES_TERMS: usize = 20;
const MAX_BESSEL_ARGUMENT: f64 = 700.0;

/// Background quantities at one temperature.
#[derive(Debug, Clone, Copy)]
pub struct Background {
    pub t9: f64,
    /// Photon temperature in MeV.
    pub temperature: f64,
    /// Baryon mass density in g/cm^3.
    pub baryon_density: f64,
    /// Hubble rate in s^-1.
    pub hubble: f64,
    /// dt/du in seconds.
    pub dt_du: f64,
}

#[derive(Debug, Clone, Copy)]
struct PairPlasma {
    energy_density: f64,
    pressure: f64,
    energy_density_derivative: f64,
}

/// Background model for one cosmological parameter set.
#[derive(Debug, Clone)]
pub struct Cosmology {
    eta: f64,
    neutrino_species: f64,
    initial_temperature: f64,
    initial_entropy: f64,
}

impl Cosmology {
    pub fn new(state: &CosmologicalState) -> Self {
        let initial_temperature = state.initial_t9 / T9_PER_MEV;
        Self {
            eta: state.eta,
            neutrino_species: state.neutrino_species,
            initial_temperature,
            initial_entropy: plasma_entropy(initial_temperature),
        }
    }

    pub fn initial_temperature(&self) -> f64 {
        self.initial_temperature
    }

    pub fn initial_t9(&self) -> f64 {
        self.initial_temperature * T9_PER_MEV
    }

    /// Background at u = -ln T9.
    pub fn at(&self, u: f64) -> Background {
        let t9 = (-u).exp();
        self.at_t9(t9)
    }

    pub fn at_t9(&self, t9: f64) -> Background {
        let t = t9 / T9_PER_MEV;
        let rho_gamma = PI * PI / 15.0 * t.powi(4);
        let p_gamma = rho_gamma / 3.0;
        let drho_gamma = 4.0 * PI * PI / 15.0 * t.powi(3);
        let pairs = pair_plasma(t);

        let entropy = (rho_gamma + p_gamma + pairs.energy_density + pairs.pressure) / t;
        let scale_factor = (self.initial_entropy / entropy).cbrt();
        let t_nu = self.initial_temperature / scale_factor;
        let rho_nu = self.neutrino_species * 7.0 / 8.0 * PI * PI / 15.0 * t_nu.powi(4);

        // Baryons track the total plasma entropy, photons alone carry eta.
        let photon_number = 2.0 * ZETA3 / (PI * PI) * t.powi(3);
        let photon_entropy = (rho_gamma + p_gamma) / t;
        let baryon_number = self.eta * photon_number * entropy / photon_entropy;
        let baryon_density = baryon_number * HBAR_C_CM.powi(-3) * AMU_GRAMS;

        let rho_total = rho_gamma + pairs.energy_density + rho_nu + baryon_number * AMU_MEV;
        let hubble = (8.0 * PI * NEWTON_G / 3.0 * rho_total).sqrt() * MEV_PER_S;
        let dt_du = t * (drho_gamma + pairs.energy_density_derivative)
            / (3.0 * hubble * (rho_gamma + p_gamma + pairs.energy_density + pairs.pressure));

        Background {
            t9,
            temperature: t,
            baryon_density,
            hubble,
            dt_du,
        }
    }
}

fn plasma_entropy(t: f64) -> f64 {
    let rho_gamma = PI * PI / 15.0 * t.powi(4);
    let pairs = pair_plasma(t);
    (rho_gamma + rho_gamma / 3.0 + pairs.energy_density + pairs.pressure) / t
}

/// e± energy density, pressure and dρ/dT from the Bessel-function series.
fn pair_plasma(t: f64) -> PairPlasma {
    let z = ELECTRON_MASS / t;
    let mut rho = 0.0;
    let mut pressure = 0.0;
    let mut drho = 0.0;
    for n in 1..=PAIR_SERIES_TERMS {
        let nf = n as f64;
        let x = nf * z;
        if x > MAX_BESSEL_ARGUMENT {
            break;
        }
        let (k1, k2, k3) = bessel_k123(x);
        let sign = if n % 2 == 1 { 1.0 } else { -1.0 };
        let m = (0.75 * k3 + 0.25 * k1) / x;
        let l = k2 / x;
        let dm = -3.0 / (x * x) * k3 - k2 / x;
        rho += sign * m;
        pressure += sign * l / x;
        drho -= sign * nf * z / t * dm;
    }
    let norm = 2.0 / (PI * PI) * ELECTRON_MASS.powi(4);
    PairPlasma {
        energy_density: norm * rho,
        pressure: norm * pressure,
        energy_density_derivative: norm * drho,
    }
}

fn bessel_i0(x: f64) -> f64 {
    let y = (x / 3.75).powi(2);
    1.0 + y
        * (3.5156229
            + y * (3.0899424 + y * (1.2067492 + y * (0.2659732 + y * (0.360768e-1 + y * 0.45813e-2)))))
}

fn bessel_i1(x: f64) -> f64 {
    let y = (x / 3.75).powi(2);
    x * (0.5
        + y * (0.87890594
            + y * (0.51498869
                + y * (0.15084934 + y * (0.2658733e-1 + y * (0.301532e-2 + y * 0.32411e-3))))))
}

fn bessel_k0(x: f64) -> f64 {
    if x <= 2.0 {
        let y = x * x / 4.0;
        return -(x / 2.0).ln() * bessel_i0(x)
            + (-0.57721566
                + y * (0.42278420
                    + y * (0.23069756
                        + y * (0.3488590e-1 + y * (0.262698e-2 + y * (0.10750e-3 + y * 0.74e-5))))));
    }
    let y = 2.0 / x;
    (-x).exp() / x.sqrt()
        * (1.25331414
            + y * (-0.7832358e-1
                + y * (0.2189568e-1
                    + y * (-0.1062446e-1 + y * (0.587872e-2 + y * (-0.251540e-2 + y * 0.53208e-3))))))
}

fn bessel_k1(x: f64) -> f64 {
    if x <= 2.0 {
        let y = x * x / 4.0;
        return (x / 2.0).ln() * bessel_i1(x)
            + (1.0 / x)
                * (1.0
                    + y * (0.15443144
                        + y * (-0.67278579
                            + y * (-0.18156897
                                + y * (-0.1919402e-1 + y * (-0.110404e-2 + y * (-0.4686e-4)))))));
    }
    let y = 2.0 / x;
    (-x).exp() / x.sqrt()
        * (1.25331414
            + y * (0.23498619
                + y * (-0.3655620e-1
                    + y * (0.1504268e-1 + y * (-0.780353e-2 + y * (0.325614e-2 + y * (-0.68245e-3)))))))
}

/// K1, K2, K3 with the upward recurrence K_{n+1} = K_{n-1} + 2n/x K_n.
fn bessel_k123(x: f64) -> (f64, f64, f64) {
    let k0 = bessel_k0(x);
    let k1 = bessel_k1(x);
    let k2 = k0 + 2.0 / x * k1;
    let k3 = k1 + 4.0 / x * k2;
    (k1, k2, k3)
}

#[cfg(test)]
mod tests {
    use super::{bessel_k0, bessel_k1, pair_plasma, Cosmology, ELECTRON_MASS, T9_PER_MEV};
    use crate::config::CosmologicalState;
    use std::f64::consts::PI;

    #[test]
    fn bessel_functions_match_reference_values() {
        // Abramowitz & Stegun table 9.8.
        assert!((bessel_k0(1.0) - 0.4210244382).abs() < 1e-6);
        assert!((bessel_k1(1.0) - 0.6019072302).abs() < 1e-6);
        assert!((bessel_k0(5.0) - 0.003691098334).abs() < 1e-8);
        assert!((bessel_k1(5.0) - 0.004044613445).abs() < 1e-8);
    }

    #[test]
    fn relativistic_pairs_carry_seven_eighths_of_photon_density() {
        let t = 50.0 * ELECTRON_MASS;
        let pairs = pair_plasma(t);
        let photons = PI * PI / 15.0 * t.powi(4);
        let ratio = pairs.energy_density / photons;
        assert!((ratio - 7.0 / 4.0).abs() < 5e-3, "ratio = {ratio}");
        assert!((pairs.pressure - pairs.energy_density / 3.0).abs() / pairs.energy_density < 5e-3);
    }

    #[test]
    fn pairs_vanish_at_low_temperature() {
        let pairs = pair_plasma(0.001);
        assert!(pairs.energy_density < 1e-100);
        assert!(pairs.energy_density >= 0.0);
    }

    #[test]
    fn background_is_positive_and_time_grows_as_temperature_drops() {
        let cosmology = Cosmology::new(&CosmologicalState::default());
        let hot = cosmology.at_t9(10.0);
        let cold = cosmology.at_t9(0.1);
        for bg in [hot, cold] {
            assert!(bg.baryon_density > 0.0 && bg.baryon_density.is_finite());
            assert!(bg.hubble > 0.0 && bg.dt_du > 0.0);
        }
        assert!(cold.dt_du > hot.dt_du);
        assert!(hot.baryon_density > cold.baryon_density);
        // Radiation era: t ~ 1/(2H), so dt/du ~ 1/H.
        let late = cosmology.at_t9(0.05);
        assert!((late.dt_du * late.hubble - 1.0).abs() < 0.05);
        assert!((hot.temperature - 10.0 / T9_PER_MEV).abs() < 1e-15);
    }
}
