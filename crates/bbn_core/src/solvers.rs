use crate::error::IntegrationFailure;
use crate::traits::{NetworkSystem, Steppable};

/// Classic Runge-Kutta 4th Order Solver
pub struct RK4 {
    k1: Vec<f64>,
    k2: Vec<f64>,
    k3: Vec<f64>,
    k4: Vec<f64>,
    tmp: Vec<f64>,
}

impl RK4 {
    /// Largest |lambda| du on the negative real axis inside the stability region.
    pub const STABILITY_BOUND: f64 = 2.6;

    pub fn new(dim: usize) -> Self {
        Self {
            k1: vec![0.0; dim],
            k2: vec![0.0; dim],
            k3: vec![0.0; dim],
            k4: vec![0.0; dim],
            tmp: vec![0.0; dim],
        }
    }
}

impl Steppable for RK4 {
    fn step(
        &mut self,
        system: &impl NetworkSystem,
        u: &mut f64,
        state: &mut [f64],
        du: f64,
    ) -> Result<(), IntegrationFailure> {
        let u0 = *u;

        // k1 = f(u, y)
        system.apply(u0, state, &mut self.k1);

        // k2 = f(u + du/2, y + du*k1/2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + 0.5 * du * self.k1[i];
        }
        system.apply(u0 + 0.5 * du, &self.tmp, &mut self.k2);

        // k3 = f(u + du/2, y + du*k2/2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + 0.5 * du * self.k2[i];
        }
        system.apply(u0 + 0.5 * du, &self.tmp, &mut self.k3);

        // k4 = f(u + du, y + du*k3)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + du * self.k3[i];
        }
        system.apply(u0 + du, &self.tmp, &mut self.k4);

        for i in 0..state.len() {
            state[i] += du / 6.0 * (self.k1[i] + 2.0 * self.k2[i] + 2.0 * self.k3[i] + self.k4[i]);
        }

        *u = u0 + du;
        Ok(())
    }
}

/// Six-stage explicit tableau carrying a 5th-order and an embedded 4th-order
/// weight set.
#[derive(Debug, Clone, Copy)]
pub struct ButcherTableau {
    pub name: &'static str,
    pub c: [f64; 6],
    /// Row s holds the coefficients of stages 0..s.
    pub a: [[f64; 5]; 6],
    pub b_high: [f64; 6],
    pub b_low: [f64; 6],
    pub stability_bound: f64,
}

/// Runge-Kutta-Fehlberg 4(5).
pub const FEHLBERG: ButcherTableau = ButcherTableau {
    name: "Fehlberg",
    c: [0.0, 1.0 / 4.0, 3.0 / 8.0, 12.0 / 13.0, 1.0, 1.0 / 2.0],
    a: [
        [0.0, 0.0, 0.0, 0.0, 0.0],
        [1.0 / 4.0, 0.0, 0.0, 0.0, 0.0],
        [3.0 / 32.0, 9.0 / 32.0, 0.0, 0.0, 0.0],
        [1932.0 / 2197.0, -7200.0 / 2197.0, 7296.0 / 2197.0, 0.0, 0.0],
        [439.0 / 216.0, -8.0, 3680.0 / 513.0, -845.0 / 4104.0, 0.0],
        [-8.0 / 27.0, 2.0, -3544.0 / 2565.0, 1859.0 / 4104.0, -11.0 / 40.0],
    ],
    b_high: [
        16.0 / 135.0,
        0.0,
        6656.0 / 12825.0,
        28561.0 / 56430.0,
        -9.0 / 50.0,
        2.0 / 55.0,
    ],
    b_low: [
        25.0 / 216.0,
        0.0,
        1408.0 / 2565.0,
        2197.0 / 4104.0,
        -1.0 / 5.0,
        0.0,
    ],
    stability_bound: 2.8,
};

/// Cash-Karp 4(5).
pub const CASH_KARP: ButcherTableau = ButcherTableau {
    name: "Cash-Karp",
    c: [0.0, 1.0 / 5.0, 3.0 / 10.0, 3.0 / 5.0, 1.0, 7.0 / 8.0],
    a: [
        [0.0, 0.0, 0.0, 0.0, 0.0],
        [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0],
        [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0],
        [3.0 / 10.0, -9.0 / 10.0, 6.0 / 5.0, 0.0, 0.0],
        [-11.0 / 54.0, 5.0 / 2.0, -70.0 / 27.0, 35.0 / 27.0, 0.0],
        [
            1631.0 / 55296.0,
            175.0 / 512.0,
            575.0 / 13824.0,
            44275.0 / 110592.0,
            253.0 / 4096.0,
        ],
    ],
    b_high: [
        37.0 / 378.0,
        0.0,
        250.0 / 621.0,
        125.0 / 594.0,
        0.0,
        512.0 / 1771.0,
    ],
    b_low: [
        2825.0 / 27648.0,
        0.0,
        18575.0 / 48384.0,
        13525.0 / 55296.0,
        277.0 / 14336.0,
        1.0 / 4.0,
    ],
    stability_bound: 3.0,
};

/// Embedded pair stepper. Advances with the 5th-order weights and reports
/// the difference to the 4th-order solution.
pub struct EmbeddedPair {
    tableau: ButcherTableau,
    k: [Vec<f64>; 6],
    tmp: Vec<f64>,
}

impl EmbeddedPair {
    pub fn new(tableau: ButcherTableau, dim: usize) -> Self {
        Self {
            tableau,
            k: std::array::from_fn(|_| vec![0.0; dim]),
            tmp: vec![0.0; dim],
        }
    }

    pub fn tableau(&self) -> &ButcherTableau {
        &self.tableau
    }

    /// Writes the 5th-order solution into `out` and (high - low) into `error`.
    pub fn attempt(
        &mut self,
        system: &impl NetworkSystem,
        u: f64,
        state: &[f64],
        du: f64,
        out: &mut [f64],
        error: &mut [f64],
    ) {
        let tab = self.tableau;
        system.apply(u, state, &mut self.k[0]);
        for s in 1..6 {
            for i in 0..state.len() {
                let mut acc = 0.0;
                for j in 0..s {
                    acc += tab.a[s][j] * self.k[j][i];
                }
                self.tmp[i] = state[i] + du * acc;
            }
            system.apply(u + tab.c[s] * du, &self.tmp, &mut self.k[s]);
        }

        for i in 0..state.len() {
            let mut high = 0.0;
            let mut low = 0.0;
            for s in 0..6 {
                high += tab.b_high[s] * self.k[s][i];
                low += tab.b_low[s] * self.k[s][i];
            }
            out[i] = state[i] + du * high;
            error[i] = du * (high - low);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ButcherTableau, EmbeddedPair, CASH_KARP, FEHLBERG, RK4};
    use crate::traits::{NetworkSystem, Steppable};
    use nalgebra::DMatrix;

    struct Decay {
        rate: f64,
    }

    impl NetworkSystem for Decay {
        fn dimension(&self) -> usize {
            1
        }

        fn apply(&self, _u: f64, y: &[f64], out: &mut [f64]) {
            out[0] = -self.rate * y[0];
        }

        fn jacobian(&self, _u: f64, _y: &[f64], out: &mut DMatrix<f64>) {
            out[(0, 0)] = -self.rate;
        }
    }

    fn check_consistency(tableau: &ButcherTableau) {
        for s in 0..6 {
            let row: f64 = tableau.a[s].iter().sum();
            assert!((row - tableau.c[s]).abs() < 1e-14, "{} row {s}", tableau.name);
        }
        let high: f64 = tableau.b_high.iter().sum();
        let low: f64 = tableau.b_low.iter().sum();
        assert!((high - 1.0).abs() < 1e-14 && (low - 1.0).abs() < 1e-14);
    }

    #[test]
    fn tableaus_are_consistent() {
        check_consistency(&FEHLBERG);
        check_consistency(&CASH_KARP);
    }

    #[test]
    fn rk4_matches_exponential_decay() {
        let system = Decay { rate: 1.0 };
        let mut stepper = RK4::new(1);
        let mut u = 0.0;
        let mut y = [1.0];
        for _ in 0..10 {
            stepper.step(&system, &mut u, &mut y, 0.1).expect("step");
        }
        assert!((u - 1.0).abs() < 1e-12);
        assert!((y[0] - (-1.0f64).exp()).abs() < 1e-6);
    }

    #[test]
    fn embedded_error_shrinks_with_fifth_power_of_step() {
        let system = Decay { rate: 1.0 };
        for tableau in [FEHLBERG, CASH_KARP] {
            let mut pair = EmbeddedPair::new(tableau, 1);
            let mut out = [0.0];
            let mut coarse = [0.0];
            let mut fine = [0.0];
            pair.attempt(&system, 0.0, &[1.0], 0.2, &mut out, &mut coarse);
            assert!((out[0] - (-0.2f64).exp()).abs() < 1e-7, "{}", tableau.name);
            pair.attempt(&system, 0.0, &[1.0], 0.1, &mut out, &mut fine);
            let ratio = coarse[0].abs() / fine[0].abs();
            assert!(ratio > 20.0 && ratio < 45.0, "{}: {ratio}", tableau.name);
        }
    }
}
