//! Implicit and linearly implicit steppers for the stiff phase of the network.

use crate::config::NewtonSettings;
use crate::error::IntegrationFailure;
use crate::traits::{NetworkSystem, Steppable};
use nalgebra::{DMatrix, DVector};

/// Added to |y| when measuring Newton updates, so species at the floor do
/// not dominate the convergence test.
const NEWTON_SCALE_FLOOR: f64 = 1e-20;

/// Builds I - gamma_du * J.
fn iteration_matrix(jacobian: &DMatrix<f64>, gamma_du: f64) -> DMatrix<f64> {
    let n = jacobian.nrows();
    DMatrix::from_fn(n, n, |i, j| {
        let identity = if i == j { 1.0 } else { 0.0 };
        identity - gamma_du * jacobian[(i, j)]
    })
}

fn solve_into(
    lu: &nalgebra::LU<f64, nalgebra::Dyn, nalgebra::Dyn>,
    rhs: &[f64],
    out: &mut [f64],
    t9: f64,
) -> Result<(), IntegrationFailure> {
    let solution = lu
        .solve(&DVector::from_column_slice(rhs))
        .ok_or(IntegrationFailure::SingularMatrix { t9 })?;
    out.copy_from_slice(solution.as_slice());
    Ok(())
}

/// Solves y - gamma_du * f(u, y) = rhs by Newton iteration.
pub struct NewtonSolver {
    settings: NewtonSettings,
    f: Vec<f64>,
    residual: Vec<f64>,
    delta: Vec<f64>,
    jacobian: DMatrix<f64>,
}

impl NewtonSolver {
    pub fn new(dim: usize, settings: NewtonSettings) -> Self {
        Self {
            settings,
            f: vec![0.0; dim],
            residual: vec![0.0; dim],
            delta: vec![0.0; dim],
            jacobian: DMatrix::zeros(dim, dim),
        }
    }

    /// `y` holds the initial guess on entry and the solution on success.
    /// Returns the number of iterations used.
    pub fn solve(
        &mut self,
        system: &impl NetworkSystem,
        u: f64,
        rhs: &[f64],
        gamma_du: f64,
        y: &mut [f64],
        tolerance: f64,
    ) -> Result<usize, IntegrationFailure> {
        let t9 = system.t9(u);
        let mut change = f64::INFINITY;
        for iteration in 1..=self.settings.max_steps {
            system.apply(u, y, &mut self.f);
            system.jacobian(u, y, &mut self.jacobian);
            for i in 0..y.len() {
                self.residual[i] = -(y[i] - gamma_du * self.f[i] - rhs[i]);
            }
            let lu = iteration_matrix(&self.jacobian, gamma_du).lu();
            solve_into(&lu, &self.residual, &mut self.delta, t9)?;

            change = 0.0;
            for i in 0..y.len() {
                y[i] += self.delta[i];
                change = f64::max(change, self.delta[i].abs() / (y[i].abs() + NEWTON_SCALE_FLOOR));
            }
            if !change.is_finite() {
                return Err(IntegrationFailure::NonFinite { t9 });
            }
            if change < tolerance {
                return Ok(iteration);
            }
        }
        log::trace!("Newton stalled at T9 = {t9:.4} with relative change {change:e}");
        Err(IntegrationFailure::NewtonDidNotConverge {
            t9,
            iterations: self.settings.max_steps,
        })
    }
}

/// Two-stage Rosenbrock method (ROS2, gamma = 1 + 1/sqrt 2). L-stable and
/// second order with one Jacobian and one LU per step.
pub struct Ros2 {
    f: Vec<f64>,
    k1: Vec<f64>,
    k2: Vec<f64>,
    tmp: Vec<f64>,
    jacobian: DMatrix<f64>,
}

impl Ros2 {
    const GAMMA: f64 = 1.0 + std::f64::consts::FRAC_1_SQRT_2;

    pub fn new(dim: usize) -> Self {
        Self {
            f: vec![0.0; dim],
            k1: vec![0.0; dim],
            k2: vec![0.0; dim],
            tmp: vec![0.0; dim],
            jacobian: DMatrix::zeros(dim, dim),
        }
    }
}

impl Steppable for Ros2 {
    fn step(
        &mut self,
        system: &impl NetworkSystem,
        u: &mut f64,
        state: &mut [f64],
        du: f64,
    ) -> Result<(), IntegrationFailure> {
        let u0 = *u;
        let t9 = system.t9(u0);
        system.apply(u0, state, &mut self.f);
        system.jacobian(u0, state, &mut self.jacobian);
        let lu = iteration_matrix(&self.jacobian, Self::GAMMA * du).lu();

        solve_into(&lu, &self.f, &mut self.k1, t9)?;
        for i in 0..state.len() {
            self.tmp[i] = state[i] + du * self.k1[i];
        }
        system.apply(u0 + du, &self.tmp, &mut self.f);
        for i in 0..state.len() {
            self.f[i] -= 2.0 * self.k1[i];
        }
        solve_into(&lu, &self.f, &mut self.k2, t9)?;

        for i in 0..state.len() {
            state[i] += du * (1.5 * self.k1[i] + 0.5 * self.k2[i]);
        }
        *u = u0 + du;
        Ok(())
    }
}

/// Two-step backward differentiation formula. Falls back to backward Euler
/// on the first step and whenever the step size changes.
pub struct Bdf2 {
    newton: NewtonSolver,
    tolerance: f64,
    previous: Vec<f64>,
    previous_du: Option<f64>,
    rhs: Vec<f64>,
    next: Vec<f64>,
    newton_iterations: usize,
}

impl Bdf2 {
    pub fn new(dim: usize, settings: NewtonSettings) -> Self {
        Self {
            newton: NewtonSolver::new(dim, settings),
            tolerance: settings.tolerance,
            previous: vec![0.0; dim],
            previous_du: None,
            rhs: vec![0.0; dim],
            next: vec![0.0; dim],
            newton_iterations: 0,
        }
    }

    pub fn newton_iterations(&self) -> usize {
        self.newton_iterations
    }
}

impl Steppable for Bdf2 {
    fn step(
        &mut self,
        system: &impl NetworkSystem,
        u: &mut f64,
        state: &mut [f64],
        du: f64,
    ) -> Result<(), IntegrationFailure> {
        let gamma_du = match self.previous_du {
            Some(prev) if prev == du => {
                for i in 0..state.len() {
                    self.rhs[i] = (4.0 * state[i] - self.previous[i]) / 3.0;
                }
                2.0 / 3.0 * du
            }
            _ => {
                self.rhs.copy_from_slice(state);
                du
            }
        };

        self.next.copy_from_slice(state);
        self.newton_iterations += self.newton.solve(
            system,
            *u + du,
            &self.rhs,
            gamma_du,
            &mut self.next,
            self.tolerance,
        )?;

        self.previous.copy_from_slice(state);
        self.previous_du = Some(du);
        state.copy_from_slice(&self.next);
        *u += du;
        Ok(())
    }
}

/// Backward Euler with step doubling. One full step and two half steps give
/// an error estimate and a Richardson-extrapolated second-order result.
pub struct RichardsonEuler {
    newton: NewtonSolver,
    full: Vec<f64>,
    half: Vec<f64>,
}

impl RichardsonEuler {
    pub fn new(dim: usize, settings: NewtonSettings) -> Self {
        Self {
            newton: NewtonSolver::new(dim, settings),
            full: vec![0.0; dim],
            half: vec![0.0; dim],
        }
    }

    /// Writes the extrapolated result to `out` and the step-doubling
    /// difference to `error`. Returns the Newton iterations spent.
    #[allow(clippy::too_many_arguments)]
    pub fn attempt(
        &mut self,
        system: &impl NetworkSystem,
        u: f64,
        state: &[f64],
        du: f64,
        newton_tolerance: f64,
        out: &mut [f64],
        error: &mut [f64],
    ) -> Result<usize, IntegrationFailure> {
        let mut iterations = 0;

        self.full.copy_from_slice(state);
        iterations +=
            self.newton
                .solve(system, u + du, state, du, &mut self.full, newton_tolerance)?;

        self.half.copy_from_slice(state);
        iterations += self.newton.solve(
            system,
            u + 0.5 * du,
            state,
            0.5 * du,
            &mut self.half,
            newton_tolerance,
        )?;

        out.copy_from_slice(&self.half);
        iterations += self.newton.solve(
            system,
            u + du,
            &self.half,
            0.5 * du,
            out,
            newton_tolerance,
        )?;

        for i in 0..state.len() {
            error[i] = out[i] - self.full[i];
            out[i] += error[i];
        }
        Ok(iterations)
    }
}

#[cfg(test)]
mod tests {
    use super::{Bdf2, NewtonSolver, RichardsonEuler, Ros2};
    use crate::config::NewtonSettings;
    use crate::error::IntegrationFailure;
    use crate::traits::{NetworkSystem, Steppable};
    use nalgebra::DMatrix;

    /// y0' = -k (y0 - y1), y1' = -y1: the first component is stiff and
    /// relaxes onto the slow manifold y0 = y1.
    struct StiffPair {
        k: f64,
    }

    impl NetworkSystem for StiffPair {
        fn dimension(&self) -> usize {
            2
        }

        fn apply(&self, _u: f64, y: &[f64], out: &mut [f64]) {
            out[0] = -self.k * (y[0] - y[1]);
            out[1] = -y[1];
        }

        fn jacobian(&self, _u: f64, _y: &[f64], out: &mut DMatrix<f64>) {
            out[(0, 0)] = -self.k;
            out[(0, 1)] = self.k;
            out[(1, 0)] = 0.0;
            out[(1, 1)] = -1.0;
        }
    }

    /// y' = y^2 + 4: the backward Euler equation has no real root.
    struct Blowup;

    impl NetworkSystem for Blowup {
        fn dimension(&self) -> usize {
            1
        }

        fn apply(&self, _u: f64, y: &[f64], out: &mut [f64]) {
            out[0] = y[0] * y[0] + 4.0;
        }

        fn jacobian(&self, _u: f64, y: &[f64], out: &mut DMatrix<f64>) {
            out[(0, 0)] = 2.0 * y[0];
        }
    }

    fn exact_slow(u: f64) -> f64 {
        (-u).exp()
    }

    #[test]
    fn ros2_is_stable_far_beyond_explicit_limit() {
        let system = StiffPair { k: 1e8 };
        let mut stepper = Ros2::new(2);
        let mut u = 0.0;
        let mut y = [2.0, 1.0];
        for _ in 0..100 {
            stepper.step(&system, &mut u, &mut y, 0.01).expect("step");
        }
        assert!((y[1] - exact_slow(1.0)).abs() < 1e-4);
        assert!((y[0] - y[1]).abs() < 1e-4, "{y:?}");
    }

    #[test]
    fn bdf2_tracks_slow_manifold() {
        let system = StiffPair { k: 1e8 };
        let mut stepper = Bdf2::new(2, NewtonSettings::default());
        let mut u = 0.0;
        let mut y = [2.0, 1.0];
        for _ in 0..100 {
            stepper.step(&system, &mut u, &mut y, 0.01).expect("step");
        }
        assert!((y[1] - exact_slow(1.0)).abs() < 1e-3);
        assert!((y[0] - y[1]).abs() < 1e-3);
        assert!(stepper.newton_iterations() >= 100);
    }

    #[test]
    fn richardson_error_shrinks_quadratically() {
        let system = StiffPair { k: 1.0 };
        let mut stepper = RichardsonEuler::new(2, NewtonSettings::default());
        let mut out = [0.0; 2];
        let mut coarse = [0.0; 2];
        let mut fine = [0.0; 2];
        stepper
            .attempt(&system, 0.0, &[1.0, 1.0], 0.1, 1e-12, &mut out, &mut coarse)
            .expect("attempt");
        assert!((out[1] - exact_slow(0.1)).abs() < 1e-3);
        stepper
            .attempt(&system, 0.0, &[1.0, 1.0], 0.05, 1e-12, &mut out, &mut fine)
            .expect("attempt");
        let ratio = coarse[1].abs() / fine[1].abs();
        assert!(ratio > 3.5 && ratio < 4.5, "{ratio}");
    }

    #[test]
    fn newton_reports_non_convergence() {
        let mut solver = NewtonSolver::new(
            1,
            NewtonSettings {
                max_steps: 5,
                tolerance: 1e-12,
            },
        );
        let mut y = [0.0];
        let err = solver
            .solve(&Blowup, 0.0, &[0.0], 1.0, &mut y, 1e-12)
            .expect_err("no real root");
        assert!(matches!(
            err,
            IntegrationFailure::NewtonDidNotConverge { iterations: 5, .. }
                | IntegrationFailure::SingularMatrix { .. }
                | IntegrationFailure::NonFinite { .. }
        ));
    }
}
