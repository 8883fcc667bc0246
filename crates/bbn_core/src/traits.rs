use crate::error::IntegrationFailure;
use nalgebra::DMatrix;

/// A system dy/du = f(u, y) that can also supply its Jacobian.
pub trait NetworkSystem {
    /// Returns the dimension of the state space.
    fn dimension(&self) -> usize;

    /// Evaluates dy/du at (u, y) into `out`.
    fn apply(&self, u: f64, y: &[f64], out: &mut [f64]);

    /// Evaluates df/dy at (u, y) into `out` (row i, column j holds df_i/dy_j).
    fn jacobian(&self, u: f64, y: &[f64], out: &mut DMatrix<f64>);

    /// Temperature in T9 at u, for diagnostics.
    fn t9(&self, u: f64) -> f64 {
        (-u).exp()
    }
}

/// A fixed-step stepper.
pub trait Steppable {
    /// Performs one step of size du.
    /// u: current position (updated after step)
    /// state: current state (updated after step)
    fn step(
        &mut self,
        system: &impl NetworkSystem,
        u: &mut f64,
        state: &mut [f64],
        du: f64,
    ) -> Result<(), IntegrationFailure>;
}
