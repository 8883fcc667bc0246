pub mod config;
pub mod constraints;
pub mod cosmology;
pub mod covariance;
pub mod error;
pub mod implicit;
pub mod integrator;
pub mod network;
pub mod nuclides;
pub mod rates;
pub mod solvers;
/// The `bbn_core` crate integrates the light-element network of Big Bang
/// nucleosynthesis and tests the resulting abundances against observations.
///
/// Key components:
/// - **Config**: `CosmologicalState` with an `IntegrationMethod` (family + precision tier) and an `UncertaintyMode`.
/// - **Network**: nuclide fluxes and their analytic Jacobian in u = -ln T9, driven by a `ReactionRateTable`.
/// - **Solvers**: explicit RK4 and embedded 4(5) pairs, plus ROS2, BDF2 and checked backward Euler for the stiff phase.
/// - **Integrator**: fixed-step and error-controlled drivers behind `integrate`.
/// - **Covariance**: linearized rate-uncertainty propagation behind `integrate_with_uncertainty`.
/// - **Constraints**: chi-square verdicts against a `ConstraintTable`.
pub mod traits;
pub mod uncertainty;

pub use config::{
    CosmologicalState, IntegrationMethod, MethodFamily, PrecisionTier, SolverSettings,
    UncertaintyMode,
};
pub use constraints::{check_compatibility, evaluate_constraints, ConstraintTable, Verdict};
pub use covariance::{integrate_with_uncertainty, CovarianceMatrix, UncertainAbundances};
pub use error::{BbnError, BbnResult, ConfigurationError, IntegrationFailure};
pub use integrator::{integrate, ReactionNetworkIntegrator};
pub use nuclides::{AbundanceVector, Nuclide, NNUC};
pub use rates::{ReactionId, ReactionRateTable};
