//! Drives the nuclear network from the initial temperature to freeze-out.

use crate::config::{CosmologicalState, MethodFamily, SolverSettings};
use crate::error::{BbnResult, IntegrationFailure};
use crate::implicit::{Bdf2, RichardsonEuler, Ros2};
use crate::network::NuclearNetwork;
use crate::nuclides::{AbundanceVector, ABUNDANCE_FLOOR, NNUC};
use crate::rates::ReactionRateTable;
use crate::solvers::{EmbeddedPair, CASH_KARP, FEHLBERG, RK4};
use crate::traits::{NetworkSystem, Steppable};
use crate::uncertainty::RateUncertaintyModel;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// Remaining interval below which the run counts as finished.
const END_SLACK: f64 = 1e-12;
const SAFETY: f64 = 0.9;
const MAX_GROWTH: f64 = 5.0;
const MAX_SHRINK: f64 = 0.2;
/// Explicit steps are only attempted while the stability limit allows at
/// least this fraction of the step the error controller asks for.
const EXPLICIT_MIN_FRACTION: f64 = 0.25;
const NEWTON_TIGHTENING: f64 = 0.1;
const NEWTON_MIN_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationStats {
    pub accepted: usize,
    pub rejected: usize,
    /// Accepted steps taken by an implicit scheme.
    pub implicit_steps: usize,
    pub newton_iterations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationOutcome {
    pub ratios: AbundanceVector,
    /// Final mole fractions, indexed by `Nuclide::slot`.
    pub mole_fractions: [f64; NNUC],
    pub stats: IntegrationStats,
}

enum FixedStepper {
    Ros2(Ros2),
    Bdf2(Bdf2),
}

impl FixedStepper {
    fn step(
        &mut self,
        system: &impl NetworkSystem,
        u: &mut f64,
        state: &mut [f64],
        du: f64,
    ) -> Result<(), IntegrationFailure> {
        match self {
            FixedStepper::Ros2(s) => s.step(system, u, state, du),
            FixedStepper::Bdf2(s) => s.step(system, u, state, du),
        }
    }

    fn newton_iterations(&self) -> usize {
        match self {
            FixedStepper::Ros2(_) => 0,
            FixedStepper::Bdf2(s) => s.newton_iterations(),
        }
    }
}

enum ExplicitScheme {
    Rk4 {
        stepper: RK4,
        half: Vec<f64>,
    },
    Embedded(EmbeddedPair),
}

impl ExplicitScheme {
    fn stability_bound(&self) -> f64 {
        match self {
            ExplicitScheme::Rk4 { .. } => RK4::STABILITY_BOUND,
            ExplicitScheme::Embedded(pair) => pair.tableau().stability_bound,
        }
    }

    /// RK4 uses step doubling: the two half steps plus the Richardson
    /// correction go to `out`, their difference to the full step to `error`.
    fn attempt(
        &mut self,
        system: &impl NetworkSystem,
        u: f64,
        state: &[f64],
        du: f64,
        out: &mut [f64],
        error: &mut [f64],
    ) -> Result<(), IntegrationFailure> {
        match self {
            ExplicitScheme::Rk4 { stepper, half } => {
                let mut t = u;
                out.copy_from_slice(state);
                stepper.step(system, &mut t, out, du)?;

                t = u;
                half.copy_from_slice(state);
                stepper.step(system, &mut t, half, 0.5 * du)?;
                stepper.step(system, &mut t, half, 0.5 * du)?;

                for i in 0..state.len() {
                    error[i] = half[i] - out[i];
                    out[i] = half[i] + error[i] / 15.0;
                }
                Ok(())
            }
            ExplicitScheme::Embedded(pair) => {
                pair.attempt(system, u, state, du, out, error);
                Ok(())
            }
        }
    }
}

/// Integrates one run. Holds only borrowed, read-only inputs; every call to
/// [`run`](Self::run) builds its own working buffers.
pub struct ReactionNetworkIntegrator<'a> {
    state: &'a CosmologicalState,
    rates: &'a ReactionRateTable,
    settings: SolverSettings,
}

impl<'a> ReactionNetworkIntegrator<'a> {
    pub fn new(state: &'a CosmologicalState, rates: &'a ReactionRateTable) -> Self {
        Self {
            state,
            rates,
            settings: SolverSettings::for_method(state.method),
        }
    }

    pub fn with_settings(mut self, settings: SolverSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    /// Runs with the table selected by the state's mode. `Covariance` mode
    /// runs the nominal table.
    pub fn run(&self) -> BbnResult<IntegrationOutcome> {
        self.state.validate()?;
        self.settings.validate()?;
        let table = RateUncertaintyModel::new(self.rates).table_for(self.state.mode)?;
        self.run_with_table(&table)
    }

    /// Runs with `rates` as given, ignoring the state's mode.
    pub fn run_with_table(&self, rates: &ReactionRateTable) -> BbnResult<IntegrationOutcome> {
        self.state.validate()?;
        self.settings.validate()?;
        let network = NuclearNetwork::new(self.state, rates)?;
        let mut y = network.initial_abundances();
        let u_start = -self.state.initial_t9.ln();
        let u_end = -self.state.final_t9.ln();
        let dim = network.dimension();
        let newton = self.settings.newton;

        let stats = match self.state.method.family {
            MethodFamily::Fast => {
                let stepper = FixedStepper::Ros2(Ros2::new(dim));
                integrate_fixed(&network, stepper, &mut y, u_start, u_end, &self.settings)?
            }
            MethodFamily::Stiff => {
                let stepper = FixedStepper::Bdf2(Bdf2::new(dim, newton));
                integrate_fixed(&network, stepper, &mut y, u_start, u_end, &self.settings)?
            }
            MethodFamily::StiffChecked => {
                integrate_adaptive(&network, None, &mut y, u_start, u_end, &self.settings)?
            }
            MethodFamily::AdaptiveRk4 => {
                let scheme = ExplicitScheme::Rk4 {
                    stepper: RK4::new(dim),
                    half: vec![0.0; dim],
                };
                integrate_adaptive(&network, Some(scheme), &mut y, u_start, u_end, &self.settings)?
            }
            MethodFamily::Fehlberg => {
                let scheme = ExplicitScheme::Embedded(EmbeddedPair::new(FEHLBERG, dim));
                integrate_adaptive(&network, Some(scheme), &mut y, u_start, u_end, &self.settings)?
            }
            MethodFamily::CashKarp => {
                let scheme = ExplicitScheme::Embedded(EmbeddedPair::new(CASH_KARP, dim));
                integrate_adaptive(&network, Some(scheme), &mut y, u_start, u_end, &self.settings)?
            }
        };

        let ratios = AbundanceVector::from_mole_fractions(&y);
        if !ratios.is_physical() {
            return Err(IntegrationFailure::NonFinite {
                t9: self.state.final_t9,
            }
            .into());
        }
        log::debug!(
            "{:?}/{:?} finished: {} accepted, {} rejected, {} implicit, {} Newton iterations",
            self.state.method.family,
            self.state.method.tier,
            stats.accepted,
            stats.rejected,
            stats.implicit_steps,
            stats.newton_iterations
        );
        Ok(IntegrationOutcome {
            ratios,
            mole_fractions: y,
            stats,
        })
    }
}

/// Integrates with the state's method and mode and returns the final ratios.
pub fn integrate(
    state: &CosmologicalState,
    rates: &ReactionRateTable,
) -> BbnResult<AbundanceVector> {
    ReactionNetworkIntegrator::new(state, rates)
        .run()
        .map(|outcome| outcome.ratios)
}

/// Applies the abundance floor after an accepted step.
fn clamp_to_floor(y: &mut [f64], t9: f64) -> Result<(), IntegrationFailure> {
    for value in y.iter_mut() {
        if !value.is_finite() {
            return Err(IntegrationFailure::NonFinite { t9 });
        }
        *value = value.max(ABUNDANCE_FLOOR);
    }
    Ok(())
}

fn error_norm(error: &[f64], y: &[f64], floor: f64) -> f64 {
    error
        .iter()
        .zip(y)
        .map(|(e, v)| e.abs() / (v.abs() + floor))
        .fold(0.0, f64::max)
}

/// Gershgorin bound on the spectral radius of the Jacobian.
fn stiffness_bound(jacobian: &DMatrix<f64>) -> f64 {
    jacobian
        .row_iter()
        .map(|row| row.iter().map(|v| v.abs()).sum::<f64>())
        .fold(0.0, f64::max)
}

fn integrate_fixed(
    system: &impl NetworkSystem,
    mut stepper: FixedStepper,
    y: &mut [f64],
    u_start: f64,
    u_end: f64,
    settings: &SolverSettings,
) -> Result<IntegrationStats, IntegrationFailure> {
    let mut stats = IntegrationStats::default();
    let mut u = u_start;
    while u_end - u > END_SLACK {
        if stats.accepted >= settings.max_steps {
            return Err(IntegrationFailure::StepLimitExceeded {
                steps: settings.max_steps,
            });
        }
        let du = settings.step.min(u_end - u);
        stepper.step(system, &mut u, y, du)?;
        clamp_to_floor(y, system.t9(u))?;
        stats.accepted += 1;
    }
    stats.implicit_steps = stats.accepted;
    stats.newton_iterations = stepper.newton_iterations();
    Ok(stats)
}

/// Error-controlled driver. With an explicit scheme, each step first checks
/// the stiffness bound and falls back to the checked backward Euler step
/// while the explicit stability limit is too small.
fn integrate_adaptive(
    system: &impl NetworkSystem,
    mut explicit: Option<ExplicitScheme>,
    y: &mut [f64],
    u_start: f64,
    u_end: f64,
    settings: &SolverSettings,
) -> Result<IntegrationStats, IntegrationFailure> {
    let dim = y.len();
    let mut implicit = RichardsonEuler::new(dim, settings.newton);
    let mut jacobian = DMatrix::zeros(dim, dim);
    let mut out = vec![0.0; dim];
    let mut error = vec![0.0; dim];
    let mut stats = IntegrationStats::default();

    let tolerance = settings.tolerance;
    let mut newton_tolerance = settings.newton.tolerance;
    let mut u = u_start;
    let mut du = settings.step;

    while u_end - u > END_SLACK {
        if stats.accepted + stats.rejected >= settings.max_steps {
            return Err(IntegrationFailure::StepLimitExceeded {
                steps: settings.max_steps,
            });
        }
        du = du.min(settings.max_step).min(u_end - u);

        let mut explicit_step = None;
        if let Some(scheme) = explicit.as_mut() {
            system.jacobian(u, y, &mut jacobian);
            let limit = scheme.stability_bound() / stiffness_bound(&jacobian).max(f64::MIN_POSITIVE);
            if limit >= EXPLICIT_MIN_FRACTION * du {
                du = du.min(limit);
                explicit_step = Some(scheme);
            }
        }

        let is_implicit = explicit_step.is_none();
        // (error norm, order of the error estimate)
        let (err, order) = match explicit_step {
            Some(scheme) => {
                scheme.attempt(system, u, y, du, &mut out, &mut error)?;
                (error_norm(&error, &out, settings.error_floor), 5.0)
            }
            None => match implicit.attempt(system, u, y, du, newton_tolerance, &mut out, &mut error) {
                Ok(iterations) => {
                    stats.newton_iterations += iterations;
                    (error_norm(&error, &out, settings.error_floor), 2.0)
                }
                Err(
                    failure @ (IntegrationFailure::NewtonDidNotConverge { .. }
                    | IntegrationFailure::SingularMatrix { .. }
                    | IntegrationFailure::NonFinite { .. }),
                ) => {
                    log::warn!("{failure}; retrying with a smaller step");
                    stats.rejected += 1;
                    du *= 0.5;
                    newton_tolerance = (newton_tolerance * NEWTON_TIGHTENING).max(NEWTON_MIN_TOLERANCE);
                    if du < settings.min_step {
                        return Err(failure);
                    }
                    continue;
                }
                Err(other) => return Err(other),
            },
        };

        if err.is_finite() && err <= tolerance {
            y.copy_from_slice(&out);
            u += du;
            clamp_to_floor(y, system.t9(u))?;
            stats.accepted += 1;
            if is_implicit {
                stats.implicit_steps += 1;
            }
            newton_tolerance = settings.newton.tolerance;
            let growth = if err > 0.0 {
                SAFETY * (tolerance / err).powf(1.0 / order)
            } else {
                MAX_GROWTH
            };
            du *= growth.min(MAX_GROWTH);
        } else {
            stats.rejected += 1;
            let shrink = if err.is_finite() {
                SAFETY * (tolerance / err).powf(1.0 / (order - 1.0))
            } else {
                MAX_SHRINK
            };
            du *= shrink.max(MAX_SHRINK);
            if is_implicit {
                newton_tolerance = (newton_tolerance * NEWTON_TIGHTENING).max(NEWTON_MIN_TOLERANCE);
            }
            log::trace!("rejected step at T9 = {:.4}: error {err:e}", system.t9(u));
        }

        if du < settings.min_step {
            return Err(IntegrationFailure::ToleranceNotMet {
                t9: system.t9(u),
                step: du,
            });
        }
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::{integrate, ReactionNetworkIntegrator};
    use crate::config::{
        CosmologicalState, IntegrationMethod, MethodFamily, PrecisionTier, SolverSettings,
        UncertaintyMode,
    };
    use crate::error::{BbnError, ConfigurationError, IntegrationFailure};
    use crate::nuclides::Nuclide;
    use crate::rates::{ReactionId, ReactionRateTable};

    const FAMILIES: [MethodFamily; 6] = [
        MethodFamily::Fast,
        MethodFamily::Stiff,
        MethodFamily::StiffChecked,
        MethodFamily::AdaptiveRk4,
        MethodFamily::Fehlberg,
        MethodFamily::CashKarp,
    ];

    #[test]
    fn default_run_lands_near_standard_abundances() {
        let rates = ReactionRateTable::standard();
        let ratios = integrate(&CosmologicalState::default(), &rates).expect("integrate");
        let yp = ratios.helium_mass_fraction();
        let dh = ratios.deuterium_to_hydrogen();
        let li7 = ratios.lithium7_to_hydrogen();
        assert!(yp > 0.23 && yp < 0.26, "Yp = {yp}");
        assert!(dh > 1e-5 && dh < 6e-5, "D/H = {dh}");
        assert!(li7 > 1e-10 && li7 < 1e-9, "Li7/H = {li7}");
    }

    #[test]
    fn every_family_finishes_with_physical_ratios() {
        let rates = ReactionRateTable::standard();
        for family in FAMILIES {
            let state = CosmologicalState::default()
                .with_method(IntegrationMethod::new(family, PrecisionTier::Low));
            let outcome = ReactionNetworkIntegrator::new(&state, &rates)
                .run()
                .unwrap_or_else(|err| panic!("{family:?}: {err}"));
            assert!(outcome.ratios.is_physical(), "{family:?}");
            assert!(outcome.stats.accepted > 0, "{family:?}");
            let yp = outcome.ratios.helium_mass_fraction();
            assert!(yp > 0.2 && yp < 0.3, "{family:?}: Yp = {yp}");
        }
    }

    #[test]
    fn explicit_families_switch_to_implicit_steps_when_stiff() {
        let rates = ReactionRateTable::standard();
        let state = CosmologicalState::default()
            .with_method(IntegrationMethod::new(MethodFamily::CashKarp, PrecisionTier::Low));
        let stats = ReactionNetworkIntegrator::new(&state, &rates)
            .run()
            .expect("run")
            .stats;
        assert!(stats.implicit_steps > 0);
        assert!(stats.implicit_steps < stats.accepted);
    }

    #[test]
    fn repeated_runs_are_bit_identical() {
        let rates = ReactionRateTable::standard();
        let state = CosmologicalState::default()
            .with_method(IntegrationMethod::new(MethodFamily::Fehlberg, PrecisionTier::Low));
        let first = ReactionNetworkIntegrator::new(&state, &rates).run().expect("first");
        let second = ReactionNetworkIntegrator::new(&state, &rates).run().expect("second");
        assert_eq!(first, second);
    }

    #[test]
    fn tier_changes_stay_within_the_looser_tolerance() {
        let rates = ReactionRateTable::standard();
        let run = |family, tier| {
            let state = CosmologicalState::default()
                .with_method(IntegrationMethod::new(family, tier));
            integrate(&state, &rates).expect("integrate").deuterium_to_hydrogen()
        };
        let medium = run(MethodFamily::StiffChecked, PrecisionTier::Medium);
        let high = run(MethodFamily::StiffChecked, PrecisionTier::High);
        assert!((medium - high).abs() / high < 0.01, "{medium} vs {high}");

        let low = run(MethodFamily::Fehlberg, PrecisionTier::Low);
        let high = run(MethodFamily::Fehlberg, PrecisionTier::High);
        assert!((low - high).abs() / high < 0.05, "{low} vs {high}");
    }

    #[test]
    fn covariance_mode_runs_the_nominal_table() {
        let rates = ReactionRateTable::standard();
        let nominal = integrate(&CosmologicalState::default(), &rates).expect("nominal");
        let state = CosmologicalState::default().with_mode(UncertaintyMode::Covariance);
        assert_eq!(integrate(&state, &rates).expect("covariance"), nominal);
    }

    #[test]
    fn shifted_modes_change_the_result() {
        let rates = ReactionRateTable::standard();
        let nominal = integrate(&CosmologicalState::default(), &rates).expect("nominal");
        for mode in [UncertaintyMode::ShiftedUp, UncertaintyMode::ShiftedDown] {
            let state = CosmologicalState::default().with_mode(mode);
            let shifted = integrate(&state, &rates).expect("shifted");
            assert!(shifted.is_physical());
            assert_ne!(shifted.deuterium_to_hydrogen(), nominal.deuterium_to_hydrogen());
        }
    }

    #[test]
    fn shifted_runs_bracket_the_nominal_result() {
        let rates = ReactionRateTable::standard();
        for family in [MethodFamily::Fast, MethodFamily::Fehlberg] {
            let base = CosmologicalState::default()
                .with_method(IntegrationMethod::new(family, PrecisionTier::Medium));
            let run = |mode| integrate(&base.with_mode(mode), &rates).expect("integrate");
            let nominal = run(UncertaintyMode::Nominal);
            let up = run(UncertaintyMode::ShiftedUp);
            let down = run(UncertaintyMode::ShiftedDown);
            for nuclide in [
                Nuclide::Helium4,
                Nuclide::Deuterium,
                Nuclide::Helium3,
                Nuclide::Lithium7,
            ] {
                let (lo, hi) = (up[nuclide].min(down[nuclide]), up[nuclide].max(down[nuclide]));
                assert!(
                    lo <= nominal[nuclide] && nominal[nuclide] <= hi,
                    "{family:?} {nuclide:?}: {} not within [{lo}, {hi}]",
                    nominal[nuclide]
                );
            }
        }
    }

    #[test]
    fn zero_uncertainties_make_shifted_runs_nominal() {
        let mut rates = ReactionRateTable::standard();
        for id in ReactionId::ALL {
            rates.set_uncertainty(id, Some(0.0));
        }
        let nominal = integrate(&CosmologicalState::default(), &rates).expect("nominal");
        let state = CosmologicalState::default().with_mode(UncertaintyMode::ShiftedUp);
        assert_eq!(integrate(&state, &rates).expect("shifted"), nominal);
    }

    #[test]
    fn shifted_run_without_uncertainty_is_a_configuration_error() {
        let mut rates = ReactionRateTable::standard();
        rates.set_uncertainty(ReactionId::PdToHe3, None);
        let state = CosmologicalState::default().with_mode(UncertaintyMode::ShiftedDown);
        assert_eq!(
            integrate(&state, &rates),
            Err(BbnError::Configuration(ConfigurationError::MissingUncertainty(
                ReactionId::PdToHe3
            )))
        );
    }

    #[test]
    fn invalid_state_is_rejected_before_integrating() {
        let rates = ReactionRateTable::standard();
        let state = CosmologicalState {
            eta: -1.0,
            ..CosmologicalState::default()
        };
        assert!(matches!(
            integrate(&state, &rates),
            Err(BbnError::Configuration(ConfigurationError::InvalidParameter { name: "eta", .. }))
        ));
    }

    #[test]
    fn step_limit_is_reported() {
        let rates = ReactionRateTable::standard();
        let state = CosmologicalState::default();
        let settings = SolverSettings {
            max_steps: 10,
            ..SolverSettings::for_method(state.method)
        };
        let err = ReactionNetworkIntegrator::new(&state, &rates)
            .with_settings(settings)
            .run()
            .expect_err("ten steps cannot reach freeze-out");
        assert_eq!(
            err,
            BbnError::Integration(IntegrationFailure::StepLimitExceeded { steps: 10 })
        );
    }
}
