use crate::error::ConfigurationError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Integration scheme family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MethodFamily {
    /// Fixed-step linearly implicit scheme, no tolerance control.
    Fast,
    /// Fixed-step BDF2; tiers tighten the Newton tolerance and shrink the step.
    Stiff,
    /// Backward Euler with a per-step error test and rejection.
    StiffChecked,
    /// Classical RK4 with step-doubling error control.
    AdaptiveRk4,
    /// Runge-Kutta-Fehlberg 4(5) embedded pair.
    Fehlberg,
    /// Cash-Karp 4(5) embedded pair.
    CashKarp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PrecisionTier {
    Low,
    Medium,
    High,
}

impl PrecisionTier {
    pub const ALL: [PrecisionTier; 3] = [PrecisionTier::Low, PrecisionTier::Medium, PrecisionTier::High];

    fn index(self) -> usize {
        match self {
            PrecisionTier::Low => 0,
            PrecisionTier::Medium => 1,
            PrecisionTier::High => 2,
        }
    }

    fn from_index(index: i32) -> Option<Self> {
        match index {
            0 => Some(PrecisionTier::Low),
            1 => Some(PrecisionTier::Medium),
            2 => Some(PrecisionTier::High),
            _ => None,
        }
    }
}

/// Family plus precision tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntegrationMethod {
    pub family: MethodFamily,
    pub tier: PrecisionTier,
}

impl IntegrationMethod {
    pub const fn new(family: MethodFamily, tier: PrecisionTier) -> Self {
        Self { family, tier }
    }

    /// Target relative local error, or `None` for the fixed-step families.
    pub fn tolerance(self) -> Option<f64> {
        let tiers = match self.family {
            MethodFamily::Fast | MethodFamily::Stiff => return None,
            MethodFamily::StiffChecked | MethodFamily::AdaptiveRk4 | MethodFamily::Fehlberg => {
                [5e-2, 1e-2, 1e-3]
            }
            MethodFamily::CashKarp => [1e-2, 1e-4, 1e-5],
        };
        Some(tiers[self.tier.index()])
    }

    /// Flat code used by older drivers. `Fast` encodes as 0 for every tier.
    pub fn legacy_code(self) -> i32 {
        let tier = self.tier.index() as i32;
        match self.family {
            MethodFamily::Fast => 0,
            MethodFamily::Stiff => 1 + tier,
            MethodFamily::StiffChecked => 5 + tier,
            MethodFamily::AdaptiveRk4 => 10 + tier,
            MethodFamily::Fehlberg => 20 + tier,
            MethodFamily::CashKarp => 30 + tier,
        }
    }
}

impl Default for IntegrationMethod {
    fn default() -> Self {
        Self::new(MethodFamily::Fast, PrecisionTier::Low)
    }
}

impl TryFrom<i32> for IntegrationMethod {
    type Error = ConfigurationError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        let (family, offset) = match code {
            0 => (MethodFamily::Fast, 0),
            1..=3 => (MethodFamily::Stiff, 1),
            5..=7 => (MethodFamily::StiffChecked, 5),
            10..=12 => (MethodFamily::AdaptiveRk4, 10),
            20..=22 => (MethodFamily::Fehlberg, 20),
            30..=32 => (MethodFamily::CashKarp, 30),
            _ => return Err(ConfigurationError::UnknownMethodCode(code)),
        };
        let tier = PrecisionTier::from_index(code - offset)
            .ok_or(ConfigurationError::UnknownMethodCode(code))?;
        Ok(Self::new(family, tier))
    }
}

/// Which rate table variant a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UncertaintyMode {
    #[default]
    Nominal,
    /// Every rate scaled by (1 - sigma).
    ShiftedDown,
    /// Every rate scaled by (1 + sigma).
    ShiftedUp,
    /// Linearized covariance propagation around the nominal run.
    Covariance,
}

impl UncertaintyMode {
    pub fn legacy_code(self) -> i32 {
        match self {
            UncertaintyMode::Nominal => 0,
            UncertaintyMode::ShiftedUp => 1,
            UncertaintyMode::ShiftedDown => 2,
            UncertaintyMode::Covariance => 3,
        }
    }
}

impl TryFrom<i32> for UncertaintyMode {
    type Error = ConfigurationError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(UncertaintyMode::Nominal),
            1 => Ok(UncertaintyMode::ShiftedUp),
            2 => Ok(UncertaintyMode::ShiftedDown),
            3 => Ok(UncertaintyMode::Covariance),
            _ => Err(ConfigurationError::UnknownModeCode(code)),
        }
    }
}

/// Physical parameters and selectors for one run. Read-only during integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CosmologicalState {
    /// Baryon-to-photon ratio.
    pub eta: f64,
    /// Effective number of neutrino species.
    pub neutrino_species: f64,
    /// Neutron lifetime in seconds.
    pub neutron_lifetime: f64,
    pub initial_t9: f64,
    /// Freeze-out temperature where integration stops.
    pub final_t9: f64,
    pub method: IntegrationMethod,
    pub mode: UncertaintyMode,
}

impl Default for CosmologicalState {
    fn default() -> Self {
        Self {
            eta: 6.1e-10,
            neutrino_species: 3.046,
            neutron_lifetime: 880.2,
            initial_t9: 27.0,
            final_t9: 0.01,
            method: IntegrationMethod::default(),
            mode: UncertaintyMode::Nominal,
        }
    }
}

impl CosmologicalState {
    pub fn with_method(&self, method: IntegrationMethod) -> Self {
        Self {
            method,
            ..self.clone()
        }
    }

    pub fn with_mode(&self, mode: UncertaintyMode) -> Self {
        Self {
            mode,
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(self.eta.is_finite() && self.eta > 0.0) {
            return Err(ConfigurationError::invalid("eta", "must be positive and finite"));
        }
        if !(self.neutrino_species.is_finite() && self.neutrino_species >= 0.0) {
            return Err(ConfigurationError::invalid(
                "neutrino_species",
                "must be non-negative and finite",
            ));
        }
        if !(self.neutron_lifetime.is_finite() && self.neutron_lifetime > 0.0) {
            return Err(ConfigurationError::invalid(
                "neutron_lifetime",
                "must be positive and finite",
            ));
        }
        if !(self.final_t9.is_finite() && self.final_t9 > 0.0) {
            return Err(ConfigurationError::invalid("final_t9", "must be positive and finite"));
        }
        if !(self.initial_t9.is_finite() && self.initial_t9 > self.final_t9) {
            return Err(ConfigurationError::invalid(
                "initial_t9",
                format!("must exceed final_t9 ({})", self.final_t9),
            ));
        }
        Ok(())
    }

    /// Parses a JSON parameter set; absent fields take their defaults.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let state: CosmologicalState =
            serde_json::from_str(text).context("Failed to parse cosmological state JSON.")?;
        state
            .validate()
            .context("Cosmological state JSON is invalid.")?;
        Ok(state)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NewtonSettings {
    pub max_steps: usize,
    pub tolerance: f64,
}

impl Default for NewtonSettings {
    fn default() -> Self {
        Self {
            max_steps: 30,
            tolerance: 1e-6,
        }
    }
}

/// Numerical knobs derived from an [`IntegrationMethod`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverSettings {
    /// Step in u for the fixed-step families, first trial step otherwise.
    pub step: f64,
    pub min_step: f64,
    pub max_step: f64,
    /// Relative local error target; ignored by the fixed-step families.
    pub tolerance: f64,
    /// Absolute floor added to |Y| when scaling local errors.
    pub error_floor: f64,
    pub newton: NewtonSettings,
    pub max_steps: usize,
}

impl SolverSettings {
    pub fn for_method(method: IntegrationMethod) -> Self {
        let fixed_steps = [1e-2, 5e-3, 2.5e-3];
        let tier = method.tier.index();
        let base = Self {
            step: 1e-3,
            min_step: 1e-12,
            max_step: 5e-2,
            tolerance: method.tolerance().unwrap_or(0.0),
            error_floor: 1e-16,
            newton: NewtonSettings::default(),
            max_steps: 500_000,
        };
        match method.family {
            MethodFamily::Fast => Self {
                step: fixed_steps[tier],
                ..base
            },
            MethodFamily::Stiff => Self {
                step: fixed_steps[tier],
                newton: NewtonSettings {
                    tolerance: [1e-4, 1e-6, 1e-8][tier],
                    ..NewtonSettings::default()
                },
                ..base
            },
            MethodFamily::StiffChecked
            | MethodFamily::AdaptiveRk4
            | MethodFamily::Fehlberg
            | MethodFamily::CashKarp => base,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(self.step > 0.0 && self.step.is_finite()) {
            return Err(ConfigurationError::invalid("step", "must be positive"));
        }
        if !(self.min_step > 0.0 && self.min_step <= self.max_step) {
            return Err(ConfigurationError::invalid(
                "min_step",
                "must be positive and no larger than max_step",
            ));
        }
        if self.tolerance < 0.0 || !self.tolerance.is_finite() {
            return Err(ConfigurationError::invalid("tolerance", "must be non-negative"));
        }
        if self.error_floor <= 0.0 {
            return Err(ConfigurationError::invalid("error_floor", "must be positive"));
        }
        if self.newton.max_steps == 0 {
            return Err(ConfigurationError::invalid(
                "newton.max_steps",
                "must be greater than zero",
            ));
        }
        if self.newton.tolerance <= 0.0 {
            return Err(ConfigurationError::invalid("newton.tolerance", "must be positive"));
        }
        if self.max_steps == 0 {
            return Err(ConfigurationError::invalid("max_steps", "must be greater than zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CosmologicalState, IntegrationMethod, MethodFamily, PrecisionTier, SolverSettings,
        UncertaintyMode,
    };
    use crate::error::ConfigurationError;

    fn assert_err_contains<T: std::fmt::Debug>(result: anyhow::Result<T>, needle: &str) {
        let err = result.expect_err("expected error");
        let message = format!("{err:#}");
        assert!(
            message.contains(needle),
            "expected error to contain \"{needle}\", got \"{message}\""
        );
    }

    #[test]
    fn legacy_method_codes_round_trip() {
        let codes = [1, 2, 3, 5, 6, 7, 10, 11, 12, 20, 21, 22, 30, 31, 32];
        for code in codes {
            let method = IntegrationMethod::try_from(code).expect("code should decode");
            assert_eq!(method.legacy_code(), code);
        }
        let fast = IntegrationMethod::try_from(0).expect("fast");
        assert_eq!(fast, IntegrationMethod::new(MethodFamily::Fast, PrecisionTier::Low));
    }

    #[test]
    fn unknown_method_codes_are_rejected() {
        for code in [-1, 4, 8, 9, 13, 23, 33, 100] {
            assert_eq!(
                IntegrationMethod::try_from(code),
                Err(ConfigurationError::UnknownMethodCode(code))
            );
        }
    }

    #[test]
    fn tolerances_follow_family_tiers() {
        let tol = |family, tier| IntegrationMethod::new(family, tier).tolerance();
        assert_eq!(tol(MethodFamily::Fast, PrecisionTier::High), None);
        assert_eq!(tol(MethodFamily::Stiff, PrecisionTier::Low), None);
        assert_eq!(tol(MethodFamily::StiffChecked, PrecisionTier::Low), Some(5e-2));
        assert_eq!(tol(MethodFamily::Fehlberg, PrecisionTier::Medium), Some(1e-2));
        assert_eq!(tol(MethodFamily::AdaptiveRk4, PrecisionTier::High), Some(1e-3));
        assert_eq!(tol(MethodFamily::CashKarp, PrecisionTier::Low), Some(1e-2));
        assert_eq!(tol(MethodFamily::CashKarp, PrecisionTier::High), Some(1e-5));
    }

    #[test]
    fn mode_codes_exclude_monte_carlo() {
        assert_eq!(UncertaintyMode::try_from(1), Ok(UncertaintyMode::ShiftedUp));
        assert_eq!(UncertaintyMode::try_from(2), Ok(UncertaintyMode::ShiftedDown));
        assert_eq!(UncertaintyMode::Covariance.legacy_code(), 3);
        assert_eq!(
            UncertaintyMode::try_from(4),
            Err(ConfigurationError::UnknownModeCode(4))
        );
    }

    #[test]
    fn validate_rejects_unphysical_parameters() {
        let base = CosmologicalState::default();
        assert!(base.validate().is_ok());

        let mut state = base.clone();
        state.eta = 0.0;
        assert!(matches!(
            state.validate(),
            Err(ConfigurationError::InvalidParameter { name: "eta", .. })
        ));

        let mut state = base.clone();
        state.neutron_lifetime = f64::NAN;
        assert!(state.validate().is_err());

        let mut state = base;
        state.initial_t9 = 0.005;
        assert!(matches!(
            state.validate(),
            Err(ConfigurationError::InvalidParameter { name: "initial_t9", .. })
        ));
    }

    #[test]
    fn json_loading_fills_defaults_and_validates() {
        let state = CosmologicalState::from_json_str(
            r#"{ "eta": 6.0e-10, "method": { "family": "CashKarp", "tier": "Medium" } }"#,
        )
        .expect("state should parse");
        assert_eq!(state.eta, 6.0e-10);
        assert_eq!(state.neutron_lifetime, 880.2);
        assert_eq!(state.method.legacy_code(), 31);
        assert_eq!(state.mode, UncertaintyMode::Nominal);

        assert_err_contains(CosmologicalState::from_json_str("{ eta: }"), "parse");
        assert_err_contains(
            CosmologicalState::from_json_str(r#"{ "neutrino_species": -1.0 }"#),
            "neutrino_species",
        );
    }

    #[test]
    fn with_method_and_mode_return_modified_copies() {
        let base = CosmologicalState::default();
        let method = IntegrationMethod::new(MethodFamily::Stiff, PrecisionTier::High);
        let changed = base.with_method(method).with_mode(UncertaintyMode::ShiftedUp);
        assert_eq!(base.method, IntegrationMethod::default());
        assert_eq!(changed.method, method);
        assert_eq!(changed.mode, UncertaintyMode::ShiftedUp);
        assert_eq!(changed.eta, base.eta);
    }

    #[test]
    fn solver_settings_shrink_with_tier() {
        let low = SolverSettings::for_method(IntegrationMethod::new(
            MethodFamily::Stiff,
            PrecisionTier::Low,
        ));
        let high = SolverSettings::for_method(IntegrationMethod::new(
            MethodFamily::Stiff,
            PrecisionTier::High,
        ));
        assert!(high.step < low.step);
        assert!(high.newton.tolerance < low.newton.tolerance);
        assert!(low.validate().is_ok());

        let mut broken = low;
        broken.newton.max_steps = 0;
        assert!(broken.validate().is_err());
    }
}
