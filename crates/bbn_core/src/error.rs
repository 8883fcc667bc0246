use crate::rates::ReactionId;
use thiserror::Error;

/// Missing or inconsistent input data. Fatal to the run, never retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("reaction {0} is missing from the rate table")]
    MissingReaction(ReactionId),
    #[error("reaction {0} has no relative uncertainty")]
    MissingUncertainty(ReactionId),
    #[error("reaction {reaction} has invalid relative uncertainty {value} (expected 0 <= sigma < 1)")]
    InvalidUncertainty { reaction: ReactionId, value: f64 },
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("unknown integration method code {0}")]
    UnknownMethodCode(i32),
    #[error("unknown uncertainty mode code {0}")]
    UnknownModeCode(i32),
}

impl ConfigurationError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        ConfigurationError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// The integrator could not finish within its bounds.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntegrationFailure {
    #[error("step size fell to {step:e} at T9 = {t9:.4} without meeting the tolerance")]
    ToleranceNotMet { t9: f64, step: f64 },
    #[error("Newton iteration did not converge in {iterations} iterations at T9 = {t9:.4}")]
    NewtonDidNotConverge { t9: f64, iterations: usize },
    #[error("iteration matrix is singular at T9 = {t9:.4}")]
    SingularMatrix { t9: f64 },
    #[error("step limit of {steps} exceeded before freeze-out")]
    StepLimitExceeded { steps: usize },
    #[error("non-finite abundance encountered at T9 = {t9:.4}")]
    NonFinite { t9: f64 },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BbnError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("integration failed: {0}")]
    Integration(#[from] IntegrationFailure),
    #[error("combined covariance matrix is singular")]
    SingularCovariance,
}

pub type BbnResult<T> = Result<T, BbnError>;
