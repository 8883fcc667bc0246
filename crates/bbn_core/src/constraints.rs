//! Chi-square compatibility of predicted ratios with observed abundances.

use crate::config::{CosmologicalState, UncertaintyMode};
use crate::covariance::{integrate_with_uncertainty, CovarianceMatrix};
use crate::error::{BbnError, BbnResult};
use crate::integrator::integrate;
use crate::nuclides::{AbundanceVector, Nuclide, NNUC};
use crate::rates::ReactionRateTable;
use anyhow::{bail, Context, Result};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// 95% quantiles of the chi-square distribution for 1..=10 degrees of freedom.
const CHI2_95: [f64; 10] = [
    3.841, 5.991, 7.815, 9.488, 11.070, 12.592, 14.067, 15.507, 16.919, 18.307,
];
/// Standard normal 95% quantile.
const Z_95: f64 = 1.644_853_626_951_472_2;

/// One observed ratio with its 1-sigma uncertainty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub nuclide: Nuclide,
    pub value: f64,
    pub sigma: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintTable {
    pub measurements: Vec<Measurement>,
}

impl Default for ConstraintTable {
    fn default() -> Self {
        Self {
            measurements: vec![
                Measurement {
                    nuclide: Nuclide::Helium4,
                    value: 0.245,
                    sigma: 0.003,
                },
                Measurement {
                    nuclide: Nuclide::Deuterium,
                    value: 2.527e-5,
                    sigma: 0.030e-5,
                },
            ],
        }
    }
}

impl ConstraintTable {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let table: ConstraintTable =
            serde_json::from_str(text).context("Failed to parse constraint table JSON.")?;
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<()> {
        if self.measurements.is_empty() {
            bail!("Constraint table has no measurements.");
        }
        for m in &self.measurements {
            if !(m.value.is_finite() && m.sigma.is_finite() && m.sigma > 0.0) {
                bail!(
                    "Measurement of {} needs a finite value and a positive uncertainty.",
                    m.nuclide.ratio_label()
                );
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Compatible,
    Excluded,
    ComputationFailed,
}

impl Verdict {
    /// 1 excluded, 0 compatible, -1 failed.
    pub fn legacy_code(self) -> i32 {
        match self {
            Verdict::Compatible => 0,
            Verdict::Excluded => 1,
            Verdict::ComputationFailed => -1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChiSquare {
    pub value: f64,
    pub degrees_of_freedom: usize,
    pub threshold: f64,
}

impl ChiSquare {
    fn new(value: f64, degrees_of_freedom: usize) -> Self {
        Self {
            value,
            degrees_of_freedom,
            threshold: chi_square_threshold(degrees_of_freedom),
        }
    }

    pub fn verdict(&self) -> Verdict {
        if !self.value.is_finite() {
            Verdict::ComputationFailed
        } else if self.value <= self.threshold {
            Verdict::Compatible
        } else {
            Verdict::Excluded
        }
    }
}

/// 95% chi-square quantile. Tabulated up to 10 degrees of freedom,
/// Wilson-Hilferty beyond.
pub fn chi_square_threshold(degrees_of_freedom: usize) -> f64 {
    match degrees_of_freedom {
        0 => 0.0,
        k @ 1..=10 => CHI2_95[k - 1],
        k => {
            let k = k as f64;
            let a = 2.0 / (9.0 * k);
            k * (1.0 - a + Z_95 * a.sqrt()).powi(3)
        }
    }
}

pub struct ConstraintEvaluator<'a> {
    table: &'a ConstraintTable,
}

impl<'a> ConstraintEvaluator<'a> {
    pub fn new(table: &'a ConstraintTable) -> Self {
        Self { table }
    }

    fn residuals(&self, ratios: &AbundanceVector) -> Vec<f64> {
        self.table
            .measurements
            .iter()
            .map(|m| ratios.get(m.nuclide) - m.value)
            .collect()
    }

    /// Sum of squared residuals over observed plus, if given, predicted
    /// variances. Off-diagonal terms are ignored.
    pub fn chi_square_uncorrelated(
        &self,
        ratios: &AbundanceVector,
        covariance: Option<&CovarianceMatrix>,
    ) -> ChiSquare {
        let value = self
            .table
            .measurements
            .iter()
            .zip(self.residuals(ratios))
            .map(|(m, r)| {
                let predicted = covariance.map_or(0.0, |c| c.variance(m.nuclide));
                r * r / (m.sigma * m.sigma + predicted)
            })
            .sum();
        ChiSquare::new(value, self.table.len())
    }

    /// r^T (C_pred + C_obs)^-1 r over the measured ratios.
    pub fn chi_square_correlated(
        &self,
        ratios: &AbundanceVector,
        covariance: &CovarianceMatrix,
    ) -> BbnResult<ChiSquare> {
        let measurements = &self.table.measurements;
        let n = measurements.len();
        let combined = DMatrix::from_fn(n, n, |i, j| {
            let observed = if i == j {
                measurements[i].sigma * measurements[i].sigma
            } else {
                0.0
            };
            covariance.covariance(measurements[i].nuclide, measurements[j].nuclide) + observed
        });
        let residual = DVector::from_vec(self.residuals(ratios));
        let weighted = combined
            .lu()
            .solve(&residual)
            .ok_or(BbnError::SingularCovariance)?;
        Ok(ChiSquare::new(residual.dot(&weighted), n))
    }

    /// Correlated form when a covariance is given, observational errors only
    /// otherwise.
    pub fn evaluate(
        &self,
        ratios: &AbundanceVector,
        covariance: Option<&CovarianceMatrix>,
    ) -> Verdict {
        match covariance {
            None => self.report(Ok(self.chi_square_uncorrelated(ratios, None))),
            Some(c) => self.report(self.chi_square_correlated(ratios, c)),
        }
    }

    pub fn evaluate_uncorrelated(
        &self,
        ratios: &AbundanceVector,
        covariance: Option<&CovarianceMatrix>,
    ) -> Verdict {
        self.report(Ok(self.chi_square_uncorrelated(ratios, covariance)))
    }

    fn report(&self, chi2: BbnResult<ChiSquare>) -> Verdict {
        match chi2 {
            Ok(chi2) => {
                log::debug!(
                    "chi2 = {:.4} for {} dof (threshold {:.3})",
                    chi2.value,
                    chi2.degrees_of_freedom,
                    chi2.threshold
                );
                chi2.verdict()
            }
            Err(err) => {
                log::warn!("Chi-square evaluation failed: {err}");
                Verdict::ComputationFailed
            }
        }
    }
}

/// Tests against the default measurement table.
pub fn evaluate_constraints(
    ratios: &AbundanceVector,
    covariance: Option<&CovarianceMatrix>,
) -> Verdict {
    ConstraintEvaluator::new(&ConstraintTable::default()).evaluate(ratios, covariance)
}

/// Integrates according to the state's mode and tests the result.
///
/// Shifted and nominal modes run the nominal, shifted-up and shifted-down
/// tables and use half the up/down spread as the predicted uncertainty.
/// `Covariance` mode propagates the full covariance and tests with
/// correlations. Any failed run gives `ComputationFailed`.
pub fn check_compatibility(
    state: &CosmologicalState,
    rates: &ReactionRateTable,
    table: &ConstraintTable,
) -> Verdict {
    let evaluator = ConstraintEvaluator::new(table);
    let outcome = match state.mode {
        UncertaintyMode::Covariance => integrate_with_uncertainty(state, rates)
            .map(|result| evaluator.evaluate(&result.central, Some(&result.covariance))),
        _ => bracketed_prediction(state, rates)
            .map(|(central, spread)| evaluator.evaluate_uncorrelated(&central, Some(&spread))),
    };
    outcome.unwrap_or_else(|err| {
        log::warn!("Compatibility check aborted: {err}");
        Verdict::ComputationFailed
    })
}

fn bracketed_prediction(
    state: &CosmologicalState,
    rates: &ReactionRateTable,
) -> BbnResult<(AbundanceVector, CovarianceMatrix)> {
    let central = integrate(&state.with_mode(UncertaintyMode::Nominal), rates)?;
    let up = integrate(&state.with_mode(UncertaintyMode::ShiftedUp), rates)?;
    let down = integrate(&state.with_mode(UncertaintyMode::ShiftedDown), rates)?;
    let mut variances = [0.0; NNUC + 1];
    for nuclide in Nuclide::ALL {
        let half_spread = 0.5 * (up.get(nuclide) - down.get(nuclide));
        variances[nuclide.number()] = half_spread * half_spread;
    }
    Ok((central, CovarianceMatrix::from_variances(&variances)))
}
