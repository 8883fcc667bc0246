//! Linearized propagation of rate uncertainties to the output ratios.
//!
//! Each uncertainty source gets one full integration with its rate shifted by
//! `sigmas` standard deviations. The deviation from the central run, divided
//! by `sigmas`, is that source's 1-sigma response; the covariance is the sum
//! of the outer products of all responses.

use crate::config::{CosmologicalState, SolverSettings};
use crate::error::{BbnResult, ConfigurationError};
use crate::integrator::ReactionNetworkIntegrator;
use crate::nuclides::{AbundanceVector, Nuclide, NNUC};
use crate::rates::ReactionRateTable;
use crate::uncertainty::{RateUncertaintyModel, UncertaintySource};
use nalgebra::DMatrix;
use rayon::prelude::*;

/// Symmetric covariance over the ratio index space (index 0 unused).
#[derive(Debug, Clone, PartialEq)]
pub struct CovarianceMatrix {
    matrix: DMatrix<f64>,
}

impl CovarianceMatrix {
    pub fn zeros() -> Self {
        Self {
            matrix: DMatrix::zeros(NNUC + 1, NNUC + 1),
        }
    }

    /// Diagonal matrix from per-ratio variances.
    pub fn from_variances(variances: &[f64; NNUC + 1]) -> Self {
        let mut cov = Self::zeros();
        for (i, v) in variances.iter().enumerate() {
            cov.matrix[(i, i)] = *v;
        }
        cov
    }

    /// Adds deviation * deviation^T.
    pub fn add_outer(&mut self, deviation: &[f64]) {
        for i in 0..=NNUC {
            for j in 0..=NNUC {
                self.matrix[(i, j)] += deviation[i] * deviation[j];
            }
        }
    }

    pub fn variance(&self, nuclide: Nuclide) -> f64 {
        self.matrix[(nuclide.number(), nuclide.number())]
    }

    pub fn std_error(&self, nuclide: Nuclide) -> f64 {
        self.variance(nuclide).max(0.0).sqrt()
    }

    pub fn covariance(&self, a: Nuclide, b: Nuclide) -> f64 {
        self.matrix[(a.number(), b.number())]
    }

    /// `None` when either variance is zero.
    pub fn correlation(&self, a: Nuclide, b: Nuclide) -> Option<f64> {
        let norm = (self.variance(a) * self.variance(b)).sqrt();
        (norm > 0.0).then(|| self.covariance(a, b) / norm)
    }

    /// Correlation coefficients with zero rows and columns where the
    /// variance vanishes.
    pub fn correlation_matrix(&self) -> DMatrix<f64> {
        let mut corr = DMatrix::zeros(NNUC + 1, NNUC + 1);
        for a in Nuclide::ALL {
            for b in Nuclide::ALL {
                if let Some(c) = self.correlation(a, b) {
                    corr[(a.number(), b.number())] = c;
                }
            }
        }
        corr
    }

    pub fn as_matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }
}

impl Default for CovarianceMatrix {
    fn default() -> Self {
        Self::zeros()
    }
}

/// Central ratios and their covariance.
#[derive(Debug, Clone, PartialEq)]
pub struct UncertainAbundances {
    pub central: AbundanceVector,
    pub covariance: CovarianceMatrix,
}

pub struct CovariancePropagator<'a> {
    state: &'a CosmologicalState,
    rates: &'a ReactionRateTable,
    settings: SolverSettings,
    sigmas: f64,
}

impl<'a> CovariancePropagator<'a> {
    pub fn new(state: &'a CosmologicalState, rates: &'a ReactionRateTable) -> Self {
        Self {
            state,
            rates,
            settings: SolverSettings::for_method(state.method),
            sigmas: 1.0,
        }
    }

    pub fn with_settings(mut self, settings: SolverSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Size of each perturbation in standard deviations.
    pub fn with_perturbation(mut self, sigmas: f64) -> Self {
        self.sigmas = sigmas;
        self
    }

    pub fn run(&self) -> BbnResult<UncertainAbundances> {
        if !(self.sigmas.is_finite() && self.sigmas > 0.0) {
            return Err(ConfigurationError::invalid("perturbation", "must be positive and finite").into());
        }
        let model = RateUncertaintyModel::new(self.rates);
        let sources = model.sources()?;
        let integrator = ReactionNetworkIntegrator::new(self.state, self.rates)
            .with_settings(self.settings);

        let central = integrator.run_with_table(self.rates)?.ratios;
        log::info!(
            "Propagating {} rate uncertainties with {:?}/{:?}",
            sources.len(),
            self.state.method.family,
            self.state.method.tier
        );

        let deviations: Vec<[f64; NNUC + 1]> = sources
            .par_iter()
            .map(|source| self.deviation(&model, &integrator, source, &central))
            .collect::<BbnResult<Vec<_>>>()?;

        let mut covariance = CovarianceMatrix::zeros();
        for deviation in &deviations {
            covariance.add_outer(deviation);
        }
        log::info!(
            "Covariance done: sigma(Yp) = {:.3e}, sigma(D/H) = {:.3e}",
            covariance.std_error(Nuclide::Helium4),
            covariance.std_error(Nuclide::Deuterium)
        );
        Ok(UncertainAbundances {
            central,
            covariance,
        })
    }

    fn deviation(
        &self,
        model: &RateUncertaintyModel<'_>,
        integrator: &ReactionNetworkIntegrator<'_>,
        source: &UncertaintySource,
        central: &AbundanceVector,
    ) -> BbnResult<[f64; NNUC + 1]> {
        let table = model.perturbed(source.reaction, self.sigmas)?;
        let perturbed = integrator.run_with_table(&table).map_err(|err| {
            log::warn!("Perturbed run for {} failed: {err}", source.reaction);
            err
        })?;
        let mut deviation = [0.0; NNUC + 1];
        for nuclide in Nuclide::ALL {
            let i = nuclide.number();
            deviation[i] = (perturbed.ratios.as_slice()[i] - central.as_slice()[i]) / self.sigmas;
        }
        Ok(deviation)
    }
}

/// Central ratios plus covariance, using the state's method.
pub fn integrate_with_uncertainty(
    state: &CosmologicalState,
    rates: &ReactionRateTable,
) -> BbnResult<UncertainAbundances> {
    CovariancePropagator::new(state, rates).run()
}
