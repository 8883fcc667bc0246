//! Rate-table transforms for shifted and perturbed runs.

use crate::config::UncertaintyMode;
use crate::error::ConfigurationError;
use crate::rates::{RateEntry, ReactionId, ReactionRateTable};
use std::borrow::Cow;

/// One independent source of rate uncertainty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UncertaintySource {
    pub reaction: ReactionId,
    /// Relative 1-sigma uncertainty.
    pub sigma: f64,
}

/// Read-only view over a nominal rate table that derives shifted copies.
#[derive(Debug, Clone, Copy)]
pub struct RateUncertaintyModel<'a> {
    table: &'a ReactionRateTable,
}

fn checked_sigma(reaction: ReactionId, entry: &RateEntry) -> Result<f64, ConfigurationError> {
    let sigma = entry
        .uncertainty
        .ok_or(ConfigurationError::MissingUncertainty(reaction))?;
    if !sigma.is_finite() || !(0.0..1.0).contains(&sigma) {
        return Err(ConfigurationError::InvalidUncertainty {
            reaction,
            value: sigma,
        });
    }
    Ok(sigma)
}

impl<'a> RateUncertaintyModel<'a> {
    pub fn new(table: &'a ReactionRateTable) -> Self {
        Self { table }
    }

    pub fn nominal(&self) -> &'a ReactionRateTable {
        self.table
    }

    pub fn sigma(&self, reaction: ReactionId) -> Result<f64, ConfigurationError> {
        checked_sigma(reaction, self.table.require(reaction)?)
    }

    /// Reactions with a non-zero uncertainty, in table order. Fails on the
    /// first reaction whose uncertainty is missing or invalid.
    pub fn sources(&self) -> Result<Vec<UncertaintySource>, ConfigurationError> {
        let mut sources = Vec::new();
        for (reaction, entry) in self.table.iter() {
            let sigma = checked_sigma(reaction, entry)?;
            if sigma > 0.0 {
                sources.push(UncertaintySource { reaction, sigma });
            }
        }
        Ok(sources)
    }

    /// Every rate scaled by (1 + direction * sigma) at once.
    pub fn shifted(&self, direction: f64) -> Result<ReactionRateTable, ConfigurationError> {
        self.table
            .scaled_each(|reaction, entry| Ok(1.0 + direction * checked_sigma(reaction, entry)?))
    }

    /// One reaction scaled by (1 + sigmas * sigma), all others nominal.
    pub fn perturbed(
        &self,
        reaction: ReactionId,
        sigmas: f64,
    ) -> Result<ReactionRateTable, ConfigurationError> {
        let sigma = self.sigma(reaction)?;
        self.table.scaled(reaction, 1.0 + sigmas * sigma)
    }

    /// The table a run in `mode` integrates with. Nominal and covariance runs
    /// borrow the nominal table unchanged.
    pub fn table_for(
        &self,
        mode: UncertaintyMode,
    ) -> Result<Cow<'a, ReactionRateTable>, ConfigurationError> {
        match mode {
            UncertaintyMode::Nominal | UncertaintyMode::Covariance => Ok(Cow::Borrowed(self.table)),
            UncertaintyMode::ShiftedUp => self.shifted(1.0).map(Cow::Owned),
            UncertaintyMode::ShiftedDown => self.shifted(-1.0).map(Cow::Owned),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RateUncertaintyModel;
    use crate::config::UncertaintyMode;
    use crate::error::ConfigurationError;
    use crate::rates::{ReactionId, ReactionRateTable};
    use std::borrow::Cow;

    fn scale_of(table: &ReactionRateTable, id: ReactionId) -> f64 {
        table.require(id).expect("present").scale
    }

    #[test]
    fn nominal_mode_borrows_the_table() {
        let table = ReactionRateTable::standard();
        let model = RateUncertaintyModel::new(&table);
        let nominal = model.table_for(UncertaintyMode::Nominal).expect("nominal");
        assert!(matches!(nominal, Cow::Borrowed(_)));
        let covariance = model.table_for(UncertaintyMode::Covariance).expect("covariance");
        assert!(matches!(covariance, Cow::Borrowed(_)));
    }

    #[test]
    fn shifted_modes_scale_every_reaction_by_its_sigma() {
        let table = ReactionRateTable::standard();
        let model = RateUncertaintyModel::new(&table);
        let up = model.table_for(UncertaintyMode::ShiftedUp).expect("up");
        let down = model.table_for(UncertaintyMode::ShiftedDown).expect("down");
        for (id, entry) in table.iter() {
            let sigma = entry.uncertainty.expect("sigma");
            assert!((scale_of(&up, id) - (1.0 + sigma)).abs() < 1e-15, "{id}");
            assert!((scale_of(&down, id) - (1.0 - sigma)).abs() < 1e-15, "{id}");
            assert_eq!(entry.scale, 1.0);
        }
    }

    #[test]
    fn perturbed_touches_only_one_reaction() {
        let table = ReactionRateTable::standard();
        let model = RateUncertaintyModel::new(&table);
        let perturbed = model.perturbed(ReactionId::DAlphaToLi6, 1.0).expect("perturbed");
        assert!((scale_of(&perturbed, ReactionId::DAlphaToLi6) - 1.3).abs() < 1e-15);
        assert_eq!(scale_of(&perturbed, ReactionId::NpToD), 1.0);
    }

    #[test]
    fn missing_uncertainty_is_a_configuration_error() {
        let mut table = ReactionRateTable::standard();
        table.set_uncertainty(ReactionId::PtToHe4, None);
        let model = RateUncertaintyModel::new(&table);
        assert_eq!(
            model.sources(),
            Err(ConfigurationError::MissingUncertainty(ReactionId::PtToHe4))
        );
        assert!(model.table_for(UncertaintyMode::ShiftedDown).is_err());
        assert!(model.table_for(UncertaintyMode::Nominal).is_ok());
    }

    #[test]
    fn out_of_range_uncertainty_is_rejected() {
        let mut table = ReactionRateTable::standard();
        table.set_uncertainty(ReactionId::NdToT, Some(1.2));
        let model = RateUncertaintyModel::new(&table);
        assert!(matches!(
            model.shifted(-1.0),
            Err(ConfigurationError::InvalidUncertainty {
                reaction: ReactionId::NdToT,
                ..
            })
        ));
    }

    #[test]
    fn zero_uncertainty_reactions_are_not_sources() {
        let mut table = ReactionRateTable::standard();
        table.set_uncertainty(ReactionId::Be7Capture, Some(0.0));
        let sources = RateUncertaintyModel::new(&table).sources().expect("sources");
        assert_eq!(sources.len(), ReactionId::ALL.len() - 1);
        assert!(sources.iter().all(|s| s.reaction != ReactionId::Be7Capture));
    }
}
