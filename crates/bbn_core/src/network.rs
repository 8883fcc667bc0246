//! Abundance evolution equations for the light-element network.
//!
//! Each reaction contributes a net flux
//! phi = lambda_f rho^(N_f-1) prod(Y^nu)/prod(nu!) - lambda_r rho^(N_r-1) prod(Y^nu)/prod(nu!)
//! and dY_i/dt sums (nu_products - nu_reactants) * phi. Equations are
//! expressed in u = -ln T9 by multiplying with dt/du from the background.

use crate::config::CosmologicalState;
use crate::cosmology::{Cosmology, NEUTRON_PROTON_Q};
use crate::error::ConfigurationError;
use crate::nuclides::{Nuclide, ABUNDANCE_FLOOR, NNUC};
use crate::rates::{RateEntry, ReactionId, ReactionRateTable};
use crate::traits::NetworkSystem;
use nalgebra::DMatrix;

type Side = &'static [(Nuclide, u8)];

struct ActiveReaction<'a> {
    id: ReactionId,
    entry: &'a RateEntry,
    reactants: Side,
    products: Side,
    /// 1/prod(nu!) and total particle count per side.
    forward_symmetry: f64,
    forward_order: i32,
    reverse_symmetry: f64,
    reverse_order: i32,
    /// (slot, products minus reactants)
    net: Vec<(usize, f64)>,
}

impl<'a> ActiveReaction<'a> {
    fn new(id: ReactionId, entry: &'a RateEntry) -> Self {
        let (reactants, products) = id.stoichiometry();
        let mut change = [0i32; NNUC];
        for (nuclide, count) in reactants {
            change[nuclide.slot()] -= *count as i32;
        }
        for (nuclide, count) in products {
            change[nuclide.slot()] += *count as i32;
        }
        let net = change
            .iter()
            .enumerate()
            .filter(|(_, c)| **c != 0)
            .map(|(slot, c)| (slot, *c as f64))
            .collect();
        Self {
            id,
            entry,
            reactants,
            products,
            forward_symmetry: symmetry_factor(reactants),
            forward_order: order(reactants),
            reverse_symmetry: symmetry_factor(products),
            reverse_order: order(products),
            net,
        }
    }
}

fn symmetry_factor(side: Side) -> f64 {
    let factorial = |n: u8| (1..=n as u32).product::<u32>() as f64;
    1.0 / side.iter().map(|(_, c)| factorial(*c)).product::<f64>()
}

fn order(side: Side) -> i32 {
    side.iter().map(|(_, c)| *c as i32).sum()
}

fn monomial(side: Side, y: &[f64]) -> f64 {
    side.iter().map(|(n, c)| y[n.slot()].powi(*c as i32)).product()
}

/// d(monomial)/dY_target.
fn monomial_partial(side: Side, y: &[f64], target: Nuclide) -> f64 {
    side.iter()
        .map(|(n, c)| {
            let value = y[n.slot()];
            if *n == target {
                *c as f64 * value.powi(*c as i32 - 1)
            } else {
                value.powi(*c as i32)
            }
        })
        .product()
}

/// The nuclear network bound to one parameter set and one rate table.
pub struct NuclearNetwork<'a> {
    cosmology: Cosmology,
    neutron_lifetime: f64,
    reactions: Vec<ActiveReaction<'a>>,
}

impl<'a> NuclearNetwork<'a> {
    /// Fails if any reaction of the network is absent from `rates`.
    pub fn new(
        state: &CosmologicalState,
        rates: &'a ReactionRateTable,
    ) -> Result<Self, ConfigurationError> {
        let reactions = ReactionId::ALL
            .iter()
            .map(|&id| rates.require(id).map(|entry| ActiveReaction::new(id, entry)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            cosmology: Cosmology::new(state),
            neutron_lifetime: state.neutron_lifetime,
            reactions,
        })
    }

    pub fn cosmology(&self) -> &Cosmology {
        &self.cosmology
    }

    /// Nucleons in weak equilibrium, deuterium in n + p <-> d balance,
    /// everything else at the floor.
    pub fn initial_abundances(&self) -> [f64; NNUC] {
        let t = self.cosmology.initial_temperature();
        let background = self.cosmology.at_t9(self.cosmology.initial_t9());
        let mut y = [ABUNDANCE_FLOOR; NNUC];
        let neutron = 1.0 / (1.0 + (NEUTRON_PROTON_Q / t).exp());
        let proton = 1.0 - neutron;
        y[Nuclide::Neutron.slot()] = neutron;
        y[Nuclide::Proton.slot()] = proton;

        if let Some(reaction) = self.reactions.iter().find(|r| r.id == ReactionId::NpToD) {
            let (capture, breakup) = reaction
                .entry
                .evaluate(background.t9, self.neutron_lifetime);
            if breakup > 0.0 {
                let deuterium = background.baryon_density * neutron * proton * capture / breakup;
                y[Nuclide::Deuterium.slot()] = deuterium.max(ABUNDANCE_FLOOR);
            }
        }
        y
    }

    fn evaluate(&self, u: f64, y: &[f64], out: &mut [f64], mut jacobian: Option<&mut DMatrix<f64>>) {
        let background = self.cosmology.at(u);
        let rho = background.baryon_density;
        out.fill(0.0);
        if let Some(j) = jacobian.as_deref_mut() {
            j.fill(0.0);
        }

        for reaction in &self.reactions {
            let (forward, reverse) = reaction
                .entry
                .evaluate(background.t9, self.neutron_lifetime);
            let kf = forward
                * rho.powi(reaction.forward_order - 1)
                * reaction.forward_symmetry
                * background.dt_du;
            let kr = reverse
                * rho.powi(reaction.reverse_order - 1)
                * reaction.reverse_symmetry
                * background.dt_du;
            let flux = kf * monomial(reaction.reactants, y) - kr * monomial(reaction.products, y);
            for &(slot, change) in &reaction.net {
                out[slot] += change * flux;
            }

            if let Some(j) = jacobian.as_deref_mut() {
                for &(nuclide, _) in reaction.reactants {
                    let d_flux = kf * monomial_partial(reaction.reactants, y, nuclide);
                    for &(slot, change) in &reaction.net {
                        j[(slot, nuclide.slot())] += change * d_flux;
                    }
                }
                if kr != 0.0 {
                    for &(nuclide, _) in reaction.products {
                        let d_flux = -kr * monomial_partial(reaction.products, y, nuclide);
                        for &(slot, change) in &reaction.net {
                            j[(slot, nuclide.slot())] += change * d_flux;
                        }
                    }
                }
            }
        }
    }
}

impl NetworkSystem for NuclearNetwork<'_> {
    fn dimension(&self) -> usize {
        NNUC
    }

    fn apply(&self, u: f64, y: &[f64], out: &mut [f64]) {
        self.evaluate(u, y, out, None);
    }

    fn jacobian(&self, u: f64, y: &[f64], out: &mut DMatrix<f64>) {
        let mut scratch = [0.0; NNUC];
        self.evaluate(u, y, &mut scratch, Some(out));
    }
}

#[cfg(test)]
mod tests {
    use super::NuclearNetwork;
    use crate::config::CosmologicalState;
    use crate::error::ConfigurationError;
    use crate::nuclides::{Nuclide, NNUC};
    use crate::rates::{ReactionId, ReactionRateTable};
    use crate::traits::NetworkSystem;
    use nalgebra::DMatrix;

    fn sample_state() -> [f64; NNUC] {
        let mut y = [0.0; NNUC];
        let values = [0.1, 0.7, 1e-3, 1e-5, 2e-5, 0.04, 1e-12, 1e-9, 1e-9];
        y.copy_from_slice(&values);
        y
    }

    #[test]
    fn missing_reaction_is_a_configuration_error() {
        let mut rates = ReactionRateTable::standard();
        rates.remove(ReactionId::TAlphaToLi7);
        let err = NuclearNetwork::new(&CosmologicalState::default(), &rates)
            .err()
            .expect("network should refuse incomplete table");
        assert_eq!(err, ConfigurationError::MissingReaction(ReactionId::TAlphaToLi7));
    }

    #[test]
    fn derivatives_conserve_baryon_number() {
        let rates = ReactionRateTable::standard();
        let network = NuclearNetwork::new(&CosmologicalState::default(), &rates).expect("network");
        let y = sample_state();
        let mut dy = [0.0; NNUC];
        for t9 in [5.0, 0.8, 0.1] {
            let u = -f64::ln(t9);
            network.apply(u, &y, &mut dy);
            let scale: f64 = Nuclide::ALL
                .iter()
                .map(|n| (n.mass_number() as f64 * dy[n.slot()]).abs())
                .sum();
            let total: f64 = Nuclide::ALL
                .iter()
                .map(|n| n.mass_number() as f64 * dy[n.slot()])
                .sum();
            assert!(total.abs() <= 1e-12 * scale.max(1e-300), "T9 = {t9}: {total} vs {scale}");
        }
    }

    #[test]
    fn analytic_jacobian_matches_finite_differences() {
        let rates = ReactionRateTable::standard();
        let network = NuclearNetwork::new(&CosmologicalState::default(), &rates).expect("network");
        let y = sample_state();
        let u = -f64::ln(0.9);
        let mut jacobian = DMatrix::zeros(NNUC, NNUC);
        network.jacobian(u, &y, &mut jacobian);

        // Every flux is at most quadratic in any single abundance, so central
        // differences are exact up to rounding.
        let h = 1e-3;
        let mut plus = [0.0; NNUC];
        let mut minus = [0.0; NNUC];
        for j in 0..NNUC {
            let mut yp = y;
            let mut ym = y;
            yp[j] += h;
            ym[j] -= h;
            network.apply(u, &yp, &mut plus);
            network.apply(u, &ym, &mut minus);
            for i in 0..NNUC {
                let row_scale = (0..NNUC).map(|k| jacobian[(i, k)].abs()).fold(0.0, f64::max);
                let numeric = (plus[i] - minus[i]) / (2.0 * h);
                let analytic = jacobian[(i, j)];
                assert!(
                    (numeric - analytic).abs() <= 1e-8 * row_scale + 1e-6 * analytic.abs(),
                    "J[{i}][{j}]: analytic {analytic}, numeric {numeric}"
                );
            }
        }
    }

    #[test]
    fn initial_abundances_follow_weak_equilibrium() {
        let rates = ReactionRateTable::standard();
        let network = NuclearNetwork::new(&CosmologicalState::default(), &rates).expect("network");
        let y = network.initial_abundances();
        let neutron = y[Nuclide::Neutron.slot()];
        let proton = y[Nuclide::Proton.slot()];
        assert!((neutron + proton - 1.0).abs() < 1e-15);
        assert!((neutron - 0.3645).abs() < 1e-3, "{neutron}");
        assert!(y[Nuclide::Deuterium.slot()] > 0.0 && y[Nuclide::Deuterium.slot()] < 1e-10);
        assert_eq!(y[Nuclide::Lithium7.slot()], 1e-30);
    }
}
