//! Nuclide identifiers and the ratio vector reported at the end of a run.

use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Number of nuclides carried by the network.
pub const NNUC: usize = 9;

/// Abundances below this are treated as zero and clamped to it.
pub const ABUNDANCE_FLOOR: f64 = 1e-30;

/// Light nuclides in network order. Discriminants are the 1-based nuclide
/// numbers used to index [`AbundanceVector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Nuclide {
    Neutron = 1,
    Proton = 2,
    Deuterium = 3,
    Tritium = 4,
    Helium3 = 5,
    Helium4 = 6,
    Lithium6 = 7,
    Lithium7 = 8,
    Beryllium7 = 9,
}

impl Nuclide {
    pub const ALL: [Nuclide; NNUC] = [
        Nuclide::Neutron,
        Nuclide::Proton,
        Nuclide::Deuterium,
        Nuclide::Tritium,
        Nuclide::Helium3,
        Nuclide::Helium4,
        Nuclide::Lithium6,
        Nuclide::Lithium7,
        Nuclide::Beryllium7,
    ];

    /// 1-based nuclide number.
    pub fn number(self) -> usize {
        self as usize
    }

    /// 0-based position in a mole-fraction state vector.
    pub fn slot(self) -> usize {
        self as usize - 1
    }

    pub fn mass_number(self) -> u32 {
        match self {
            Nuclide::Neutron | Nuclide::Proton => 1,
            Nuclide::Deuterium => 2,
            Nuclide::Tritium | Nuclide::Helium3 => 3,
            Nuclide::Helium4 => 4,
            Nuclide::Lithium6 => 6,
            Nuclide::Lithium7 | Nuclide::Beryllium7 => 7,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Nuclide::Neutron => "n",
            Nuclide::Proton => "p",
            Nuclide::Deuterium => "d",
            Nuclide::Tritium => "t",
            Nuclide::Helium3 => "3He",
            Nuclide::Helium4 => "4He",
            Nuclide::Lithium6 => "6Li",
            Nuclide::Lithium7 => "7Li",
            Nuclide::Beryllium7 => "7Be",
        }
    }

    /// Label of the reported ratio at this nuclide's index.
    pub fn ratio_label(self) -> &'static str {
        match self {
            Nuclide::Neutron => "n/H",
            Nuclide::Proton => "H",
            Nuclide::Deuterium => "H2/H",
            Nuclide::Tritium => "H3/H",
            Nuclide::Helium3 => "He3/H",
            Nuclide::Helium4 => "Yp",
            Nuclide::Lithium6 => "Li6/H",
            Nuclide::Lithium7 => "Li7/H",
            Nuclide::Beryllium7 => "Be7/H",
        }
    }

    pub fn from_number(number: usize) -> Option<Nuclide> {
        Nuclide::ALL.get(number.checked_sub(1)?).copied()
    }
}

/// Final abundance ratios indexed by nuclide number; slot 0 is unused.
///
/// Entries are ratios to hydrogen except [`Nuclide::Proton`], which holds the
/// hydrogen mole fraction itself, and [`Nuclide::Helium4`], which holds the
/// helium mass fraction Yp. Tritium is folded into helium-3 and beryllium-7
/// into lithium-7, since both decay long after freeze-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbundanceVector {
    values: [f64; NNUC + 1],
}

impl AbundanceVector {
    /// Builds the reported ratios from final mole fractions (`y[nuclide.slot()]`).
    pub fn from_mole_fractions(y: &[f64]) -> Self {
        let at = |n: Nuclide| y[n.slot()];
        let hydrogen = at(Nuclide::Proton);
        let mut values = [0.0; NNUC + 1];
        values[Nuclide::Neutron.number()] = at(Nuclide::Neutron) / hydrogen;
        values[Nuclide::Proton.number()] = hydrogen;
        values[Nuclide::Deuterium.number()] = at(Nuclide::Deuterium) / hydrogen;
        values[Nuclide::Tritium.number()] = at(Nuclide::Tritium) / hydrogen;
        values[Nuclide::Helium3.number()] =
            (at(Nuclide::Helium3) + at(Nuclide::Tritium)) / hydrogen;
        values[Nuclide::Helium4.number()] = 4.0 * at(Nuclide::Helium4);
        values[Nuclide::Lithium6.number()] = at(Nuclide::Lithium6) / hydrogen;
        values[Nuclide::Lithium7.number()] =
            (at(Nuclide::Lithium7) + at(Nuclide::Beryllium7)) / hydrogen;
        values[Nuclide::Beryllium7.number()] = at(Nuclide::Beryllium7) / hydrogen;
        Self { values }
    }

    pub fn from_values(values: [f64; NNUC + 1]) -> Self {
        Self { values }
    }

    pub fn get(&self, nuclide: Nuclide) -> f64 {
        self.values[nuclide.number()]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn helium_mass_fraction(&self) -> f64 {
        self.get(Nuclide::Helium4)
    }

    pub fn deuterium_to_hydrogen(&self) -> f64 {
        self.get(Nuclide::Deuterium)
    }

    pub fn lithium7_to_hydrogen(&self) -> f64 {
        self.get(Nuclide::Lithium7)
    }

    pub fn is_physical(&self) -> bool {
        self.values[1..].iter().all(|v| v.is_finite() && *v >= 0.0)
    }
}

impl Index<Nuclide> for AbundanceVector {
    type Output = f64;

    fn index(&self, nuclide: Nuclide) -> &f64 {
        &self.values[nuclide.number()]
    }
}
