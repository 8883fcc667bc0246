//! Reaction identifiers and thermonuclear rate fits.
//!
//! Two-body and three-body rates use the seven-parameter REACLIB form summed
//! over fit sets; reverse rates carry their own fits so detailed balance is
//! built into the tables. The weak n <-> p rates use polynomial fits in
//! z = m_e / T normalized to the neutron lifetime.

use crate::error::ConfigurationError;
use crate::nuclides::Nuclide;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use Nuclide::{
    Beryllium7 as BE7, Deuterium as D, Helium3 as HE3, Helium4 as HE4, Lithium6 as LI6,
    Lithium7 as LI7, Neutron as N, Proton as P, Tritium as T,
};

/// Reactions of the standard light-element network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReactionId {
    /// n <-> p weak interconversion and neutron decay.
    NucleonWeak,
    NpToD,
    PdToHe3,
    DdToNHe3,
    DdToPT,
    DtToNHe4,
    NHe3ToPT,
    DHe3ToPHe4,
    He3AlphaToBe7,
    TAlphaToLi7,
    NBe7ToPLi7,
    PLi7ToAlphaAlpha,
    DAlphaToLi6,
    PLi6ToAlphaHe3,
    NdToT,
    NHe3ToHe4,
    PtToHe4,
    DdToHe4,
    NLi6ToAlphaT,
    NBe7ToAlphaAlpha,
    PLi6ToBe7,
    NLi6ToLi7,
    THe3ToDHe4,
    THe3ToNPHe4,
    He3He3ToPPHe4,
    TtToNNHe4,
    DLi7ToNAlphaAlpha,
    DBe7ToPAlphaAlpha,
    DLi6ToNBe7,
    DLi6ToPLi7,
    TritiumDecay,
    Be7Capture,
}

type Side = &'static [(Nuclide, u8)];

impl ReactionId {
    pub const ALL: [ReactionId; 32] = [
        ReactionId::NucleonWeak,
        ReactionId::NpToD,
        ReactionId::PdToHe3,
        ReactionId::DdToNHe3,
        ReactionId::DdToPT,
        ReactionId::DtToNHe4,
        ReactionId::NHe3ToPT,
        ReactionId::DHe3ToPHe4,
        ReactionId::He3AlphaToBe7,
        ReactionId::TAlphaToLi7,
        ReactionId::NBe7ToPLi7,
        ReactionId::PLi7ToAlphaAlpha,
        ReactionId::DAlphaToLi6,
        ReactionId::PLi6ToAlphaHe3,
        ReactionId::NdToT,
        ReactionId::NHe3ToHe4,
        ReactionId::PtToHe4,
        ReactionId::DdToHe4,
        ReactionId::NLi6ToAlphaT,
        ReactionId::NBe7ToAlphaAlpha,
        ReactionId::PLi6ToBe7,
        ReactionId::NLi6ToLi7,
        ReactionId::THe3ToDHe4,
        ReactionId::THe3ToNPHe4,
        ReactionId::He3He3ToPPHe4,
        ReactionId::TtToNNHe4,
        ReactionId::DLi7ToNAlphaAlpha,
        ReactionId::DBe7ToPAlphaAlpha,
        ReactionId::DLi6ToNBe7,
        ReactionId::DLi6ToPLi7,
        ReactionId::TritiumDecay,
        ReactionId::Be7Capture,
    ];

    /// (reactants, products) with multiplicities, forward direction.
    pub fn stoichiometry(self) -> (Side, Side) {
        match self {
            ReactionId::NucleonWeak => (&[(N, 1)], &[(P, 1)]),
            ReactionId::NpToD => (&[(N, 1), (P, 1)], &[(D, 1)]),
            ReactionId::PdToHe3 => (&[(P, 1), (D, 1)], &[(HE3, 1)]),
            ReactionId::DdToNHe3 => (&[(D, 2)], &[(N, 1), (HE3, 1)]),
            ReactionId::DdToPT => (&[(D, 2)], &[(P, 1), (T, 1)]),
            ReactionId::DtToNHe4 => (&[(D, 1), (T, 1)], &[(N, 1), (HE4, 1)]),
            ReactionId::NHe3ToPT => (&[(N, 1), (HE3, 1)], &[(P, 1), (T, 1)]),
            ReactionId::DHe3ToPHe4 => (&[(D, 1), (HE3, 1)], &[(P, 1), (HE4, 1)]),
            ReactionId::He3AlphaToBe7 => (&[(HE3, 1), (HE4, 1)], &[(BE7, 1)]),
            ReactionId::TAlphaToLi7 => (&[(T, 1), (HE4, 1)], &[(LI7, 1)]),
            ReactionId::NBe7ToPLi7 => (&[(N, 1), (BE7, 1)], &[(P, 1), (LI7, 1)]),
            ReactionId::PLi7ToAlphaAlpha => (&[(P, 1), (LI7, 1)], &[(HE4, 2)]),
            ReactionId::DAlphaToLi6 => (&[(D, 1), (HE4, 1)], &[(LI6, 1)]),
            ReactionId::PLi6ToAlphaHe3 => (&[(P, 1), (LI6, 1)], &[(HE3, 1), (HE4, 1)]),
            ReactionId::NdToT => (&[(N, 1), (D, 1)], &[(T, 1)]),
            ReactionId::NHe3ToHe4 => (&[(N, 1), (HE3, 1)], &[(HE4, 1)]),
            ReactionId::PtToHe4 => (&[(P, 1), (T, 1)], &[(HE4, 1)]),
            ReactionId::DdToHe4 => (&[(D, 2)], &[(HE4, 1)]),
            ReactionId::NLi6ToAlphaT => (&[(N, 1), (LI6, 1)], &[(T, 1), (HE4, 1)]),
            ReactionId::NBe7ToAlphaAlpha => (&[(N, 1), (BE7, 1)], &[(HE4, 2)]),
            ReactionId::PLi6ToBe7 => (&[(P, 1), (LI6, 1)], &[(BE7, 1)]),
            ReactionId::NLi6ToLi7 => (&[(N, 1), (LI6, 1)], &[(LI7, 1)]),
            ReactionId::THe3ToDHe4 => (&[(T, 1), (HE3, 1)], &[(D, 1), (HE4, 1)]),
            ReactionId::THe3ToNPHe4 => (&[(T, 1), (HE3, 1)], &[(N, 1), (P, 1), (HE4, 1)]),
            ReactionId::He3He3ToPPHe4 => (&[(HE3, 2)], &[(P, 2), (HE4, 1)]),
            ReactionId::TtToNNHe4 => (&[(T, 2)], &[(N, 2), (HE4, 1)]),
            ReactionId::DLi7ToNAlphaAlpha => (&[(D, 1), (LI7, 1)], &[(N, 1), (HE4, 2)]),
            ReactionId::DBe7ToPAlphaAlpha => (&[(D, 1), (BE7, 1)], &[(P, 1), (HE4, 2)]),
            ReactionId::DLi6ToNBe7 => (&[(D, 1), (LI6, 1)], &[(N, 1), (BE7, 1)]),
            ReactionId::DLi6ToPLi7 => (&[(D, 1), (LI6, 1)], &[(P, 1), (LI7, 1)]),
            ReactionId::TritiumDecay => (&[(T, 1)], &[(HE3, 1)]),
            ReactionId::Be7Capture => (&[(BE7, 1)], &[(LI7, 1)]),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReactionId::NucleonWeak => "n<->p",
            ReactionId::NpToD => "p(n,g)d",
            ReactionId::PdToHe3 => "d(p,g)3He",
            ReactionId::DdToNHe3 => "d(d,n)3He",
            ReactionId::DdToPT => "d(d,p)t",
            ReactionId::DtToNHe4 => "t(d,n)4He",
            ReactionId::NHe3ToPT => "3He(n,p)t",
            ReactionId::DHe3ToPHe4 => "3He(d,p)4He",
            ReactionId::He3AlphaToBe7 => "3He(a,g)7Be",
            ReactionId::TAlphaToLi7 => "t(a,g)7Li",
            ReactionId::NBe7ToPLi7 => "7Be(n,p)7Li",
            ReactionId::PLi7ToAlphaAlpha => "7Li(p,a)4He",
            ReactionId::DAlphaToLi6 => "d(a,g)6Li",
            ReactionId::PLi6ToAlphaHe3 => "6Li(p,a)3He",
            ReactionId::NdToT => "d(n,g)t",
            ReactionId::NHe3ToHe4 => "3He(n,g)4He",
            ReactionId::PtToHe4 => "t(p,g)4He",
            ReactionId::DdToHe4 => "d(d,g)4He",
            ReactionId::NLi6ToAlphaT => "6Li(n,a)t",
            ReactionId::NBe7ToAlphaAlpha => "7Be(n,a)4He",
            ReactionId::PLi6ToBe7 => "6Li(p,g)7Be",
            ReactionId::NLi6ToLi7 => "6Li(n,g)7Li",
            ReactionId::THe3ToDHe4 => "3He(t,d)4He",
            ReactionId::THe3ToNPHe4 => "3He(t,np)4He",
            ReactionId::He3He3ToPPHe4 => "3He(3He,2p)4He",
            ReactionId::TtToNNHe4 => "t(t,2n)4He",
            ReactionId::DLi7ToNAlphaAlpha => "7Li(d,na)4He",
            ReactionId::DBe7ToPAlphaAlpha => "7Be(d,pa)4He",
            ReactionId::DLi6ToNBe7 => "6Li(d,n)7Be",
            ReactionId::DLi6ToPLi7 => "6Li(d,p)7Li",
            ReactionId::TritiumDecay => "t(e-nu)3He",
            ReactionId::Be7Capture => "7Be(e-,nu)7Li",
        }
    }
}

impl fmt::Display for ReactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One REACLIB fit set: lambda = exp(a0 + a1/T9 + a2 T9^-1/3 + a3 T9^1/3 + a4 T9 + a5 T9^5/3 + a6 ln T9).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReaclibFit(pub [f64; 7]);

impl ReaclibFit {
    pub fn evaluate(&self, t9: f64) -> f64 {
        let a = &self.0;
        let t913 = t9.cbrt();
        (a[0] + a[1] / t9 + a[2] / t913 + a[3] * t913 + a[4] * t9 + a[5] * t9 * t913 * t913
            + a[6] * t9.ln())
        .exp()
    }
}

fn sum_sets(sets: &[ReaclibFit], t9: f64) -> f64 {
    sets.iter().map(|set| set.evaluate(t9)).sum()
}

/// Temperature dependence of a reaction rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RateLaw {
    Reaclib {
        forward: Vec<ReaclibFit>,
        reverse: Vec<ReaclibFit>,
    },
    /// n -> p and p -> n, scaled by 1/tau_n.
    NucleonWeak,
}

const WEAK_Z_SCALE: f64 = 5.92989658;
const WEAK_NP: [f64; 14] = [
    1.0, 0.15735, 4.6172, -0.40520e2, 0.13875e3, -0.59898e2, 0.66752e2, -0.16705e2, 3.8071,
    -0.39140, 0.023590, -0.83696e-4, -0.42095e-4, 0.17675e-5,
];
const WEAK_PN: [f64; 11] = [
    -0.62173, 0.22211e2, -0.72798e2, 0.11571e3, -0.11763e2, 0.45521e2, -3.7973, 0.41266,
    -0.026210, 0.87934e-3, -0.12016e-4,
];
/// Below this temperature the p -> n rate is set to zero.
const WEAK_PN_CUTOFF_T9: f64 = 1.160451812;

fn inverse_power_series(coefficients: &[f64], z: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc / z + c)
}

impl RateLaw {
    /// (forward, reverse) rates at T9, unscaled.
    pub fn evaluate(&self, t9: f64, neutron_lifetime: f64) -> (f64, f64) {
        match self {
            RateLaw::Reaclib { forward, reverse } => (sum_sets(forward, t9), sum_sets(reverse, t9)),
            RateLaw::NucleonWeak => {
                let z = WEAK_Z_SCALE / t9;
                let n_to_p = inverse_power_series(&WEAK_NP, z) * (-0.33979 / z).exp();
                let p_to_n = if t9 > WEAK_PN_CUTOFF_T9 {
                    inverse_power_series(&WEAK_PN, z) * (-2.8602 * z).exp()
                } else {
                    0.0
                };
                (n_to_p / neutron_lifetime, p_to_n / neutron_lifetime)
            }
        }
    }
}

/// Rate law, relative 1-sigma uncertainty and a multiplicative scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateEntry {
    pub law: RateLaw,
    pub uncertainty: Option<f64>,
    pub scale: f64,
}

impl RateEntry {
    pub fn new(law: RateLaw, uncertainty: Option<f64>) -> Self {
        Self {
            law,
            uncertainty,
            scale: 1.0,
        }
    }

    pub fn evaluate(&self, t9: f64, neutron_lifetime: f64) -> (f64, f64) {
        let (forward, reverse) = self.law.evaluate(t9, neutron_lifetime);
        (self.scale * forward, self.scale * reverse)
    }
}

/// Reaction rates keyed by reaction. Perturbed runs work on copies; the
/// nominal table is never modified by the integrator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReactionRateTable {
    entries: BTreeMap<ReactionId, RateEntry>,
}

impl ReactionRateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard 9-nuclide network with its rate uncertainties.
    pub fn standard() -> Self {
        let mut table = Self::new();
        table.insert(
            ReactionId::NucleonWeak,
            RateEntry::new(RateLaw::NucleonWeak, Some(NUCLEON_WEAK_UNCERTAINTY)),
        );
        for rate in STANDARD_RATES {
            let law = RateLaw::Reaclib {
                forward: rate.forward.iter().copied().map(ReaclibFit).collect(),
                reverse: rate.reverse.iter().copied().map(ReaclibFit).collect(),
            };
            table.insert(rate.id, RateEntry::new(law, Some(rate.uncertainty)));
        }
        table
    }

    pub fn insert(&mut self, id: ReactionId, entry: RateEntry) -> Option<RateEntry> {
        self.entries.insert(id, entry)
    }

    pub fn remove(&mut self, id: ReactionId) -> Option<RateEntry> {
        self.entries.remove(&id)
    }

    pub fn get(&self, id: ReactionId) -> Option<&RateEntry> {
        self.entries.get(&id)
    }

    pub fn require(&self, id: ReactionId) -> Result<&RateEntry, ConfigurationError> {
        self.get(id).ok_or(ConfigurationError::MissingReaction(id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ReactionId, &RateEntry)> {
        self.entries.iter().map(|(id, entry)| (*id, entry))
    }

    pub fn set_uncertainty(&mut self, id: ReactionId, uncertainty: Option<f64>) -> bool {
        match self.entries.get_mut(&id) {
            Some(entry) => {
                entry.uncertainty = uncertainty;
                true
            }
            None => false,
        }
    }

    /// Copy with one reaction's scale multiplied by `factor`.
    pub fn scaled(&self, id: ReactionId, factor: f64) -> Result<Self, ConfigurationError> {
        let mut table = self.clone();
        let entry = table
            .entries
            .get_mut(&id)
            .ok_or(ConfigurationError::MissingReaction(id))?;
        entry.scale *= factor;
        Ok(table)
    }

    /// Copy with each reaction's scale multiplied by `factor(entry)`.
    pub fn scaled_each<F>(&self, mut factor: F) -> Result<Self, ConfigurationError>
    where
        F: FnMut(ReactionId, &RateEntry) -> Result<f64, ConfigurationError>,
    {
        let mut table = self.clone();
        for (id, entry) in table.entries.iter_mut() {
            let f = factor(*id, entry)?;
            entry.scale *= f;
        }
        Ok(table)
    }
}

/// Relative uncertainty of the weak rates, from the neutron lifetime error.
const NUCLEON_WEAK_UNCERTAINTY: f64 = 0.0011;

struct StandardRate {
    id: ReactionId,
    forward: &'static [[f64; 7]],
    reverse: &'static [[f64; 7]],
    uncertainty: f64,
}

const STANDARD_RATES: &[StandardRate] = &[
    StandardRate {
        id: ReactionId::NpToD,
        forward: &[
            [12.3687, 0.0, 0.0, -2.70618, 0.11718, -0.00312788, 0.469127],
            [10.7548, 0.0, 0.0, -2.30472, -0.887862, 0.137663, 0.0],
            [8.84688, 0.0, 0.0, -0.0102082, -0.0893959, 0.00696704, 1.0],
        ],
        reverse: &[
            [33.0154, -25.815, 0.0, -2.30472, -0.887862, 0.137663, 1.5],
            [34.6293, -25.815, 0.0, -2.70618, 0.11718, -0.00312788, 1.96913],
            [31.1075, -25.815, 0.0, -0.0102082, -0.0893959, 0.00696704, 2.5],
        ],
        uncertainty: 0.01,
    },
    StandardRate {
        id: ReactionId::PdToHe3,
        forward: &[
            [8.93525, 0.0, -3.7208, 0.198654, 0.0, 0.0, 0.333333],
            [7.52898, 0.0, -3.7208, 0.871782, 0.0, 0.0, -0.666667],
        ],
        reverse: &[
            [32.4383, -63.7435, -3.7208, 0.198654, 0.0, 0.0, 1.83333],
            [31.032, -63.7435, -3.7208, 0.871782, 0.0, 0.0, 0.833333],
        ],
        uncertainty: 0.03,
    },
    StandardRate {
        id: ReactionId::DdToNHe3,
        forward: &[
            [19.0876, -0.00019002, -4.2292, 1.6932, -0.0855529, -1.35709e-25, -0.734513],
        ],
        reverse: &[
            [19.6369, -37.9358, -4.2292, 1.6932, -0.0855529, -1.35709e-25, -0.734513],
        ],
        uncertainty: 0.012,
    },
    StandardRate {
        id: ReactionId::DdToPT,
        forward: &[
            [18.8052, 4.36209e-05, -4.32296, 1.91572, -0.081562, -3.28804e-22, -0.879518],
        ],
        reverse: &[
            [19.3545, -46.799, -4.32296, 1.91572, -0.081562, -3.28804e-22, -0.879518],
        ],
        uncertainty: 0.012,
    },
    StandardRate {
        id: ReactionId::DtToNHe4,
        forward: &[
            [39.3457, 0.0, -4.5244, -16.4028, 1.73103, -0.122966, 2.31304],
            [25.1794, 0.0, -4.5244, 0.350337, 0.58747, -8.84909, -0.666667],
        ],
        reverse: &[
            [26.8862, -204.112, -4.5244, 0.350337, 0.58747, -8.84909, -0.666667],
            [41.0525, -204.112, -4.5244, -16.4028, 1.73103, -0.122966, 2.31304],
        ],
        uncertainty: 0.013,
    },
    StandardRate {
        id: ReactionId::NHe3ToPT,
        forward: &[
            [20.3787, 0.0, 0.0, -0.332788, -0.700485, 0.0976521, 0.0],
            [19.2762, 0.0, 0.0, 0.0438557, -0.201527, 0.0153433, 1.0],
        ],
        reverse: &[
            [19.2762, -8.86352, 0.0, 0.0438557, -0.201527, 0.0153433, 1.0],
            [20.3787, -8.86352, 0.0, -0.332788, -0.700485, 0.0976521, 0.0],
        ],
        uncertainty: 0.015,
    },
    StandardRate {
        id: ReactionId::DHe3ToPHe4,
        forward: &[
            [24.6839, 0.0, -7.182, 0.473288, 1.46847, -27.9603, -0.666667],
            [41.2969, 0.0, -7.182, -17.1349, 1.36908, -0.0814423, 3.35395],
        ],
        reverse: &[
            [43.0037, -212.977, -7.182, -17.1349, 1.36908, -0.0814423, 3.35395],
            [26.3907, -212.977, -7.182, 0.473288, 1.46847, -27.9603, -0.666667],
        ],
        uncertainty: 0.03,
    },
    StandardRate {
        id: ReactionId::He3AlphaToBe7,
        forward: &[
            [17.7075, 0.0, -12.8271, -3.8126, 0.0942285, -0.00301018, 1.33333],
            [15.6099, 0.0, -12.8271, -0.0308225, -0.654685, 0.0896331, -0.666667],
        ],
        reverse: &[
            [38.7379, -18.4059, -12.8271, -0.0308225, -0.654685, 0.0896331, 0.833333],
            [40.8355, -18.4059, -12.8271, -3.8126, 0.0942285, -0.00301018, 2.83333],
        ],
        uncertainty: 0.05,
    },
    StandardRate {
        id: ReactionId::TAlphaToLi7,
        forward: &[
            [13.6162, 0.0, -8.0805, -0.217514, -0.114859, 0.0470043, -0.666667],
        ],
        reverse: &[
            [36.7442, -28.6283, -8.0805, -0.217514, -0.114859, 0.0470043, 0.833333],
        ],
        uncertainty: 0.04,
    },
    StandardRate {
        id: ReactionId::NBe7ToPLi7,
        forward: &[
            [21.7899, 0.000728098, -0.30254, -0.3602, 0.17472, -0.0223, -0.4581],
        ],
        reverse: &[
            [21.7899, -19.0779, -0.30254, -0.3602, 0.17472, -0.0223, -0.4581],
        ],
        uncertainty: 0.02,
    },
    StandardRate {
        id: ReactionId::PLi7ToAlphaAlpha,
        forward: &[
            [11.9576, 0.0, -8.4727, 0.417943, 5.34565, -4.8684, -0.666667],
            [21.8999, -26.1527, 0.0, 0.0, 0.0, 0.0, -1.5],
            [20.4438, 0.0, -8.4727, 0.297934, 0.0582335, -0.00413383, -0.666667],
            [14.2538, -4.478, 0.0, 0.0, 0.0, 0.0, -1.5],
        ],
        reverse: &[
            [23.4325, -227.465, 0.0, 0.0, 0.0, 0.0, -1.5],
            [21.9764, -201.312, -8.4727, 0.297934, 0.0582335, -0.00413383, -0.666667],
            [15.7864, -205.79, 0.0, 0.0, 0.0, 0.0, -1.5],
            [13.4902, -201.312, -8.4727, 0.417943, 5.34565, -4.8684, -0.666667],
        ],
        uncertainty: 0.04,
    },
    StandardRate {
        id: ReactionId::DAlphaToLi6,
        forward: &[
            [4.12313, -7.889, 0.0, 0.0, 0.0, 0.0, -1.5],
            [-0.676485, 6.3911e-05, -7.55198, 5.77546, -0.487854, 0.032833, -1.12305],
        ],
        reverse: &[
            [27.5672, -24.9919, 0.0, 0.0, 0.0, 0.0, 0.0],
            [22.7676, -17.1028, -7.55198, 5.77546, -0.487854, 0.032833, 0.376948],
        ],
        uncertainty: 0.3,
    },
    StandardRate {
        id: ReactionId::PLi6ToAlphaHe3,
        forward: &[
            [24.3475, 0.0, -8.39481, -0.165254, -0.16936, 0.0533676, -0.666667],
        ],
        reverse: &[
            [24.4064, -46.6405, -8.39481, -0.165254, -0.16936, 0.0533676, -0.666667],
        ],
        uncertainty: 0.1,
    },
    StandardRate {
        id: ReactionId::NdToT,
        forward: &[
            [6.60935, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0],
            [5.36598, 0.0, 0.0, 0.0, 0.0, 0.0, 0.075],
        ],
        reverse: &[
            [30.1124, -72.6136, 0.0, 0.0, 0.0, 0.0, 2.5],
            [28.869, -72.6136, 0.0, 0.0, 0.0, 0.0, 1.575],
        ],
        uncertainty: 0.1,
    },
    StandardRate {
        id: ReactionId::NHe3ToHe4,
        forward: &[
            [9.04572, 0.0, 0.0, -1.50147, 0.0, 0.0, 1.0],
            [5.51711, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        ],
        reverse: &[
            [33.0131, -238.79, 0.0, -1.50147, 0.0, 0.0, 2.5],
            [29.4845, -238.79, 0.0, 0.0, 0.0, 0.0, 1.5],
        ],
        uncertainty: 0.1,
    },
    StandardRate {
        id: ReactionId::PtToHe4,
        forward: &[
            [9.76526, 0.0, -3.869, 1.45482, 0.577246, -0.112199, -0.666667],
        ],
        reverse: &[
            [33.7327, -229.932, -3.869, 1.45482, 0.577246, -0.112199, 0.833333],
        ],
        uncertainty: 0.2,
    },
    StandardRate {
        id: ReactionId::DdToHe4,
        forward: &[
            [3.78177, 0.0, -4.26166, -0.119233, 0.778829, -0.0925203, -0.666667],
        ],
        reverse: &[
            [28.2984, -276.744, -4.26166, -0.119233, 0.778829, -0.0925203, 0.833333],
        ],
        uncertainty: 0.3,
    },
    StandardRate {
        id: ReactionId::NLi6ToAlphaT,
        forward: &[
            [21.665, -2.39128, 0.0, 0.0, 0.0, 0.0, -1.5],
            [18.9496, -0.001281, 0.0, 0.0, 0.0, 0.0, 0.0],
        ],
        reverse: &[
            [19.0085, -55.494, 0.0, 0.0, 0.0, 0.0, 0.0],
            [21.7239, -57.884, 0.0, 0.0, 0.0, 0.0, -1.5],
        ],
        uncertainty: 0.1,
    },
    StandardRate {
        id: ReactionId::NBe7ToAlphaAlpha,
        forward: &[
            [18.1614, 0.0, 0.0, -0.00210045, 0.000176541, -1.36797e-05, 1.00083],
        ],
        reverse: &[
            [19.694, -220.375, 0.0, -0.00210045, 0.000176541, -1.36797e-05, 1.00083],
        ],
        uncertainty: 0.5,
    },
    StandardRate {
        id: ReactionId::PLi6ToBe7,
        forward: &[
            [14.2792, 0.0, -8.4372, -0.515473, 0.0285578, 0.00879731, -0.666667],
        ],
        reverse: &[
            [37.4661, -65.0548, -8.4372, -0.515473, 0.0285578, 0.00879731, 0.833333],
        ],
        uncertainty: 0.1,
    },
    StandardRate {
        id: ReactionId::NLi6ToLi7,
        forward: &[
            [9.04782, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        ],
        reverse: &[
            [32.2347, -84.1369, 0.0, 0.0, 0.0, 0.0, 1.5],
        ],
        uncertainty: 0.2,
    },
    StandardRate {
        id: ReactionId::THe3ToDHe4,
        forward: &[
            [22.4207, 0.0, -7.733, -0.133473, -0.294412, 0.0310968, -0.666667],
        ],
        reverse: &[
            [22.8851, -166.176, -7.733, -0.133473, -0.294412, 0.0310968, -0.666667],
        ],
        uncertainty: 0.1,
    },
    StandardRate {
        id: ReactionId::THe3ToNPHe4,
        forward: &[
            [22.7658, 0.0, -7.733, -0.118902, -0.267393, 0.0275387, -0.666667],
        ],
        reverse: &[
            [0.969572, -140.368, -7.733, -0.118902, -0.267393, 0.0275387, -2.16667],
        ],
        uncertainty: 0.1,
    },
    StandardRate {
        id: ReactionId::He3He3ToPPHe4,
        forward: &[
            [24.7788, 0.0, -12.277, -0.103699, -0.0649967, 0.0168191, -0.666667],
        ],
        reverse: &[
            [2.98257, -149.222, -12.277, -0.103699, -0.0649967, 0.0168191, -2.16667],
        ],
        uncertainty: 0.05,
    },
    StandardRate {
        id: ReactionId::TtToNNHe4,
        forward: &[
            [21.2361, 0.0, -4.872, -1.72398, 0.684775, -0.0702582, 0.333333],
            [21.2361, 0.0, -4.872, -0.0328579, -1.13588, 0.250064, -0.666667],
        ],
        reverse: &[
            [-0.560128, -131.502, -4.872, -1.72398, 0.684775, -0.0702582, -1.16667],
            [-0.560128, -131.502, -4.872, -0.0328579, -1.13588, 0.250064, -2.16667],
        ],
        uncertainty: 0.1,
    },
    StandardRate {
        id: ReactionId::DLi7ToNAlphaAlpha,
        forward: &[
            [26.4, 0.0, -10.259, 0.0, 0.0, 0.0, -0.666667],
        ],
        reverse: &[
            [5.67199, -175.472, -10.259, 0.0, 0.0, 0.0, -2.16667],
        ],
        uncertainty: 0.5,
    },
    StandardRate {
        id: ReactionId::DBe7ToPAlphaAlpha,
        forward: &[
            [27.6987, 0.0, -12.428, 0.0, 0.0, 0.0, -0.666667],
        ],
        reverse: &[
            [6.97069, -194.561, -12.428, 0.0, 0.0, 0.0, -2.16667],
        ],
        uncertainty: 0.5,
    },
    StandardRate {
        id: ReactionId::DLi6ToNBe7,
        forward: &[
            [28.0095, -4.77456e-12, -10.259, -2.01559e-09, 1.99542e-10, -1.65595e-11, -0.666667],
        ],
        reverse: &[
            [28.9358, -39.2438, -10.259, -2.01559e-09, 1.99542e-10, -1.65595e-11, -0.666667],
        ],
        uncertainty: 0.2,
    },
    StandardRate {
        id: ReactionId::DLi6ToPLi7,
        forward: &[
            [28.0231, 0.0, -10.135, 0.0, 0.0, 0.0, -0.666667],
        ],
        reverse: &[
            [28.9494, -58.3239, -10.135, 0.0, 0.0, 0.0, -0.666667],
        ],
        uncertainty: 0.2,
    },
    StandardRate {
        id: ReactionId::TritiumDecay,
        forward: &[
            [-20.1456, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        ],
        reverse: &[
            [-32.462, -0.21338, -0.821581, 11.1241, -0.577338, 0.0290471, -0.262705],
        ],
        uncertainty: 0.01,
    },
    StandardRate {
        id: ReactionId::Be7Capture,
        forward: &[
            [-23.8328, 0.0, 0.0, 3.02033, -0.0742132, -0.00792386, -0.650113],
        ],
        reverse: &[],
        uncertainty: 0.05,
    },
];
