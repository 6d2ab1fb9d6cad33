// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use std::fmt;

/// Named model parameters.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Parameter {
    /// Discrete break index.
    Tau,
    /// Mean before the break.
    Mu1,
    /// Mean at and after the break.
    Mu2,
    /// Shared standard deviation.
    Sigma,
}

impl Parameter {
    /// Update order of one Metropolis-within-Gibbs sweep.
    pub const ALL: [Parameter; 4] = [Self::Tau, Self::Mu1, Self::Mu2, Self::Sigma];
    pub const CONTINUOUS: [Parameter; 3] = [Self::Mu1, Self::Mu2, Self::Sigma];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Tau => "tau",
            Self::Mu1 => "mu1",
            Self::Mu2 => "mu2",
            Self::Sigma => "sigma",
        }
    }

    pub const fn is_continuous(self) -> bool {
        !matches!(self, Self::Tau)
    }

    /// Dense index into per-parameter arrays, following [`Parameter::ALL`].
    pub const fn index(self) -> usize {
        match self {
            Self::Tau => 0,
            Self::Mu1 => 1,
            Self::Mu2 => 2,
            Self::Sigma => 3,
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
