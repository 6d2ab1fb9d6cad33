// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// Reproducibility mode used to control determinism/performance trade-offs.
///
/// `Strict` runs chains one after another and uses compensated prefix sums.
/// The other modes may run chains on a thread pool; per-chain draws do not
/// depend on scheduling in any mode.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReproMode {
    Strict,
    #[default]
    Balanced,
    Fast,
}
