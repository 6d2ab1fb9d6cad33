// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod chain;
pub mod config;
pub mod init;
pub mod orchestrator;
pub mod seeds;

pub use chain::{
    AcceptanceCounter, AcceptanceStats, Chain, ChainDraws, ChainPhase, ChainSampler, ChainSettings,
};
pub use config::{ConvergencePolicy, SamplerConfig};
pub use init::{initial_scales, initial_state};
pub use orchestrator::{ChainSet, Orchestrator};
pub use seeds::{chain_seed, init_seed};

/// Sampler namespace.
pub fn crate_name() -> &'static str {
    let _ = (bcp_core::crate_name(), bcp_model::crate_name());
    "bcp-sampler"
}
