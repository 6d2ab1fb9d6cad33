// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod model;
pub mod prior;
pub mod proposal;
pub mod state;

pub use model::{ChangePointModel, DensityTerms, ModelCache, PosteriorModel};
pub use prior::{PriorConfig, half_normal_log_pdf, normal_log_pdf, tau_log_prior};
pub use proposal::{
    Proposal, ProposalScales, TauProposal, propose_continuous, propose_tau, reflect_index,
};
pub use state::ParameterState;

/// Change-point model namespace.
pub fn crate_name() -> &'static str {
    let _ = bcp_core::crate_name();
    "bcp-model"
}
