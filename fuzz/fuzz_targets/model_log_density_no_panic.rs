// SPDX-License-Identifier: MIT OR Apache-2.0

#![no_main]

use bcp_core::{ObservationSeries, Parameter, ReproMode};
use bcp_model::{
    ChangePointModel, ParameterState, PosteriorModel, PriorConfig, TauProposal, propose_continuous,
    propose_tau,
};
use libfuzzer_sys::fuzz_target;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn next_u8(&mut self) -> u8 {
        let byte = self.data.get(self.pos).copied().unwrap_or(0);
        self.pos = self.pos.saturating_add(1);
        byte
    }

    fn next_u64(&mut self) -> u64 {
        let mut bytes = [0_u8; 8];
        for byte in &mut bytes {
            *byte = self.next_u8();
        }
        u64::from_le_bytes(bytes)
    }

    fn next_f64(&mut self) -> f64 {
        f64::from_bits(self.next_u64())
    }
}

fn bounded(seed: u8, lo: usize, hi: usize) -> usize {
    lo + usize::from(seed) % (hi - lo + 1)
}

fn mapped_scale(seed: u8) -> f64 {
    match seed % 4 {
        0 => 0.0,
        1 => -1.0,
        2 => f64::NAN,
        _ => 1e-3 + f64::from(seed) / 16.0,
    }
}

fuzz_target!(|data: &[u8]| {
    let mut cursor = ByteCursor::new(data);

    let n = bounded(cursor.next_u8(), 0, 64);
    let values: Vec<f64> = (0..n).map(|_| cursor.next_f64()).collect();
    let Ok(series) = ObservationSeries::from_values(values) else {
        return;
    };

    let prior = PriorConfig {
        mu_scale: mapped_scale(cursor.next_u8()),
        sigma_scale: mapped_scale(cursor.next_u8()),
    };
    let mode = match cursor.next_u8() % 3 {
        0 => ReproMode::Strict,
        1 => ReproMode::Balanced,
        _ => ReproMode::Fast,
    };
    let Ok(model) = ChangePointModel::new(&series, prior, mode) else {
        return;
    };

    let state = ParameterState {
        tau: usize::from(cursor.next_u8()),
        mu1: cursor.next_f64(),
        mu2: cursor.next_f64(),
        sigma: cursor.next_f64(),
    };
    let density = model.log_density(&state);
    if state.tau >= model.n() || !(state.sigma > 0.0) {
        assert_eq!(density, f64::NEG_INFINITY);
    }

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(cursor.next_u64());
    let tau_config = TauProposal {
        step: bounded(cursor.next_u8(), 1, 8),
        resample_prob: f64::from(cursor.next_u8()) / 255.0,
    };
    let valid = ParameterState {
        tau: state.tau % model.n(),
        ..state
    };
    for _ in 0..bounded(cursor.next_u8(), 1, 32) {
        let proposal = propose_tau(&valid, model.n(), &tau_config, &mut rng);
        assert!(proposal.candidate.tau < model.n());
        let _ = model.log_density(&proposal.candidate);

        let parameter = Parameter::CONTINUOUS[usize::from(cursor.next_u8()) % 3];
        if let Some(proposal) = propose_continuous(&valid, parameter, 1.0, &mut rng) {
            if parameter == Parameter::Sigma {
                assert!(proposal.candidate.sigma > 0.0);
            }
            let _ = model.log_density(&proposal.candidate);
        }
    }
});
