// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use bcp_core::{ObservationSeries, Parameter, ReproMode};
use bcp_model::{
    ChangePointModel, ParameterState, PosteriorModel, PriorConfig, TauProposal, propose_continuous,
    propose_tau, reflect_index,
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

fn series_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-50.0f64..50.0, 2..64)
}

fn build_model(values: &[f64]) -> ChangePointModel {
    let series = ObservationSeries::from_values(values.to_vec()).expect("strategy values are valid");
    ChangePointModel::new(&series, PriorConfig::default(), ReproMode::Balanced)
        .expect("default prior is valid")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn log_density_is_finite_for_valid_states(
        values in series_strategy(),
        tau_seed in any::<usize>(),
        mu1 in -5.0f64..5.0,
        mu2 in -5.0f64..5.0,
        sigma in 1e-3f64..10.0,
    ) {
        let model = build_model(&values);
        let state = ParameterState { tau: tau_seed % values.len(), mu1, mu2, sigma };
        prop_assert!(model.log_density(&state).is_finite());
    }

    #[test]
    fn log_density_is_negative_infinity_for_non_positive_sigma(
        values in series_strategy(),
        sigma in -10.0f64..=0.0,
    ) {
        let model = build_model(&values);
        let state = ParameterState { tau: 0, mu1: 0.0, mu2: 0.0, sigma };
        prop_assert_eq!(model.log_density(&state), f64::NEG_INFINITY);
    }

    #[test]
    fn tau_proposals_stay_in_range(
        n in 2usize..500,
        start_seed in any::<usize>(),
        step in 1usize..1_000,
        resample_prob in 0.0f64..=1.0,
        seed in any::<u64>(),
    ) {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let config = TauProposal { step, resample_prob };
        let mut state = ParameterState { tau: start_seed % n, mu1: 0.0, mu2: 0.0, sigma: 1.0 };
        for _ in 0..32 {
            let proposal = propose_tau(&state, n, &config, &mut rng);
            prop_assert!(proposal.candidate.tau < n);
            state = proposal.candidate;
        }
    }

    #[test]
    fn reflected_walk_has_symmetric_transition_counts(
        n in 2usize..40,
        step in 1usize..12,
        i_seed in any::<usize>(),
        j_seed in any::<usize>(),
    ) {
        let i = i_seed % n;
        let j = j_seed % n;
        let step = step as i64;
        let steps_between = |from: usize, to: usize| {
            (-step..=step)
                .filter(|&delta| delta != 0 && reflect_index(from as i64 + delta, n) == to)
                .count()
        };
        prop_assert_eq!(steps_between(i, j), steps_between(j, i));
    }

    #[test]
    fn valid_continuous_proposals_keep_state_valid(
        sigma in 1e-4f64..5.0,
        scale in 1e-4f64..5.0,
        seed in any::<u64>(),
    ) {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let state = ParameterState { tau: 0, mu1: 0.0, mu2: 0.0, sigma };
        for parameter in Parameter::CONTINUOUS {
            if let Some(proposal) = propose_continuous(&state, parameter, scale, &mut rng) {
                prop_assert!(proposal.candidate.is_valid(1));
            }
        }
    }
}
