// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use bcp_core::{BcpError, ObservationSeries};

fn lcg_next(state: &mut u64) -> u64 {
    *state = state
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    *state
}

/// Mean shift from `before` to `after` at `break_at`, with uniform noise of
/// half-width `noise`.
pub fn step_values(n: usize, break_at: usize, before: f64, after: f64, noise: f64) -> Vec<f64> {
    let mut state = 0xfeed_f00d_dead_beef_u64;
    (0..n)
        .map(|idx| {
            let unit = (lcg_next(&mut state) >> 11) as f64 / (1_u64 << 53) as f64;
            let level = if idx < break_at { before } else { after };
            level + noise * (2.0 * unit - 1.0)
        })
        .collect()
}

/// [`step_values`] wrapped as a series with implicit timestamps.
pub fn step_series(n: usize, break_at: usize) -> Result<ObservationSeries, BcpError> {
    ObservationSeries::from_values(step_values(n, break_at, -0.01, 0.02, 0.01))
}

#[cfg(test)]
mod tests {
    use super::{step_series, step_values};

    #[test]
    fn step_values_are_deterministic_and_shifted() {
        let a = step_values(200, 100, 0.0, 1.0, 0.1);
        assert_eq!(a, step_values(200, 100, 0.0, 1.0, 0.1));
        assert!(a[..100].iter().all(|x| x.abs() <= 0.1));
        assert!(a[100..].iter().all(|x| (x - 1.0).abs() <= 0.1));
        assert_eq!(step_series(50, 25).expect("series should build").len(), 50);
        assert!(step_series(1, 0).is_err());
    }
}
