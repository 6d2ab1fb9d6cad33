// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// Prefix sums with a leading zero: `out[i] = values[0] + ... + values[i-1]`.
pub fn prefix_sums(values: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len() + 1);
    let mut acc = 0.0;
    out.push(acc);
    for &value in values {
        acc += value;
        out.push(acc);
    }
    out
}

/// Prefix sums of squares with a leading zero.
pub fn prefix_sum_squares(values: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len() + 1);
    let mut acc = 0.0;
    out.push(acc);
    for &value in values {
        acc += value * value;
        out.push(acc);
    }
    out
}

/// Kahan-compensated variant of [`prefix_sums`].
pub fn prefix_sums_kahan(values: &[f64]) -> Vec<f64> {
    kahan_prefix(values.iter().copied())
}

/// Kahan-compensated variant of [`prefix_sum_squares`].
pub fn prefix_sum_squares_kahan(values: &[f64]) -> Vec<f64> {
    kahan_prefix(values.iter().map(|value| value * value))
}

fn kahan_prefix(terms: impl ExactSizeIterator<Item = f64>) -> Vec<f64> {
    let mut out = Vec::with_capacity(terms.len() + 1);
    let mut sum = 0.0;
    let mut compensation = 0.0;
    out.push(sum);
    for term in terms {
        let y = term - compensation;
        let t = sum + y;
        compensation = (t - sum) - y;
        sum = t;
        out.push(sum);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{prefix_sum_squares, prefix_sum_squares_kahan, prefix_sums, prefix_sums_kahan};

    #[test]
    fn prefix_sums_have_leading_zero_and_running_totals() {
        let values = [1.0, 2.0, 3.0, -1.0];
        assert_eq!(prefix_sums(&values), vec![0.0, 1.0, 3.0, 6.0, 5.0]);
        assert_eq!(prefix_sum_squares(&values), vec![0.0, 1.0, 5.0, 14.0, 15.0]);
        assert_eq!(prefix_sums(&[]), vec![0.0]);
    }

    #[test]
    fn kahan_matches_naive_on_exact_values() {
        let values = [0.5, 0.25, -0.75, 2.0];
        assert_eq!(prefix_sums_kahan(&values), prefix_sums(&values));
        assert_eq!(prefix_sum_squares_kahan(&values), prefix_sum_squares(&values));
    }

    #[test]
    fn kahan_reduces_drift_on_many_small_terms() {
        let values = vec![0.1; 100_000];
        let naive = *prefix_sums(&values).last().expect("non-empty");
        let compensated = *prefix_sums_kahan(&values).last().expect("non-empty");
        let exact = 10_000.0;
        assert!((compensated - exact).abs() <= (naive - exact).abs());
        assert!((compensated - exact).abs() < 1e-9);
    }
}
