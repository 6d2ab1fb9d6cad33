// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::BcpError;

/// Ordered `(timestamp, value)` observations, validated at construction.
///
/// Timestamps are strictly increasing `i64` values (Unix nanoseconds when the
/// series comes from dated data, plain indices otherwise).
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ObservationSeries {
    timestamps: Vec<i64>,
    values: Vec<f64>,
}

impl ObservationSeries {
    pub fn new(timestamps: Vec<i64>, values: Vec<f64>) -> Result<Self, BcpError> {
        if timestamps.len() != values.len() {
            return Err(BcpError::data(format!(
                "timestamp/value length mismatch: timestamps={}, values={}",
                timestamps.len(),
                values.len()
            )));
        }

        let n = values.len();
        if n < 2 {
            return Err(BcpError::data(format!(
                "observation series length must be >= 2; got {n}"
            )));
        }

        if let Some(idx) = timestamps.windows(2).position(|pair| pair[0] >= pair[1]) {
            return Err(BcpError::data(format!(
                "timestamps must be strictly increasing: index {} has {} after {}",
                idx + 1,
                timestamps[idx + 1],
                timestamps[idx]
            )));
        }

        if let Some((idx, value)) = values
            .iter()
            .copied()
            .enumerate()
            .find(|(_, value)| !value.is_finite())
        {
            return Err(BcpError::data(format!(
                "observation values must be finite: index {idx} has {value}"
            )));
        }

        Ok(Self { timestamps, values })
    }

    /// Builds a series with implicit timestamps `0..n`.
    pub fn from_values(values: Vec<f64>) -> Result<Self, BcpError> {
        let n = i64::try_from(values.len()).map_err(|_| {
            BcpError::resource_limit(format!(
                "series length {} does not fit into i64",
                values.len()
            ))
        })?;
        Self::new((0..n).collect(), values)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false; kept for API symmetry with slices.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    pub fn timestamp_at(&self, idx: usize) -> Result<i64, BcpError> {
        self.timestamps.get(idx).copied().ok_or_else(|| {
            BcpError::data(format!(
                "index {idx} out of bounds for series of length {}",
                self.len()
            ))
        })
    }

    /// Sample mean of the values.
    pub fn mean(&self) -> f64 {
        self.values.iter().sum::<f64>() / self.len() as f64
    }

    /// Sample standard deviation (n - 1 denominator).
    pub fn std_dev(&self) -> f64 {
        let mean = self.mean();
        let ss = self
            .values
            .iter()
            .map(|&value| (value - mean) * (value - mean))
            .sum::<f64>();
        (ss / (self.len() - 1) as f64).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::ObservationSeries;

    #[test]
    fn valid_series_exposes_values_and_timestamps() {
        let series = ObservationSeries::new(vec![10, 20, 30], vec![1.0, 2.0, 3.0])
            .expect("valid series should build");
        assert_eq!(series.len(), 3);
        assert!(!series.is_empty());
        assert_eq!(series.values(), &[1.0, 2.0, 3.0]);
        assert_eq!(series.timestamp_at(2).expect("in range"), 30);
        assert_eq!(series.mean(), 2.0);
        assert_eq!(series.std_dev(), 1.0);
    }

    #[test]
    fn from_values_uses_implicit_index() {
        let series = ObservationSeries::from_values(vec![0.0, 1.0, 0.5])
            .expect("implicit index series should build");
        assert_eq!(series.timestamps(), &[0, 1, 2]);
    }

    #[test]
    fn rejects_fewer_than_two_points() {
        let err = ObservationSeries::from_values(vec![1.0]).expect_err("n=1 must fail");
        assert_eq!(err.code(), "data_error");
        assert!(err.to_string().contains("length must be >= 2; got 1"));

        let err = ObservationSeries::from_values(vec![]).expect_err("n=0 must fail");
        assert!(err.to_string().contains("got 0"));
    }

    #[test]
    fn rejects_non_monotonic_timestamps() {
        let err = ObservationSeries::new(vec![1, 3, 3], vec![0.0, 0.0, 0.0])
            .expect_err("duplicate timestamp must fail");
        assert!(err.to_string().contains("strictly increasing: index 2"));

        let err = ObservationSeries::new(vec![5, 4], vec![0.0, 0.0])
            .expect_err("decreasing timestamp must fail");
        assert!(err.to_string().contains("strictly increasing"));
    }

    #[test]
    fn rejects_length_mismatch_and_non_finite_values() {
        let err = ObservationSeries::new(vec![1, 2], vec![0.0, 1.0, 2.0])
            .expect_err("mismatch must fail");
        assert!(err.to_string().contains("length mismatch"));

        let err = ObservationSeries::from_values(vec![0.0, f64::NAN])
            .expect_err("NaN must fail");
        assert!(err.to_string().contains("index 1 has NaN"));
    }

    #[test]
    fn timestamp_at_out_of_bounds_is_data_error() {
        let series = ObservationSeries::from_values(vec![0.0, 1.0]).expect("valid");
        let err = series.timestamp_at(2).expect_err("out of bounds must fail");
        assert_eq!(err.code(), "data_error");
    }
}
