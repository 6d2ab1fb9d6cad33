// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::error::CliError;
use bcp_core::ObservationSeries;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::io::Read;

const DATE_FORMATS: [&str; 3] = ["%d-%b-%y", "%b %d, %Y", "%Y-%m-%d"];

/// Parses `20-May-87`, `Apr 22, 2020` or `2020-04-22`.
pub fn parse_date(raw: &str) -> Result<NaiveDate, CliError> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .ok_or_else(|| {
            CliError::invalid_input(format!(
                "unrecognized date '{raw}'; expected DD-Mon-YY, 'Mon DD, YYYY' or YYYY-MM-DD"
            ))
        })
}

/// Inclusive date range; open on a side that is `None`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self, CliError> {
        if let (Some(start), Some(end)) = (start, end)
            && start > end
        {
            return Err(CliError::invalid_input(format!(
                "window start {start} is after window end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|start| date >= start) && self.end.is_none_or(|end| date <= end)
    }
}

/// One row of the price history.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub price: f64,
}

#[derive(Debug, Deserialize)]
struct RawPriceRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Price")]
    price: String,
}

/// Reads a `Date,Price` CSV, sorted by date.
///
/// Rejects unparseable dates, non-positive or non-finite prices and
/// duplicate dates.
pub fn read_prices<R: Read>(reader: R) -> Result<Vec<PriceRecord>, CliError> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for (idx, row) in csv.deserialize::<RawPriceRow>().enumerate() {
        let line = idx + 2;
        let row = row.map_err(|source| CliError::csv(format!("price row {line}"), source))?;
        let date = parse_date(&row.date)?;
        let price: f64 = row.price.replace(',', "").parse().map_err(|_| {
            CliError::invalid_input(format!("price row {line}: invalid price '{}'", row.price))
        })?;
        if !price.is_finite() || price <= 0.0 {
            return Err(CliError::invalid_input(format!(
                "price row {line}: price must be finite and > 0; got {price}"
            )));
        }
        records.push(PriceRecord { date, price });
    }

    records.sort_by_key(|record| record.date);
    if let Some(pair) = records.windows(2).find(|pair| pair[0].date == pair[1].date) {
        return Err(CliError::invalid_input(format!(
            "duplicate price date {}",
            pair[0].date
        )));
    }
    Ok(records)
}

/// Log returns of a price history, each aligned with the price it ends on.
#[derive(Clone, Debug, PartialEq)]
pub struct ReturnSeries {
    pub dates: Vec<NaiveDate>,
    pub returns: Vec<f64>,
    /// Price on each return date; the level behind each return.
    pub levels: Vec<f64>,
}

impl ReturnSeries {
    /// `ln(p_t / p_{t-1})` for consecutive prices.
    pub fn from_prices(prices: &[PriceRecord]) -> Self {
        let mut series = Self {
            dates: Vec::with_capacity(prices.len().saturating_sub(1)),
            returns: Vec::with_capacity(prices.len().saturating_sub(1)),
            levels: Vec::with_capacity(prices.len().saturating_sub(1)),
        };
        for pair in prices.windows(2) {
            series.dates.push(pair[1].date);
            series.returns.push((pair[1].price / pair[0].price).ln());
            series.levels.push(pair[1].price);
        }
        series
    }

    pub fn len(&self) -> usize {
        self.returns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }

    /// Observation series keyed by Unix nanoseconds at midnight UTC.
    pub fn to_observations(&self) -> Result<ObservationSeries, CliError> {
        let timestamps = self
            .dates
            .iter()
            .map(|date| {
                date.and_time(NaiveTime::MIN)
                    .and_utc()
                    .timestamp_nanos_opt()
                    .ok_or_else(|| {
                        CliError::invalid_input(format!(
                            "date {date} is outside the nanosecond range"
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ObservationSeries::new(timestamps, self.returns.clone())?)
    }
}
