// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::error::CliError;
use crate::prices::{DateWindow, parse_date};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// A dated real-world event that may explain a change point.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EventRecord {
    pub date: NaiveDate,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Deserialize)]
struct RawEventRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Description")]
    description: String,
    #[serde(rename = "Type", default)]
    kind: String,
}

/// Reads a `Date,Description,Type` CSV, keeping events inside `window`.
pub fn read_events<R: Read>(reader: R, window: &DateWindow) -> Result<Vec<EventRecord>, CliError> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut events = Vec::new();
    for (idx, row) in csv.deserialize::<RawEventRow>().enumerate() {
        let row = row.map_err(|source| CliError::csv(format!("event row {}", idx + 2), source))?;
        let date = parse_date(&row.date)?;
        if window.contains(date) {
            events.push(EventRecord {
                date,
                description: row.description,
                kind: row.kind,
            });
        }
    }
    events.sort_by_key(|event| event.date);
    Ok(events)
}

/// Event closest in time to `date`; ties go to the earlier event.
pub fn nearest_event(events: &[EventRecord], date: NaiveDate) -> Option<&EventRecord> {
    events
        .iter()
        .min_by_key(|event| ((event.date - date).num_days().abs(), event.date))
}
