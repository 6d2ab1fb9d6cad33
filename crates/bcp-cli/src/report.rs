// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::error::CliError;
use crate::events::EventRecord;
use crate::prices::DateWindow;
use bcp_posterior::ChangePointResult;
use bcp_sampler::SamplerConfig;
use chrono::NaiveDate;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

/// What was read from disk and modelled.
#[derive(Clone, Debug, Serialize)]
pub struct InputSummary {
    pub prices_path: String,
    pub events_path: Option<String>,
    pub window: DateWindow,
    pub price_rows: usize,
    pub returns: usize,
    pub events: usize,
}

/// JSON document written by `bcp detect`.
#[derive(Clone, Debug, Serialize)]
pub struct DetectionReport {
    pub command: &'static str,
    pub input: InputSummary,
    pub config: SamplerConfig,
    pub change_point_date: NaiveDate,
    pub closest_event: Option<EventRecord>,
    pub result: ChangePointResult,
}

/// The single-row CSV summary.
#[derive(Debug, Serialize)]
pub struct ResultRow {
    #[serde(rename = "Change_Point_Date")]
    pub change_point_date: NaiveDate,
    #[serde(rename = "Mean_Before")]
    pub mean_before: f64,
    #[serde(rename = "Mean_After")]
    pub mean_after: f64,
    #[serde(rename = "Price_Before")]
    pub price_before: f64,
    #[serde(rename = "Price_After")]
    pub price_after: f64,
    #[serde(rename = "Price_Change_Percent")]
    pub price_change_percent: f64,
    #[serde(rename = "Closest_Event_Date")]
    pub closest_event_date: Option<NaiveDate>,
    #[serde(rename = "Closest_Event_Description")]
    pub closest_event_description: Option<String>,
    #[serde(rename = "Closest_Event_Type")]
    pub closest_event_type: Option<String>,
}

impl ResultRow {
    /// Posterior means of the modelled returns next to the price-level means.
    pub fn from_report(report: &DetectionReport) -> Self {
        let event = report.closest_event.as_ref();
        Self {
            change_point_date: report.change_point_date,
            mean_before: report.result.mu1.mean,
            mean_after: report.result.mu2.mean,
            price_before: report.result.before_mean,
            price_after: report.result.after_mean,
            price_change_percent: report.result.percent_change,
            closest_event_date: event.map(|event| event.date),
            closest_event_description: event.map(|event| event.description.clone()),
            closest_event_type: event.map(|event| event.kind.clone()),
        }
    }
}

/// Pretty JSON to `output_path`, or stdout when absent.
pub fn write_json_output<T: Serialize>(
    payload: &T,
    output_path: Option<&Path>,
) -> Result<(), CliError> {
    let encoded = serde_json::to_string_pretty(payload)
        .map_err(|source| CliError::json("failed to serialize JSON output", source))?;

    if let Some(path) = output_path {
        fs::write(path, format!("{encoded}\n"))
            .map_err(|source| CliError::io(format!("failed to write '{}'", path.display()), source))
    } else {
        println!("{encoded}");
        Ok(())
    }
}

/// Header plus one row.
pub fn write_csv_row<W: Write>(writer: W, row: &ResultRow) -> Result<(), CliError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.serialize(row)
        .map_err(|source| CliError::csv("failed to write result row", source))?;
    csv.flush()
        .map_err(|source| CliError::io("failed to flush result row", source))
}

pub fn write_csv_output(row: &ResultRow, path: &Path) -> Result<(), CliError> {
    let file = fs::File::create(path)
        .map_err(|source| CliError::io(format!("failed to create '{}'", path.display()), source))?;
    write_csv_row(file, row)
}

#[cfg(test)]
mod tests {
    use super::{ResultRow, write_csv_row};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    #[test]
    fn csv_row_uses_report_column_names() {
        let row = ResultRow {
            change_point_date: date(2014, 11, 28),
            mean_before: 0.001,
            mean_after: -0.004,
            price_before: 105.5,
            price_after: 52.25,
            price_change_percent: -50.5,
            closest_event_date: Some(date(2014, 11, 27)),
            closest_event_description: Some("OPEC keeps output unchanged".to_string()),
            closest_event_type: Some("Policy".to_string()),
        };
        let mut buffer = Vec::new();
        write_csv_row(&mut buffer, &row).expect("row should serialize");
        let text = String::from_utf8(buffer).expect("csv output is utf-8");
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some(
                "Change_Point_Date,Mean_Before,Mean_After,Price_Before,Price_After,\
                 Price_Change_Percent,Closest_Event_Date,Closest_Event_Description,\
                 Closest_Event_Type"
            )
        );
        assert_eq!(
            lines.next(),
            Some("2014-11-28,0.001,-0.004,105.5,52.25,-50.5,2014-11-27,OPEC keeps output unchanged,Policy")
        );
    }

    #[test]
    fn missing_event_leaves_columns_empty() {
        let row = ResultRow {
            change_point_date: date(2020, 3, 9),
            mean_before: 0.0,
            mean_after: 0.0,
            price_before: 1.0,
            price_after: 2.0,
            price_change_percent: 100.0,
            closest_event_date: None,
            closest_event_description: None,
            closest_event_type: None,
        };
        let mut buffer = Vec::new();
        write_csv_row(&mut buffer, &row).expect("row should serialize");
        let text = String::from_utf8(buffer).expect("csv output is utf-8");
        assert!(text.ends_with("2020-03-09,0.0,0.0,1.0,2.0,100.0,,,\n"), "{text}");
    }
}
