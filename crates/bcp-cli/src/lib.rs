// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod cli;
pub mod error;
pub mod events;
pub mod prices;
pub mod report;

pub use cli::{Cli, Command, DetectArgs, detect, resolve_config, run};
pub use error::CliError;
pub use events::{EventRecord, nearest_event, read_events};
pub use prices::{DateWindow, PriceRecord, ReturnSeries, parse_date, read_prices};
pub use report::{DetectionReport, InputSummary, ResultRow, write_csv_row, write_json_output};
