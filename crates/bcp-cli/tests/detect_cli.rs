// SPDX-License-Identifier: MIT OR Apache-2.0

use bcp_cli::{Cli, Command, DetectArgs, detect, run};
use chrono::{Days, NaiveDate};
use std::fs;
use std::path::Path;

const BREAK_AT: usize = 60;

fn day(offset: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1)
        .and_then(|start| start.checked_add_days(Days::new(offset as u64)))
        .expect("test date should be valid")
}

/// Prices whose log returns move from -1% to +2% per day at `BREAK_AT`,
/// with a small deterministic jitter.
fn write_prices(path: &Path, n_returns: usize) {
    let mut price = 100.0_f64;
    let mut csv = format!("Date,Price\n{},{price}\n", day(0));
    for i in 0..n_returns {
        let drift = if i < BREAK_AT { -0.01 } else { 0.02 };
        let jitter = 0.004 * (((i * 7919) % 13) as f64 - 6.0) / 6.0;
        price *= f64::exp(drift + jitter);
        csv.push_str(&format!("{},{price}\n", day(i + 1)));
    }
    fs::write(path, csv).expect("price csv should be written");
}

fn write_events(path: &Path) {
    let csv = format!(
        "Date,Description,Type\n{},Early shock,Economic\n{},Supply cut,Policy\n{},Late news,Political\n",
        day(5),
        day(BREAK_AT + 2),
        day(110)
    );
    fs::write(path, csv).expect("event csv should be written");
}

fn quick_args(dir: &Path) -> DetectArgs {
    let prices = dir.join("prices.csv");
    let events = dir.join("events.csv");
    write_prices(&prices, 120);
    write_events(&events);
    DetectArgs {
        prices,
        events: Some(events),
        chains: Some(2),
        draws: Some(1_000),
        tune: Some(500),
        seed: Some(42),
        ..DetectArgs::default()
    }
}

#[test]
fn detect_reports_break_date_and_closest_event() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let args = quick_args(dir.path());

    let report = detect(&args).expect("detection should succeed");
    let expected = day(BREAK_AT + 1);
    let distance = (report.change_point_date - expected).num_days().abs();
    assert!(distance <= 2, "change point {} vs {expected}", report.change_point_date);

    let event = report.closest_event.as_ref().expect("an event should match");
    assert_eq!(event.description, "Supply cut");
    assert_eq!(event.kind, "Policy");

    assert_eq!(report.input.price_rows, 121);
    assert_eq!(report.input.returns, 120);
    assert_eq!(report.input.events, 3);
    assert!(report.result.mu1.mean < 0.0);
    assert!(report.result.mu2.mean > 0.0);
    // Prices fall into the break and recover faster after it.
    assert!(report.result.percent_change > 0.0);
}

#[test]
fn window_limits_prices_and_events() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let mut args = quick_args(dir.path());
    args.start = Some(day(30));
    args.end = Some(day(100));

    let report = detect(&args).expect("detection should succeed");
    assert_eq!(report.input.price_rows, 71);
    assert_eq!(report.input.returns, 70);
    assert_eq!(report.input.events, 1);
    assert!(report.change_point_date >= day(31) && report.change_point_date <= day(100));
}

#[test]
fn run_writes_json_and_csv_outputs() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let mut args = quick_args(dir.path());
    let json_path = dir.path().join("report.json");
    let csv_path = dir.path().join("result.csv");
    args.output = Some(json_path.clone());
    args.csv_output = Some(csv_path.clone());

    let cli = Cli {
        verbose: false,
        command: Command::Detect(args),
    };
    run(&cli).expect("run should succeed");

    let json: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(&json_path).expect("json report should exist"),
    )
    .expect("json report should parse");
    assert_eq!(json["command"], "detect");
    assert_eq!(json["config"]["chains"], 2);
    assert_eq!(json["closest_event"]["type"], "Policy");
    assert!(json["result"]["percent_change"].is_number());

    let csv = fs::read_to_string(&csv_path).expect("csv result should exist");
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some(
            "Change_Point_Date,Mean_Before,Mean_After,Price_Before,Price_After,\
             Price_Change_Percent,Closest_Event_Date,Closest_Event_Description,\
             Closest_Event_Type"
        )
    );
    let row = lines.next().expect("one data row");
    assert!(row.ends_with("Supply cut,Policy"), "{row}");
    assert!(lines.next().is_none());
}

#[test]
fn missing_price_file_is_io_error() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let args = DetectArgs {
        prices: dir.path().join("absent.csv"),
        ..DetectArgs::default()
    };
    let err = detect(&args).expect_err("missing file must fail");
    assert_eq!(err.code(), "io_error");
    assert!(err.to_string().contains("absent.csv"), "{err}");
}

#[test]
fn window_with_too_few_prices_is_invalid_input() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let mut args = quick_args(dir.path());
    args.start = Some(day(10));
    args.end = Some(day(11));
    let err = detect(&args).expect_err("two prices cannot form two returns");
    assert_eq!(err.code(), "invalid_input");
}

#[test]
fn config_file_is_loaded_and_unknown_fields_rejected() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let mut args = quick_args(dir.path());
    let config_path = dir.path().join("config.json");
    fs::write(&config_path, r#"{"chains": 3, "credible_mass": 0.9}"#)
        .expect("config should be written");
    args.config = Some(config_path.clone());
    args.chains = None;
    let config = bcp_cli::resolve_config(&args).expect("config should load");
    assert_eq!(config.chains, 3);
    assert_eq!(config.credible_mass, 0.9);
    assert_eq!(config.draws, 1_000);

    fs::write(&config_path, r#"{"chainz": 3}"#).expect("config should be written");
    let err = bcp_cli::resolve_config(&args).expect_err("unknown field must fail");
    assert_eq!(err.code(), "json_error");
}
