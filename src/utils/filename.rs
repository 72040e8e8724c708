use chrono::{Datelike, Local};
use std::path::PathBuf;

fn dated_output_path(stem: &str, extension: &str) -> PathBuf {
    let now = Local::now();
    let year = now.year() % 100; // Get last 2 digits of year

    let filename = format!(
        "{}-{:02}{:02}{:02}.{}",
        stem,
        year,
        now.month(),
        now.day(),
        extension
    );
    PathBuf::from("output").join(filename)
}

/// Default scored-observation output: hsri-scores-{YYMMDD}.parquet
pub fn generate_default_parquet_filename() -> PathBuf {
    dated_output_path("hsri-scores", "parquet")
}

/// Default forecast output: hsri-forecast-{YYMMDD}.csv
pub fn generate_default_forecast_filename() -> PathBuf {
    dated_output_path("hsri-forecast", "csv")
}
