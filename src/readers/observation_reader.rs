use crate::error::{ProcessingError, Result};
use crate::models::WeatherObservation;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};
use validator::Validate;

/// Raw row of the hourly weather export
#[derive(Debug, Deserialize)]
struct RawObservationRow {
    #[serde(rename = "datetime")]
    datetime: Option<String>,

    #[serde(rename = "aqs_id_full")]
    station_id: Option<String>,

    #[serde(rename = "temp")]
    temperature: Option<f64>,

    humidity: Option<f64>,

    #[serde(rename = "windspeed")]
    wind_speed: Option<f64>,

    #[serde(rename = "solarradiation", default)]
    solar_radiation: Option<f64>,

    #[serde(rename = "uvindex", default)]
    uv_index: Option<f64>,

    #[serde(rename = "cloudcover", default)]
    cloud_cover: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub missing_mandatory: usize,
    pub invalid_timestamp: usize,
    pub out_of_range: usize,
    pub malformed_rows: usize,
}

impl LoadReport {
    pub fn skipped_rows(&self) -> usize {
        self.missing_mandatory + self.invalid_timestamp + self.out_of_range + self.malformed_rows
    }

    pub fn summary(&self) -> String {
        format!(
            "Rows read: {}\n\
            Observations loaded: {}\n\
            Skipped: {} (missing temp/humidity/wind: {}, bad timestamp: {}, out of range: {}, malformed: {})",
            self.total_rows,
            self.loaded_rows,
            self.skipped_rows(),
            self.missing_mandatory,
            self.invalid_timestamp,
            self.out_of_range,
            self.malformed_rows
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct ObservationBatch {
    pub observations: Vec<WeatherObservation>,
    pub report: LoadReport,
}

/// Loads hourly observations from CSV, dropping rows that cannot be scored
pub struct ObservationReader {
    strict_validation: bool,
}

impl ObservationReader {
    pub fn new() -> Self {
        Self {
            strict_validation: false,
        }
    }

    /// Also drop rows whose values fall outside physical ranges
    pub fn with_strict_validation(mut self, strict_validation: bool) -> Self {
        self.strict_validation = strict_validation;
        self
    }

    pub fn read_observations(&self, path: &Path) -> Result<ObservationBatch> {
        info!("Reading observations from {}", path.display());
        let file = File::open(path)?;
        self.read_from(file)
    }

    pub fn read_from<R: Read>(&self, source: R) -> Result<ObservationBatch> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);

        let mut batch = ObservationBatch::default();

        for row_result in reader.deserialize::<RawObservationRow>() {
            batch.report.total_rows += 1;

            let row = match row_result {
                Ok(row) => row,
                Err(e) => {
                    // I/O failures are fatal, bad cells are not
                    if matches!(e.kind(), csv::ErrorKind::Io(_)) {
                        return Err(ProcessingError::Csv(e));
                    }
                    debug!("Skipping malformed row: {}", e);
                    batch.report.malformed_rows += 1;
                    continue;
                }
            };

            let timestamp = match row.datetime.as_deref().map(parse_timestamp) {
                Some(Ok(ts)) => ts,
                _ => {
                    batch.report.invalid_timestamp += 1;
                    continue;
                }
            };

            let observation = WeatherObservation::builder()
                .timestamp(timestamp)
                .solar_radiation_wm2(row.solar_radiation)
                .uv_index(row.uv_index)
                .cloud_cover_pct(row.cloud_cover);
            let observation = match row.station_id {
                Some(id) => observation.station_id(id),
                None => observation,
            };
            let observation = match (row.temperature, row.humidity, row.wind_speed) {
                (Some(t), Some(h), Some(w)) => observation
                    .temperature_f(t)
                    .relative_humidity_pct(h)
                    .wind_speed_mph(w)
                    .build(),
                _ => None,
            };

            let Some(observation) = observation else {
                batch.report.missing_mandatory += 1;
                continue;
            };

            if self.strict_validation && observation.validate().is_err() {
                batch.report.out_of_range += 1;
                continue;
            }

            batch.observations.push(observation);
        }

        batch.report.loaded_rows = batch.observations.len();

        if batch.report.skipped_rows() > 0 {
            warn!(
                "Skipped {} of {} rows",
                batch.report.skipped_rows(),
                batch.report.total_rows
            );
        }
        info!("Loaded {} observations", batch.report.loaded_rows);

        Ok(batch)
    }
}

impl Default for ObservationReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an RFC 3339 instant, or a naive date/time taken as UTC
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%:z") {
        return Ok(ts.with_timezone(&Utc));
    }

    for format in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")?;
    date.and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ProcessingError::InvalidFormat(format!("Invalid date: '{}'", value)))
}
