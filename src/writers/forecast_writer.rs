use crate::error::{ProcessingError, Result};
use crate::processors::{StationDailyRisk, StationForecast};
use chrono::NaiveDate;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastFormat {
    Csv,
    Json,
}

impl ForecastFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .as_deref()
        {
            Some("csv") => Ok(ForecastFormat::Csv),
            Some("json") => Ok(ForecastFormat::Json),
            _ => Err(ProcessingError::Config(format!(
                "Unsupported forecast output '{}': use .csv or .json",
                path.display()
            ))),
        }
    }
}

/// Flat row: one per projected day, or a single row carrying the reason a
/// station has no projection
#[derive(Debug, Serialize)]
struct ForecastRow<'a> {
    station_id: &'a str,
    site_name: &'a str,
    county: &'a str,
    history_len: usize,
    day_offset: Option<u32>,
    target_date: Option<NaiveDate>,
    predicted_hsri: Option<f64>,
    risk_tier: Option<&'static str>,
    unavailable_reason: Option<String>,
}

#[derive(Debug, Serialize)]
struct ForecastDay {
    day_offset: u32,
    target_date: NaiveDate,
    predicted_hsri: f64,
    risk_tier: &'static str,
}

#[derive(Debug, Serialize)]
struct StationForecastDocument<'a> {
    station_id: &'a str,
    site_name: &'a str,
    county: &'a str,
    latitude: f64,
    longitude: f64,
    history_len: usize,
    latest_observation: String,
    forecast: Vec<ForecastDay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unavailable_reason: Option<String>,
}

/// Recorded daily mean for one station
#[derive(Debug, Serialize)]
struct DailyRiskRow<'a> {
    station_id: &'a str,
    site_name: &'a str,
    county: &'a str,
    date: NaiveDate,
    observations: usize,
    mean_hsri: f64,
    risk_tier: &'static str,
}

impl<'a> From<&'a StationDailyRisk> for DailyRiskRow<'a> {
    fn from(daily: &'a StationDailyRisk) -> Self {
        Self {
            station_id: &daily.station.station_id,
            site_name: &daily.station.site_name,
            county: &daily.station.county,
            date: daily.date,
            observations: daily.observations,
            mean_hsri: daily.mean_hsri,
            risk_tier: daily.risk_tier.name(),
        }
    }
}

pub struct ForecastWriter;

impl ForecastWriter {
    /// Write forecasts as CSV or JSON depending on the file extension
    pub fn write(forecasts: &[StationForecast], path: &Path) -> Result<()> {
        let format = ForecastFormat::from_path(path)?;
        let file = BufWriter::new(File::create(path)?);

        match format {
            ForecastFormat::Csv => Self::write_csv(forecasts, file)?,
            ForecastFormat::Json => Self::write_json(forecasts, file)?,
        }

        debug!(stations = forecasts.len(), path = %path.display(), "Wrote forecasts");
        Ok(())
    }

    /// Write recorded daily means, CSV or JSON by extension
    pub fn write_daily(daily: &[StationDailyRisk], path: &Path) -> Result<()> {
        let format = ForecastFormat::from_path(path)?;
        let mut file = BufWriter::new(File::create(path)?);
        let rows: Vec<DailyRiskRow> = daily.iter().map(DailyRiskRow::from).collect();

        match format {
            ForecastFormat::Csv => {
                let mut writer = csv::Writer::from_writer(file);
                for row in &rows {
                    writer.serialize(row)?;
                }
                writer.flush()?;
            }
            ForecastFormat::Json => {
                serde_json::to_writer_pretty(&mut file, &rows)?;
                file.flush()?;
            }
        }

        debug!(stations = daily.len(), path = %path.display(), "Wrote daily risk");
        Ok(())
    }

    pub fn write_csv<W: Write>(forecasts: &[StationForecast], sink: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(sink);

        for forecast in forecasts {
            let station = &forecast.station;
            let base = || ForecastRow {
                station_id: &station.station_id,
                site_name: &station.site_name,
                county: &station.county,
                history_len: forecast.history_len,
                day_offset: None,
                target_date: None,
                predicted_hsri: None,
                risk_tier: None,
                unavailable_reason: None,
            };

            match &forecast.outcome {
                Ok(series) => {
                    for point in series.iter() {
                        writer.serialize(ForecastRow {
                            day_offset: Some(point.day_offset),
                            target_date: Some(forecast.target_date(point.day_offset)),
                            predicted_hsri: Some(point.predicted_hsri),
                            risk_tier: Some(point.risk_tier().name()),
                            ..base()
                        })?;
                    }
                }
                Err(reason) => writer.serialize(ForecastRow {
                    unavailable_reason: Some(reason.to_string()),
                    ..base()
                })?,
            }
        }

        writer.flush()?;
        Ok(())
    }

    pub fn write_json<W: Write>(forecasts: &[StationForecast], mut sink: W) -> Result<()> {
        let documents: Vec<StationForecastDocument> = forecasts
            .iter()
            .map(|forecast| {
                let forecast_days = forecast
                    .series()
                    .map(|series| {
                        series
                            .iter()
                            .map(|point| ForecastDay {
                                day_offset: point.day_offset,
                                target_date: forecast.target_date(point.day_offset),
                                predicted_hsri: point.predicted_hsri,
                                risk_tier: point.risk_tier().name(),
                            })
                            .collect()
                    })
                    .unwrap_or_default();

                StationForecastDocument {
                    station_id: &forecast.station.station_id,
                    site_name: &forecast.station.site_name,
                    county: &forecast.station.county,
                    latitude: forecast.station.latitude,
                    longitude: forecast.station.longitude,
                    history_len: forecast.history_len,
                    latest_observation: forecast.latest_timestamp.to_rfc3339(),
                    forecast: forecast_days,
                    unavailable_reason: forecast.outcome.as_ref().err().map(|r| r.to_string()),
                }
            })
            .collect();

        serde_json::to_writer_pretty(&mut sink, &documents)?;
        sink.flush()?;
        Ok(())
    }
}
