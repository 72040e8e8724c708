use crate::analyzers::{closest_timestamp, OutlookSummary, RiskAnalyzer};
use crate::cli::args::{Cli, Commands};
use crate::config::Settings;
use crate::error::{ProcessingError, Result};
use crate::models::{RiskTier, WeatherObservation};
use crate::processors::{Outlook, StationForecast, StationProcessor};
use crate::readers::{parse_timestamp, ObservationBatch, ObservationReader};
use crate::utils::filename::generate_default_parquet_filename;
use crate::utils::progress::ProgressReporter;
use crate::writers::{ForecastWriter, ParquetWriter};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, Level};

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    let settings = Settings::load(cli.config.as_deref())?;
    debug!(?settings, "Loaded settings");

    match cli.command {
        Commands::Score {
            input_file,
            output_file,
            compression,
            station_id,
            strict,
            max_workers,
            chunk_size,
        } => {
            let output_file = output_file.unwrap_or_else(generate_default_parquet_filename);
            let compression = compression.unwrap_or_else(|| settings.compression.clone());
            let max_workers = max_workers.unwrap_or(settings.max_workers);

            println!("Scoring heat stress risk...");
            println!("Input file: {}", input_file.display());
            println!("Output file: {}", output_file.display());
            println!("Workers: {}, Chunk size: {}", max_workers, chunk_size);

            let progress = ProgressReporter::new_spinner("Loading observations...", false);
            let batch = load_observations(input_file, strict).await?;
            let observations = filter_station(batch.observations, station_id.as_deref());

            let processor = StationProcessor::new(max_workers);
            let scored = processor.score_all(observations, Some(&progress))?;
            progress.finish_with_message(&format!("Scored {} observations", scored.len()));

            println!("\n{}", batch.report.summary());

            if scored.is_empty() {
                println!("No observations to write");
                return Ok(());
            }

            let mut distribution: BTreeMap<RiskTier, usize> = BTreeMap::new();
            for s in &scored {
                *distribution.entry(s.risk_tier()).or_insert(0) += 1;
            }
            println!("\nRisk Distribution:");
            for tier in RiskTier::ALL {
                println!(
                    "  {:<9} {:>8}",
                    tier.name(),
                    distribution.get(&tier).copied().unwrap_or(0)
                );
            }

            println!("\nWriting {} records to Parquet file...", scored.len());
            let writer = ParquetWriter::new()
                .with_compression(&compression)?
                .with_registry(processor.registry().clone());

            // Create output directory if it doesn't exist
            create_parent_dir(&output_file)?;
            writer.write_scored_batched(&scored, &output_file, chunk_size)?;

            let file_info = writer.get_file_info(&output_file)?;
            println!("\n{}", file_info.summary());

            println!("Scoring complete!");
        }

        Commands::Snapshot {
            input_file,
            at,
            area,
            threshold,
        } => {
            let target = at.as_deref().map(parse_timestamp).transpose()?;
            let threshold = threshold.unwrap_or(settings.risk_threshold);

            let batch = load_observations(input_file, false).await?;
            let analyzer = RiskAnalyzer::new().with_threshold(threshold);
            let snapshot = analyzer.snapshot(&batch.observations, target, area.as_deref())?;

            println!(
                "Heat stress snapshot for {} at {}",
                snapshot.area,
                snapshot.timestamp.format("%Y-%m-%d %H:%M UTC")
            );
            println!("\n{}", snapshot.statistics.summary());

            match &snapshot.network_forecast {
                Ok(series) => {
                    println!("\n3-Day HSRI Forecast:");
                    for point in series.iter() {
                        let flag = if point.predicted_hsri >= snapshot.threshold {
                            " (above threshold)"
                        } else {
                            ""
                        };
                        println!(
                            "  {}  {:>6.1}  {}{}",
                            snapshot.forecast_time(point.day_offset).format("%Y-%m-%d"),
                            point.predicted_hsri,
                            point.risk_tier().label(),
                            flag
                        );
                    }
                }
                Err(reason) => println!("\nInsufficient data for forecasting: {}", reason),
            }

            if snapshot.high_risk.is_empty() {
                println!("\nNo sites at or above HSRI {:.0}", snapshot.threshold);
            } else {
                println!(
                    "\nHigh-risk sites (HSRI >= {:.0}):",
                    snapshot.threshold
                );
                for (i, site) in snapshot.high_risk.iter().enumerate() {
                    let obs = &site.scored.observation;
                    println!(
                        "{}. {} ({}): HSRI {:.1} {} | {:.0}°F, {:.0}% RH, wind {:.1} mph",
                        i + 1,
                        site.station.site_name,
                        site.station.county,
                        site.scored.hsri(),
                        site.scored.risk_tier().label(),
                        obs.temperature_f,
                        obs.relative_humidity_pct,
                        obs.wind_speed_mph
                    );
                }
            }

            let areas = analyzer.available_areas(&batch.observations, snapshot.timestamp);
            println!("\nAreas with data: {}", areas.join(", "));
        }

        Commands::Forecast {
            input_file,
            horizon_days,
            station_id,
            output_file,
            day,
            at,
            max_workers,
        } => {
            let horizon_days = horizon_days.unwrap_or(settings.forecast.horizon_days);
            let max_workers = max_workers.unwrap_or(settings.max_workers);

            let batch = load_observations(input_file, false).await?;
            let observations = filter_station(batch.observations, station_id.as_deref());
            if observations.is_empty() {
                return Err(match station_id {
                    Some(station_id) => ProcessingError::StationNotFound { station_id },
                    None => ProcessingError::MissingData("No observations loaded".to_string()),
                });
            }

            let processor = StationProcessor::new(max_workers)
                .with_history_window(settings.forecast.history_window);
            let progress = ProgressReporter::new(
                StationProcessor::group_by_station(&observations).len() as u64,
                "Forecasting...",
                false,
            );

            let (forecasts, outlook_summary) = match day {
                Some(day) => {
                    let base_time = outlook_base_time(&observations, at.as_deref())?;
                    let target_date = (base_time + Duration::days(day as i64)).date_naive();
                    let outlook =
                        processor.daily_outlook(&observations, base_time, day, Some(&progress))?;
                    let summary = OutlookSummary::from_outlook(
                        &outlook,
                        target_date,
                        day,
                        settings.risk_threshold,
                    );

                    match outlook {
                        Outlook::Observed(daily) => {
                            progress.finish_with_message("Using recorded observations");
                            println!(
                                "\nRecorded risk on {} (day +{} from {}):",
                                target_date,
                                day,
                                base_time.format("%Y-%m-%d %H:%M UTC")
                            );
                            for d in &daily {
                                println!(
                                    "  {:<28} mean HSRI {:>6.1}  {:<13} ({} readings)",
                                    d.station.site_name,
                                    d.mean_hsri,
                                    d.risk_tier.label(),
                                    d.observations
                                );
                            }
                            println!("\n{}", summary.summary());

                            if let Some(output_file) = output_file {
                                create_parent_dir(&output_file)?;
                                ForecastWriter::write_daily(&daily, &output_file)?;
                                println!("\nDaily risk written to {}", output_file.display());
                            }
                            return Ok(());
                        }
                        Outlook::Projected(forecasts) => (forecasts, Some((day, summary))),
                    }
                }
                None => (
                    processor.forecast_stations(&observations, horizon_days, Some(&progress))?,
                    None,
                ),
            };
            progress.finish_with_message(&format!("Forecast {} stations", forecasts.len()));

            for line in forecast_lines(
                &forecasts,
                outlook_summary.as_ref().map(|(day, _)| *day),
                processor.min_history(),
            ) {
                println!("{}", line);
            }
            if let Some((_, summary)) = &outlook_summary {
                println!("\n{}", summary.summary());
            }

            if let Some(output_file) = output_file {
                create_parent_dir(&output_file)?;
                ForecastWriter::write(&forecasts, &output_file)?;
                println!("\nForecasts written to {}", output_file.display());
            }
        }

        Commands::Info { file, sample } => {
            println!("Analyzing Parquet file: {}", file.display());

            let writer = ParquetWriter::new();
            let file_info = writer.get_file_info(&file)?;

            println!("\nFile Details:");
            println!("{}", file_info.summary());

            if sample > 0 {
                println!("\nSample Records (showing up to {} records):", sample);
                match writer.read_sample(&file, sample) {
                    Ok(records) => {
                        for (i, (station, scored)) in records.iter().enumerate() {
                            println!(
                                "{}. {} at {}: {:.1}°F, HI={:.1}, HSRI={:.1} ({})",
                                i + 1,
                                station.site_name,
                                scored.observation.timestamp.format("%Y-%m-%d %H:%M"),
                                scored.observation.temperature_f,
                                scored.result.heat_index,
                                scored.hsri(),
                                scored.risk_tier().name()
                            );
                        }
                    }
                    Err(e) => println!("Error reading sample data: {}", e),
                }
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    let installed = match log_file {
        Some(path) => {
            let file = File::create(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    // Embedding callers may already have a global subscriber
    if installed.is_err() {
        debug!("Tracing subscriber already installed");
    }
    Ok(())
}

async fn load_observations(path: PathBuf, strict: bool) -> Result<ObservationBatch> {
    tokio::task::spawn_blocking(move || {
        ObservationReader::new()
            .with_strict_validation(strict)
            .read_observations(&path)
    })
    .await?
}

fn filter_station(
    observations: Vec<WeatherObservation>,
    station_id: Option<&str>,
) -> Vec<WeatherObservation> {
    match station_id {
        Some(id) => {
            let filtered: Vec<WeatherObservation> = observations
                .into_iter()
                .filter(|o| o.station_id == id)
                .collect();
            info!("{} observations for station {}", filtered.len(), id);
            filtered
        }
        None => observations,
    }
}

/// Available instant closest to `at`, or the earliest one
fn outlook_base_time(
    observations: &[WeatherObservation],
    at: Option<&str>,
) -> Result<DateTime<Utc>> {
    let missing = || ProcessingError::MissingData("No observations loaded".to_string());
    let target = match at {
        Some(at) => parse_timestamp(at)?,
        None => observations
            .iter()
            .map(|o| o.timestamp)
            .min()
            .ok_or_else(missing)?,
    };
    closest_timestamp(observations, target).ok_or_else(missing)
}

fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Report lines for station forecasts; `day` restricts each station to
/// that day's projection
fn forecast_lines(
    forecasts: &[StationForecast],
    day: Option<u32>,
    min_history: usize,
) -> Vec<String> {
    let available = forecasts.iter().filter(|f| f.outcome.is_ok()).count();
    let mut lines = vec![format!(
        "\nForecasts available for {} of {} stations",
        available,
        forecasts.len()
    )];
    if available < forecasts.len() {
        lines.push(format!(
            "Stations need at least {} records to be forecast",
            min_history
        ));
    }

    for forecast in forecasts {
        match &forecast.outcome {
            Ok(series) => {
                let days: Vec<String> = series
                    .iter()
                    .filter(|p| day.map_or(true, |d| p.day_offset == d))
                    .map(|p| {
                        format!(
                            "{} {:.1} ({})",
                            forecast.target_date(p.day_offset).format("%b %d"),
                            p.predicted_hsri,
                            p.risk_tier().label()
                        )
                    })
                    .collect();
                lines.push(format!("  {:<28} {}", forecast.station.site_name, days.join(" | ")));
            }
            Err(reason) => lines.push(format!(
                "  {:<28} unavailable: {}",
                forecast.station.site_name, reason
            )),
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ForecastPoint, ForecastSeries, ForecastUnavailable, StationMetadata};
    use chrono::TimeZone;

    fn forecasts() -> Vec<StationForecast> {
        let station = |id: &str, name: &str| {
            StationMetadata::new(
                id.to_string(),
                name.to_string(),
                "Bronx County".to_string(),
                40.8298,
                -73.8850,
            )
        };
        let latest = Utc.with_ymd_and_hms(2024, 7, 15, 23, 0, 0).unwrap();
        let points = (1..=3)
            .map(|day_offset| ForecastPoint {
                day_offset,
                predicted_hsri: 80.0 + day_offset as f64,
            })
            .collect();

        vec![
            StationForecast {
                station: station("840360610135", "Bronx-SW"),
                history_len: 50,
                latest_timestamp: latest,
                outcome: Ok(ForecastSeries::new(points)),
            },
            StationForecast {
                station: station("840360610115", "Bronx-Pelham"),
                history_len: 4,
                latest_timestamp: latest,
                outcome: Err(ForecastUnavailable::InsufficientHistory {
                    available: 4,
                    required: 10,
                }),
            },
        ]
    }

    #[test]
    fn test_forecast_lines_show_selected_day_only() {
        let lines = forecast_lines(&forecasts(), Some(2), 10);
        let bronx = lines.iter().find(|l| l.contains("Bronx-SW")).unwrap();

        assert!(bronx.contains("Jul 17 82.0"));
        assert!(!bronx.contains("Jul 16"));
        assert!(!bronx.contains("Jul 18"));
        assert!(!bronx.contains('|'));
    }

    #[test]
    fn test_forecast_lines_without_day_show_horizon() {
        let lines = forecast_lines(&forecasts(), None, 10);
        let bronx = lines.iter().find(|l| l.contains("Bronx-SW")).unwrap();
        assert_eq!(bronx.matches('|').count(), 2);

        assert!(lines.contains(&"Stations need at least 10 records to be forecast".to_string()));
        assert!(lines
            .iter()
            .any(|l| l.contains("Bronx-Pelham") && l.contains("unavailable")));
    }

    #[test]
    fn test_outlook_base_time_defaults_to_earliest() {
        let start = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
        let observations: Vec<WeatherObservation> = (0..72)
            .map(|h| {
                WeatherObservation::new(
                    "840360610135".to_string(),
                    start + Duration::hours(h),
                    85.0,
                    50.0,
                    3.0,
                )
            })
            .collect();

        assert_eq!(outlook_base_time(&observations, None).unwrap(), start);
        assert_eq!(
            outlook_base_time(&observations, Some("2024-07-02T05:20:00")).unwrap(),
            start + Duration::hours(29)
        );
        // Past the end snaps to the last hour
        assert_eq!(
            outlook_base_time(&observations, Some("2024-08-01T00:00:00")).unwrap(),
            start + Duration::hours(71)
        );
        assert!(outlook_base_time(&[], None).is_err());
        assert!(outlook_base_time(&observations, Some("yesterday")).is_err());
    }
}
