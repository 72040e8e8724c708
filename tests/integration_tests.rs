use clap::Parser;
use hsri_processor::analyzers::RiskAnalyzer;
use hsri_processor::cli::{run, Cli};
use hsri_processor::models::{ForecastUnavailable, RiskTier, WeatherObservation};
use hsri_processor::processors::{score, Outlook, StationProcessor};
use hsri_processor::readers::{parse_timestamp, ObservationReader};
use hsri_processor::writers::{ForecastWriter, ParquetWriter};
use pretty_assertions::assert_eq;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

const HEADER: &str =
    "datetime,aqs_id_full,temp,humidity,windspeed,solarradiation,uvindex,cloudcover";

/// 15 hours for Bronx-SW, 4 for Queens-Astoria, plus two unusable rows
fn write_observation_csv(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("observations.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "{}", HEADER).unwrap();

    for hour in 0..15 {
        writeln!(
            file,
            "2024-07-15T{:02}:00:00,840360610135,{},{},{},{},{},{}",
            hour,
            80 + (hour * 3) % 14,
            45 + (hour * 7) % 30,
            2 + hour % 5,
            100 + (hour * 61) % 800,
            3 + hour % 6,
            10 + (hour * hour) % 40
        )
        .unwrap();
    }
    for hour in 10..14 {
        writeln!(file, "2024-07-15T{:02}:00:00,840360470052,84,60,3,,,", hour).unwrap();
    }
    writeln!(file, "2024-07-15T16:00:00,840360470052,,60,3,,,").unwrap();
    writeln!(file, "yesterday,840360470052,80,60,3,,,").unwrap();

    path
}

/// Three full days (July 1st to 3rd) of hourly Bronx-SW readings
fn write_three_day_csv(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("three_days.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "{}", HEADER).unwrap();

    for hour in 0..72 {
        writeln!(
            file,
            "2024-07-{:02}T{:02}:00:00,840360610135,{},{},{},{},{},{}",
            1 + hour / 24,
            hour % 24,
            76 + (hour * 5) % 19,
            40 + (hour * 7) % 37,
            1 + hour % 6,
            (hour * 83) % 900,
            1 + hour % 9,
            (hour * hour * 3) % 90
        )
        .unwrap();
    }

    path
}

#[test]
fn test_documented_hsri_examples() {
    let t = parse_timestamp("2024-07-15T14:00:00Z").unwrap();

    let mut hot = WeatherObservation::new("s".to_string(), t, 90.0, 50.0, 0.0);
    hot.solar_radiation_wm2 = Some(0.0);
    hot.uv_index = Some(0.0);
    hot.cloud_cover_pct = Some(0.0);
    let result = score(&hot);
    assert!((result.heat_index - 94.597).abs() < 1e-3);
    assert_eq!(result.risk_tier, RiskTier::Critical);

    let mut full = WeatherObservation::new("s".to_string(), t, 90.0, 50.0, 5.0);
    full.solar_radiation_wm2 = Some(800.0);
    full.uv_index = Some(8.0);
    full.cloud_cover_pct = Some(20.0);
    let result = score(&full);
    assert!((result.hsri - 81.297).abs() < 1e-3);
    assert_eq!(result.risk_tier, RiskTier::High);

    let cold = WeatherObservation::new("s".to_string(), t, 20.0, 50.0, 30.0);
    let result = score(&cold);
    assert_eq!(result.hsri, -100.0);
    assert_eq!(result.risk_tier, RiskTier::Freezing);
}

#[test]
fn test_csv_to_parquet_pipeline() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let csv_path = write_observation_csv(temp_dir.path());

    let batch = ObservationReader::new().read_observations(&csv_path).unwrap();
    assert_eq!(batch.report.total_rows, 21);
    assert_eq!(batch.report.loaded_rows, 19);
    assert_eq!(batch.report.skipped_rows(), 2);

    let processor = StationProcessor::new(2);
    let scored = processor.score_all(batch.observations.clone(), None).unwrap();
    assert_eq!(scored.len(), 19);
    for s in &scored {
        assert!((-100.0..=100.0).contains(&s.hsri()));
        assert_eq!(s.risk_tier(), RiskTier::from_hsri(s.hsri()));
    }

    let output_path = temp_dir.path().join("scores.parquet");
    let writer = ParquetWriter::new().with_compression("zstd").unwrap();
    writer.write_scored(&scored, &output_path).unwrap();

    let file_info = writer.get_file_info(&output_path).unwrap();
    assert_eq!(file_info.total_rows, 19);

    let sample = writer.read_sample(&output_path, 3).unwrap();
    assert_eq!(sample.len(), 3);
    assert_eq!(sample[0].0.site_name, "Bronx-SW");
    assert_eq!(sample[0].1, scored[0]);
}

#[test]
fn test_forecast_pipeline() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let csv_path = write_observation_csv(temp_dir.path());
    let batch = ObservationReader::new().read_observations(&csv_path).unwrap();

    let processor = StationProcessor::new(2);
    let forecasts = processor
        .forecast_stations(&batch.observations, 3, None)
        .unwrap();
    assert_eq!(forecasts.len(), 2);

    let bronx = forecasts
        .iter()
        .find(|f| f.station.site_name == "Bronx-SW")
        .unwrap();
    let series = bronx.series().unwrap();
    assert_eq!(series.len(), 3);
    assert!(series
        .iter()
        .all(|p| (-100.0..=100.0).contains(&p.predicted_hsri)));
    assert_eq!(bronx.target_date(1).to_string(), "2024-07-16");

    let queens = forecasts
        .iter()
        .find(|f| f.station.site_name == "Queens-Astoria")
        .unwrap();
    assert_eq!(
        queens.outcome,
        Err(ForecastUnavailable::InsufficientHistory {
            available: 4,
            required: 10
        })
    );

    let csv_out = temp_dir.path().join("forecast.csv");
    ForecastWriter::write(&forecasts, &csv_out).unwrap();
    let text = std::fs::read_to_string(&csv_out).unwrap();
    // Header, three projected days, one unavailable row
    assert_eq!(text.lines().count(), 5);

    let json_out = temp_dir.path().join("forecast.json");
    ForecastWriter::write(&forecasts, &json_out).unwrap();
    assert!(json_out.exists());
}

#[test]
fn test_outlook_and_snapshot() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let csv_path = write_observation_csv(temp_dir.path());
    let observations = ObservationReader::new()
        .read_observations(&csv_path)
        .unwrap()
        .observations;

    let base_time = parse_timestamp("2024-07-15T00:00:00Z").unwrap();
    let processor = StationProcessor::new(2);

    match processor.daily_outlook(&observations, base_time, 0, None).unwrap() {
        Outlook::Observed(daily) => assert_eq!(daily.len(), 2),
        Outlook::Projected(_) => panic!("expected recorded values for the same day"),
    }
    match processor.daily_outlook(&observations, base_time, 2, None).unwrap() {
        Outlook::Projected(forecasts) => {
            assert!(forecasts.iter().any(|f| f.day(2).is_some()));
        }
        Outlook::Observed(_) => panic!("expected projections"),
    }

    let snapshot = RiskAnalyzer::new()
        .snapshot(
            &observations,
            Some(parse_timestamp("2024-07-15T11:20:00Z").unwrap()),
            Some("Queens"),
        )
        .unwrap();
    assert_eq!(snapshot.timestamp, parse_timestamp("2024-07-15T11:00:00Z").unwrap());
    assert_eq!(snapshot.sites.len(), 1);
    assert_eq!(snapshot.sites[0].station.site_name, "Queens-Astoria");
}

#[tokio::test]
async fn test_cli_score_and_info() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let csv_path = write_observation_csv(temp_dir.path());
    let output_path = temp_dir.path().join("out").join("scores.parquet");

    let cli = Cli::try_parse_from([
        "hsri-processor",
        "score",
        "--input-file",
        csv_path.to_str().unwrap(),
        "--output-file",
        output_path.to_str().unwrap(),
        "--max-workers",
        "2",
    ])
    .unwrap();
    run(cli).await.unwrap();
    assert!(output_path.exists());

    let cli = Cli::try_parse_from([
        "hsri-processor",
        "info",
        "--file",
        output_path.to_str().unwrap(),
        "--sample",
        "2",
    ])
    .unwrap();
    run(cli).await.unwrap();

    let file_info = ParquetWriter::new().get_file_info(&output_path).unwrap();
    assert_eq!(file_info.total_rows, 19);
}

#[tokio::test]
async fn test_cli_forecast_day_reads_recorded_outlook() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let csv_path = write_three_day_csv(temp_dir.path());

    // Default base is the earliest hour, so day 1 is July 2nd and recorded
    let observed_path = temp_dir.path().join("observed.csv");
    let cli = Cli::try_parse_from([
        "hsri-processor",
        "forecast",
        "--input-file",
        csv_path.to_str().unwrap(),
        "--day",
        "1",
        "--output-file",
        observed_path.to_str().unwrap(),
    ])
    .unwrap();
    run(cli).await.unwrap();

    let text = std::fs::read_to_string(&observed_path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines[0],
        "station_id,site_name,county,date,observations,mean_hsri,risk_tier"
    );
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("840360610135,Bronx-SW,Bronx County,2024-07-02,24,"));

    // From the last day there is nothing recorded a day later
    let projected_path = temp_dir.path().join("projected.csv");
    let cli = Cli::try_parse_from([
        "hsri-processor",
        "forecast",
        "--input-file",
        csv_path.to_str().unwrap(),
        "--day",
        "1",
        "--at",
        "2024-07-03T12:00:00",
        "--output-file",
        projected_path.to_str().unwrap(),
    ])
    .unwrap();
    run(cli).await.unwrap();

    let text = std::fs::read_to_string(&projected_path).unwrap();
    assert!(text
        .lines()
        .next()
        .unwrap()
        .contains("predicted_hsri"));
    assert!(text.contains(",2024-07-04,"));
}
