use crate::utils::constants::DEFAULT_CHUNK_SIZE;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hsri-processor")]
#[command(about = "Heat Stress Risk Index scoring and short-range forecasting for NYC metro weather stations")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(long, global = true, help = "Settings file (toml, json, yaml)")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score hourly observations and write them to Parquet
    Score {
        #[arg(short, long, help = "Input CSV of hourly observations")]
        input_file: PathBuf,

        #[arg(
            short,
            long,
            help = "Output Parquet file path [default: output/hsri-scores-{YYMMDD}.parquet]"
        )]
        output_file: Option<PathBuf>,

        #[arg(short, long, help = "Parquet compression [default: from settings]")]
        compression: Option<String>,

        #[arg(short, long)]
        station_id: Option<String>,

        #[arg(long, help = "Drop rows with physically implausible values")]
        strict: bool,

        #[arg(long)]
        max_workers: Option<usize>,

        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
    },

    /// Show the network-wide risk picture at one instant
    Snapshot {
        #[arg(short, long, help = "Input CSV of hourly observations")]
        input_file: PathBuf,

        #[arg(long, help = "Target time; the closest available hour is used [default: earliest]")]
        at: Option<String>,

        #[arg(long, help = "Area name, e.g. 'Manhattan' [default: All Areas]")]
        area: Option<String>,

        #[arg(long, help = "High-risk HSRI threshold [default: from settings]")]
        threshold: Option<f64>,
    },

    /// Project HSRI up to three days ahead for each station
    Forecast {
        #[arg(short, long, help = "Input CSV of hourly observations")]
        input_file: PathBuf,

        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=3))]
        horizon_days: Option<u32>,

        #[arg(short, long)]
        station_id: Option<String>,

        #[arg(short, long, help = "Write forecasts to .csv or .json")]
        output_file: Option<PathBuf>,

        #[arg(
            long,
            value_parser = clap::value_parser!(u32).range(1..=3),
            help = "Daily outlook for this many days after the --at instant"
        )]
        day: Option<u32>,

        #[arg(
            long,
            requires = "day",
            help = "Outlook base time; the closest available hour is used [default: earliest]"
        )]
        at: Option<String>,

        #[arg(long)]
        max_workers: Option<usize>,
    },

    /// Display information about a scored Parquet file
    Info {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long, default_value = "10")]
        sample: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_horizon_is_bounded() {
        let parsed = Cli::try_parse_from([
            "hsri-processor",
            "forecast",
            "-i",
            "obs.csv",
            "--horizon-days",
            "2",
        ]);
        assert!(parsed.is_ok());

        let parsed = Cli::try_parse_from([
            "hsri-processor",
            "forecast",
            "-i",
            "obs.csv",
            "--horizon-days",
            "4",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_outlook_base_time_needs_day() {
        let parsed = Cli::try_parse_from([
            "hsri-processor",
            "forecast",
            "-i",
            "obs.csv",
            "--at",
            "2024-07-02T12:00:00",
        ]);
        assert!(parsed.is_err());

        let cli = Cli::try_parse_from([
            "hsri-processor",
            "forecast",
            "-i",
            "obs.csv",
            "--day",
            "1",
            "--at",
            "2024-07-02T12:00:00",
        ])
        .unwrap();
        match cli.command {
            Commands::Forecast { day, at, .. } => {
                assert_eq!(day, Some(1));
                assert_eq!(at.as_deref(), Some("2024-07-02T12:00:00"));
            }
            _ => panic!("expected forecast"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "hsri-processor",
            "snapshot",
            "-i",
            "obs.csv",
            "--area",
            "Queens",
            "--verbose",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Snapshot { area, .. } => assert_eq!(area.as_deref(), Some("Queens")),
            _ => panic!("expected snapshot"),
        }
    }
}
