use crate::error::Result;
use crate::utils::constants::{
    COMPRESSION_SNAPPY, DEFAULT_HISTORY_WINDOW, DEFAULT_HORIZON_DAYS, DEFAULT_RISK_THRESHOLD,
    HSRI_MAX, HSRI_MIN, MAX_HORIZON_DAYS, MIN_FORECAST_HISTORY,
};
use config::{Config, Environment, File, Map};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;
use validator::Validate;

const ENV_PREFIX: &str = "HSRI";

#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct ForecastSettings {
    #[validate(range(min = 1, max = MAX_HORIZON_DAYS))]
    pub horizon_days: u32,

    #[validate(range(min = MIN_FORECAST_HISTORY))]
    pub history_window: usize,
}

/// Runtime settings: built-in defaults, then an optional file, then
/// `HSRI_*` environment variables (`HSRI_FORECAST__HORIZON_DAYS` for nested keys)
#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct Settings {
    #[validate(range(min = HSRI_MIN, max = HSRI_MAX))]
    pub risk_threshold: f64,

    pub compression: String,

    #[validate(range(min = 1))]
    pub max_workers: usize,

    #[validate(nested)]
    pub forecast: ForecastSettings,
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// `env` replaces the process environment when given
    fn load_with_env(path: Option<&Path>, env: Option<Map<String, String>>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("risk_threshold", DEFAULT_RISK_THRESHOLD)?
            .set_default("compression", COMPRESSION_SNAPPY)?
            .set_default("max_workers", num_cpus::get() as i64)?
            .set_default("forecast.horizon_days", DEFAULT_HORIZON_DAYS as i64)?
            .set_default("forecast.history_window", DEFAULT_HISTORY_WINDOW as i64)?;

        if let Some(path) = path {
            debug!("Loading settings from {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            risk_threshold: DEFAULT_RISK_THRESHOLD,
            compression: COMPRESSION_SNAPPY.to_string(),
            max_workers: num_cpus::get(),
            forecast: ForecastSettings {
                horizon_days: DEFAULT_HORIZON_DAYS,
                history_window: DEFAULT_HISTORY_WINDOW,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessingError;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::Builder;

    fn env(pairs: &[(&str, &str)]) -> Option<Map<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_defaults() -> Result<()> {
        let settings = Settings::load_with_env(None, env(&[]))?;
        assert_eq!(settings, Settings::default());
        Ok(())
    }

    #[test]
    fn test_file_then_environment() -> Result<()> {
        let mut file = Builder::new().suffix(".toml").tempfile()?;
        writeln!(file, "risk_threshold = 70.0")?;
        writeln!(file, "compression = \"zstd\"")?;
        writeln!(file, "[forecast]")?;
        writeln!(file, "horizon_days = 2")?;

        let settings = Settings::load_with_env(
            Some(file.path()),
            env(&[("HSRI_RISK_THRESHOLD", "80"), ("HSRI_FORECAST__HISTORY_WINDOW", "24")]),
        )?;

        assert_eq!(settings.risk_threshold, 80.0);
        assert_eq!(settings.compression, "zstd");
        assert_eq!(settings.forecast.horizon_days, 2);
        assert_eq!(settings.forecast.history_window, 24);
        Ok(())
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let result = Settings::load_with_env(None, env(&[("HSRI_FORECAST__HORIZON_DAYS", "7")]));
        assert!(matches!(result, Err(ProcessingError::Validation(_))));

        let result = Settings::load_with_env(None, env(&[("HSRI_FORECAST__HISTORY_WINDOW", "5")]));
        assert!(matches!(result, Err(ProcessingError::Validation(_))));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = Settings::load_with_env(Some(Path::new("/nonexistent/hsri.toml")), env(&[]));
        assert!(matches!(result, Err(ProcessingError::Settings(_))));
    }
}
