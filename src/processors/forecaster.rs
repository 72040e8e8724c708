use tracing::debug;

use crate::models::{ForecastPoint, ForecastSeries, ForecastUnavailable, ScoredObservation};
use crate::processors::hsri_scorer::clamp_hsri;
use crate::processors::regression::{column_means, LinearModel};
use crate::utils::constants::{
    COL_CLOUD, COL_HUMIDITY, COL_SOLAR, COL_TEMP, COL_UV, COL_WIND, DAILY_FEATURE_DRIFT,
    MIN_FORECAST_HISTORY,
};

/// Feature columns in model order
pub const FEATURE_COLUMNS: [&str; 6] = [COL_TEMP, COL_HUMIDITY, COL_WIND, COL_SOLAR, COL_UV, COL_CLOUD];

/// Short-horizon HSRI projection.
///
/// Fits OLS of each row's HSRI on the six weather features, then evaluates
/// the model at the mean feature vector scaled by `1 + 0.02·day`. The drift
/// is applied uniformly to every feature; it is a deliberately simple
/// extrapolation, not a time-series model.
#[derive(Debug, Clone)]
pub struct Forecaster {
    min_history: usize,
}

impl Forecaster {
    pub fn new() -> Self {
        Self {
            min_history: MIN_FORECAST_HISTORY,
        }
    }

    pub fn min_history(&self) -> usize {
        self.min_history
    }

    pub fn forecast(
        &self,
        history: &[ScoredObservation],
        horizon_days: u32,
    ) -> Result<ForecastSeries, ForecastUnavailable> {
        if history.len() < self.min_history {
            return Err(ForecastUnavailable::InsufficientHistory {
                available: history.len(),
                required: self.min_history,
            });
        }

        let features = build_feature_matrix(history)?;
        let targets: Vec<f64> = history.iter().map(|s| s.result.hsri).collect();

        let model =
            LinearModel::fit(&features, &targets).ok_or(ForecastUnavailable::DegenerateFit)?;
        let mean_features = column_means(&features);

        debug!(
            rows = history.len(),
            intercept = model.intercept,
            "Fitted forecast model"
        );

        let mut points = Vec::with_capacity(horizon_days as usize);
        for day in 1..=horizon_days {
            let scale = 1.0 + DAILY_FEATURE_DRIFT * day as f64;
            let projected: Vec<f64> = mean_features.iter().map(|m| m * scale).collect();
            let raw = model.predict(&projected);
            if !raw.is_finite() {
                return Err(ForecastUnavailable::DegenerateFit);
            }
            points.push(ForecastPoint {
                day_offset: day,
                predicted_hsri: clamp_hsri(raw),
            });
        }

        Ok(ForecastSeries::new(points))
    }
}

impl Default for Forecaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Six-column design matrix. Missing optional values take the mean of the
/// values present in the same batch; a column with nothing present cannot
/// be filled.
pub fn build_feature_matrix(
    history: &[ScoredObservation],
) -> Result<Vec<Vec<f64>>, ForecastUnavailable> {
    let solar = impute_column(history, |s| s.observation.solar_radiation_wm2, COL_SOLAR)?;
    let uv = impute_column(history, |s| s.observation.uv_index, COL_UV)?;
    let cloud = impute_column(history, |s| s.observation.cloud_cover_pct, COL_CLOUD)?;

    Ok(history
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let obs = &s.observation;
            vec![
                obs.temperature_f,
                obs.relative_humidity_pct,
                obs.wind_speed_mph,
                solar[i],
                uv[i],
                cloud[i],
            ]
        })
        .collect())
}

fn impute_column<F>(
    history: &[ScoredObservation],
    field: F,
    column: &str,
) -> Result<Vec<f64>, ForecastUnavailable>
where
    F: Fn(&ScoredObservation) -> Option<f64>,
{
    let values: Vec<Option<f64>> = history.iter().map(&field).collect();
    let present: Vec<f64> = values.iter().flatten().copied().collect();

    if present.is_empty() {
        return Err(ForecastUnavailable::EmptyFeature {
            column: column.to_string(),
        });
    }

    let mean = present.iter().sum::<f64>() / present.len() as f64;
    Ok(values.into_iter().map(|v| v.unwrap_or(mean)).collect())
}
