use crate::error::{ProcessingError, Result};
use crate::models::{
    ForecastPoint, ForecastSeries, ForecastUnavailable, RiskTier, ScoredObservation,
    StationMetadata, WeatherObservation,
};
use crate::processors::forecaster::Forecaster;
use crate::processors::hsri_scorer::score_observation;
use crate::readers::StationRegistry;
use crate::utils::constants::DEFAULT_HISTORY_WINDOW;
use crate::utils::progress::ProgressReporter;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Forecast outcome for one station
#[derive(Debug, Clone)]
pub struct StationForecast {
    pub station: StationMetadata,
    pub history_len: usize,
    pub latest_timestamp: DateTime<Utc>,
    pub outcome: std::result::Result<ForecastSeries, ForecastUnavailable>,
}

impl StationForecast {
    pub fn series(&self) -> Option<&ForecastSeries> {
        self.outcome.as_ref().ok()
    }

    pub fn day(&self, day_offset: u32) -> Option<&ForecastPoint> {
        self.series().and_then(|s| s.day(day_offset))
    }

    /// Calendar date a day offset refers to
    pub fn target_date(&self, day_offset: u32) -> NaiveDate {
        (self.latest_timestamp + Duration::days(day_offset as i64)).date_naive()
    }
}

/// Mean of the actual scores a station recorded on one date
#[derive(Debug, Clone, Serialize)]
pub struct StationDailyRisk {
    pub station: StationMetadata,
    pub date: NaiveDate,
    pub observations: usize,
    pub mean_hsri: f64,
    pub risk_tier: RiskTier,
}

/// Risk for one day ahead: recorded values when the data covers the date,
/// projections otherwise
#[derive(Debug, Clone)]
pub enum Outlook {
    Observed(Vec<StationDailyRisk>),
    Projected(Vec<StationForecast>),
}

pub struct StationProcessor {
    max_workers: usize,
    history_window: usize,
    forecaster: Forecaster,
    registry: StationRegistry,
}

impl StationProcessor {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
            history_window: DEFAULT_HISTORY_WINDOW,
            forecaster: Forecaster::new(),
            registry: StationRegistry::nyc_metro(),
        }
    }

    /// Number of most recent observations per station fed to the forecaster
    pub fn with_history_window(mut self, history_window: usize) -> Self {
        self.history_window = history_window;
        self
    }

    pub fn with_registry(mut self, registry: StationRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &StationRegistry {
        &self.registry
    }

    /// Fewest observations a station needs before it is forecast
    pub fn min_history(&self) -> usize {
        self.forecaster.min_history()
    }

    fn thread_pool(&self) -> Result<rayon::ThreadPool> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()
            .map_err(|e| ProcessingError::Config(e.to_string()))
    }

    /// Score every observation, preserving input order
    pub fn score_all(
        &self,
        observations: Vec<WeatherObservation>,
        progress: Option<&ProgressReporter>,
    ) -> Result<Vec<ScoredObservation>> {
        if let Some(p) = progress {
            p.set_message(&format!("Scoring {} observations...", observations.len()));
        }

        let pool = self.thread_pool()?;
        let scored: Vec<ScoredObservation> =
            pool.install(|| observations.into_par_iter().map(score_observation).collect());

        debug!("Scored {} observations", scored.len());
        Ok(scored)
    }

    /// Observations per station, each sorted by time
    pub fn group_by_station(
        observations: &[WeatherObservation],
    ) -> BTreeMap<String, Vec<WeatherObservation>> {
        let mut stations: BTreeMap<String, Vec<WeatherObservation>> = BTreeMap::new();
        for observation in observations {
            stations
                .entry(observation.station_id.clone())
                .or_default()
                .push(observation.clone());
        }

        for records in stations.values_mut() {
            records.sort_by_key(|o| o.timestamp);
        }

        stations
    }

    /// Forecast every station from its most recent history
    pub fn forecast_stations(
        &self,
        observations: &[WeatherObservation],
        horizon_days: u32,
        progress: Option<&ProgressReporter>,
    ) -> Result<Vec<StationForecast>> {
        let stations = Self::group_by_station(observations);
        let total_stations = stations.len();
        let processed_count = Arc::new(AtomicUsize::new(0));

        if let Some(p) = progress {
            p.set_message(&format!("Forecasting {} stations...", total_stations));
        }

        let pool = self.thread_pool()?;
        let forecasts: Vec<StationForecast> = pool.install(|| {
            stations
                .par_iter()
                .filter_map(|(station_id, records)| {
                    let forecast = self.forecast_single_station(station_id, records, horizon_days);

                    let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;
                    if let Some(p) = progress {
                        p.update(count as u64);
                    }

                    forecast
                })
                .collect()
        });

        let available = forecasts.iter().filter(|f| f.outcome.is_ok()).count();
        info!(
            "Forecast available for {} of {} stations",
            available, total_stations
        );

        Ok(forecasts)
    }

    fn forecast_single_station(
        &self,
        station_id: &str,
        records: &[WeatherObservation],
        horizon_days: u32,
    ) -> Option<StationForecast> {
        let latest_timestamp = records.last()?.timestamp;
        let start = records.len().saturating_sub(self.history_window);
        let history: Vec<ScoredObservation> = records[start..]
            .iter()
            .cloned()
            .map(score_observation)
            .collect();

        let outcome = self.forecaster.forecast(&history, horizon_days);
        if let Err(reason) = &outcome {
            debug!("No forecast for station {}: {}", station_id, reason);
        }

        Some(StationForecast {
            station: self.registry.lookup(station_id),
            history_len: history.len(),
            latest_timestamp,
            outcome,
        })
    }

    /// Outlook for `base_time + day_offset` days.
    ///
    /// If any observation falls on that calendar date the recorded scores are
    /// averaged per station; otherwise each station is forecast.
    pub fn daily_outlook(
        &self,
        observations: &[WeatherObservation],
        base_time: DateTime<Utc>,
        day_offset: u32,
        progress: Option<&ProgressReporter>,
    ) -> Result<Outlook> {
        let target_date = (base_time + Duration::days(day_offset as i64)).date_naive();

        let on_date: Vec<WeatherObservation> = observations
            .iter()
            .filter(|o| o.timestamp.date_naive() == target_date)
            .cloned()
            .collect();

        if on_date.is_empty() {
            info!("No observations for {}, projecting", target_date);
            let forecasts = self.forecast_stations(observations, day_offset, progress)?;
            return Ok(Outlook::Projected(forecasts));
        }

        info!(
            "Using {} recorded observations for {}",
            on_date.len(),
            target_date
        );
        let scored = self.score_all(on_date, progress)?;

        let mut per_station: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for s in &scored {
            per_station
                .entry(s.observation.station_id.as_str())
                .or_default()
                .push(s.hsri());
        }

        let daily = per_station
            .into_iter()
            .map(|(station_id, values)| {
                let mean_hsri = values.iter().sum::<f64>() / values.len() as f64;
                StationDailyRisk {
                    station: self.registry.lookup(station_id),
                    date: target_date,
                    observations: values.len(),
                    mean_hsri,
                    risk_tier: RiskTier::from_hsri(mean_hsri),
                }
            })
            .collect();

        Ok(Outlook::Observed(daily))
    }
}

impl Default for StationProcessor {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn hourly(station_id: &str, hours: usize, start: DateTime<Utc>) -> Vec<WeatherObservation> {
        (0..hours)
            .map(|i| {
                let i_f = i as f64;
                WeatherObservation {
                    station_id: station_id.to_string(),
                    timestamp: start + Duration::hours(i as i64),
                    temperature_f: 76.0 + (i_f * 3.0) % 17.0,
                    relative_humidity_pct: 45.0 + (i_f * 7.0) % 31.0,
                    wind_speed_mph: 2.0 + (i_f * 5.0) % 8.0,
                    solar_radiation_wm2: if i % 4 == 0 {
                        None
                    } else {
                        Some(250.0 + (i_f * 91.0) % 600.0)
                    },
                    uv_index: Some(3.0 + (i_f * 2.0) % 6.0),
                    cloud_cover_pct: Some(10.0 + (i_f * i_f * 7.0) % 50.0),
                }
            })
            .collect()
    }

    fn july_first() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_score_all_preserves_order() -> Result<()> {
        let observations = hourly("840360610135", 30, july_first());
        let processor = StationProcessor::new(2);

        let scored = processor.score_all(observations.clone(), None)?;
        assert_eq!(scored.len(), 30);
        for (s, o) in scored.iter().zip(&observations) {
            assert_eq!(&s.observation, o);
        }
        Ok(())
    }

    #[test]
    fn test_group_by_station_sorts_by_time() {
        let mut observations = hourly("a", 5, july_first());
        observations.reverse();
        observations.extend(hourly("b", 3, july_first()));

        let grouped = StationProcessor::group_by_station(&observations);
        assert_eq!(grouped.len(), 2);
        let a = &grouped["a"];
        assert!(a.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert_eq!(grouped["b"].len(), 3);
    }

    #[test]
    fn test_forecast_stations_respects_history_gate() -> Result<()> {
        let mut observations = hourly("840360610135", 40, july_first());
        observations.extend(hourly("840360470052", 6, july_first()));

        let processor = StationProcessor::new(2);
        let forecasts = processor.forecast_stations(&observations, 3, None)?;
        assert_eq!(forecasts.len(), 2);

        let bronx = forecasts
            .iter()
            .find(|f| f.station.site_name == "Bronx-SW")
            .unwrap();
        assert_eq!(bronx.series().map(|s| s.len()), Some(3));
        assert_eq!(bronx.history_len, 40);

        let astoria = forecasts
            .iter()
            .find(|f| f.station.site_name == "Queens-Astoria")
            .unwrap();
        assert_eq!(
            astoria.outcome,
            Err(ForecastUnavailable::InsufficientHistory {
                available: 6,
                required: processor.min_history(),
            })
        );
        Ok(())
    }

    #[test]
    fn test_history_window_limits_rows() -> Result<()> {
        let observations = hourly("840360610135", 80, july_first());
        let forecasts = StationProcessor::new(1)
            .with_history_window(20)
            .forecast_stations(&observations, 2, None)?;

        assert_eq!(forecasts[0].history_len, 20);
        assert_eq!(
            forecasts[0].latest_timestamp,
            july_first() + Duration::hours(79)
        );
        assert_eq!(
            forecasts[0].target_date(2),
            NaiveDate::from_ymd_opt(2024, 7, 6).unwrap()
        );
        Ok(())
    }

    #[test]
    fn test_daily_outlook_uses_recorded_data_when_present() -> Result<()> {
        // 72 hours: July 1st to 3rd
        let observations = hourly("840360610135", 72, july_first());
        let processor = StationProcessor::new(2);

        match processor.daily_outlook(&observations, july_first(), 1, None)? {
            Outlook::Observed(daily) => {
                assert_eq!(daily.len(), 1);
                assert_eq!(daily[0].observations, 24);
                assert_eq!(daily[0].date, NaiveDate::from_ymd_opt(2024, 7, 2).unwrap());
                assert_eq!(daily[0].risk_tier, RiskTier::from_hsri(daily[0].mean_hsri));
            }
            Outlook::Projected(_) => panic!("expected recorded values"),
        }

        match processor.daily_outlook(&observations, july_first(), 3, None)? {
            Outlook::Projected(forecasts) => {
                assert_eq!(forecasts.len(), 1);
                assert!(forecasts[0].day(3).is_some());
            }
            Outlook::Observed(_) => panic!("expected a projection"),
        }
        Ok(())
    }
}
