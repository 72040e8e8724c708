use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// One hourly reading at one station.
///
/// Temperature, humidity and wind are mandatory; a record without them is not
/// an observation. An absent optional field is a modelling choice ("no
/// contribution"), not an unknown value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct WeatherObservation {
    #[validate(length(min = 1))]
    pub station_id: String,

    pub timestamp: DateTime<Utc>,

    #[validate(range(min = -80.0, max = 140.0))]
    pub temperature_f: f64,

    #[validate(range(min = 0.0, max = 100.0))]
    pub relative_humidity_pct: f64,

    #[validate(range(min = 0.0))]
    pub wind_speed_mph: f64,

    #[validate(range(min = 0.0))]
    pub solar_radiation_wm2: Option<f64>,

    #[validate(range(min = 0.0))]
    pub uv_index: Option<f64>,

    #[validate(range(min = 0.0, max = 100.0))]
    pub cloud_cover_pct: Option<f64>,
}

impl WeatherObservation {
    pub fn new(
        station_id: String,
        timestamp: DateTime<Utc>,
        temperature_f: f64,
        relative_humidity_pct: f64,
        wind_speed_mph: f64,
    ) -> Self {
        Self {
            station_id,
            timestamp,
            temperature_f,
            relative_humidity_pct,
            wind_speed_mph,
            solar_radiation_wm2: None,
            uv_index: None,
            cloud_cover_pct: None,
        }
    }

    pub fn builder() -> WeatherObservationBuilder {
        WeatherObservationBuilder::new()
    }

    pub fn has_solar_radiation(&self) -> bool {
        self.solar_radiation_wm2.is_some()
    }

    pub fn has_uv_index(&self) -> bool {
        self.uv_index.is_some()
    }

    pub fn has_cloud_cover(&self) -> bool {
        self.cloud_cover_pct.is_some()
    }

    /// True when all three optional radiation/sky fields are present
    pub fn is_complete(&self) -> bool {
        self.has_solar_radiation() && self.has_uv_index() && self.has_cloud_cover()
    }

    pub fn available_metrics(&self) -> Vec<&str> {
        let mut metrics = vec!["temperature", "humidity", "wind_speed"];
        if self.has_solar_radiation() {
            metrics.push("solar_radiation");
        }
        if self.has_uv_index() {
            metrics.push("uv_index");
        }
        if self.has_cloud_cover() {
            metrics.push("cloud_cover");
        }
        metrics
    }
}

#[derive(Debug, Default)]
pub struct WeatherObservationBuilder {
    station_id: Option<String>,
    timestamp: Option<DateTime<Utc>>,
    temperature_f: Option<f64>,
    relative_humidity_pct: Option<f64>,
    wind_speed_mph: Option<f64>,
    solar_radiation_wm2: Option<f64>,
    uv_index: Option<f64>,
    cloud_cover_pct: Option<f64>,
}

impl WeatherObservationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn station_id(mut self, station_id: impl Into<String>) -> Self {
        self.station_id = Some(station_id.into());
        self
    }

    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn temperature_f(mut self, temperature_f: f64) -> Self {
        self.temperature_f = Some(temperature_f);
        self
    }

    pub fn relative_humidity_pct(mut self, relative_humidity_pct: f64) -> Self {
        self.relative_humidity_pct = Some(relative_humidity_pct);
        self
    }

    pub fn wind_speed_mph(mut self, wind_speed_mph: f64) -> Self {
        self.wind_speed_mph = Some(wind_speed_mph);
        self
    }

    pub fn solar_radiation_wm2(mut self, solar_radiation_wm2: Option<f64>) -> Self {
        self.solar_radiation_wm2 = solar_radiation_wm2;
        self
    }

    pub fn uv_index(mut self, uv_index: Option<f64>) -> Self {
        self.uv_index = uv_index;
        self
    }

    pub fn cloud_cover_pct(mut self, cloud_cover_pct: Option<f64>) -> Self {
        self.cloud_cover_pct = cloud_cover_pct;
        self
    }

    /// Returns `None` when any mandatory field is missing or non-finite.
    /// Non-finite optional values are dropped to `None`.
    pub fn build(self) -> Option<WeatherObservation> {
        let finite = |v: Option<f64>| v.filter(|x| x.is_finite());

        let station_id = self.station_id.filter(|s| !s.trim().is_empty())?;
        let timestamp = self.timestamp?;
        let temperature_f = finite(self.temperature_f)?;
        let relative_humidity_pct = finite(self.relative_humidity_pct)?;
        let wind_speed_mph = finite(self.wind_speed_mph)?;

        Some(WeatherObservation {
            station_id,
            timestamp,
            temperature_f,
            relative_humidity_pct,
            wind_speed_mph,
            solar_radiation_wm2: finite(self.solar_radiation_wm2),
            uv_index: finite(self.uv_index),
            cloud_cover_pct: finite(self.cloud_cover_pct),
        })
    }
}
