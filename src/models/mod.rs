pub mod forecast;
pub mod hsri;
pub mod observation;
pub mod station;

pub use forecast::{ForecastPoint, ForecastSeries, ForecastUnavailable};
pub use hsri::{HsriResult, RiskTier, ScoredObservation};
pub use observation::{WeatherObservation, WeatherObservationBuilder};
pub use station::StationMetadata;
