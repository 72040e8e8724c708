pub mod forecaster;
pub mod hsri_scorer;
pub mod regression;
pub mod station_processor;

pub use forecaster::Forecaster;
pub use hsri_scorer::{heat_index, score, score_observation};
pub use regression::LinearModel;
pub use station_processor::{Outlook, StationDailyRisk, StationForecast, StationProcessor};
