use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::constants::UNKNOWN_SITE_PREFIX;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct StationMetadata {
    #[validate(length(min = 1))]
    pub station_id: String,

    #[validate(length(min = 1))]
    pub site_name: String,

    pub county: String,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

impl StationMetadata {
    pub fn new(
        station_id: String,
        site_name: String,
        county: String,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            station_id,
            site_name,
            county,
            latitude,
            longitude,
        }
    }

    /// Placeholder entries are generated for ids missing from the registry
    pub fn is_known_site(&self) -> bool {
        !self.site_name.starts_with(UNKNOWN_SITE_PREFIX)
    }

    pub fn is_within_nyc_metro_bounds(&self) -> bool {
        self.latitude >= 40.4
            && self.latitude <= 41.8
            && self.longitude >= -74.6
            && self.longitude <= -72.5
    }
}
