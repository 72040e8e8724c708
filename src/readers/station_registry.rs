use std::collections::{BTreeSet, HashMap};

use crate::models::StationMetadata;
use crate::utils::constants::{
    ALL_AREAS, NYC_CENTER_LAT, NYC_CENTER_LON, UNKNOWN_COUNTY, UNKNOWN_SITE_PREFIX,
};

/// AQS id, site name, county, latitude, longitude
const NYC_METRO_SITES: &[(u64, &str, &str, f64, f64)] = &[
    // NYC (5 boroughs)
    (840421010055, "Manhattan-Midtown", "New York County", 40.7614, -73.9776),
    (840421010075, "Manhattan-Upper West", "New York County", 40.7831, -73.9712),
    (840421010048, "Manhattan-Upper East", "New York County", 40.7688, -73.9519),
    (840090010010, "Brooklyn-Downtown", "Kings County", 40.6501, -73.9496),
    (840360470052, "Queens-Astoria", "Queens County", 40.7673, -73.9302),
    (840360470118, "Queens-Jamaica", "Queens County", 40.7014, -73.8156),
    (840360610135, "Bronx-SW", "Bronx County", 40.8298, -73.8850),
    (840360610115, "Bronx-Pelham", "Bronx County", 40.8648, -73.8276),
    (840360850055, "Staten Island-Fresh Kills", "Richmond County", 40.5834, -74.1677),
    (840360850111, "Staten Island-Coney Island", "Richmond County", 40.5755, -74.1333),
    // Westchester
    (840360050080, "Westchester-Yonkers", "Westchester County", 40.9230, -73.8987),
    (840360050110, "Westchester-Mamaroneck", "Westchester County", 40.9450, -73.7350),
    (840360050112, "Westchester-Croton", "Westchester County", 41.1833, -73.8667),
    // New Jersey
    (840360710002, "NJ-Hudson", "Hudson County", 40.7178, -74.0569),
    // Connecticut
    (840090090027, "CT-New Haven", "New Haven County", 41.3083, -72.9279),
    (840090110124, "CT-Bridgeport", "Fairfield County", 41.1833, -73.1833),
    (840090011123, "CT-Stamford", "Fairfield County", 41.0534, -73.5387),
    // Long Island
    (840340030010, "Nassau-NW", "Nassau County", 40.8333, -73.6667),
    (840340070010, "Nassau-Central", "Nassau County", 40.8500, -73.5000),
    (840340170008, "Suffolk-E", "Suffolk County", 40.9500, -72.8000),
    (840340171003, "Suffolk-SE", "Suffolk County", 40.8667, -72.7333),
    (840340210005, "Suffolk-Central", "Suffolk County", 40.9000, -72.9000),
    (840340210008, "Suffolk-NE", "Suffolk County", 41.0500, -72.7500),
    (840340390004, "Nassau-SW", "Nassau County", 40.6833, -73.5000),
    (840340392003, "Nassau-S", "Nassau County", 40.6500, -73.6667),
    (840340190001, "Hempstead", "Nassau County", 40.7550, -73.6219),
    (840340273001, "Freeport", "Nassau County", 40.6575, -73.5819),
    (840340230011, "Rockville Centre", "Nassau County", 40.6667, -73.6500),
    (840340410007, "Valley Stream", "Nassau County", 40.6650, -73.7100),
    // Upstate counties
    (840360810120, "Rockland-W", "Rockland County", 41.0880, -74.2435),
    (840360810124, "Rockland-S", "Rockland County", 41.1333, -74.0333),
    (840360870005, "Orange County", "Orange County", 41.3333, -74.2667),
    (840361030009, "Dutchess County", "Dutchess County", 41.6333, -73.7000),
    (840361192004, "Putnam County", "Putnam County", 41.4667, -73.8667),
];

/// Named groupings of sites, in display order
const NYC_METRO_AREAS: &[(&str, &[&str])] = &[
    (
        "Manhattan",
        &["Manhattan-Midtown", "Manhattan-Upper West", "Manhattan-Upper East"],
    ),
    ("Brooklyn", &["Brooklyn-Downtown"]),
    ("Queens", &["Queens-Astoria", "Queens-Jamaica"]),
    ("Bronx", &["Bronx-SW", "Bronx-Pelham"]),
    (
        "Staten Island",
        &["Staten Island-Fresh Kills", "Staten Island-Coney Island"],
    ),
    (
        "Westchester",
        &[
            "Westchester-Yonkers",
            "Westchester-Mamaroneck",
            "Westchester-Croton",
        ],
    ),
    (
        "Long Island (Nassau)",
        &[
            "Nassau-NW",
            "Nassau-Central",
            "Nassau-SW",
            "Nassau-S",
            "Hempstead",
            "Freeport",
            "Rockville Centre",
            "Valley Stream",
        ],
    ),
    (
        "Long Island (Suffolk)",
        &["Suffolk-E", "Suffolk-SE", "Suffolk-Central", "Suffolk-NE"],
    ),
    ("New Jersey", &["NJ-Hudson"]),
    (
        "Connecticut",
        &["CT-New Haven", "CT-Bridgeport", "CT-Stamford"],
    ),
    ("Rockland County", &["Rockland-W", "Rockland-S"]),
    (
        "Orange/Dutchess",
        &["Orange County", "Dutchess County", "Putnam County"],
    ),
];

/// Static station id → site lookup for the NYC metro network
#[derive(Debug, Clone)]
pub struct StationRegistry {
    stations: HashMap<u64, StationMetadata>,
}

impl StationRegistry {
    pub fn nyc_metro() -> Self {
        let stations = NYC_METRO_SITES
            .iter()
            .map(|&(id, name, county, lat, lon)| {
                (
                    id,
                    StationMetadata::new(
                        id.to_string(),
                        name.to_string(),
                        county.to_string(),
                        lat,
                        lon,
                    ),
                )
            })
            .collect();

        Self { stations }
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Registered site for `station_id`, if any
    pub fn get(&self, station_id: &str) -> Option<&StationMetadata> {
        parse_aqs_id(station_id).and_then(|id| self.stations.get(&id))
    }

    /// Registered site, or a `Location-{id}` placeholder at the NYC center
    pub fn lookup(&self, station_id: &str) -> StationMetadata {
        match self.get(station_id) {
            Some(station) => StationMetadata {
                station_id: station_id.to_string(),
                ..station.clone()
            },
            None => StationMetadata::new(
                station_id.to_string(),
                format!("{}{}", UNKNOWN_SITE_PREFIX, station_id),
                UNKNOWN_COUNTY.to_string(),
                NYC_CENTER_LAT,
                NYC_CENTER_LON,
            ),
        }
    }

    /// Area name → sites that currently have data, starting with "All Areas".
    ///
    /// Placeholder sites are only listed under "All Areas" when no known
    /// site has data.
    pub fn areas_with_data<'a, I>(&self, site_names: I) -> Vec<(String, Vec<String>)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let available: BTreeSet<&str> = site_names.into_iter().collect();
        let known: Vec<String> = available
            .iter()
            .filter(|name| !name.starts_with(UNKNOWN_SITE_PREFIX))
            .map(|name| name.to_string())
            .collect();

        let all_sites = if known.is_empty() {
            available.iter().map(|name| name.to_string()).collect()
        } else {
            known
        };

        let mut areas = vec![(ALL_AREAS.to_string(), all_sites)];
        for (area, sites) in NYC_METRO_AREAS {
            let present: Vec<String> = sites
                .iter()
                .filter(|site| available.contains(*site))
                .map(|site| site.to_string())
                .collect();
            if !present.is_empty() {
                areas.push((area.to_string(), present));
            }
        }

        areas
    }

    pub fn area_names() -> Vec<&'static str> {
        NYC_METRO_AREAS.iter().map(|(area, _)| *area).collect()
    }
}

impl Default for StationRegistry {
    fn default() -> Self {
        Self::nyc_metro()
    }
}

/// AQS ids sometimes arrive as floats ("840360610135.0")
fn parse_aqs_id(station_id: &str) -> Option<u64> {
    let trimmed = station_id.trim();
    trimmed.parse::<u64>().ok().or_else(|| {
        trimmed
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0 && v.fract() == 0.0)
            .map(|v| v as u64)
    })
}
