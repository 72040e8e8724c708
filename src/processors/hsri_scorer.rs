//! Heat Stress Risk Index scoring.
//!
//! `HSRI = HI + 0.3·UV + 8·SR_eff − 4·WS − 0.05·CC`, clamped to [-100, 100],
//! where HI is the NWS heat index and `SR_eff = max(0, SR / 1000)`. Missing
//! solar, UV or cloud values contribute nothing.

use crate::models::{HsriResult, RiskTier, ScoredObservation, WeatherObservation};
use crate::utils::constants::{
    CLOUD_WEIGHT, HEAT_INDEX_THRESHOLD_F, HSRI_MAX, HSRI_MIN, ROTHFUSZ_COEFFICIENTS, SOLAR_SCALE_WM2,
    SOLAR_WEIGHT, UV_WEIGHT, WIND_WEIGHT,
};

/// NWS heat index (Rothfusz regression).
///
/// Below 80°F the regression does not apply and the temperature is returned
/// unchanged.
pub fn heat_index(temperature_f: f64, relative_humidity_pct: f64) -> f64 {
    if temperature_f < HEAT_INDEX_THRESHOLD_F {
        return temperature_f;
    }

    let [c1, c2, c3, c4, c5, c6, c7, c8, c9] = ROTHFUSZ_COEFFICIENTS;
    let t = temperature_f;
    let rh = relative_humidity_pct;

    c1 + c2 * t
        + c3 * rh
        + c4 * t * rh
        + c5 * t * t
        + c6 * rh * rh
        + c7 * t * t * rh
        + c8 * t * rh * rh
        + c9 * t * t * rh * rh
}

/// Solar radiation rescaled to roughly 0..1
pub fn effective_solar(solar_radiation_wm2: Option<f64>) -> f64 {
    solar_radiation_wm2.map_or(0.0, |sr| (sr / SOLAR_SCALE_WM2).max(0.0))
}

pub fn clamp_hsri(value: f64) -> f64 {
    value.clamp(HSRI_MIN, HSRI_MAX)
}

/// Score a single observation. Total over any observation with finite
/// mandatory fields; the caller owns range validation.
pub fn score(observation: &WeatherObservation) -> HsriResult {
    let hi = heat_index(
        observation.temperature_f,
        observation.relative_humidity_pct,
    );

    let sr_eff = effective_solar(observation.solar_radiation_wm2);
    let uv = observation.uv_index.unwrap_or(0.0);
    let cc = observation.cloud_cover_pct.unwrap_or(0.0);

    let raw = hi + UV_WEIGHT * uv + SOLAR_WEIGHT * sr_eff
        - WIND_WEIGHT * observation.wind_speed_mph
        - CLOUD_WEIGHT * cc;
    let hsri = clamp_hsri(raw);

    HsriResult {
        heat_index: hi,
        hsri,
        risk_tier: RiskTier::from_hsri(hsri),
    }
}

/// Pair an observation with its score
pub fn score_observation(observation: WeatherObservation) -> ScoredObservation {
    let result = score(&observation);
    ScoredObservation::new(observation, result)
}
