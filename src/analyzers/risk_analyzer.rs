use crate::error::{ProcessingError, Result};
use crate::models::{
    ForecastSeries, ForecastUnavailable, RiskTier, ScoredObservation, StationMetadata,
    WeatherObservation,
};
use crate::processors::hsri_scorer::score_observation;
use crate::processors::{Forecaster, Outlook};
use crate::readers::StationRegistry;
use crate::utils::constants::{
    ALL_AREAS, DEFAULT_RISK_THRESHOLD, HEALTHCARE_ALERT_THRESHOLD, MAX_HORIZON_DAYS,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Available timestamp nearest to `target`; ties go to the earlier one
pub fn closest_timestamp(
    observations: &[WeatherObservation],
    target: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    observations
        .iter()
        .map(|o| o.timestamp)
        .min_by_key(|ts| ((*ts - target).num_seconds().abs(), *ts))
}

/// One scored site at the snapshot instant
#[derive(Debug, Clone)]
pub struct SiteRisk {
    pub station: StationMetadata,
    pub scored: ScoredObservation,
}

#[derive(Debug)]
pub struct RiskSnapshot {
    pub timestamp: DateTime<Utc>,
    pub area: String,
    pub threshold: f64,
    pub sites: Vec<SiteRisk>,
    pub high_risk: Vec<SiteRisk>,
    pub statistics: SnapshotStatistics,
    /// Projection fitted across the selected sites at this instant
    pub network_forecast: std::result::Result<ForecastSeries, ForecastUnavailable>,
}

impl RiskSnapshot {
    pub fn forecast_time(&self, day_offset: u32) -> DateTime<Utc> {
        self.timestamp + Duration::days(day_offset as i64)
    }
}

/// Emergency department readiness derived from the peak score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthcareAlert {
    High,
    Low,
}

impl HealthcareAlert {
    pub fn from_peak(peak_hsri: Option<f64>) -> Self {
        match peak_hsri {
            Some(peak) if peak >= HEALTHCARE_ALERT_THRESHOLD => HealthcareAlert::High,
            _ => HealthcareAlert::Low,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HealthcareAlert::High => "HIGH",
            HealthcareAlert::Low => "LOW",
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            HealthcareAlert::High => "Expect potential increase in heat-related ED visits",
            HealthcareAlert::Low => "Normal operations expected",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotStatistics {
    pub site_count: usize,
    pub average_hsri: Option<f64>,
    pub peak_hsri: Option<f64>,
    pub peak_tier: Option<RiskTier>,
    pub peak_location: Option<String>,
    pub min_hsri: Option<f64>,
    pub above_threshold: usize,
    pub average_temperature_f: Option<f64>,
    pub average_humidity_pct: Option<f64>,
    pub tier_counts: BTreeMap<RiskTier, usize>,
    pub most_affected_county: Option<String>,
    /// High-risk sites in `most_affected_county`
    pub most_affected_county_sites: usize,
    pub healthcare_alert: HealthcareAlert,
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

fn format_value(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{:.1}{}", v, unit),
        None => "N/A".to_string(),
    }
}

impl SnapshotStatistics {
    pub fn from_sites(sites: &[SiteRisk], threshold: f64) -> Self {
        let peak = sites
            .iter()
            .max_by(|a, b| a.scored.hsri().total_cmp(&b.scored.hsri()));
        let min_hsri = sites
            .iter()
            .map(|s| s.scored.hsri())
            .min_by(|a, b| a.total_cmp(b));
        let peak_hsri = peak.map(|s| s.scored.hsri());

        let mut tier_counts = BTreeMap::new();
        for site in sites {
            *tier_counts.entry(site.scored.risk_tier()).or_insert(0) += 1;
        }

        let mut county_counts: HashMap<&str, usize> = HashMap::new();
        for site in sites.iter().filter(|s| s.scored.exceeds(threshold)) {
            *county_counts.entry(site.station.county.as_str()).or_insert(0) += 1;
        }
        let most_affected = county_counts
            .into_iter()
            .max_by(|(a_name, a), (b_name, b)| a.cmp(b).then_with(|| b_name.cmp(a_name)));

        Self {
            site_count: sites.len(),
            average_hsri: mean(sites.iter().map(|s| s.scored.hsri())),
            peak_hsri,
            peak_tier: peak.map(|s| s.scored.risk_tier()),
            peak_location: peak.map(|s| s.station.site_name.clone()),
            min_hsri,
            above_threshold: sites.iter().filter(|s| s.scored.exceeds(threshold)).count(),
            average_temperature_f: mean(sites.iter().map(|s| s.scored.observation.temperature_f)),
            average_humidity_pct: mean(
                sites
                    .iter()
                    .map(|s| s.scored.observation.relative_humidity_pct),
            ),
            tier_counts,
            most_affected_county: most_affected.map(|(county, _)| county.to_string()),
            most_affected_county_sites: most_affected.map_or(0, |(_, count)| count),
            healthcare_alert: HealthcareAlert::from_peak(peak_hsri),
        }
    }

    /// Share of sites at or above the threshold, as a percentage.
    /// Zero when there are no sites.
    pub fn high_risk_share_pct(&self) -> f64 {
        if self.site_count == 0 {
            return 0.0;
        }
        self.above_threshold as f64 / self.site_count as f64 * 100.0
    }

    pub fn summary(&self) -> String {
        let peak = match (self.peak_hsri, self.peak_tier, &self.peak_location) {
            (Some(hsri), Some(tier), Some(location)) => {
                format!("{:.1} ({}) at {}", hsri, tier.label(), location)
            }
            _ => "N/A".to_string(),
        };

        let mut summary = format!(
            "Sites: {}\n\
            Average HSRI: {}\n\
            Peak HSRI: {}\n\
            Minimum HSRI: {}\n\
            Sites at or above threshold: {}\n\
            Average Temperature: {}\n\
            Average Humidity: {}",
            self.site_count,
            format_value(self.average_hsri, ""),
            peak,
            format_value(self.min_hsri, ""),
            self.above_threshold,
            format_value(self.average_temperature_f, "°F"),
            format_value(self.average_humidity_pct, "%"),
        );

        summary.push_str("\n\nOperational Insights:");
        summary.push_str(&format!(
            "\n  Cooling centers to activate: {} of {} ({:.1}%)",
            self.above_threshold,
            self.site_count,
            self.high_risk_share_pct()
        ));
        match &self.most_affected_county {
            Some(county) => summary.push_str(&format!(
                "\n  Most affected county: {} ({} sites at high risk)",
                county, self.most_affected_county_sites
            )),
            None => summary.push_str("\n  Most affected county: N/A"),
        }
        summary.push_str(&format!(
            "\n  Healthcare alert: {} ({})",
            self.healthcare_alert.name(),
            self.healthcare_alert.advice()
        ));

        summary.push_str("\n\nRisk Distribution:");
        for tier in RiskTier::ALL {
            let count = self.tier_counts.get(&tier).copied().unwrap_or(0);
            summary.push_str(&format!(
                "\n  {:<9} HSRI {:<6} {:>4}  ({})",
                tier.name(),
                tier.range_text(),
                count,
                tier.clothing_guidance()
            ));
        }

        summary
    }
}

/// Network figures for one outlook day, from recorded station means or
/// from per-station projections
#[derive(Debug, Clone, PartialEq)]
pub struct OutlookSummary {
    pub date: NaiveDate,
    pub recorded: bool,
    pub site_count: usize,
    pub average_hsri: Option<f64>,
    pub peak_hsri: Option<f64>,
    pub peak_tier: Option<RiskTier>,
    pub peak_location: Option<String>,
    pub min_hsri: Option<f64>,
    pub high_risk_sites: usize,
}

impl OutlookSummary {
    /// Stations without a projection for `day_offset` are left out
    pub fn from_outlook(
        outlook: &Outlook,
        date: NaiveDate,
        day_offset: u32,
        threshold: f64,
    ) -> Self {
        let values: Vec<(&str, f64)> = match outlook {
            Outlook::Observed(daily) => daily
                .iter()
                .map(|d| (d.station.site_name.as_str(), d.mean_hsri))
                .collect(),
            Outlook::Projected(forecasts) => forecasts
                .iter()
                .filter_map(|f| {
                    f.day(day_offset)
                        .map(|p| (f.station.site_name.as_str(), p.predicted_hsri))
                })
                .collect(),
        };

        let peak = values.iter().max_by(|a, b| a.1.total_cmp(&b.1));

        Self {
            date,
            recorded: matches!(outlook, Outlook::Observed(_)),
            site_count: values.len(),
            average_hsri: mean(values.iter().map(|(_, v)| *v)),
            peak_hsri: peak.map(|(_, v)| *v),
            peak_tier: peak.map(|(_, v)| RiskTier::from_hsri(*v)),
            peak_location: peak.map(|(name, _)| name.to_string()),
            min_hsri: values.iter().map(|(_, v)| *v).min_by(|a, b| a.total_cmp(b)),
            high_risk_sites: values.iter().filter(|(_, v)| *v >= threshold).count(),
        }
    }

    pub fn summary(&self) -> String {
        let heading = if self.recorded {
            "Historical HSRI Statistics"
        } else {
            "Forecast Summary Statistics"
        };
        let peak = match (self.peak_hsri, self.peak_tier, &self.peak_location) {
            (Some(hsri), Some(tier), Some(location)) => {
                format!("{:.1}°F ({}) at {}", hsri, tier.label(), location)
            }
            _ => "N/A".to_string(),
        };

        format!(
            "{} for {}\n\
            Sites: {}\n\
            Average HSRI: {}\n\
            Peak HSRI: {}\n\
            Minimum HSRI: {}\n\
            High-risk sites: {}",
            heading,
            self.date.format("%b %d, %Y"),
            self.site_count,
            format_value(self.average_hsri, "°F"),
            peak,
            format_value(self.min_hsri, "°F"),
            self.high_risk_sites,
        )
    }
}

/// Dashboard-style view of one instant across the network
pub struct RiskAnalyzer {
    registry: StationRegistry,
    threshold: f64,
    forecaster: Forecaster,
}

impl RiskAnalyzer {
    pub fn new() -> Self {
        Self {
            registry: StationRegistry::nyc_metro(),
            threshold: DEFAULT_RISK_THRESHOLD,
            forecaster: Forecaster::new(),
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_registry(mut self, registry: StationRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Snapshot at the available instant closest to `target` (earliest
    /// instant when `None`), restricted to `area`.
    ///
    /// An area with no sites at that instant falls back to every site.
    pub fn snapshot(
        &self,
        observations: &[WeatherObservation],
        target: Option<DateTime<Utc>>,
        area: Option<&str>,
    ) -> Result<RiskSnapshot> {
        let target = match target {
            Some(t) => t,
            None => observations
                .iter()
                .map(|o| o.timestamp)
                .min()
                .ok_or_else(|| ProcessingError::MissingData("No observations".to_string()))?,
        };
        let timestamp = closest_timestamp(observations, target)
            .ok_or_else(|| ProcessingError::MissingData("No observations".to_string()))?;

        let all_sites: Vec<SiteRisk> = observations
            .iter()
            .filter(|o| o.timestamp == timestamp)
            .map(|o| SiteRisk {
                station: self.registry.lookup(&o.station_id),
                scored: score_observation(o.clone()),
            })
            .collect();

        let area_name = area.unwrap_or(ALL_AREAS);
        let areas = self
            .registry
            .areas_with_data(all_sites.iter().map(|s| s.station.site_name.as_str()));
        let selected = areas
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(area_name))
            .map(|(_, sites)| sites.clone())
            .unwrap_or_default();

        let mut sites: Vec<SiteRisk> = all_sites
            .iter()
            .filter(|s| selected.contains(&s.station.site_name))
            .cloned()
            .collect();
        if sites.is_empty() {
            sites = all_sites;
        }
        sites.sort_by(|a, b| b.scored.hsri().total_cmp(&a.scored.hsri()));

        let high_risk: Vec<SiteRisk> = sites
            .iter()
            .filter(|s| s.scored.exceeds(self.threshold))
            .cloned()
            .collect();
        let statistics = SnapshotStatistics::from_sites(&sites, self.threshold);

        let scored: Vec<ScoredObservation> = sites.iter().map(|s| s.scored.clone()).collect();
        let network_forecast = self.forecaster.forecast(&scored, MAX_HORIZON_DAYS);
        if let Err(reason) = &network_forecast {
            debug!("No network forecast at {}: {}", timestamp, reason);
        }

        Ok(RiskSnapshot {
            timestamp,
            area: area_name.to_string(),
            threshold: self.threshold,
            sites,
            high_risk,
            statistics,
            network_forecast,
        })
    }

    /// Areas with data at the given instant
    pub fn available_areas(
        &self,
        observations: &[WeatherObservation],
        timestamp: DateTime<Utc>,
    ) -> Vec<String> {
        let names: Vec<String> = observations
            .iter()
            .filter(|o| o.timestamp == timestamp)
            .map(|o| self.registry.lookup(&o.station_id).site_name)
            .collect();
        self.registry
            .areas_with_data(names.iter().map(String::as_str))
            .into_iter()
            .map(|(area, _)| area)
            .collect()
    }
}

impl Default for RiskAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
