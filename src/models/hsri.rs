use serde::{Deserialize, Serialize};

use crate::models::WeatherObservation;
use crate::utils::constants::{
    COOL_THRESHOLD, CRITICAL_THRESHOLD, HIGH_THRESHOLD, LOW_THRESHOLD, MODERATE_THRESHOLD,
};

/// Heat risk categories, lowest first so that `Ord` follows severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    Freezing,
    Cool,
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskTier {
    /// All tiers, most severe first
    pub const ALL: [RiskTier; 6] = [
        RiskTier::Critical,
        RiskTier::High,
        RiskTier::Moderate,
        RiskTier::Low,
        RiskTier::Cool,
        RiskTier::Freezing,
    ];

    /// Closed-below thresholds. NaN lands in `Freezing`.
    pub fn from_hsri(hsri: f64) -> Self {
        RiskTier::ALL
            .into_iter()
            .find(|tier| tier.lower_bound().is_some_and(|bound| hsri >= bound))
            .unwrap_or(RiskTier::Freezing)
    }

    /// Inclusive lower bound, `None` for the open-ended bottom tier
    pub fn lower_bound(&self) -> Option<f64> {
        match self {
            RiskTier::Critical => Some(CRITICAL_THRESHOLD),
            RiskTier::High => Some(HIGH_THRESHOLD),
            RiskTier::Moderate => Some(MODERATE_THRESHOLD),
            RiskTier::Low => Some(LOW_THRESHOLD),
            RiskTier::Cool => Some(COOL_THRESHOLD),
            RiskTier::Freezing => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RiskTier::Critical => "CRITICAL",
            RiskTier::High => "HIGH",
            RiskTier::Moderate => "MODERATE",
            RiskTier::Low => "LOW",
            RiskTier::Cool => "COOL",
            RiskTier::Freezing => "FREEZING",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::Critical => "Critical Heat",
            RiskTier::High => "High Heat",
            RiskTier::Moderate => "Moderate Heat",
            RiskTier::Low => "Mild",
            RiskTier::Cool => "Cool",
            RiskTier::Freezing => "Freezing",
        }
    }

    /// Next tier up, `None` for `Critical`
    fn next_higher(&self) -> Option<RiskTier> {
        let index = RiskTier::ALL.iter().position(|tier| tier == self)?;
        index.checked_sub(1).map(|i| RiskTier::ALL[i])
    }

    /// Legend text such as `75-84`, `85+` or `<30`
    pub fn range_text(&self) -> String {
        let upper = self.next_higher().and_then(|tier| tier.lower_bound());
        match (self.lower_bound(), upper) {
            (Some(lower), Some(upper)) => format!("{:.0}-{:.0}", lower, upper - 1.0),
            (Some(lower), None) => format!("{:.0}+", lower),
            (None, Some(upper)) => format!("<{:.0}", upper),
            (None, None) => "any".to_string(),
        }
    }

    /// Protective clothing guide shown alongside the legend
    pub fn clothing_guidance(&self) -> &'static str {
        match self {
            RiskTier::Critical => "Shorts + Tank",
            RiskTier::High => "Shorts + T-Shirt",
            RiskTier::Moderate => "Short Sleeves",
            RiskTier::Low => "Light Layers",
            RiskTier::Cool => "Light Jacket",
            RiskTier::Freezing => "Winter Coat",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        RiskTier::ALL
            .into_iter()
            .find(|tier| tier.name().eq_ignore_ascii_case(s.trim()))
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HsriResult {
    /// Base heat index (°F) before the radiation/wind/cloud adjustments
    pub heat_index: f64,
    /// Clamped to [-100, 100]
    pub hsri: f64,
    pub risk_tier: RiskTier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredObservation {
    pub observation: WeatherObservation,
    pub result: HsriResult,
}

impl ScoredObservation {
    pub fn new(observation: WeatherObservation, result: HsriResult) -> Self {
        Self {
            observation,
            result,
        }
    }

    pub fn hsri(&self) -> f64 {
        self.result.hsri
    }

    pub fn risk_tier(&self) -> RiskTier {
        self.result.risk_tier
    }

    pub fn exceeds(&self, threshold: f64) -> bool {
        self.result.hsri >= threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries_are_closed_below() {
        assert_eq!(RiskTier::from_hsri(85.0), RiskTier::Critical);
        assert_eq!(RiskTier::from_hsri(84.999), RiskTier::High);
        assert_eq!(RiskTier::from_hsri(75.0), RiskTier::High);
        assert_eq!(RiskTier::from_hsri(74.999), RiskTier::Moderate);
        assert_eq!(RiskTier::from_hsri(65.0), RiskTier::Moderate);
        assert_eq!(RiskTier::from_hsri(64.999), RiskTier::Low);
        assert_eq!(RiskTier::from_hsri(50.0), RiskTier::Low);
        assert_eq!(RiskTier::from_hsri(49.999), RiskTier::Cool);
        assert_eq!(RiskTier::from_hsri(30.0), RiskTier::Cool);
        assert_eq!(RiskTier::from_hsri(29.999), RiskTier::Freezing);
    }

    #[test]
    fn test_tiers_partition_the_real_line() {
        assert_eq!(RiskTier::from_hsri(f64::INFINITY), RiskTier::Critical);
        assert_eq!(RiskTier::from_hsri(1e9), RiskTier::Critical);
        assert_eq!(RiskTier::from_hsri(-1e9), RiskTier::Freezing);
        assert_eq!(RiskTier::from_hsri(f64::NEG_INFINITY), RiskTier::Freezing);
        assert_eq!(RiskTier::from_hsri(f64::NAN), RiskTier::Freezing);

        // Each score falls in exactly one [lower, upper) interval
        let intervals = [
            (RiskTier::Critical, 85.0, f64::INFINITY),
            (RiskTier::High, 75.0, 85.0),
            (RiskTier::Moderate, 65.0, 75.0),
            (RiskTier::Low, 50.0, 65.0),
            (RiskTier::Cool, 30.0, 50.0),
            (RiskTier::Freezing, f64::NEG_INFINITY, 30.0),
        ];
        let mut value = -120.0;
        while value <= 120.0 {
            let matching: Vec<RiskTier> = intervals
                .iter()
                .filter(|(_, lower, upper)| value >= *lower && value < *upper)
                .map(|(tier, _, _)| *tier)
                .collect();
            assert_eq!(matching, vec![RiskTier::from_hsri(value)], "value {}", value);
            value += 0.25;
        }
    }

    #[test]
    fn test_tier_ordering_follows_severity() {
        assert!(RiskTier::Critical > RiskTier::High);
        assert!(RiskTier::High > RiskTier::Moderate);
        assert!(RiskTier::Moderate > RiskTier::Low);
        assert!(RiskTier::Low > RiskTier::Cool);
        assert!(RiskTier::Cool > RiskTier::Freezing);
    }

    #[test]
    fn test_tier_parse_and_display() {
        for tier in RiskTier::ALL {
            assert_eq!(RiskTier::parse(&tier.to_string()), Some(tier));
        }
        assert_eq!(RiskTier::parse("critical"), Some(RiskTier::Critical));
        assert_eq!(RiskTier::parse("scorching"), None);
        assert_eq!(RiskTier::Low.label(), "Mild");
        assert_eq!(RiskTier::Freezing.clothing_guidance(), "Winter Coat");
    }

    #[test]
    fn test_range_text_follows_thresholds() {
        let legend: Vec<String> = RiskTier::ALL.iter().map(|t| t.range_text()).collect();
        assert_eq!(legend, vec!["85+", "75-84", "65-74", "50-64", "30-49", "<30"]);
    }

    #[test]
    fn test_lower_bound_is_in_its_own_tier() {
        for tier in RiskTier::ALL {
            match tier.lower_bound() {
                Some(bound) => {
                    assert_eq!(RiskTier::from_hsri(bound), tier);
                    assert!(RiskTier::from_hsri(bound - 0.001) < tier);
                }
                None => assert_eq!(tier, RiskTier::Freezing),
            }
        }
    }
}
