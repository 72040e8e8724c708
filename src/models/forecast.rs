use serde::{Deserialize, Serialize};

use crate::models::RiskTier;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub day_offset: u32,
    pub predicted_hsri: f64,
}

impl ForecastPoint {
    pub fn risk_tier(&self) -> RiskTier {
        RiskTier::from_hsri(self.predicted_hsri)
    }
}

/// Daily projections ordered by `day_offset`, starting at 1
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    pub points: Vec<ForecastPoint>,
}

impl ForecastSeries {
    pub fn new(points: Vec<ForecastPoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn day(&self, day_offset: u32) -> Option<&ForecastPoint> {
        self.points.iter().find(|p| p.day_offset == day_offset)
    }

    pub fn peak(&self) -> Option<&ForecastPoint> {
        self.points
            .iter()
            .max_by(|a, b| a.predicted_hsri.total_cmp(&b.predicted_hsri))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ForecastPoint> {
        self.points.iter()
    }
}

/// Why no forecast was produced. Not an error: callers are expected to
/// skip rendering a projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ForecastUnavailable {
    InsufficientHistory { available: usize, required: usize },
    EmptyFeature { column: String },
    DegenerateFit,
}

impl std::fmt::Display for ForecastUnavailable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForecastUnavailable::InsufficientHistory {
                available,
                required,
            } => write!(
                f,
                "insufficient history ({} records, {} required)",
                available, required
            ),
            ForecastUnavailable::EmptyFeature { column } => {
                write!(f, "no values present for feature '{}'", column)
            }
            ForecastUnavailable::DegenerateFit => write!(f, "regression fit is degenerate"),
        }
    }
}
