pub mod risk_analyzer;

pub use risk_analyzer::{
    closest_timestamp, HealthcareAlert, OutlookSummary, RiskAnalyzer, RiskSnapshot, SiteRisk,
    SnapshotStatistics,
};
