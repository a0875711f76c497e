use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketContext {
    #[serde(default)]
    pub interest_rate_trend: RateTrend,
    #[serde(default)]
    pub volatility_level: VolatilityLevel,
    #[serde(default)]
    pub macro_theme: Option<String>,
}

impl Default for MarketContext {
    fn default() -> Self {
        Self {
            interest_rate_trend: RateTrend::Stable,
            volatility_level: VolatilityLevel::Medium,
            macro_theme: None,
        }
    }
}

impl MarketContext {
    pub fn new(interest_rate_trend: RateTrend, volatility_level: VolatilityLevel) -> Self {
        Self {
            interest_rate_trend,
            volatility_level,
            macro_theme: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateTrend {
    Rising,
    #[default]
    Stable,
    Falling,
    #[serde(other)]
    Unrecognized,
}

impl RateTrend {
    pub fn as_str(self) -> &'static str {
        match self {
            RateTrend::Rising => "rising",
            RateTrend::Stable => "stable",
            RateTrend::Falling => "falling",
            RateTrend::Unrecognized => "unrecognized",
        }
    }
}

impl fmt::Display for RateTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolatilityLevel {
    Low,
    #[default]
    Medium,
    High,
    #[serde(other)]
    Unrecognized,
}

impl VolatilityLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            VolatilityLevel::Low => "low",
            VolatilityLevel::Medium => "medium",
            VolatilityLevel::High => "high",
            VolatilityLevel::Unrecognized => "unrecognized",
        }
    }
}

impl fmt::Display for VolatilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
