use crate::domain::market::{MarketContext, RateTrend, VolatilityLevel};
use crate::domain::profile::{ClientProfile, Goal, LiquidityNeed};
use crate::domain::recommendation::RecommendRequest;
use std::fmt;

pub const RISK_TOLERANCE_RANGE: std::ops::RangeInclusive<i32> = 1..=5;
pub const HORIZON_MONTHS_RANGE: std::ops::RangeInclusive<i32> = 1..=600;
pub const TOP_K_RANGE: std::ops::RangeInclusive<usize> = 1..=50;

/// An inbound field that failed validation. Raised before any filtering happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub detail: String,
}

impl ValidationError {
    fn new(field: &'static str, detail: impl Into<String>) -> Self {
        Self {
            field,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {}", self.field, self.detail)
    }
}

impl std::error::Error for ValidationError {}

impl RecommendRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.client.validate()?;
        self.market.validate()?;
        if !TOP_K_RANGE.contains(&self.top_k) {
            return Err(ValidationError::new(
                "top_k",
                format!(
                    "must be between {} and {} (got {})",
                    TOP_K_RANGE.start(),
                    TOP_K_RANGE.end(),
                    self.top_k
                ),
            ));
        }
        Ok(())
    }
}

impl ClientProfile {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !RISK_TOLERANCE_RANGE.contains(&self.risk_tolerance) {
            return Err(ValidationError::new(
                "client.risk_tolerance",
                format!("must be between 1 and 5 (got {})", self.risk_tolerance),
            ));
        }
        if !HORIZON_MONTHS_RANGE.contains(&self.horizon_months) {
            return Err(ValidationError::new(
                "client.horizon_months",
                format!("must be between 1 and 600 (got {})", self.horizon_months),
            ));
        }
        if self.goal == Goal::Unrecognized {
            return Err(ValidationError::new(
                "client.goal",
                "must be one of Income, Growth, Preservation",
            ));
        }
        if self.liquidity_need == LiquidityNeed::Unrecognized {
            return Err(ValidationError::new(
                "client.liquidity_need",
                "must be one of Low, Med, High",
            ));
        }
        Ok(())
    }
}

impl MarketContext {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.interest_rate_trend == RateTrend::Unrecognized {
            return Err(ValidationError::new(
                "market.interest_rate_trend",
                "must be one of rising, stable, falling",
            ));
        }
        if self.volatility_level == VolatilityLevel::Unrecognized {
            return Err(ValidationError::new(
                "market.volatility_level",
                "must be one of low, medium, high",
            ));
        }
        Ok(())
    }
}
