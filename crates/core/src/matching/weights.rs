use crate::domain::market::{MarketContext, RateTrend, VolatilityLevel};
use serde::Serialize;

const HIGH_VOLATILITY_BUMP: f64 = 0.6;
const RISING_RATES_BUMP: f64 = 0.4;

/// Scoring adjustments implied by the market regime. All weights are non-negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MarketWeights {
    pub prefer_low_risk: f64,
    pub penalize_derivatives: f64,
    pub prefer_short_lockup: f64,
}

pub fn resolve_market_weights(market: &MarketContext) -> MarketWeights {
    let mut w = MarketWeights::default();

    if market.volatility_level == VolatilityLevel::High {
        w.prefer_low_risk += HIGH_VOLATILITY_BUMP;
        w.penalize_derivatives += HIGH_VOLATILITY_BUMP;
    }

    if market.interest_rate_trend == RateTrend::Rising {
        w.prefer_short_lockup += RISING_RATES_BUMP;
    }

    w
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_volatility_and_rising_rates() {
        let w = resolve_market_weights(&MarketContext::new(RateTrend::Rising, VolatilityLevel::High));
        assert_eq!(
            w,
            MarketWeights {
                prefer_low_risk: 0.6,
                penalize_derivatives: 0.6,
                prefer_short_lockup: 0.4,
            }
        );
    }

    #[test]
    fn calm_regimes_are_neutral() {
        for trend in [RateTrend::Stable, RateTrend::Falling, RateTrend::Unrecognized] {
            for vol in [VolatilityLevel::Low, VolatilityLevel::Medium, VolatilityLevel::Unrecognized] {
                let w = resolve_market_weights(&MarketContext::new(trend, vol));
                assert_eq!(w, MarketWeights::default());
            }
        }
    }

    #[test]
    fn rising_rates_alone_only_touch_lockup() {
        let w = resolve_market_weights(&MarketContext::new(RateTrend::Rising, VolatilityLevel::Low));
        assert_eq!(w.prefer_low_risk, 0.0);
        assert_eq!(w.penalize_derivatives, 0.0);
        assert_eq!(w.prefer_short_lockup, 0.4);
    }
}
