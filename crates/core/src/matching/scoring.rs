use crate::domain::product::Product;
use crate::domain::profile::ClientProfile;
use crate::matching::weights::MarketWeights;

const BASE_SCORE: f64 = 50.0;
const RISK_FIT_MAX: i64 = 10;
const RISK_FIT_STEP: i64 = 3;
const LOW_RISK_CEILING: i64 = 6;
const DERIVATIVES_PENALTY: f64 = 20.0;
const SHORT_LOCKUP_DAYS: i64 = 14;
const FEE_PENALTY: f64 = 1000.0;

/// Explainable ranking heuristic. Unbounded, higher is better, and bit-for-bit
/// reproducible for identical inputs. Not a calibrated probability.
pub fn score_product(client: &ClientProfile, product: &Product, weights: &MarketWeights) -> f64 {
    let risk_level = i64::from(product.risk_level);
    let mut score = BASE_SCORE;

    let risk_gap = (i64::from(client.risk_tolerance) - risk_level).abs();
    score += (RISK_FIT_MAX - risk_gap * RISK_FIT_STEP).max(0) as f64;

    if weights.prefer_low_risk > 0.0 {
        score += (LOW_RISK_CEILING - risk_level) as f64 * weights.prefer_low_risk * 2.0;
    }

    if weights.penalize_derivatives > 0.0 && product.derivatives_exposure {
        score -= DERIVATIVES_PENALTY * weights.penalize_derivatives;
    }

    if weights.prefer_short_lockup > 0.0 {
        let headroom = (SHORT_LOCKUP_DAYS - i64::from(product.lockup_days)).max(0);
        score += headroom as f64 * weights.prefer_short_lockup * 0.4;
    }

    score -= product.fee_ratio * FEE_PENALTY;
    score
}
