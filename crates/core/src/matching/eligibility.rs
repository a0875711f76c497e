use crate::domain::product::Product;
use crate::domain::profile::{ClientProfile, LiquidityNeed, ESG_ONLY, NO_DERIVATIVES};
use crate::domain::recommendation::RejectedProduct;

pub const REASON_RISK: &str = "exceeds risk tolerance";
pub const REASON_LIQUIDITY: &str = "liquidity mismatch";
pub const REASON_NO_DERIVATIVES: &str = "constraint violation: No-derivatives";
pub const REASON_ESG_ONLY: &str = "constraint violation: ESG-only";

const REASON_SEPARATOR: &str = "; ";

/// Ceiling used when the liquidity need is not one of the known labels.
pub const DEFAULT_MAX_LOCKUP_DAYS: u32 = 90;

#[derive(Debug, Clone, Default)]
pub struct Eligibility {
    pub eligible: Vec<Product>,
    pub rejected: Vec<RejectedProduct>,
}

pub fn max_lockup_days(liquidity: LiquidityNeed) -> u32 {
    match liquidity {
        LiquidityNeed::Low => 14,
        LiquidityNeed::Med => 90,
        LiquidityNeed::High => 3650,
        LiquidityNeed::Unrecognized => DEFAULT_MAX_LOCKUP_DAYS,
    }
}

/// Partitions the catalog, preserving catalog order on both sides.
/// Every triggered rule is reported, not just the first.
pub fn filter_eligible(client: &ClientProfile, products: &[Product]) -> Eligibility {
    let max_lock = max_lockup_days(client.liquidity_need);
    let no_derivatives = client.has_constraint(NO_DERIVATIVES);
    let esg_only = client.has_constraint(ESG_ONLY);

    let mut out = Eligibility::default();
    for product in products {
        let mut reasons = Vec::new();

        if product.risk_level > client.risk_tolerance {
            reasons.push(REASON_RISK);
        }
        if product.lockup_days > max_lock {
            reasons.push(REASON_LIQUIDITY);
        }
        if no_derivatives && product.derivatives_exposure {
            reasons.push(REASON_NO_DERIVATIVES);
        }
        if esg_only && !product.esg {
            reasons.push(REASON_ESG_ONLY);
        }

        if reasons.is_empty() {
            out.eligible.push(product.clone());
        } else {
            out.rejected.push(RejectedProduct {
                product_id: product.product_id.clone(),
                reason: reasons.join(REASON_SEPARATOR),
            });
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::Goal;
    use std::collections::BTreeSet;

    fn client(risk_tolerance: i32, liquidity_need: LiquidityNeed, constraints: &[&str]) -> ClientProfile {
        ClientProfile {
            client_id: "c1".to_string(),
            risk_tolerance,
            horizon_months: 24,
            goal: Goal::Income,
            liquidity_need,
            constraints: constraints.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
        }
    }

    fn product(id: &str, risk_level: i32, lockup_days: u32, derivatives: bool, esg: bool) -> Product {
        Product {
            product_id: id.to_string(),
            name: format!("Product {id}"),
            kind: "fund".to_string(),
            risk_level,
            lockup_days,
            fee_ratio: 0.005,
            derivatives_exposure: derivatives,
            esg,
        }
    }

    #[test]
    fn liquidity_ceilings() {
        assert_eq!(max_lockup_days(LiquidityNeed::Low), 14);
        assert_eq!(max_lockup_days(LiquidityNeed::Med), 90);
        assert_eq!(max_lockup_days(LiquidityNeed::High), 3650);
        assert_eq!(max_lockup_days(LiquidityNeed::Unrecognized), 90);
    }

    #[test]
    fn risk_above_tolerance_is_never_eligible() {
        let products: Vec<_> = (1..=5).map(|r| product(&format!("p{r}"), r, 0, false, true)).collect();
        for tolerance in 1..=5 {
            let out = filter_eligible(&client(tolerance, LiquidityNeed::High, &[]), &products);
            assert!(out.eligible.iter().all(|p| p.risk_level <= tolerance));
            assert_eq!(out.eligible.len(), tolerance as usize);
            for r in &out.rejected {
                assert!(r.reason.contains(REASON_RISK));
            }
        }
    }

    #[test]
    fn accumulates_risk_and_liquidity_reasons() {
        let out = filter_eligible(
            &client(1, LiquidityNeed::Low, &[]),
            &[product("opp_002", 5, 180, true, false)],
        );
        assert!(out.eligible.is_empty());
        assert_eq!(out.rejected.len(), 1);
        assert_eq!(out.rejected[0].product_id, "opp_002");
        assert_eq!(
            out.rejected[0].reason,
            "exceeds risk tolerance; liquidity mismatch"
        );
    }

    #[test]
    fn lockup_equal_to_ceiling_is_allowed() {
        let out = filter_eligible(
            &client(5, LiquidityNeed::Low, &[]),
            &[product("a", 1, 14, false, false), product("b", 1, 15, false, false)],
        );
        assert_eq!(out.eligible.len(), 1);
        assert_eq!(out.eligible[0].product_id, "a");
        assert_eq!(out.rejected[0].reason, REASON_LIQUIDITY);
    }

    #[test]
    fn unrecognized_liquidity_uses_med_ceiling() {
        let out = filter_eligible(
            &client(5, LiquidityNeed::Unrecognized, &[]),
            &[product("a", 1, 90, false, false), product("b", 1, 91, false, false)],
        );
        assert_eq!(out.eligible.len(), 1);
        assert_eq!(out.rejected[0].product_id, "b");
    }

    #[test]
    fn no_derivatives_constraint_rejects_regardless_of_fit() {
        let out = filter_eligible(
            &client(5, LiquidityNeed::High, &[NO_DERIVATIVES]),
            &[product("d", 1, 1, true, true), product("plain", 1, 1, false, true)],
        );
        assert_eq!(out.eligible.len(), 1);
        assert_eq!(out.eligible[0].product_id, "plain");
        assert_eq!(out.rejected[0].reason, REASON_NO_DERIVATIVES);
    }

    #[test]
    fn esg_only_constraint_rejects_non_esg() {
        let out = filter_eligible(
            &client(5, LiquidityNeed::High, &[ESG_ONLY, NO_DERIVATIVES]),
            &[product("x", 5, 4000, true, false)],
        );
        assert_eq!(
            out.rejected[0].reason,
            "liquidity mismatch; constraint violation: No-derivatives; constraint violation: ESG-only"
        );
    }

    #[test]
    fn preserves_catalog_order() {
        let products = vec![
            product("a", 1, 0, false, false),
            product("b", 5, 0, false, false),
            product("c", 2, 0, false, false),
            product("d", 4, 0, false, false),
        ];
        let out = filter_eligible(&client(2, LiquidityNeed::High, &[]), &products);
        let eligible: Vec<_> = out.eligible.iter().map(|p| p.product_id.as_str()).collect();
        let rejected: Vec<_> = out.rejected.iter().map(|r| r.product_id.as_str()).collect();
        assert_eq!(eligible, ["a", "c"]);
        assert_eq!(rejected, ["b", "d"]);
    }
}
