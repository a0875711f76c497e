//! Deterministic half of the pipeline: suitability rules, regime weights and the ranking score.

pub mod eligibility;
pub mod scoring;
pub mod weights;

pub use eligibility::{filter_eligible, Eligibility};
pub use scoring::score_product;
pub use weights::{resolve_market_weights, MarketWeights};
