use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Constraint name excluding any product with derivatives exposure.
pub const NO_DERIVATIVES: &str = "No-derivatives";

/// Constraint name excluding any product without the ESG flag.
pub const ESG_ONLY: &str = "ESG-only";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientProfile {
    #[serde(default = "default_client_id")]
    pub client_id: String,
    /// Ordinal 1..=5; range is enforced by request validation, not here.
    pub risk_tolerance: i32,
    pub horizon_months: i32,
    pub goal: Goal,
    pub liquidity_need: LiquidityNeed,
    #[serde(default)]
    pub constraints: BTreeSet<String>,
}

fn default_client_id() -> String {
    "demo_client".to_string()
}

impl ClientProfile {
    pub fn has_constraint(&self, name: &str) -> bool {
        self.constraints.contains(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Goal {
    Income,
    Growth,
    Preservation,
    #[serde(other)]
    Unrecognized,
}

impl Goal {
    pub fn as_str(self) -> &'static str {
        match self {
            Goal::Income => "Income",
            Goal::Growth => "Growth",
            Goal::Preservation => "Preservation",
            Goal::Unrecognized => "Unrecognized",
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiquidityNeed {
    Low,
    Med,
    High,
    #[serde(other)]
    Unrecognized,
}

impl LiquidityNeed {
    pub fn as_str(self) -> &'static str {
        match self {
            LiquidityNeed::Low => "Low",
            LiquidityNeed::Med => "Med",
            LiquidityNeed::High => "High",
            LiquidityNeed::Unrecognized => "Unrecognized",
        }
    }
}

impl fmt::Display for LiquidityNeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
