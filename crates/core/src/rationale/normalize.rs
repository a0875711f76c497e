//! Contract boundary between generated output and the rest of the system.
//!
//! Whatever the generative component returns, these functions produce a value that satisfies
//! the rationale schema. They never fail.

use crate::domain::recommendation::{AuditResult, RationaleDraft};
use serde_json::{Map, Value};

pub const FALLBACK_CLIENT_FIT: &str =
    "Insufficient structured output; unable to generate a reliable client-fit rationale.";
pub const FALLBACK_MARKET_FIT: &str =
    "Insufficient structured output; unable to generate a reliable market-fit rationale.";
pub const FALLBACK_KEY_RISK: &str =
    "Insufficient structured output; risks could not be fully extracted.";
pub const FALLBACK_NOT_FOR: &str =
    "Insufficient structured output; unsuitable client types could not be determined.";

pub fn fallback_rationale() -> RationaleDraft {
    normalize_rationale(&Value::Object(Map::new()))
}

pub fn normalize_rationale(data: &Value) -> RationaleDraft {
    let empty = Map::new();
    let obj = data.as_object().unwrap_or(&empty);

    RationaleDraft {
        why_client_fit: text_or(obj.get("why_client_fit"), FALLBACK_CLIENT_FIT),
        why_market_fit: text_or(obj.get("why_market_fit"), FALLBACK_MARKET_FIT),
        key_risks: text_list_or(obj.get("key_risks"), FALLBACK_KEY_RISK),
        who_should_not_buy: text_list_or(obj.get("who_should_not_buy"), FALLBACK_NOT_FOR),
    }
}

/// A missing or wrongly typed `is_ok` approves the draft: an audit failure must not block.
pub fn normalize_audit(data: &Value) -> AuditResult {
    let empty = Map::new();
    let obj = data.as_object().unwrap_or(&empty);

    let is_ok = obj.get("is_ok").and_then(Value::as_bool).unwrap_or(true);
    let issues = obj
        .get("issues")
        .and_then(strings)
        .unwrap_or_default();
    let revised = normalize_rationale(obj.get("revised").unwrap_or(&Value::Null));

    AuditResult {
        is_ok,
        issues,
        revised,
    }
}

fn text_or(v: Option<&Value>, fallback: &str) -> String {
    match v.and_then(Value::as_str).map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => fallback.to_string(),
    }
}

fn text_list_or(v: Option<&Value>, fallback: &str) -> Vec<String> {
    match v.and_then(strings) {
        Some(list) if !list.is_empty() && list.iter().all(|s| !s.trim().is_empty()) => list,
        _ => vec![fallback.to_string()],
    }
}

/// `Some` only when `v` is an array made entirely of strings.
fn strings(v: &Value) -> Option<Vec<String>> {
    v.as_array()?
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}
