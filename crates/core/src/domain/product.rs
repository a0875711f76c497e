use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub risk_level: i32,
    pub lockup_days: u32,
    #[serde(alias = "fees")]
    pub fee_ratio: f64,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub derivatives_exposure: bool,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub esg: bool,
}

/// Accepts booleans or case-insensitive "true". Anything else, numbers included, reads as false.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(b)) => b,
        Some(Flag::Text(s)) => s.trim().eq_ignore_ascii_case("true"),
        Some(Flag::Other(_)) | None => false,
    })
}
