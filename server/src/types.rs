use serde::Deserialize;
use utoipa::ToSchema;

/// Recipe attributes as sent by clients.
/// Used for: the POST body (all fields required) and the PATCH body (any subset).
/// Presence and content are checked in [`crate::validation`].
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RecipeFields {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub making_time: Option<String>,
    #[serde(default)]
    pub serves: Option<String>,
    #[serde(default)]
    pub ingredients: Option<String>,
    #[serde(default)]
    pub cost: Option<CostValue>,
}

/// `cost` may arrive as a JSON number or as a numeric string.
///
/// Any JSON number is accepted here so that `100.0` or an oversized integer
/// reaches validation instead of failing the whole body.
#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum CostValue {
    #[schema(value_type = f64)]
    Number(serde_json::Number),
    Text(String),
}
