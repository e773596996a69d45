//! Turns client-supplied [`RecipeFields`] into values the store accepts.

use crate::models::{NewRecipe, RecipePatch};
use crate::types::{CostValue, RecipeFields};
use serde_json::Number;
use std::num::IntErrorKind;
use thiserror::Error;

pub const REQUIRED_FIELDS: &str = "title, making_time, serves, ingredients, cost";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Request body must be a JSON object: {0}")]
    MalformedBody(String),

    #[error("Missing required field: {0}")]
    Missing(&'static str),

    #[error("Field cannot be empty: {0}")]
    Empty(&'static str),

    #[error("cost must be an integer, got {0:?}")]
    CostNotNumeric(String),

    #[error("cost must be greater than zero, got {0}")]
    CostNotPositive(i64),

    #[error("cost is out of range: {0}")]
    CostOutOfRange(String),

    #[error("No updatable fields supplied, expected any of: {REQUIRED_FIELDS}")]
    NoFields,
}

impl TryFrom<RecipeFields> for NewRecipe {
    type Error = ValidationError;

    fn try_from(fields: RecipeFields) -> Result<Self, Self::Error> {
        Ok(NewRecipe {
            title: required_text("title", fields.title)?,
            making_time: required_text("making_time", fields.making_time)?,
            serves: required_text("serves", fields.serves)?,
            ingredients: required_text("ingredients", fields.ingredients)?,
            cost: parse_cost(fields.cost.ok_or(ValidationError::Missing("cost"))?)?,
        })
    }
}

impl TryFrom<RecipeFields> for RecipePatch {
    type Error = ValidationError;

    fn try_from(fields: RecipeFields) -> Result<Self, Self::Error> {
        let patch = RecipePatch {
            title: optional_text("title", fields.title)?,
            making_time: optional_text("making_time", fields.making_time)?,
            serves: optional_text("serves", fields.serves)?,
            ingredients: optional_text("ingredients", fields.ingredients)?,
            cost: fields.cost.map(parse_cost).transpose()?,
        };

        if patch.is_empty() {
            return Err(ValidationError::NoFields);
        }
        Ok(patch)
    }
}

fn required_text(field: &'static str, value: Option<String>) -> Result<String, ValidationError> {
    optional_text(field, value)?.ok_or(ValidationError::Missing(field))
}

fn optional_text(
    field: &'static str,
    value: Option<String>,
) -> Result<Option<String>, ValidationError> {
    match value {
        Some(v) if v.trim().is_empty() => Err(ValidationError::Empty(field)),
        other => Ok(other),
    }
}

fn parse_cost(value: CostValue) -> Result<i32, ValidationError> {
    let cost = match value {
        CostValue::Number(number) => integral(&number)?,
        CostValue::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Err(ValidationError::Empty("cost"));
            }
            trimmed.parse::<i64>().map_err(|e| match e.kind() {
                IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
                    ValidationError::CostOutOfRange(trimmed.to_string())
                }
                _ => ValidationError::CostNotNumeric(text.clone()),
            })?
        }
    };

    if cost <= 0 {
        return Err(ValidationError::CostNotPositive(cost));
    }
    i32::try_from(cost).map_err(|_| ValidationError::CostOutOfRange(cost.to_string()))
}

/// Whole-valued JSON numbers, including ones written with a fraction like `100.0`.
fn integral(number: &Number) -> Result<i64, ValidationError> {
    if let Some(n) = number.as_i64() {
        return Ok(n);
    }
    if number.is_u64() {
        return Err(ValidationError::CostOutOfRange(number.to_string()));
    }

    let Some(value) = number.as_f64() else {
        return Err(ValidationError::CostNotNumeric(number.to_string()));
    };
    if value.fract() != 0.0 {
        return Err(ValidationError::CostNotNumeric(number.to_string()));
    }
    if value < i64::MIN as f64 || value >= i64::MAX as f64 {
        return Err(ValidationError::CostOutOfRange(number.to_string()));
    }
    Ok(value as i64)
}
