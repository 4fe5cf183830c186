//! Simple-filter operator tables
//!
//! Text filters support equality, regex and blank operators; number and
//! date filters share the comparison/range table.

use super::model::SimpleFilterType;
use crate::error::QueryError;
use mongodb::bson::{doc, Bson, Document};
use serde_json::Value;

/// Operators a simple filter may name in its `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimpleOperator {
    Equals,
    NotEqual,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    InRange,
    Blank,
    NotBlank,
    True,
    False,
}

impl SimpleOperator {
    pub fn parse(raw: &str) -> Option<Self> {
        let op = match raw {
            "equals" => SimpleOperator::Equals,
            "notEqual" => SimpleOperator::NotEqual,
            "contains" => SimpleOperator::Contains,
            "notContains" => SimpleOperator::NotContains,
            "startsWith" => SimpleOperator::StartsWith,
            "endsWith" => SimpleOperator::EndsWith,
            "lessThan" => SimpleOperator::LessThan,
            "lessThanOrEqual" => SimpleOperator::LessThanOrEqual,
            "greaterThan" => SimpleOperator::GreaterThan,
            "greaterThanOrEqual" => SimpleOperator::GreaterThanOrEqual,
            "inRange" => SimpleOperator::InRange,
            "blank" => SimpleOperator::Blank,
            "notBlank" => SimpleOperator::NotBlank,
            "true" => SimpleOperator::True,
            "false" => SimpleOperator::False,
            _ => return None,
        };
        Some(op)
    }
}

/// Operands of one simple filter
pub(crate) struct Operands<'a> {
    pub column: &'a str,
    pub filter: Option<&'a Value>,
    pub filter_to: Option<&'a Value>,
}

/// Build the condition for a simple filter on one column
pub(crate) fn simple_condition(
    filter_type: SimpleFilterType,
    operator: &str,
    operands: &Operands<'_>,
) -> Result<Document, QueryError> {
    let unsupported = || QueryError::UnsupportedOperator {
        operator: operator.to_string(),
        filter_type: filter_type.as_str().to_string(),
    };
    let op = SimpleOperator::parse(operator).ok_or_else(unsupported)?;

    if let Some(condition) = shared_condition(op, operands)? {
        return Ok(condition);
    }

    match filter_type {
        SimpleFilterType::Text => text_condition(op, operands)?,
        SimpleFilterType::Number | SimpleFilterType::Date => number_condition(op, operands)?,
    }
    .ok_or_else(unsupported)
}

/// Operators with the same meaning for every filter type
fn shared_condition(
    op: SimpleOperator,
    operands: &Operands<'_>,
) -> Result<Option<Document>, QueryError> {
    let column = operands.column;
    let condition = match op {
        SimpleOperator::Equals => on_column(column, filter_value(operands)?),
        SimpleOperator::NotEqual => on_column(column, doc! { "$ne": filter_value(operands)? }),
        // `$empty` is not a server operator; the shape is what existing
        // consumers of `blank` already receive.
        SimpleOperator::Blank => doc! {
            "$or": [
                on_column(column, doc! { "$empty": true, "$eq": "" }),
                on_column(column, doc! { "$empty": false }),
            ]
        },
        SimpleOperator::NotBlank => on_column(column, doc! { "$exists": true, "$ne": "" }),
        SimpleOperator::True => on_column(column, true),
        SimpleOperator::False => on_column(column, false),
        _ => return Ok(None),
    };
    Ok(Some(condition))
}

fn text_condition(
    op: SimpleOperator,
    operands: &Operands<'_>,
) -> Result<Option<Document>, QueryError> {
    let column = operands.column;
    let condition = match op {
        SimpleOperator::Contains => on_column(column, regex(pattern(operands)?.to_string())),
        SimpleOperator::NotContains => on_column(
            column,
            doc! { "$not": regex(pattern(operands)?.to_string()) },
        ),
        SimpleOperator::StartsWith => {
            on_column(column, regex(format!("^{}", pattern(operands)?)))
        }
        SimpleOperator::EndsWith => {
            on_column(column, regex(format!("{}$", pattern(operands)?)))
        }
        _ => return Ok(None),
    };
    Ok(Some(condition))
}

fn number_condition(
    op: SimpleOperator,
    operands: &Operands<'_>,
) -> Result<Option<Document>, QueryError> {
    let column = operands.column;
    let comparison = |token: &str| -> Result<Document, QueryError> {
        let mut cmp = Document::new();
        cmp.insert(token, filter_value(operands)?);
        Ok(on_column(column, cmp))
    };
    let condition = match op {
        SimpleOperator::LessThan => comparison("$lt")?,
        SimpleOperator::LessThanOrEqual => comparison("$lte")?,
        SimpleOperator::GreaterThan => comparison("$gt")?,
        SimpleOperator::GreaterThanOrEqual => comparison("$gte")?,
        // Exclusive on both ends.
        SimpleOperator::InRange => {
            let upper = to_bson(column, require(column, "filterTo", operands.filter_to)?)?;
            doc! {
                "$and": [
                    on_column(column, doc! { "$lt": upper }),
                    on_column(column, doc! { "$gt": filter_value(operands)? }),
                ]
            }
        }
        _ => return Ok(None),
    };
    Ok(Some(condition))
}

/// `{column: condition}`
pub(crate) fn on_column(column: &str, condition: impl Into<Bson>) -> Document {
    let mut doc = Document::new();
    doc.insert(column, condition);
    doc
}

fn regex(pattern: String) -> Document {
    doc! { "$regex": pattern, "$options": "i" }
}

fn filter_value(operands: &Operands<'_>) -> Result<Bson, QueryError> {
    to_bson(
        operands.column,
        require(operands.column, "filter", operands.filter)?,
    )
}

fn pattern<'a>(operands: &Operands<'a>) -> Result<&'a str, QueryError> {
    require(operands.column, "filter", operands.filter)?
        .as_str()
        .ok_or_else(|| QueryError::InvalidValue {
            column: operands.column.to_string(),
            reason: "text search value must be a string".to_string(),
        })
}

fn require<'a>(
    column: &str,
    field: &str,
    value: Option<&'a Value>,
) -> Result<&'a Value, QueryError> {
    value.ok_or_else(|| QueryError::MissingField {
        column: column.to_string(),
        field: field.to_string(),
    })
}

/// Convert a raw JSON filter value to BSON
pub(crate) fn to_bson(column: &str, value: &Value) -> Result<Bson, QueryError> {
    mongodb::bson::to_bson(value)
        .map_err(|e| QueryError::Conversion(format!("column '{}': {}", column, e)))
}
