//! Grid request schema
//!
//! Server-side row model request sent by an AG Grid style table: pagination
//! bounds, per-column filters, sort directives and the value-column
//! allow-list. Wire names are camelCase.

use crate::error::{Error, QueryError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Table request payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridTableRequest {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_records")]
    pub records: i64,
    #[serde(default)]
    pub filters: Option<GridFilterModel>,
    #[serde(default)]
    pub global_filters: Map<String, Value>,
    #[serde(default)]
    pub start_row: i64,
    #[serde(default = "default_end_row")]
    pub end_row: i64,
}

fn default_page() -> i64 {
    1
}

fn default_records() -> i64 {
    50
}

fn default_end_row() -> i64 {
    100
}

impl Default for GridTableRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            records: default_records(),
            filters: None,
            global_filters: Map::new(),
            start_row: 0,
            end_row: default_end_row(),
        }
    }
}

impl GridTableRequest {
    /// Parse a JSON payload
    pub fn from_json(payload: &str) -> Result<Self> {
        serde_json::from_str(payload).map_err(|e| Error::InvalidRequest(e.to_string()))
    }

    /// Convert an already-parsed JSON value
    pub fn from_value(payload: Value) -> Result<Self> {
        serde_json::from_value(payload).map_err(|e| Error::InvalidRequest(e.to_string()))
    }

    /// Set the requested row window
    pub fn with_rows(mut self, start_row: i64, end_row: i64) -> Self {
        self.start_row = start_row;
        self.end_row = end_row;
        self
    }

    /// Attach a filter model
    pub fn with_filters(mut self, filters: GridFilterModel) -> Self {
        self.filters = Some(filters);
        self
    }
}

/// Filter, sort and column section of the request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GridFilterModel {
    pub group_keys: Vec<Value>,
    pub row_group_cols: Vec<Value>,
    pub sort_model: Vec<SortSpec>,
    /// Column name to raw filter object, in payload order
    pub filter_model: Map<String, Value>,
    /// Output column allow-list
    pub value_cols: Vec<String>,
    pub pivot_cols: Vec<Value>,
    pub pivot_mode: Option<String>,
    pub quick_filter: bool,
    pub flag_columns: Vec<Value>,
    pub flag_filters: Vec<Value>,
}

/// One sort directive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortSpec {
    pub col_id: String,
    pub sort: SortDirection,
}

impl SortSpec {
    pub fn new(col_id: impl Into<String>, sort: SortDirection) -> Self {
        Self {
            col_id: col_id.into(),
            sort,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// MongoDB sort order value
    pub fn as_order(self) -> i32 {
        match self {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        }
    }
}

/// Logical combinator of a compound filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    pub fn parse(raw: &str) -> std::result::Result<Self, QueryError> {
        match raw {
            "AND" => Ok(LogicalOperator::And),
            "OR" => Ok(LogicalOperator::Or),
            other => Err(QueryError::InvalidLogicalOperator(other.to_string())),
        }
    }

    /// Query operator token
    pub fn token(self) -> &'static str {
        match self {
            LogicalOperator::And => "$and",
            LogicalOperator::Or => "$or",
        }
    }
}

/// Filter type of a simple (single-condition) filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimpleFilterType {
    Text,
    Number,
    Date,
}

impl SimpleFilterType {
    pub fn as_str(self) -> &'static str {
        match self {
            SimpleFilterType::Text => "text",
            SimpleFilterType::Number => "number",
            SimpleFilterType::Date => "date",
        }
    }
}

/// A classified per-column filter
#[derive(Debug, Clone, PartialEq)]
pub enum FilterSpec {
    /// Two raw conditions on one column combined with AND/OR
    Compound {
        operator: LogicalOperator,
        condition1: Value,
        condition2: Value,
    },
    /// Membership in a fixed list
    Set { values: Vec<Value> },
    /// Single operator against a value (and an upper bound for ranges)
    Simple {
        filter_type: SimpleFilterType,
        operator: String,
        filter: Option<Value>,
        filter_to: Option<Value>,
    },
}

impl FilterSpec {
    /// Classify the raw filter object sent for `column`.
    ///
    /// An `operator` key wins over `filterType`; AG Grid sends both for
    /// combined conditions.
    pub fn classify(column: &str, raw: &Value) -> std::result::Result<Self, QueryError> {
        let obj = raw.as_object().ok_or_else(|| QueryError::InvalidValue {
            column: column.to_string(),
            reason: "filter must be an object".to_string(),
        })?;

        if let Some(operator) = obj.get("operator") {
            let operator = operator.as_str().ok_or_else(|| {
                QueryError::InvalidLogicalOperator(operator.to_string())
            })?;
            let operator = LogicalOperator::parse(operator)?;
            return Ok(FilterSpec::Compound {
                operator,
                condition1: required(obj, column, "condition1")?.clone(),
                condition2: required(obj, column, "condition2")?.clone(),
            });
        }

        let filter_type = match obj.get("filterType") {
            Some(Value::String(s)) => s.as_str(),
            Some(other) => return Err(QueryError::UnsupportedFilterType(other.to_string())),
            None => return Err(QueryError::MissingDiscriminator(column.to_string())),
        };

        let simple_type = match filter_type {
            "set" => {
                let values = required(obj, column, "values")?
                    .as_array()
                    .ok_or_else(|| QueryError::InvalidValue {
                        column: column.to_string(),
                        reason: "set filter values must be an array".to_string(),
                    })?
                    .clone();
                return Ok(FilterSpec::Set { values });
            }
            "text" => SimpleFilterType::Text,
            "number" => SimpleFilterType::Number,
            "date" => SimpleFilterType::Date,
            other => return Err(QueryError::UnsupportedFilterType(other.to_string())),
        };

        let operator = required(obj, column, "type")?
            .as_str()
            .ok_or_else(|| QueryError::InvalidValue {
                column: column.to_string(),
                reason: "filter type must be a string".to_string(),
            })?
            .to_string();

        Ok(FilterSpec::Simple {
            filter_type: simple_type,
            operator,
            filter: obj.get("filter").cloned(),
            filter_to: obj.get("filterTo").cloned(),
        })
    }
}

fn required<'a>(
    obj: &'a Map<String, Value>,
    column: &str,
    field: &str,
) -> std::result::Result<&'a Value, QueryError> {
    obj.get(field).ok_or_else(|| QueryError::MissingField {
        column: column.to_string(),
        field: field.to_string(),
    })
}
