//! Grid Query Module
//!
//! Translates AG Grid server-side row model requests into MongoDB
//! aggregation pipelines.

pub mod builder;
pub mod model;
pub mod operators;

pub use builder::{build_column_query, build_query, GridQueryBuilder};
pub use model::{
    FilterSpec, GridFilterModel, GridTableRequest, LogicalOperator, SimpleFilterType,
    SortDirection, SortSpec,
};
pub use operators::SimpleOperator;
