//! # mongo-grid
//!
//! Convenience layer over the MongoDB driver: a collection handle with CRUD,
//! aggregation and soft delete, and a translator from AG Grid server-side
//! row model requests into aggregation pipelines.
//!
//! ```rust
//! use mongo_grid::grid::{build_query, GridTableRequest};
//!
//! let request = GridTableRequest::from_json(
//!     r#"{"startRow": 20, "endRow": 40,
//!         "filters": {"filterModel": {"country": {"filterType": "set", "values": ["NZ"]}}}}"#,
//! )
//! .unwrap();
//! let pipeline = build_query(&request, None, None).unwrap();
//! assert_eq!(pipeline.len(), 3);
//! ```

pub mod config;
pub mod error;
pub mod grid;
pub mod logging;
pub mod mongo;

pub use error::{Error, QueryError, Result};
pub use grid::{build_query, GridQueryBuilder, GridTableRequest};
pub use mongo::{AggregationPipeline, MongoCollection, MongoConnect};
