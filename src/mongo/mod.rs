//! MongoDB access
//!
//! Client construction, a per-collection CRUD handle with optional soft
//! delete, and the aggregation pipeline types shared with the grid builder.

pub mod collection;
pub mod connection;
pub mod pipeline;

pub use collection::{
    soft_delete_pipeline, AggregateParams, FindParams, MongoCollection, UpdateStrategy,
};
pub use connection::MongoConnect;
pub use pipeline::{AggregationPipeline, AggregationStage};

use crate::error::Error;

/// MongoDB specific error conversion
pub(crate) fn convert_mongodb_error(err: mongodb::error::Error) -> Error {
    match err.kind.as_ref() {
        mongodb::error::ErrorKind::Authentication { .. } => {
            Error::ConnectionFailed(format!("Authentication failed: {}", err))
        }
        mongodb::error::ErrorKind::ConnectionPoolCleared { .. } => {
            Error::ConnectionFailed(format!("Connection pool cleared: {}", err))
        }
        mongodb::error::ErrorKind::ServerSelection { .. } => {
            Error::ConnectionFailed(format!("Server selection failed: {}", err))
        }
        mongodb::error::ErrorKind::InvalidArgument { .. } => {
            Error::Config(format!("Invalid argument: {}", err))
        }
        mongodb::error::ErrorKind::BsonSerialization(_)
        | mongodb::error::ErrorKind::BsonDeserialization(_) => Error::Serialization(err.to_string()),
        _ => Error::Database(err.to_string()),
    }
}
