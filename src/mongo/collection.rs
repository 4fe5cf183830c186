//! Collection base
//!
//! Thin CRUD and aggregation wrapper over one collection. When soft delete is
//! enabled, deletes first copy the matched documents into
//! `deleted__<database>.<collection>`, stamped with `deleted.on`.

use super::{convert_mongodb_error, pipeline::AggregationPipeline};
use crate::error::Result;
use crate::grid::{GridQueryBuilder, GridTableRequest};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Bson, DateTime, Document},
    options::{
        AggregateOptions, Collation, FindOneAndUpdateOptions, FindOneOptions, FindOptions,
        ReturnDocument, UpdateOptions,
    },
    results::{DeleteResult, UpdateResult},
    Client, Collection,
};
use std::fmt;
use tracing::{debug, info};

/// Update operator applied to the `data` document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateStrategy {
    #[default]
    Set,
    Unset,
    SetOnInsert,
    Inc,
    Mul,
    Min,
    Max,
    Push,
    AddToSet,
    Pull,
}

impl UpdateStrategy {
    pub fn as_operator(self) -> &'static str {
        match self {
            UpdateStrategy::Set => "$set",
            UpdateStrategy::Unset => "$unset",
            UpdateStrategy::SetOnInsert => "$setOnInsert",
            UpdateStrategy::Inc => "$inc",
            UpdateStrategy::Mul => "$mul",
            UpdateStrategy::Min => "$min",
            UpdateStrategy::Max => "$max",
            UpdateStrategy::Push => "$push",
            UpdateStrategy::AddToSet => "$addToSet",
            UpdateStrategy::Pull => "$pull",
        }
    }

    /// `{<operator>: data}`
    pub fn wrap(self, data: Document) -> Document {
        let mut update = Document::new();
        update.insert(self.as_operator(), data);
        update
    }
}

/// Options for [`MongoCollection::find`]
#[derive(Debug, Clone, Default)]
pub struct FindParams {
    /// Defaults to `{_id: 0}`
    pub projection: Option<Document>,
    /// Ignored when empty
    pub sort: Option<Document>,
    pub skip: u64,
    /// Ignored when zero
    pub limit: Option<i64>,
}

/// Options for [`MongoCollection::aggregate`]
#[derive(Debug, Clone, Default)]
pub struct AggregateParams {
    pub let_vars: Option<Document>,
    pub collation: Option<Collation>,
    pub allow_disk_use: bool,
}

fn default_projection() -> Document {
    doc! { "_id": 0 }
}

/// Build the copy-into-archive pipeline used by soft delete
pub fn soft_delete_pipeline(
    query: Document,
    database: &str,
    collection: &str,
    deleted_on: DateTime,
) -> AggregationPipeline {
    AggregationPipeline::new()
        .match_stage(query)
        .add_fields_stage(doc! { "deleted": { "on": deleted_on } })
        .merge_stage(doc! {
            "into": {
                "db": format!("deleted__{}", database),
                "coll": collection,
            }
        })
}

/// CRUD handle for one collection
#[derive(Debug, Clone)]
pub struct MongoCollection {
    client: Client,
    database: String,
    collection: String,
    soft_delete: bool,
}

impl fmt::Display for MongoCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MongoCollection(database={}, collection={})",
            self.database, self.collection
        )
    }
}

impl MongoCollection {
    pub fn new(client: Client, database: &str, collection: &str, soft_delete: bool) -> Self {
        Self {
            client,
            database: database.to_string(),
            collection: collection.to_string(),
            soft_delete,
        }
    }

    /// Override the soft-delete setting for this handle
    pub fn with_soft_delete(mut self, soft_delete: bool) -> Self {
        self.soft_delete = soft_delete;
        self
    }

    pub fn database_name(&self) -> &str {
        &self.database
    }

    pub fn collection_name(&self) -> &str {
        &self.collection
    }

    pub fn soft_delete(&self) -> bool {
        self.soft_delete
    }

    fn handle(&self) -> Collection<Document> {
        self.client
            .database(&self.database)
            .collection::<Document>(&self.collection)
    }

    /// Insert one document, returning its id
    pub async fn insert_one(&self, data: Document) -> Result<Bson> {
        let result = self
            .handle()
            .insert_one(data)
            .await
            .map_err(convert_mongodb_error)?;
        Ok(result.inserted_id)
    }

    /// Insert documents, returning their ids in input order
    pub async fn insert_many(&self, data: Vec<Document>) -> Result<Vec<Bson>> {
        let result = self
            .handle()
            .insert_many(data)
            .await
            .map_err(convert_mongodb_error)?;
        let mut ids: Vec<(usize, Bson)> = result.inserted_ids.into_iter().collect();
        ids.sort_by_key(|(index, _)| *index);
        Ok(ids.into_iter().map(|(_, id)| id).collect())
    }

    /// Query documents
    pub async fn find(&self, query: Document, params: FindParams) -> Result<Vec<Document>> {
        let mut options = FindOptions::default();
        options.projection = Some(params.projection.unwrap_or_else(default_projection));
        options.sort = params.sort.filter(|s| !s.is_empty());
        options.skip = Some(params.skip);
        options.limit = params.limit.filter(|l| *l != 0);

        let cursor = self
            .handle()
            .find(query)
            .with_options(options)
            .await
            .map_err(convert_mongodb_error)?;
        cursor.try_collect().await.map_err(convert_mongodb_error)
    }

    /// Query a single document
    pub async fn find_one(
        &self,
        query: Document,
        projection: Option<Document>,
    ) -> Result<Option<Document>> {
        let mut options = FindOneOptions::default();
        options.projection = Some(projection.unwrap_or_else(default_projection));

        self.handle()
            .find_one(query)
            .with_options(options)
            .await
            .map_err(convert_mongodb_error)
    }

    /// Update one document with `{strategy: data}`
    pub async fn update_one(
        &self,
        query: Document,
        data: Document,
        upsert: bool,
        strategy: UpdateStrategy,
    ) -> Result<UpdateResult> {
        let mut options = UpdateOptions::default();
        options.upsert = Some(upsert);

        self.handle()
            .update_one(query, strategy.wrap(data))
            .with_options(options)
            .await
            .map_err(convert_mongodb_error)
    }

    /// Add `data` to the array field `param` unless already present
    pub async fn update_to_set(
        &self,
        query: Document,
        param: &str,
        data: impl Into<Bson>,
        upsert: bool,
    ) -> Result<UpdateResult> {
        let mut element = Document::new();
        element.insert(param, data.into());
        self.update_one(query, element, upsert, UpdateStrategy::AddToSet)
            .await
    }

    /// `$set` `data` on every matching document
    pub async fn update_many(
        &self,
        query: Document,
        data: Document,
        upsert: bool,
    ) -> Result<UpdateResult> {
        let mut options = UpdateOptions::default();
        options.upsert = Some(upsert);

        self.handle()
            .update_many(query, UpdateStrategy::Set.wrap(data))
            .with_options(options)
            .await
            .map_err(convert_mongodb_error)
    }

    /// Update one document and return it as it is after the update
    pub async fn find_and_update(
        &self,
        query: Document,
        data: Document,
        upsert: bool,
        strategy: UpdateStrategy,
    ) -> Result<Option<Document>> {
        let mut options = FindOneAndUpdateOptions::default();
        options.return_document = Some(ReturnDocument::After);
        options.upsert = Some(upsert);

        self.handle()
            .find_one_and_update(query, strategy.wrap(data))
            .with_options(options)
            .await
            .map_err(convert_mongodb_error)
    }

    /// Delete every matching document
    pub async fn delete_many(&self, query: Document) -> Result<DeleteResult> {
        if self.soft_delete {
            self.perform_soft_delete(query.clone()).await?;
        }
        self.handle()
            .delete_many(query)
            .await
            .map_err(convert_mongodb_error)
    }

    /// Delete the first matching document
    pub async fn delete_one(&self, query: Document) -> Result<DeleteResult> {
        if self.soft_delete {
            self.perform_soft_delete(query.clone()).await?;
        }
        self.handle()
            .delete_one(query)
            .await
            .map_err(convert_mongodb_error)
    }

    /// Copy matching documents into the archive database.
    ///
    /// Copies every match, so a following `delete_one` may archive more
    /// documents than it removes.
    pub async fn perform_soft_delete(&self, query: Document) -> Result<()> {
        let pipeline =
            soft_delete_pipeline(query, &self.database, &self.collection, DateTime::now());
        self.aggregate(pipeline, AggregateParams::default()).await?;
        info!(
            database = %self.database,
            collection = %self.collection,
            "archived documents before delete"
        );
        Ok(())
    }

    /// Distinct values of `query_key` among documents matching `filter`
    pub async fn distinct(&self, query_key: &str, filter: Option<Document>) -> Result<Vec<Bson>> {
        self.handle()
            .distinct(query_key, filter.unwrap_or_default())
            .await
            .map_err(convert_mongodb_error)
    }

    /// Number of documents matching `query`
    pub async fn find_count(&self, query: Document) -> Result<u64> {
        self.handle()
            .count_documents(query)
            .await
            .map_err(convert_mongodb_error)
    }

    /// Run an aggregation pipeline and collect the results
    pub async fn aggregate(
        &self,
        pipeline: impl Into<Vec<Document>>,
        params: AggregateParams,
    ) -> Result<Vec<Document>> {
        let pipeline: Vec<Document> = pipeline.into();
        debug!(stages = pipeline.len(), collection = %self.collection, "running aggregate");

        let mut options = AggregateOptions::default();
        options.let_vars = params.let_vars;
        options.collation = params.collation;
        options.allow_disk_use = Some(params.allow_disk_use);

        let cursor = self
            .handle()
            .aggregate(pipeline)
            .with_options(options)
            .await
            .map_err(convert_mongodb_error)?;
        cursor.try_collect().await.map_err(convert_mongodb_error)
    }

    /// Translate a grid request and run it against this collection
    pub async fn grid_rows(
        &self,
        request: &GridTableRequest,
        forced_filters: Option<Document>,
    ) -> Result<Vec<Document>> {
        let mut builder = GridQueryBuilder::new(request);
        if let Some(forced) = forced_filters {
            builder = builder.forced_filters(forced);
        }
        let pipeline = builder.build()?;
        self.aggregate(pipeline, AggregateParams::default()).await
    }
}
