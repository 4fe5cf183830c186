//! Grid request to aggregation pipeline translation
//!
//! A [`GridQueryBuilder`] is consumed by [`GridQueryBuilder::build`], so one
//! builder produces exactly one pipeline. Intermediate fragments live only
//! for the duration of that call.

use super::model::{FilterSpec, GridFilterModel, GridTableRequest};
use super::operators::{on_column, simple_condition, to_bson, Operands};
use crate::error::{Error, QueryError, Result};
use crate::mongo::pipeline::{AggregationPipeline, AggregationStage};
use mongodb::bson::{Bson, Document};
use serde_json::Value;
use tracing::{debug, error};

/// Builds the aggregation pipeline for one grid request
#[derive(Debug, Clone)]
pub struct GridQueryBuilder<'a> {
    request: &'a GridTableRequest,
    forced_filters: Document,
    additional_projection: Option<Document>,
}

impl<'a> GridQueryBuilder<'a> {
    pub fn new(request: &'a GridTableRequest) -> Self {
        Self {
            request,
            forced_filters: Document::new(),
            additional_projection: None,
        }
    }

    /// Match conditions applied ahead of any user filter (e.g. tenant scoping)
    pub fn forced_filters(mut self, forced_filters: Document) -> Self {
        self.forced_filters = forced_filters;
        self
    }

    /// Final `$project` stage appended after everything else
    pub fn additional_projection(mut self, projection: Document) -> Self {
        self.additional_projection = Some(projection);
        self
    }

    /// Translate the request.
    ///
    /// Every failure surfaces as [`Error::QueryFormation`]; nothing partial is
    /// returned.
    pub fn build(self) -> Result<AggregationPipeline> {
        match self.assemble() {
            Ok(pipeline) => {
                debug!(stages = pipeline.len(), "grid pipeline built");
                Ok(pipeline)
            }
            Err(e) => {
                error!(
                    error = %e,
                    start_row = self.request.start_row,
                    end_row = self.request.end_row,
                    "failed to form grid query"
                );
                Err(Error::QueryFormation(e))
            }
        }
    }

    fn assemble(&self) -> std::result::Result<AggregationPipeline, QueryError> {
        let mut parts = PipelineParts::default();
        parts.paginate(self.request.start_row, self.request.end_row)?;
        if let Some(filters) = &self.request.filters {
            parts.form_filter_query(filters)?;
        }
        Ok(parts.into_pipeline(&self.forced_filters, self.additional_projection.as_ref()))
    }
}

/// Translate `request` with a fresh builder
pub fn build_query(
    request: &GridTableRequest,
    forced_filters: Option<Document>,
    additional_projection: Option<Document>,
) -> Result<AggregationPipeline> {
    let mut builder = GridQueryBuilder::new(request);
    if let Some(forced) = forced_filters {
        builder = builder.forced_filters(forced);
    }
    if let Some(projection) = additional_projection {
        builder = builder.additional_projection(projection);
    }
    builder.build()
}

/// Fragments collected while translating one request
#[derive(Debug, Default)]
struct PipelineParts {
    column_matches: Vec<AggregationStage>,
    sort: Option<Document>,
    skip: Option<i64>,
    limit: i64,
    value_projection: Option<Document>,
}

impl PipelineParts {
    fn paginate(&mut self, start_row: i64, end_row: i64) -> std::result::Result<(), QueryError> {
        if start_row > 0 {
            self.skip = Some(start_row);
        }
        // Not clamped: a non-positive window is rejected by the server.
        self.limit = end_row
            .checked_sub(start_row)
            .ok_or_else(|| QueryError::InvalidValue {
                column: "endRow".to_string(),
                reason: format!("row window {}..{} overflows", start_row, end_row),
            })?;
        Ok(())
    }

    fn form_filter_query(&mut self, filters: &GridFilterModel) -> std::result::Result<(), QueryError> {
        for (column, raw) in &filters.filter_model {
            let stage = build_column_query(column, raw).inspect_err(|e| {
                debug!(column = %column, error = %e, "column filter rejected");
            })?;
            self.column_matches.push(stage);
        }

        if !filters.sort_model.is_empty() {
            let mut sort = Document::new();
            for spec in &filters.sort_model {
                sort.insert(spec.col_id.as_str(), spec.sort.as_order());
            }
            self.sort = Some(sort);
        }

        if !filters.value_cols.is_empty() {
            let mut projection = Document::new();
            projection.insert("_id", 0);
            for col in &filters.value_cols {
                projection.insert(col.as_str(), 1);
            }
            self.value_projection = Some(projection);
        }
        Ok(())
    }

    fn into_pipeline(
        self,
        forced_filters: &Document,
        additional_projection: Option<&Document>,
    ) -> AggregationPipeline {
        let mut pipeline = AggregationPipeline::new();
        if !forced_filters.is_empty() {
            pipeline.push(AggregationStage::Match(forced_filters.clone()));
        }
        for stage in self.column_matches {
            pipeline.push(stage);
        }
        if let Some(sort) = self.sort.filter(|s| !s.is_empty()) {
            pipeline.push(AggregationStage::Sort(sort));
        }
        if let Some(skip) = self.skip {
            pipeline.push(AggregationStage::Skip(skip));
        }
        pipeline.push(AggregationStage::Limit(self.limit));
        if let Some(projection) = self.value_projection {
            pipeline.push(AggregationStage::Project(projection));
        }
        if let Some(projection) = additional_projection.filter(|p| !p.is_empty()) {
            pipeline.push(AggregationStage::Project(projection.clone()));
        }
        pipeline
    }
}

/// Build the `$match` stage for one column's raw filter object
pub fn build_column_query(
    column: &str,
    raw: &Value,
) -> std::result::Result<AggregationStage, QueryError> {
    let condition = match FilterSpec::classify(column, raw)? {
        FilterSpec::Compound {
            operator,
            condition1,
            condition2,
        } => {
            let branches = vec![
                Bson::Document(on_column(column, to_bson(column, &condition1)?)),
                Bson::Document(on_column(column, to_bson(column, &condition2)?)),
            ];
            let mut combined = Document::new();
            combined.insert(operator.token(), branches);
            combined
        }
        FilterSpec::Set { values } => {
            let values = values
                .iter()
                .map(|v| to_bson(column, v))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            let mut membership = Document::new();
            membership.insert("$in", values);
            on_column(column, membership)
        }
        FilterSpec::Simple {
            filter_type,
            operator,
            filter,
            filter_to,
        } => simple_condition(
            filter_type,
            &operator,
            &Operands {
                column,
                filter: filter.as_ref(),
                filter_to: filter_to.as_ref(),
            },
        )?,
    };
    Ok(AggregationStage::Match(condition))
}
