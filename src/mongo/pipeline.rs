//! MongoDB Aggregation Pipeline
//!
//! Stage types and an ordered pipeline that renders to the single-key
//! documents accepted by `Collection::aggregate`.

use mongodb::bson::{Bson, Document};

pub const MATCH: &str = "$match";
pub const SORT: &str = "$sort";
pub const SKIP: &str = "$skip";
pub const LIMIT: &str = "$limit";
pub const PROJECT: &str = "$project";
pub const GROUP: &str = "$group";
pub const LOOKUP: &str = "$lookup";
pub const UNWIND: &str = "$unwind";
pub const ADD_FIELDS: &str = "$addFields";
pub const MERGE: &str = "$merge";

/// Aggregation Pipeline Stage
#[derive(Debug, Clone, PartialEq)]
pub enum AggregationStage {
    /// $match - Filter documents
    Match(Document),
    /// $sort - Sort results
    Sort(Document),
    /// $skip - Skip documents
    Skip(i64),
    /// $limit - Limit results
    Limit(i64),
    /// $project - Project fields
    Project(Document),
    /// $group - Group by field
    Group(Document),
    /// $lookup - Join collections
    Lookup(Document),
    /// $unwind - Unwind array
    Unwind(Bson),
    /// $addFields - Add computed fields
    AddFields(Document),
    /// $merge - Write results into a collection
    Merge(Document),
}

impl AggregationStage {
    /// Stage name token, e.g. `$match`
    pub fn name(&self) -> &'static str {
        match self {
            AggregationStage::Match(_) => MATCH,
            AggregationStage::Sort(_) => SORT,
            AggregationStage::Skip(_) => SKIP,
            AggregationStage::Limit(_) => LIMIT,
            AggregationStage::Project(_) => PROJECT,
            AggregationStage::Group(_) => GROUP,
            AggregationStage::Lookup(_) => LOOKUP,
            AggregationStage::Unwind(_) => UNWIND,
            AggregationStage::AddFields(_) => ADD_FIELDS,
            AggregationStage::Merge(_) => MERGE,
        }
    }

    /// Render as a single-key stage document
    pub fn to_document(&self) -> Document {
        let body = match self {
            AggregationStage::Match(d)
            | AggregationStage::Sort(d)
            | AggregationStage::Project(d)
            | AggregationStage::Group(d)
            | AggregationStage::Lookup(d)
            | AggregationStage::AddFields(d)
            | AggregationStage::Merge(d) => Bson::Document(d.clone()),
            AggregationStage::Skip(n) | AggregationStage::Limit(n) => Bson::Int64(*n),
            AggregationStage::Unwind(spec) => spec.clone(),
        };
        let mut stage = Document::new();
        stage.insert(self.name(), body);
        stage
    }
}

/// MongoDB Aggregation Pipeline
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationPipeline {
    /// Pipeline stages
    pub stages: Vec<AggregationStage>,
}

impl AggregationPipeline {
    /// Create new pipeline
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Append a stage
    pub fn push(&mut self, stage: AggregationStage) {
        self.stages.push(stage);
    }

    /// Add match stage
    pub fn match_stage(mut self, filter: Document) -> Self {
        self.stages.push(AggregationStage::Match(filter));
        self
    }

    /// Add sort stage
    pub fn sort_stage(mut self, sort_spec: Document) -> Self {
        self.stages.push(AggregationStage::Sort(sort_spec));
        self
    }

    /// Add skip stage
    pub fn skip_stage(mut self, skip: i64) -> Self {
        self.stages.push(AggregationStage::Skip(skip));
        self
    }

    /// Add limit stage
    pub fn limit_stage(mut self, limit: i64) -> Self {
        self.stages.push(AggregationStage::Limit(limit));
        self
    }

    /// Add projection stage
    pub fn project_stage(mut self, projection: Document) -> Self {
        self.stages.push(AggregationStage::Project(projection));
        self
    }

    /// Add group stage
    pub fn group_stage(mut self, group_spec: Document) -> Self {
        self.stages.push(AggregationStage::Group(group_spec));
        self
    }

    /// Add lookup stage
    pub fn lookup_stage(mut self, lookup: Document) -> Self {
        self.stages.push(AggregationStage::Lookup(lookup));
        self
    }

    /// Add unwind stage; accepts a field path or a full unwind spec
    pub fn unwind_stage(mut self, spec: impl Into<Bson>) -> Self {
        self.stages.push(AggregationStage::Unwind(spec.into()));
        self
    }

    /// Add $addFields stage
    pub fn add_fields_stage(mut self, fields: Document) -> Self {
        self.stages.push(AggregationStage::AddFields(fields));
        self
    }

    /// Add $merge stage
    pub fn merge_stage(mut self, merge: Document) -> Self {
        self.stages.push(AggregationStage::Merge(merge));
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Render every stage as a stage document, in order
    pub fn to_documents(&self) -> Vec<Document> {
        self.stages.iter().map(AggregationStage::to_document).collect()
    }

    /// Render as relaxed extended JSON, mainly for logging and the CLI
    pub fn to_relaxed_extjson(&self) -> serde_json::Value {
        serde_json::Value::Array(
            self.to_documents()
                .into_iter()
                .map(|d| Bson::Document(d).into_relaxed_extjson())
                .collect(),
        )
    }
}

impl From<AggregationPipeline> for Vec<Document> {
    fn from(pipeline: AggregationPipeline) -> Self {
        pipeline.to_documents()
    }
}
