//! Configuration generators
//!
//! Each generator derives one artifact family from a validated specification.
//! They share the rules and the resolved source schemas, so types and column
//! names agree across the artifacts of a run.

pub mod mapping;
pub mod pipeline;
pub mod tables;
pub mod target_schema;

pub use mapping::{ColumnMapping, ColumnMappingSet, ColumnSource, DirectSource, EmptySource, FunctionSource};
pub use pipeline::PipelineLinkage;
pub use tables::{Action, TargetTableList};
pub use target_schema::TargetSchema;

use crate::rules::{Rules, Tier};
use crate::schema::SchemaCache;
use crate::spec::MappingSpecification;

/// Synthetic merge key column for silver and gold tables
pub const MERGE_KEY: &str = "MergeKey";

/// Partition column appended for ingested tiers
pub const INGEST_DATE: &str = "IngestDate";

/// Inputs shared by every generator in a run
#[derive(Debug, Clone, Copy)]
pub struct GenerateContext<'a> {
    pub domain: &'a str,
    pub tier: Tier,
    pub rules: &'a Rules,
    pub spec: &'a MappingSpecification,
    pub schemas: &'a SchemaCache,
}
