//! Mapping file validation against required columns and resolved source schemas

use tracing::{debug, error, info};

use crate::error::{InvalidColumn, MapError, Result};
use crate::resolver::ResolveSchema;
use crate::rules::{Rules, Tier};
use crate::sanitize::cleanse;
use crate::schema::SchemaCache;
use crate::spec::MappingSpecification;

/// A specification that passed validation, with the schemas it was checked against
#[derive(Debug, Clone)]
pub struct Validated {
    pub spec: MappingSpecification,
    pub schemas: SchemaCache,
}

/// Validate a specification for a target data area
///
/// Fails on the first stage with problems: missing required columns, then
/// source tables and their schema resolution, then unknown source columns
/// across all tables. Invalid columns are reported in first-seen table order.
pub fn validate(
    spec: MappingSpecification,
    domain: &str,
    target: Tier,
    rules: &Rules,
    resolver: &dyn ResolveSchema,
) -> Result<Validated> {
    debug!("Validating mapping file required columns");
    let required = rules
        .required_columns(target)
        .ok_or(MapError::UnconfiguredTier { tier: target })?;

    let missing: Vec<String> = required.iter().filter(|c| !spec.has_column(c)).cloned().collect();
    if !missing.is_empty() {
        error!(?missing, "Mapping file is missing required columns");
        return Err(MapError::MissingColumns { columns: missing });
    }
    info!("All required columns are present in the mapping file");

    debug!("Validating the existence of source columns in the source schema");
    let source_tables = spec.source_tables();
    if source_tables.is_empty() {
        error!(%target, "Mapping file names no source tables");
        return Err(MapError::NoSourceTables { tier: target });
    }

    let mut schemas = SchemaCache::new();
    for table in &source_tables {
        let schema = resolver.resolve(domain, target, table)?;
        schemas.insert(table.clone(), schema);
    }

    let mut invalid = Vec::new();
    for (table, schema) in source_tables.iter().filter_map(|t| schemas.get(t).map(|s| (t, s))) {
        let referenced = cleanse(spec.rows_for_source(table).map(|r| r.source_column.as_deref()));
        invalid.extend(
            referenced
                .into_iter()
                .filter(|column| !schema.has_column(column))
                .map(|column| InvalidColumn {
                    table: table.clone(),
                    column,
                }),
        );
    }

    if !invalid.is_empty() {
        error!(count = invalid.len(), "Mapping file contains invalid source columns");
        return Err(MapError::InvalidSourceColumns { columns: invalid });
    }
    info!(tables = schemas.len(), "All source schema columns exist in the source data store");

    Ok(Validated { spec, schemas })
}
