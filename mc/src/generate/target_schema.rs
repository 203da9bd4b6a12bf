//! Target table schemas

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{GenerateContext, INGEST_DATE, MERGE_KEY};
use crate::audit::AuditColumnProvider;
use crate::error::{MapError, Result};
use crate::resolver::schema_file_name;
use crate::rules::{DataType, Tier};
use crate::sanitize::cleanse;
use crate::schema::ColumnSchema;
use crate::spec::{Cell, MappingRow};

/// Schema of one target table, audit columns last
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSchema {
    pub domain: String,
    pub table_name: String,
    pub sort_columns: Vec<String>,
    pub partition_columns: Vec<String>,
    pub columns: Vec<ColumnSchema>,
}

impl TargetSchema {
    pub fn file_name(&self, tier: Tier) -> String {
        schema_file_name(tier, &self.table_name)
    }
}

pub fn generate(ctx: &GenerateContext<'_>, audit: &dyn AuditColumnProvider) -> Result<Vec<TargetSchema>> {
    ctx.spec
        .target_tables()
        .iter()
        .map(|table| generate_table(ctx, table, audit))
        .collect()
}

fn generate_table(ctx: &GenerateContext<'_>, table: &str, audit: &dyn AuditColumnProvider) -> Result<TargetSchema> {
    debug!(table, "Generating target schema");
    let fail = |message: String| MapError::SchemaGeneration {
        table: table.to_string(),
        message,
    };

    let rows: Vec<&MappingRow> = ctx.spec.rows_for_target(table).collect();
    if rows.is_empty() {
        return Err(fail("no mapping rows".to_string()));
    }

    let source_schema = match rows.iter().find_map(|r| r.source_table.as_deref()) {
        Some(source) => Some(
            ctx.schemas
                .get(source)
                .ok_or_else(|| fail(format!("no schema resolved for source table {}", source)))?,
        ),
        None => None,
    };

    let mut sort_columns = positioned(&rows, |r| &r.order_by);
    let mut partition_columns = positioned(&rows, |r| &r.partition_by);
    let mut columns = Vec::with_capacity(rows.len() + 1);

    if ctx.tier.merges() {
        sort_columns.push(MERGE_KEY.to_string());
        columns.push(ColumnSchema::new(MERGE_KEY, DataType::String.as_str()));
    } else {
        partition_columns.push(INGEST_DATE.to_string());
    }

    for row in &rows {
        let name = row
            .target_column
            .clone()
            .ok_or_else(|| fail(format!("row {} has no target column", row.line)))?;

        let data_type = match (&row.source_column, source_schema) {
            (None, _) => ctx.rules.map_optional_type(row.data_type.as_deref()),
            (Some(column), Some(schema)) => {
                let source = schema
                    .column(column)
                    .ok_or_else(|| fail(format!("source column {} not in {}", column, schema.table_name)))?;
                ctx.rules.map_type(&source.data_type)
            }
            (Some(column), None) => return Err(fail(format!("source column {} has no source table", column))),
        };

        columns.push(ColumnSchema::new(name, data_type.as_str()));
    }

    let audit_columns = audit.audit_columns(ctx.tier).map_err(|e| fail(e.to_string()))?;
    columns.extend(audit_columns);

    Ok(TargetSchema {
        domain: ctx.domain.to_string(),
        table_name: table.to_string(),
        sort_columns,
        partition_columns,
        columns,
    })
}

/// Target columns with a position in `cell`, ordered by that position
fn positioned(rows: &[&MappingRow], cell: impl Fn(&MappingRow) -> &Cell) -> Vec<String> {
    let mut ranked: Vec<&MappingRow> = rows.iter().copied().filter(|r| !cell(*r).is_null()).collect();
    ranked.sort_by(|a, b| cell(*a).position_cmp(cell(*b)));
    cleanse(ranked.iter().map(|r| r.target_column.as_deref()))
}
