//! Column-level mapping from upstream columns and transformation functions

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, error};

use super::{GenerateContext, MERGE_KEY};
use crate::error::{MapError, Result};
use crate::rules::{DataType, Tier};
use crate::sanitize::cleanse;
use crate::spec::MappingRow;

/// Business key markers, compared case-insensitively
const AFFIRMATIVE: [&str; 6] = ["y", "yes", "true", "t", "1", "x"];

/// Hash function the pipeline uses to build the merge key
const KEY_HASH: &str = "key_hash";

/// Column copied from an upstream column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectSource {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
}

/// Column computed by a pipeline function
///
/// The JSON object is kept as written, key order included, except that `type`
/// is always `string`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionSource(Map<String, Value>);

impl FunctionSource {
    pub fn new(mut fields: Map<String, Value>) -> Self {
        fields.insert("type".to_string(), Value::String(DataType::String.as_str().to_string()));
        Self(fields)
    }

    pub fn function(&self) -> Option<&str> {
        self.0.get("function").and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// No source; the column only carries its type (constants, defaults)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmptySource {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnSource {
    Direct(DirectSource),
    Empty(EmptySource),
    Function(FunctionSource),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
    pub source: ColumnSource,
}

/// Column mapping of one target table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMappingSet {
    pub domain: String,
    pub table_name: String,
    pub source: Tier,
    pub target: Tier,
    pub columns: Vec<ColumnMapping>,
}

impl ColumnMappingSet {
    pub fn file_name(&self) -> String {
        format!("{}_map_{}.json", self.target, self.table_name)
    }
}

pub fn generate(ctx: &GenerateContext<'_>) -> Result<Vec<ColumnMappingSet>> {
    let upstream = ctx.rules.upstream_of(ctx.tier).ok_or_else(|| MapError::MappingGeneration {
        table: String::new(),
        message: format!("no upstream data area for {}", ctx.tier),
    })?;

    ctx.spec
        .target_tables()
        .iter()
        .map(|table| generate_table(ctx, upstream, table))
        .collect()
}

fn generate_table(ctx: &GenerateContext<'_>, upstream: Tier, table: &str) -> Result<ColumnMappingSet> {
    debug!(table, "Generating mapping configuration");
    let rows: Vec<&MappingRow> = ctx.spec.rows_for_target(table).collect();
    let mut columns = Vec::with_capacity(rows.len() + 1);

    if let Some(merge_key) = merge_key(ctx, &rows) {
        columns.push(merge_key);
    }

    for row in &rows {
        match map_row(ctx, table, row) {
            Ok(column) => columns.push(column),
            Err(e) if e.is_recoverable() => {
                error!(table, line = row.line, error = %e, "Skipping column with malformed transformation function");
            }
            Err(e) => return Err(e),
        }
    }

    if columns.is_empty() {
        error!(table, "Mapping configuration has no columns");
        return Err(MapError::EmptyMapping {
            table: table.to_string(),
        });
    }

    Ok(ColumnMappingSet {
        domain: ctx.domain.to_string(),
        table_name: table.to_string(),
        source: upstream,
        target: ctx.tier,
        columns,
    })
}

fn is_affirmative(value: Option<&str>) -> bool {
    value
        .map(|v| v.trim().to_lowercase())
        .is_some_and(|v| AFFIRMATIVE.contains(&v.as_str()))
}

/// Hashed merge key over the business key columns, if any are marked
fn merge_key(ctx: &GenerateContext<'_>, rows: &[&MappingRow]) -> Option<ColumnMapping> {
    if !ctx.spec.has_column(crate::spec::headers::IS_BUSINESS_KEY) {
        return None;
    }

    let keys = cleanse(
        rows.iter()
            .filter(|r| is_affirmative(r.is_business_key.as_deref()))
            .map(|r| r.target_column.as_deref()),
    );
    if keys.is_empty() {
        return None;
    }

    Some(ColumnMapping {
        name: MERGE_KEY.to_string(),
        data_type: DataType::String,
        source: ColumnSource::Function(FunctionSource::new(Map::from_iter([
            ("function".to_string(), json!(KEY_HASH)),
            ("params".to_string(), json!({ "column_names": keys })),
        ]))),
    })
}

fn map_row(ctx: &GenerateContext<'_>, table: &str, row: &MappingRow) -> Result<ColumnMapping> {
    let fail = |message: String| MapError::MappingGeneration {
        table: table.to_string(),
        message,
    };

    let name = row
        .target_column
        .clone()
        .ok_or_else(|| fail(format!("row {} has no target column", row.line)))?;
    let declared = ctx.rules.map_optional_type(row.data_type.as_deref());

    if let (Some(source_table), Some(source_column)) = (&row.source_table, &row.source_column) {
        let column = ctx
            .schemas
            .get(source_table)
            .and_then(|schema| schema.column(source_column))
            .ok_or_else(|| fail(format!("source column {}.{} not resolved", source_table, source_column)))?;
        let data_type = ctx.rules.map_type(&column.data_type);

        return Ok(ColumnMapping {
            name,
            data_type,
            source: ColumnSource::Direct(DirectSource {
                name: source_column.clone(),
                data_type,
            }),
        });
    }

    let source = match row.transformation_function.as_deref() {
        Some(expr) if !expr.trim().is_empty() => {
            let function = parse_transformation(expr).map_err(|message| MapError::MalformedTransformation {
                table: table.to_string(),
                column: name.clone(),
                message,
            })?;
            ColumnSource::Function(function)
        }
        _ => ColumnSource::Empty(EmptySource {}),
    };

    Ok(ColumnMapping {
        name,
        data_type: declared,
        source,
    })
}

/// Parse an embedded transformation function, forcing its type to string
fn parse_transformation(expr: &str) -> std::result::Result<FunctionSource, String> {
    match serde_json::from_str(expr).map_err(|e| e.to_string())? {
        Value::Object(fields) => Ok(FunctionSource::new(fields)),
        _ => Err("transformation function is not a JSON object".to_string()),
    }
}
