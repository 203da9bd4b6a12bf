//! Audit column lookup per data area

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::{MapError, Result};
use crate::rules::Tier;
use crate::schema::ColumnSchema;

/// Supplies the bookkeeping columns appended to every target schema of a data area
pub trait AuditColumnProvider {
    fn audit_columns(&self, tier: Tier) -> Result<Vec<ColumnSchema>>;
}

/// Audit columns read from a data areas file:
///
/// ```json
/// { "bronze": { "audit_columns": [ { "name": "IngestDate", "type": "timestamp" } ] } }
/// ```
#[derive(Debug, Clone)]
pub struct DataAreasFile {
    path: PathBuf,
}

impl DataAreasFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl AuditColumnProvider for DataAreasFile {
    fn audit_columns(&self, tier: Tier) -> Result<Vec<ColumnSchema>> {
        let fail = |message: String| MapError::AuditColumns { tier, message };

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| fail(format!("cannot read {}: {}", self.path.display(), e)))?;
        let areas: Value = serde_json::from_str(&content)
            .map_err(|e| fail(format!("cannot parse {}: {}", self.path.display(), e)))?;

        let area = match areas.get(tier.as_str()) {
            Some(Value::Object(area)) if !area.is_empty() => area,
            _ => return Err(fail(format!("data area not found in {}", self.path.display()))),
        };

        let columns = match area.get("audit_columns") {
            None => return Ok(Vec::new()),
            Some(Value::Array(columns)) => columns,
            Some(_) => return Err(fail("audit_columns is not a list".to_string())),
        };

        let columns = columns
            .iter()
            .map(|c| serde_json::from_value::<ColumnSchema>(c.clone()))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| fail(format!("invalid audit column: {}", e)))?;

        debug!(%tier, count = columns.len(), "Loaded audit columns");
        Ok(columns)
    }
}

impl AuditColumnProvider for BTreeMap<Tier, Vec<ColumnSchema>> {
    fn audit_columns(&self, tier: Tier) -> Result<Vec<ColumnSchema>> {
        self.get(&tier).cloned().ok_or(MapError::AuditColumns {
            tier,
            message: "data area not configured".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_areas(temp: &TempDir, content: &str) -> DataAreasFile {
        let path = temp.path().join("mint_data_areas.json");
        fs::write(&path, content).unwrap();
        DataAreasFile::new(path)
    }

    #[test]
    fn test_reads_columns_in_order() {
        let temp = TempDir::new().unwrap();
        let areas = write_areas(
            &temp,
            r#"{"bronze": {"audit_columns": [
                {"name": "IngestDate", "type": "timestamp", "nullable": false},
                {"name": "SourceFile", "type": "string"}
            ]}}"#,
        );

        let columns = areas.audit_columns(Tier::Bronze).unwrap();
        assert_eq!(
            columns,
            vec![ColumnSchema::new("IngestDate", "timestamp"), ColumnSchema::new("SourceFile", "string")]
        );
    }

    #[test]
    fn test_unconfigured_tier_fails() {
        let temp = TempDir::new().unwrap();
        let areas = write_areas(&temp, r#"{"bronze": {"audit_columns": []}, "gold": {}}"#);

        assert!(matches!(areas.audit_columns(Tier::Silver), Err(MapError::AuditColumns { .. })));
        assert!(matches!(areas.audit_columns(Tier::Gold), Err(MapError::AuditColumns { .. })));
        assert!(areas.audit_columns(Tier::Bronze).unwrap().is_empty());
    }

    #[test]
    fn test_non_list_audit_columns_fails() {
        let temp = TempDir::new().unwrap();
        let areas = write_areas(&temp, r#"{"silver": {"audit_columns": "MergedAt"}}"#);

        let err = areas.audit_columns(Tier::Silver).unwrap_err();
        assert!(err.to_string().contains("not a list"));
    }

    #[test]
    fn test_missing_file_fails() {
        let areas = DataAreasFile::new("/nonexistent/mint_data_areas.json");
        assert!(areas.audit_columns(Tier::Bronze).is_err());
    }

    #[test]
    fn test_map_provider() {
        let provider = BTreeMap::from([(Tier::Gold, vec![ColumnSchema::new("UpdatedAt", "timestamp")])]);
        assert_eq!(provider.audit_columns(Tier::Gold).unwrap().len(), 1);
        assert!(provider.audit_columns(Tier::Bronze).is_err());
    }
}
