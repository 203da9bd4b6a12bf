//! Integration tests for mapcompiler
//!
//! These tests drive a full compile from a mapping file on disk to the JSON
//! artifacts, with the source catalog and secret store replaced by fakes.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use mapcompiler::audit::AuditColumnProvider;
use mapcompiler::config::{OutputConfig, SourceConfig};
use mapcompiler::error::{MapError, Result};
use mapcompiler::introspect::TableIntrospector;
use mapcompiler::loader::{self, FileType};
use mapcompiler::resolver::SchemaResolver;
use mapcompiler::secrets::SecretStore;
use mapcompiler::{ArtifactStore, ColumnSchema, Compiler, Rules, Tier};
use serde_json::{Value, json};
use tempfile::TempDir;

const HEADER: &str = "Source Table Name,Source Column Name,Target Table Name,Target Column Name,Order By,Partition By,Is Business Key,Data Type,Default Value,Transformation Function";

struct FixedSecret;

impl SecretStore for FixedSecret {
    fn get_secret(&self, _vault: &str, _name: &str) -> Result<String> {
        Ok("Server=tcp:localhost,1433;Database=sales".to_string())
    }
}

struct Catalog(BTreeMap<String, Vec<ColumnSchema>>);

impl TableIntrospector for Catalog {
    fn table_schema(&self, _connection: &str, table: &str) -> Result<Vec<ColumnSchema>> {
        self.0.get(table).cloned().ok_or_else(|| MapError::Introspection {
            table: table.to_string(),
            message: "table not found".to_string(),
        })
    }
}

struct Harness {
    dir: TempDir,
    rules: Rules,
    source: SourceConfig,
    output: OutputConfig,
    catalog: Catalog,
    audit: BTreeMap<Tier, Vec<ColumnSchema>>,
}

impl Harness {
    fn new() -> Self {
        let catalog = Catalog(BTreeMap::from([
            (
                "ORDERS".to_string(),
                vec![
                    ColumnSchema::new("id", "int"),
                    ColumnSchema::new("name", "varchar(100)"),
                    ColumnSchema::new("created", "datetime"),
                ],
            ),
            (
                "ADDRESSES".to_string(),
                vec![ColumnSchema::new("id", "int"), ColumnSchema::new("city", "varchar")],
            ),
        ]));
        let audit = BTreeMap::from([
            (Tier::Bronze, vec![ColumnSchema::new("IngestDate", "timestamp")]),
            (
                Tier::Silver,
                vec![
                    ColumnSchema::new("CreatedAt", "timestamp"),
                    ColumnSchema::new("UpdatedAt", "timestamp"),
                ],
            ),
        ]);

        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
            rules: Rules::default(),
            source: SourceConfig {
                key_vault: Some("source-vault".to_string()),
                secret_name: Some("orders-db".to_string()),
            },
            output: OutputConfig::default(),
            catalog,
            audit,
        }
    }

    fn store(&self) -> ArtifactStore {
        ArtifactStore::open(self.dir.path().join("config"))
    }

    fn write_input(&self, name: &str, rows: &[&str]) -> PathBuf {
        let path = self.dir.path().join(name);
        let mut content = String::from(HEADER);
        for row in rows {
            content.push('\n');
            content.push_str(row);
        }
        fs::write(&path, content).expect("Failed to write mapping file");
        path
    }

    fn compile(&self, input: &Path, tier: Tier) -> Result<Vec<String>> {
        let store = self.store();
        let resolver = SchemaResolver::new(&self.rules, &self.source, &store, &FixedSecret, &self.catalog);
        let compiler = Compiler::new(&self.rules, &self.output, &resolver, &self.audit as &dyn AuditColumnProvider);

        let spec = loader::load(input, FileType::Csv)?;
        compiler.compile(spec, "sales", tier)?.write(&store)
    }

    fn read(&self, tier: Tier, file_name: &str) -> Value {
        let path = self.store().artifact_path("sales", tier, file_name);
        let content = fs::read_to_string(&path).unwrap_or_else(|e| panic!("{}: {}", path.display(), e));
        serde_json::from_str(&content).expect("Artifact is not valid JSON")
    }

    fn snapshot(&self, tier: Tier) -> BTreeMap<String, Vec<u8>> {
        fs::read_dir(self.store().tier_dir("sales", tier))
            .expect("Failed to list output")
            .map(|entry| {
                let path = entry.expect("Failed to read entry").path();
                let name = path.file_name().unwrap().to_string_lossy().to_string();
                (name, fs::read(&path).unwrap())
            })
            .collect()
    }

    fn bronze_orders(&self) -> PathBuf {
        self.write_input(
            "orders.csv",
            &[
                "ORDERS,id,DimOrders,OrderId,1,,Y,,,",
                "ORDERS,name,DimOrders,OrderName,,,,,,",
                "ORDERS,created,DimOrders,CreatedOn,2,,,,,",
            ],
        )
    }
}

// =============================================================================
// Bronze Tests
// =============================================================================

#[test]
fn test_bronze_writes_all_artifacts_in_order() {
    let harness = Harness::new();
    let input = harness.bronze_orders();

    let written = harness.compile(&input, Tier::Bronze).unwrap();
    assert_eq!(
        written,
        vec![
            "bronze_target_tables_sales.json",
            "landing-zone_schema_DimOrders.json",
            "bronze_schema_DimOrders.json",
            "bronze_pipeline_DimOrders.json",
            "bronze_map_DimOrders.json",
        ]
    );

    assert_eq!(
        harness.read(Tier::Bronze, "bronze_target_tables_sales.json"),
        json!({
            "action": "ingest",
            "target_data_area": "bronze",
            "target_table_list": ["DimOrders"]
        })
    );

    assert_eq!(
        harness.read(Tier::Bronze, "bronze_pipeline_DimOrders.json"),
        json!({
            "source_data_area": "landing-zone",
            "source_table_path": "cura",
            "source_table_name": "ORDERS",
            "target_data_area": "bronze",
            "target_table_path": "cura",
            "target_table_name": "DimOrders"
        })
    );
}

#[test]
fn test_bronze_target_schema_types_from_catalog() {
    let harness = Harness::new();
    harness.compile(&harness.bronze_orders(), Tier::Bronze).unwrap();

    assert_eq!(
        harness.read(Tier::Bronze, "bronze_schema_DimOrders.json"),
        json!({
            "domain": "sales",
            "table_name": "DimOrders",
            "sort_columns": ["OrderId", "CreatedOn"],
            "partition_columns": ["IngestDate"],
            "columns": [
                { "name": "OrderId", "type": "integer" },
                { "name": "OrderName", "type": "string" },
                { "name": "CreatedOn", "type": "timestamp" },
                { "name": "IngestDate", "type": "timestamp" }
            ]
        })
    );
}

#[test]
fn test_landing_zone_echo_is_all_strings() {
    let harness = Harness::new();
    harness.compile(&harness.bronze_orders(), Tier::Bronze).unwrap();

    let echo = harness.read(Tier::Bronze, "landing-zone_schema_DimOrders.json");
    assert_eq!(echo["table_name"], "ORDERS");
    let types: Vec<&str> = echo["columns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["type"].as_str().unwrap())
        .collect();
    assert_eq!(types, vec!["string", "string", "string"]);
}

#[test]
fn test_bronze_mapping_with_business_key() {
    let harness = Harness::new();
    harness.compile(&harness.bronze_orders(), Tier::Bronze).unwrap();

    let mapping = harness.read(Tier::Bronze, "bronze_map_DimOrders.json");
    assert_eq!(mapping["source"], "landing-zone");
    assert_eq!(mapping["target"], "bronze");

    let columns = mapping["columns"].as_array().unwrap();
    assert_eq!(columns.len(), 4);
    assert_eq!(
        columns[0],
        json!({
            "name": "MergeKey",
            "type": "string",
            "source": {
                "function": "key_hash",
                "params": { "column_names": ["OrderId"] },
                "type": "string"
            }
        })
    );
    assert_eq!(
        columns[1],
        json!({ "name": "OrderId", "type": "integer", "source": { "name": "id", "type": "integer" } })
    );
}

#[test]
fn test_transformation_rows() {
    let harness = Harness::new();
    let input = harness.write_input(
        "derived.csv",
        &[
            "ORDERS,id,DimOrders,OrderId,,,,,,",
            r#",,DimOrders,LoadedAt,,,,datetime,,"{""function"": ""current_timestamp"", ""format"": ""utc""}""#,
            ",,DimOrders,Broken,,,,varchar,,not json",
            ",,DimOrders,Region,,,,varchar,EU,",
        ],
    );

    harness.compile(&input, Tier::Bronze).unwrap();

    let mapping = harness.read(Tier::Bronze, "bronze_map_DimOrders.json");
    let columns = mapping["columns"].as_array().unwrap();
    let names: Vec<&str> = columns.iter().map(|c| c["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["OrderId", "LoadedAt", "Region"]);
    assert_eq!(
        columns[1],
        json!({
            "name": "LoadedAt",
            "type": "timestamp",
            "source": { "function": "current_timestamp", "format": "utc", "type": "string" }
        })
    );
    assert_eq!(columns[2]["source"], json!({}));

    let schema = harness.read(Tier::Bronze, "bronze_schema_DimOrders.json");
    let schema_names: Vec<&str> = schema["columns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(schema_names, vec!["OrderId", "LoadedAt", "Broken", "Region", "IngestDate"]);
}

// =============================================================================
// Failure Tests
// =============================================================================

#[test]
fn test_invalid_source_column_writes_nothing() {
    let harness = Harness::new();
    let input = harness.write_input(
        "invalid.csv",
        &["ORDERS,id,DimOrders,OrderId,,,,,,", "ORDERS,email,DimOrders,Email,,,,,,"],
    );

    let err = harness.compile(&input, Tier::Bronze).unwrap_err();
    match err {
        MapError::InvalidSourceColumns { ref columns } => {
            assert_eq!(columns.len(), 1);
            assert_eq!(columns[0].to_string(), "ORDERS.email");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!harness.store().tier_dir("sales", Tier::Bronze).exists());
}

#[test]
fn test_source_echoes_and_invalid_columns_follow_file_order() {
    let harness = Harness::new();
    let input = harness.write_input(
        "two_sources.csv",
        &[
            "ORDERS,id,DimOrders,OrderId,,,,,,",
            "ADDRESSES,city,DimAddresses,City,,,,,,",
        ],
    );

    let written = harness.compile(&input, Tier::Bronze).unwrap();
    assert_eq!(
        &written[1..3],
        &["landing-zone_schema_DimOrders.json", "landing-zone_schema_DimAddresses.json"]
    );

    let invalid = harness.write_input(
        "two_invalid.csv",
        &[
            "ORDERS,email,DimOrders,Email,,,,,,",
            "ADDRESSES,zip,DimAddresses,Zip,,,,,,",
        ],
    );
    match harness.compile(&invalid, Tier::Bronze).unwrap_err() {
        MapError::InvalidSourceColumns { columns } => {
            let names: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
            assert_eq!(names, vec!["ORDERS.email", "ADDRESSES.zip"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_no_source_tables_writes_nothing() {
    let harness = Harness::new();
    let input = harness.write_input(
        "constants.csv",
        &[",,DimCalendar,DayNumber,,,,int,1,", ",,DimCalendar,MonthName,,,,varchar,Jan,"],
    );

    let err = harness.compile(&input, Tier::Bronze).unwrap_err();
    assert!(matches!(err, MapError::NoSourceTables { tier: Tier::Bronze }));
    assert!(!harness.store().tier_dir("sales", Tier::Bronze).exists());
}

#[test]
fn test_missing_required_columns() {
    let harness = Harness::new();
    let path = harness.dir.path().join("short.csv");
    fs::write(
        &path,
        "Source Table Name,Source Column Name,Target Table Name,Target Column Name\nORDERS,id,DimOrders,OrderId\n",
    )
    .unwrap();

    let err = harness.compile(&path, Tier::Bronze).unwrap_err();
    match err {
        MapError::MissingColumns { columns } => assert_eq!(
            columns,
            vec![
                "Order By",
                "Partition By",
                "Is Business Key",
                "Data Type",
                "Default Value",
                "Transformation Function"
            ]
        ),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_landing_zone_target_has_no_upstream() {
    let harness = Harness::new();
    let input = harness.bronze_orders();

    let err = harness.compile(&input, Tier::LandingZone).unwrap_err();
    assert!(matches!(err, MapError::UnresolvedSchema { target: Tier::LandingZone }));
}

#[test]
fn test_silver_without_bronze_artifact_fails() {
    let harness = Harness::new();
    let input = harness.write_input("silver.csv", &["DimOrders,OrderId,FactOrders,OrderKey,,,,,,"]);

    let err = harness.compile(&input, Tier::Silver).unwrap_err();
    assert!(matches!(err, MapError::SchemaArtifactNotFound { .. }));
}

// =============================================================================
// Chained Tier Tests
// =============================================================================

#[test]
fn test_silver_reads_bronze_artifact() {
    let harness = Harness::new();
    harness.compile(&harness.bronze_orders(), Tier::Bronze).unwrap();

    let input = harness.write_input(
        "silver.csv",
        &[
            "DimOrders,OrderId,FactOrders,OrderKey,1,,yes,,,",
            "DimOrders,CreatedOn,FactOrders,OrderDate,,1,,,,",
        ],
    );
    let written = harness.compile(&input, Tier::Silver).unwrap();
    assert!(written.contains(&"bronze_schema_FactOrders.json".to_string()));

    let echo = harness.read(Tier::Silver, "bronze_schema_FactOrders.json");
    assert_eq!(echo["table_name"], "DimOrders");
    assert_eq!(echo["columns"][0], json!({ "name": "OrderId", "type": "integer" }));

    let schema = harness.read(Tier::Silver, "silver_schema_FactOrders.json");
    assert_eq!(schema["sort_columns"], json!(["OrderKey", "MergeKey"]));
    assert_eq!(schema["partition_columns"], json!(["OrderDate"]));
    assert_eq!(
        schema["columns"],
        json!([
            { "name": "MergeKey", "type": "string" },
            { "name": "OrderKey", "type": "integer" },
            { "name": "OrderDate", "type": "timestamp" },
            { "name": "CreatedAt", "type": "timestamp" },
            { "name": "UpdatedAt", "type": "timestamp" }
        ])
    );

    let tables = harness.read(Tier::Silver, "silver_target_tables_sales.json");
    assert_eq!(tables["action"], "merge");
}

#[test]
fn test_recompile_is_byte_identical() {
    let harness = Harness::new();
    let input = harness.bronze_orders();

    harness.compile(&input, Tier::Bronze).unwrap();
    let first = harness.snapshot(Tier::Bronze);
    harness.compile(&input, Tier::Bronze).unwrap();
    let second = harness.snapshot(Tier::Bronze);

    assert_eq!(first.len(), 5);
    assert_eq!(first, second);

    let raw = String::from_utf8(first["bronze_pipeline_DimOrders.json"].clone()).unwrap();
    assert!(raw.starts_with("{\n    \"source_data_area\""));
}
