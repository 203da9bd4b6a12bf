//! Compilation rules: data areas, the data type dictionary and required mapping columns
//!
//! Everything here is lookup data rather than branching, so a new data area or
//! source type is a configuration change. [`Rules::default`] carries the built-in
//! tables; a config file can replace any of them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::spec::headers;

/// A data area (tier) of the layered store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    LandingZone,
    Bronze,
    Silver,
    Gold,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::LandingZone => "landing-zone",
            Tier::Bronze => "bronze",
            Tier::Silver => "silver",
            Tier::Gold => "gold",
        }
    }

    /// Silver and gold tables are merged on a hashed business key; lower tiers are appended
    pub fn merges(&self) -> bool {
        matches!(self, Tier::Silver | Tier::Gold)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target column data types understood by the downstream pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Integer,
    Double,
    String,
    Timestamp,
    Long,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Integer => "integer",
            DataType::Double => "double",
            DataType::String => "string",
            DataType::Timestamp => "timestamp",
            DataType::Long => "long",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable lookup tables shared by every stage of a compilation run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    /// Source type name (lowercase) to target data type
    #[serde(rename = "type-map")]
    pub type_map: BTreeMap<String, DataType>,

    /// Target data area to the data area it reads from
    pub upstream: BTreeMap<Tier, Tier>,

    /// Mapping file columns that must be present for each target data area
    #[serde(rename = "required-columns")]
    pub required_columns: BTreeMap<Tier, Vec<String>>,
}

impl Default for Rules {
    fn default() -> Self {
        let type_map = [
            ("smallint", DataType::Integer),
            ("int", DataType::Integer),
            ("integer", DataType::Integer),
            ("bigint", DataType::Long),
            ("long", DataType::Long),
            ("decimal", DataType::Double),
            ("double", DataType::Double),
            ("varchar", DataType::String),
            ("uniqueidentifier", DataType::String),
            ("datetime", DataType::Timestamp),
            ("date", DataType::Timestamp),
            ("timestamp", DataType::Timestamp),
        ]
        .into_iter()
        .map(|(name, data_type)| (name.to_string(), data_type))
        .collect();

        let upstream = BTreeMap::from([
            (Tier::Bronze, Tier::LandingZone),
            (Tier::Silver, Tier::Bronze),
            (Tier::Gold, Tier::Silver),
        ]);

        let landing: Vec<String> = [
            headers::SOURCE_TABLE,
            headers::SOURCE_COLUMN,
            headers::TARGET_TABLE,
            headers::TARGET_COLUMN,
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let mut full = landing.clone();
        full.extend(
            [
                headers::ORDER_BY,
                headers::PARTITION_BY,
                headers::IS_BUSINESS_KEY,
                headers::DATA_TYPE,
                headers::DEFAULT_VALUE,
                headers::TRANSFORMATION_FUNCTION,
            ]
            .iter()
            .map(|s| s.to_string()),
        );

        let required_columns = BTreeMap::from([
            (Tier::LandingZone, landing),
            (Tier::Bronze, full.clone()),
            (Tier::Silver, full.clone()),
            (Tier::Gold, full),
        ]);

        Self {
            type_map,
            upstream,
            required_columns,
        }
    }
}

impl Rules {
    /// Map a source or declared type name to a target data type
    ///
    /// Matching ignores case, surrounding whitespace and a `(length)` suffix.
    /// Unknown types fall back to string.
    pub fn map_type(&self, raw: &str) -> DataType {
        let base = raw.split('(').next().unwrap_or_default().trim().to_lowercase();
        self.type_map.get(&base).copied().unwrap_or(DataType::String)
    }

    /// Map an optional type name, defaulting to string when absent
    pub fn map_optional_type(&self, raw: Option<&str>) -> DataType {
        raw.map(|t| self.map_type(t)).unwrap_or(DataType::String)
    }

    /// The data area a target data area reads from
    pub fn upstream_of(&self, target: Tier) -> Option<Tier> {
        self.upstream.get(&target).copied()
    }

    /// Required mapping file columns for a target data area
    pub fn required_columns(&self, target: Tier) -> Option<&[String]> {
        self.required_columns.get(&target).map(Vec::as_slice)
    }
}
