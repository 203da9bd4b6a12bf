//! JSON artifact store
//!
//! Generated configuration lives under a single output root:
//!
//! ```text
//! config/
//! ├── mint/
//! │   └── mint_data_areas.json
//! └── domains/
//!     └── {domain}/
//!         └── {tier}/
//!             ├── {tier}_target_tables_{domain}.json
//!             ├── {upstream}_schema_{table}.json
//!             ├── {tier}_schema_{table}.json
//!             ├── {tier}_pipeline_{table}.json
//!             └── {tier}_map_{table}.json
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::{MapError, Result};
use crate::rules::Tier;

/// Reads and writes JSON artifacts below an output root
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Open a store rooted at the given path; directories are created on write
    pub fn open(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        debug!(?root, "Opened artifact store");
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one domain's artifacts for a data area
    pub fn tier_dir(&self, domain: &str, tier: Tier) -> PathBuf {
        self.root.join("domains").join(domain).join(tier.as_str())
    }

    pub fn artifact_path(&self, domain: &str, tier: Tier, file_name: &str) -> PathBuf {
        self.tier_dir(domain, tier).join(file_name)
    }

    /// Load and deserialize a JSON file
    pub fn load<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                MapError::SchemaArtifactNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                MapError::MalformedArtifact {
                    path: path.to_path_buf(),
                    source: serde_json::Error::io(e),
                }
            }
        })?;

        serde_json::from_str(&content).map_err(|source| MapError::MalformedArtifact {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Serialize a value as 4-space indented JSON, replacing any existing file
    pub fn save<T: Serialize>(&self, domain: &str, tier: Tier, file_name: &str, value: &T) -> Result<PathBuf> {
        let dir = self.tier_dir(domain, tier);
        fs::create_dir_all(&dir).map_err(|source| MapError::CreateDir {
            path: dir.clone(),
            source,
        })?;

        let path = dir.join(file_name);
        let content = to_json(value)?;
        fs::write(&path, content).map_err(|source| MapError::Write {
            path: path.clone(),
            source,
        })?;

        info!(path = %path.display(), "Config file generated successfully");
        Ok(path)
    }
}

/// Render a value as 4-space indented JSON
pub fn to_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(buf)
}
