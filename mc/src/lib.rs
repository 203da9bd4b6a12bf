//! mapcompiler - compiles field-mapping spreadsheets into pipeline configuration
//!
//! A mapping specification lists, row by row, which source column feeds which
//! target column of a data area (landing-zone, bronze, silver or gold). The
//! compiler validates it against the upstream table schemas and emits the JSON
//! artifacts a tiered data pipeline reads.
//!
//! # Layout
//!
//! ```text
//! {output-dir}/
//! └── domains/
//!     └── {domain}/
//!         └── {tier}/
//!             ├── {tier}_target_tables_{domain}.json
//!             ├── {upstream}_schema_{table}.json    # source schema echo
//!             ├── {tier}_schema_{table}.json
//!             ├── {tier}_pipeline_{table}.json
//!             └── {tier}_map_{table}.json
//! ```
//!
//! # Example
//!
//! ```ignore
//! use mapcompiler::{Config, FileType, Tier, compiler};
//!
//! let config = Config::load(None)?;
//! let written = compiler::run(&config, "mapping.xlsx".as_ref(), FileType::Excel, "sales", Tier::Bronze)?;
//! ```

pub mod audit;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod error;
pub mod generate;
pub mod introspect;
pub mod loader;
pub mod resolver;
pub mod rules;
pub mod sanitize;
pub mod schema;
pub mod secrets;
pub mod spec;
pub mod store;
pub mod validate;

pub use compiler::{CompiledArtifacts, Compiler};
pub use config::Config;
pub use error::{ErrorKind, MapError, Result};
pub use loader::FileType;
pub use rules::{DataType, Rules, Tier};
pub use schema::{ColumnSchema, SchemaCache, SourceSchema};
pub use spec::{MappingRow, MappingSpecification};
pub use store::ArtifactStore;
