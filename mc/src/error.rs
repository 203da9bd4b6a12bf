//! Compiler error types

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::rules::Tier;

pub type Result<T> = std::result::Result<T, MapError>;

/// Broad class of a failure, used to decide how a run reacts to it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Validation,
    SchemaResolution,
    ConfigGeneration,
    Persistence,
}

/// A source column referenced by the mapping file but missing from its source schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidColumn {
    pub table: String,
    pub column: String,
}

impl fmt::Display for InvalidColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// Errors that can occur while compiling a mapping file
#[derive(Debug, Error)]
pub enum MapError {
    #[error("Input file {path} does not exist")]
    InputNotFound { path: PathBuf },

    #[error("Unsupported file format for {path}; only spreadsheet (.xlsx) and .csv files are supported")]
    UnsupportedFormat { path: PathBuf },

    #[error("Input file {path} is empty")]
    EmptyInput { path: PathBuf },

    #[error("Failed to read input file {path}: {message}")]
    UnreadableInput { path: PathBuf, message: String },

    #[error("No required columns configured for target data area '{tier}'")]
    UnconfiguredTier { tier: Tier },

    #[error("Mapping file is missing required columns: {}", columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    #[error("Mapping file names no source tables for target data area '{tier}'")]
    NoSourceTables { tier: Tier },

    #[error("Mapping file contains invalid source columns: {}", join(columns))]
    InvalidSourceColumns { columns: Vec<InvalidColumn> },

    #[error("Cannot resolve source schema for target data area '{target}': no upstream data area")]
    UnresolvedSchema { target: Tier },

    #[error("Schema artifact not found: {path}")]
    SchemaArtifactNotFound { path: PathBuf },

    #[error("Malformed JSON artifact {path}: {source}")]
    MalformedArtifact {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Secret '{name}' unavailable in vault '{vault}': {message}")]
    Secret { vault: String, name: String, message: String },

    #[error("Failed to introspect table '{table}': {message}")]
    Introspection { table: String, message: String },

    #[error("Audit columns unavailable for data area '{tier}': {message}")]
    AuditColumns { tier: Tier, message: String },

    #[error("Error generating target schema for {table}: {message}")]
    SchemaGeneration { table: String, message: String },

    #[error("Error generating pipeline configuration: {message}")]
    PipelineGeneration { message: String },

    #[error("Error generating mapping configuration for {table}: {message}")]
    MappingGeneration { table: String, message: String },

    #[error("Mapping configuration for {table} has no columns")]
    EmptyMapping { table: String },

    #[error("Malformed transformation function for {table}.{column}: {message}")]
    MalformedTransformation {
        table: String,
        column: String,
        message: String,
    },

    #[error("Error creating output folder '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error writing to file '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

fn join(columns: &[InvalidColumn]) -> String {
    columns.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

impl MapError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            MapError::InputNotFound { .. }
            | MapError::UnsupportedFormat { .. }
            | MapError::EmptyInput { .. }
            | MapError::UnreadableInput { .. } => ErrorKind::Input,
            MapError::UnconfiguredTier { .. }
            | MapError::MissingColumns { .. }
            | MapError::NoSourceTables { .. }
            | MapError::InvalidSourceColumns { .. } => ErrorKind::Validation,
            MapError::UnresolvedSchema { .. }
            | MapError::SchemaArtifactNotFound { .. }
            | MapError::MalformedArtifact { .. }
            | MapError::Secret { .. }
            | MapError::Introspection { .. } => ErrorKind::SchemaResolution,
            MapError::AuditColumns { .. }
            | MapError::SchemaGeneration { .. }
            | MapError::PipelineGeneration { .. }
            | MapError::MappingGeneration { .. }
            | MapError::EmptyMapping { .. }
            | MapError::MalformedTransformation { .. } => ErrorKind::ConfigGeneration,
            MapError::CreateDir { .. } | MapError::Write { .. } | MapError::Serialize(_) => ErrorKind::Persistence,
        }
    }

    /// Check if the run can continue past this error
    ///
    /// Only a malformed transformation function is recovered from, by skipping its column.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, MapError::MalformedTransformation { .. })
    }
}
