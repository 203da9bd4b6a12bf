//! CLI argument parsing for mapcompiler

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::loader::FileType;
use crate::rules::Tier;

#[derive(Parser, Debug)]
#[command(name = "mc")]
#[command(author, version, about = "Compile mapping specifications into data pipeline configuration", long_about = None)]
pub struct Cli {
    /// Mapping specification file (Excel workbook or CSV)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Business domain the mapping belongs to
    #[arg(short, long)]
    pub domain: String,

    /// Format of the mapping file
    #[arg(short = 't', long = "type", value_enum, default_value_t = FileType::Excel)]
    pub file_type: FileType,

    /// Data area the mapping targets
    #[arg(short = 'a', long, value_enum)]
    pub target: Tier,

    /// Run mode
    #[arg(short, long, value_enum, default_value_t = Mode::Debug)]
    pub mode: Mode,

    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    pub log_level: Option<String>,
}

/// Whether generated files stay local or are handed on for upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Debug,
    Live,
}
