//! Mapping file loading from spreadsheets and CSV files

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{MapError, Result};
use crate::spec::{Cell, MappingSpecification};

/// Declared format of the input file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Excel,
    Csv,
}

const SPREADSHEET_EXTENSIONS: [&str; 4] = ["xlsx", "xlsm", "xls", "ods"];

/// A header row plus raw data records
struct Table {
    headers: Vec<String>,
    records: Vec<Vec<Cell>>,
}

/// Load a mapping file into a normalized specification
///
/// The reader is chosen by file extension; `file_type` is what the caller
/// expects and only produces a warning when it disagrees.
pub fn load(path: &Path, file_type: FileType) -> Result<MappingSpecification> {
    if !path.exists() {
        return Err(MapError::InputNotFound {
            path: path.to_path_buf(),
        });
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let (detected, table) = if extension == "csv" {
        info!(path = %path.display(), "Loading input file as a CSV file");
        (FileType::Csv, read_csv(path)?)
    } else if SPREADSHEET_EXTENSIONS.contains(&extension.as_str()) {
        info!(path = %path.display(), "Loading input file as an Excel file");
        (FileType::Excel, read_spreadsheet(path)?)
    } else {
        return Err(MapError::UnsupportedFormat {
            path: path.to_path_buf(),
        });
    };

    if detected != file_type {
        warn!(?file_type, ?detected, path = %path.display(), "Declared file type does not match extension");
    }

    if table.records.is_empty() {
        return Err(MapError::EmptyInput {
            path: path.to_path_buf(),
        });
    }

    debug!(rows = table.records.len(), columns = table.headers.len(), "Input file parsed");
    let spec = MappingSpecification::from_table(table.headers, table.records);
    info!(path = %path.display(), "Input file loaded successfully");
    Ok(spec)
}

fn unreadable(path: &Path, err: impl ToString) -> MapError {
    MapError::UnreadableInput {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

fn read_csv(path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| unreadable(path, e))?;

    let headers = reader
        .headers()
        .map_err(|e| unreadable(path, e))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| unreadable(path, e))?;
        let cells: Vec<Cell> = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(field.to_string())
                }
            })
            .collect();
        if !is_blank(&cells) {
            records.push(cells);
        }
    }

    Ok(Table { headers, records })
}

fn read_spreadsheet(path: &Path) -> Result<Table> {
    let mut workbook = open_workbook_auto(path).map_err(|e| unreadable(path, e))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| unreadable(path, "workbook has no worksheets"))?
        .map_err(|e| unreadable(path, e))?;

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(row) => row.iter().map(|c| c.to_string()).collect(),
        None => Vec::new(),
    };

    let records = rows
        .map(|row| row.iter().map(to_cell).collect::<Vec<_>>())
        .filter(|cells| !is_blank(cells))
        .collect();

    Ok(Table { headers, records })
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Bool(*b),
        other => Cell::Text(other.to_string()),
    }
}

fn is_blank(cells: &[Cell]) -> bool {
    cells.iter().all(|c| match c {
        Cell::Text(s) => s.trim().is_empty(),
        other => other.is_null(),
    })
}
