//! The normalized mapping specification

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::sanitize::{cleanse, cleanse_one};

/// Mapping file column headers
pub mod headers {
    pub const SOURCE_TABLE: &str = "Source Table Name";
    pub const SOURCE_COLUMN: &str = "Source Column Name";
    pub const TARGET_TABLE: &str = "Target Table Name";
    pub const TARGET_COLUMN: &str = "Target Column Name";
    pub const ORDER_BY: &str = "Order By";
    pub const PARTITION_BY: &str = "Partition By";
    pub const IS_BUSINESS_KEY: &str = "Is Business Key";
    pub const DATA_TYPE: &str = "Data Type";
    pub const DEFAULT_VALUE: &str = "Default Value";
    pub const TRANSFORMATION_FUNCTION: &str = "Transformation Function";
}

/// A raw cell value as produced by the tabular reader
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Number(n) => n.is_nan(),
            Cell::Text(_) | Cell::Bool(_) => false,
        }
    }

    /// Text rendering of the cell; whole numbers render without a fraction
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(n) if n.is_nan() => None,
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => Some((*n as i64).to_string()),
            Cell::Number(n) => Some(n.to_string()),
            Cell::Bool(b) => Some(b.to_string()),
        }
    }

    /// Trim text cells in place, turning blank text into `Empty`
    fn normalized(self) -> Self {
        match self {
            Cell::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(trimmed.to_string())
                }
            }
            other => other,
        }
    }

    /// Ordering used for `Order By` / `Partition By` positions
    ///
    /// Numbers (including numeric text) sort before other text.
    pub fn position_cmp(&self, other: &Cell) -> Ordering {
        match (self.position(), other.position()) {
            (Position::Number(a), Position::Number(b)) => a.total_cmp(&b),
            (Position::Number(_), Position::Text(_)) => Ordering::Less,
            (Position::Text(_), Position::Number(_)) => Ordering::Greater,
            (Position::Text(a), Position::Text(b)) => a.cmp(&b),
        }
    }

    fn position(&self) -> Position {
        match self {
            Cell::Number(n) => Position::Number(*n),
            Cell::Bool(b) => Position::Number(if *b { 1.0 } else { 0.0 }),
            Cell::Text(s) => match s.trim().parse::<f64>() {
                Ok(n) => Position::Number(n),
                Err(_) => Position::Text(s.clone()),
            },
            Cell::Empty => Position::Text(String::new()),
        }
    }
}

enum Position {
    Number(f64),
    Text(String),
}

/// One mapping line: how a single target column is populated
#[derive(Debug, Clone, PartialEq)]
pub struct MappingRow {
    /// 1-based data row number in the input file
    pub line: usize,
    pub source_table: Option<String>,
    pub source_column: Option<String>,
    pub target_table: Option<String>,
    pub target_column: Option<String>,
    pub data_type: Option<String>,
    pub order_by: Cell,
    pub partition_by: Cell,
    pub is_business_key: Option<String>,
    pub default_value: Option<String>,
    pub transformation_function: Option<String>,
}

impl MappingRow {
    /// Empty row for the given line, used as a base when building rows
    pub fn new(line: usize) -> Self {
        Self {
            line,
            source_table: None,
            source_column: None,
            target_table: None,
            target_column: None,
            data_type: None,
            order_by: Cell::Empty,
            partition_by: Cell::Empty,
            is_business_key: None,
            default_value: None,
            transformation_function: None,
        }
    }
}

/// A loaded mapping file: its headers as written plus the normalized rows
#[derive(Debug, Clone, PartialEq)]
pub struct MappingSpecification {
    pub columns: Vec<String>,
    pub rows: Vec<MappingRow>,
}

impl MappingSpecification {
    /// Build a specification from a header row and data records
    ///
    /// Table and column names are cleansed, other text cells trimmed.
    /// Headers are matched verbatim; cells under unknown headers are ignored.
    pub fn from_table(columns: Vec<String>, records: Vec<Vec<Cell>>) -> Self {
        let index: HashMap<&str, usize> = columns.iter().enumerate().map(|(i, c)| (c.as_str(), i)).collect();

        let rows = records
            .into_iter()
            .enumerate()
            .map(|(i, record)| {
                let mut cells: Vec<Cell> = record.into_iter().map(Cell::normalized).collect();
                let mut take = |header: &str| -> Cell {
                    index
                        .get(header)
                        .and_then(|&i| cells.get_mut(i))
                        .map(|cell| std::mem::replace(cell, Cell::Empty))
                        .unwrap_or(Cell::Empty)
                };

                MappingRow {
                    line: i + 1,
                    source_table: cleanse_one(take(headers::SOURCE_TABLE).as_text().as_deref()),
                    source_column: cleanse_one(take(headers::SOURCE_COLUMN).as_text().as_deref()),
                    target_table: cleanse_one(take(headers::TARGET_TABLE).as_text().as_deref()),
                    target_column: cleanse_one(take(headers::TARGET_COLUMN).as_text().as_deref()),
                    data_type: take(headers::DATA_TYPE).as_text(),
                    order_by: take(headers::ORDER_BY),
                    partition_by: take(headers::PARTITION_BY),
                    is_business_key: take(headers::IS_BUSINESS_KEY).as_text(),
                    default_value: take(headers::DEFAULT_VALUE).as_text(),
                    transformation_function: take(headers::TRANSFORMATION_FUNCTION).as_text(),
                }
            })
            .collect();

        Self { columns, rows }
    }

    pub fn has_column(&self, header: &str) -> bool {
        self.columns.iter().any(|c| c == header)
    }

    /// Distinct target tables in first-seen order
    pub fn target_tables(&self) -> Vec<String> {
        cleanse(self.rows.iter().map(|r| r.target_table.as_deref()))
    }

    /// Distinct source tables in first-seen order
    pub fn source_tables(&self) -> Vec<String> {
        cleanse(self.rows.iter().map(|r| r.source_table.as_deref()))
    }

    /// Rows feeding the given target table, in file order
    pub fn rows_for_target<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a MappingRow> + 'a {
        self.rows.iter().filter(move |r| r.target_table.as_deref() == Some(table))
    }

    /// Rows reading from the given source table, in file order
    pub fn rows_for_source<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a MappingRow> + 'a {
        self.rows.iter().filter(move |r| r.source_table.as_deref() == Some(table))
    }
}
