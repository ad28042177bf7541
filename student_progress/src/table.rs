// ********* Tabular store ***********

use std::fmt::Display;

use snafu::OptionExt;

use crate::error::*;

/// The content of one cell, as read from a spreadsheet or a CSV file.
///
/// Readers are permissive: a cell is only interpreted when it is accessed
/// through one of the typed accessors.
#[derive(PartialEq, Debug, Clone)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
}

impl Cell {
    /// A field read from a file. The text is kept as it is, apart from the
    /// surrounding whitespace: `0043` stays `0043`. Numbers and booleans are
    /// only interpreted through [Cell::as_f64] and [Cell::as_bool].
    pub fn raw(field: &str) -> Cell {
        Cell::text(field.trim())
    }

    pub fn text(s: &str) -> Cell {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }

    pub fn from_opt_f64(x: Option<f64>) -> Cell {
        match x {
            Some(v) if v.is_finite() => Cell::Number(v),
            _ => Cell::Empty,
        }
    }

    pub fn from_opt_str(x: Option<&str>) -> Cell {
        x.map(Cell::text).unwrap_or(Cell::Empty)
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Numeric view of the cell. Text is accepted if it parses as a number,
    /// with either a decimal point or a decimal comma.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(x) => Some(*x),
            Cell::Text(s) => s
                .trim()
                .replace(',', ".")
                .parse::<f64>()
                .ok()
                .filter(|x| x.is_finite()),
            Cell::Bool(_) | Cell::Empty => None,
        }
    }

    /// Boolean view of the cell. Text is accepted if it reads `true` or
    /// `false`, in any case.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Cell::Bool(b) => Some(*b),
            Cell::Text(s) => match s.trim().to_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            Cell::Number(_) | Cell::Empty => None,
        }
    }

    /// Textual view of the cell. Missing cells have no text.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            c => Some(c.to_string()),
        }
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Number(x) => write!(f, "{}", x),
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// A rename table from source column titles to semantic names.
pub type ColumnMapping = Vec<(String, String)>;

/// A loosely typed table: a header and rows of cells, all of the same width.
///
/// This is the exchange format between the file readers and the typed
/// models ([crate::Roster], [crate::WeeklySurvey]).
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Table {
    header: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(header: Vec<String>) -> Table {
        Table {
            header,
            rows: Vec::new(),
        }
    }

    /// Adds a row. Short rows are padded with empty cells, extra cells are dropped.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.header.len(), Cell::Empty);
        self.rows.push(row);
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// The index of a column that must be present.
    pub fn require_column(&self, name: &str, source: &str) -> RosterResult<usize> {
        self.column_index(name).context(MissingColumnSnafu {
            column: name.to_string(),
            source_name: source.to_string(),
        })
    }

    /// Renames the columns found in the mapping. Titles that do not appear in
    /// the header are ignored.
    pub fn rename_columns(&mut self, mapping: &[(String, String)]) {
        for h in self.header.iter_mut() {
            if let Some((_, target)) = mapping.iter().find(|(src, _)| src == h) {
                *h = target.clone();
            }
        }
    }

    /// The names of the columns in the half-open positional range `[first, last)`.
    pub fn column_names_in_range(&self, first: usize, last: usize) -> RosterResult<Vec<String>> {
        if first >= last || last > self.header.len() {
            return Err(RosterError::ColumnIndexOutOfRange {
                first,
                last,
                width: self.header.len(),
            });
        }
        Ok(self.header[first..last].to_vec())
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<Cell>>) {
        (self.header, self.rows)
    }
}
