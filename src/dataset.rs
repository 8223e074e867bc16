//! Tabular perception data: typed columns, rows and the CSV ingestion boundary.

use anyhow::{anyhow, Context};
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};

/// Cell texts read as missing values, in addition to the empty cell.
pub const NA_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Whether a trimmed cell stands for a missing value.
pub fn is_na(cell: &str) -> bool {
    cell.is_empty() || NA_TOKENS.contains(&cell)
}

/// A single cell of the table.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Missing,
}

impl Value {
    /// Equality against a user selection as shown in the filter options.
    pub fn matches(&self, selected: &str) -> bool {
        match self {
            Value::Text(s) => s == selected,
            Value::Number(x) => selected.trim().parse::<f64>().map_or(false, |v| v == *x),
            Value::Missing => false,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(x) => write!(f, "{}", x),
            Value::Text(s) => f.write_str(s),
            Value::Missing => f.write_str("NaN"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn numeric(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: ColumnKind::Numeric }
    }

    pub fn categorical(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: ColumnKind::Categorical }
    }
}

/// One row of the table, co-indexed with the dataset columns.
pub type Observation = Vec<Value>;

/// An ordered set of observations sharing one column schema.
///
/// Every row holds exactly one value per column, and numeric columns only
/// hold numbers or missing cells. Row order is the input order and is never
/// changed by any operation on the dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSet {
    columns: Vec<Column>,
    rows: Vec<Observation>,
}

impl DataSet {
    /// Build a dataset, checking that the rows fit the columns.
    pub fn new(columns: Vec<Column>, rows: Vec<Observation>) -> Result<Self> {
        let mut seen = HashSet::new();
        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(Error::Schema(format!("duplicate column name {:?}", col.name)));
            }
        }

        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(Error::Schema(format!(
                    "row {} has {} values but there are {} columns",
                    i,
                    row.len(),
                    columns.len()
                )));
            }
            for (value, col) in row.iter().zip(&columns) {
                if col.kind == ColumnKind::Numeric && matches!(value, Value::Text(_)) {
                    return Err(Error::Schema(format!(
                        "row {} has text {} in numeric column {:?}",
                        i, value, col.name
                    )));
                }
            }
        }

        Ok(Self { columns, rows })
    }

    /// Build a dataset from raw string cells, inferring the column types.
    ///
    /// A column is numeric when every non-missing cell parses as a float.
    /// Empty cells and the `NA_TOKENS` become `Value::Missing`.
    pub fn from_records(headers: Vec<String>, records: Vec<Vec<String>>) -> Result<Self> {
        let ncols = headers.len();
        if let Some((i, r)) = records.iter().enumerate().find(|(_, r)| r.len() != ncols) {
            return Err(Error::Schema(format!(
                "row {} has {} values but there are {} columns",
                i,
                r.len(),
                ncols
            )));
        }

        let columns: Vec<Column> = headers
            .into_iter()
            .enumerate()
            .map(|(j, name)| {
                let numeric = records.iter().all(|r| {
                    let cell = r[j].trim();
                    is_na(cell) || cell.parse::<f64>().is_ok()
                });
                let kind = if numeric { ColumnKind::Numeric } else { ColumnKind::Categorical };
                Column { name, kind }
            })
            .collect();

        let rows = records
            .into_iter()
            .map(|r| {
                r.into_iter()
                    .zip(&columns)
                    .map(|(cell, col)| {
                        let cell = cell.trim();
                        if is_na(cell) {
                            Value::Missing
                        } else if col.kind == ColumnKind::Numeric {
                            Value::Number(cell.parse::<f64>().unwrap_or(f64::NAN))
                        } else {
                            Value::Text(cell.to_string())
                        }
                    })
                    .collect()
            })
            .collect();

        Self::new(columns, rows)
    }

    /// Read delimited text with a header line into a DataSet
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> anyhow::Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()
            .context("Failed to read the header line")?
            .iter()
            .map(|s| s.trim().to_string())
            .collect();

        let mut records: Vec<Vec<String>> = Vec::new();
        for (i, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| anyhow!("Error reading record {}: {}", i, e))?;
            records.push(record.iter().map(|s| s.to_string()).collect());
        }

        Ok(Self::from_records(headers, records)?)
    }

    /// Read a CSV (or other delimited) file into a DataSet
    pub fn from_path<P: AsRef<Path>>(path: P, delimiter: u8) -> anyhow::Result<Self> {
        let file = File::open(&path)
            .map_err(|e| anyhow!("Failed to open {:?}: {}", path.as_ref(), e))?;
        Self::from_reader(file, delimiter)
            .with_context(|| format!("Failed to parse {:?}", path.as_ref()))
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// The first `n` rows, for previews.
    pub fn head(&self, n: usize) -> DataSet {
        DataSet {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Keep the rows for which `keep` returns true, in their original order.
    pub fn retain_rows<F>(&self, mut keep: F) -> DataSet
    where
        F: FnMut(&Observation) -> bool,
    {
        DataSet {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Sorted distinct non-missing values of a column, rendered as strings.
    ///
    /// Numeric columns sort by value, categorical ones lexically. Returns an
    /// empty list when the column does not exist.
    pub fn distinct_values(&self, name: &str) -> Vec<String> {
        let Some(j) = self.column_index(name) else {
            return Vec::new();
        };

        let mut values: Vec<&Value> = self
            .rows
            .iter()
            .map(|r| &r[j])
            .filter(|v| !v.is_missing() && !matches!(v, Value::Number(x) if x.is_nan()))
            .collect();
        values.sort_by(|a, b| match (a, b) {
            (Value::Number(x), Value::Number(y)) => x.total_cmp(y),
            _ => a.to_string().cmp(&b.to_string()),
        });

        let mut out: Vec<String> = values.into_iter().map(|v| v.to_string()).collect();
        out.dedup();
        out
    }
}

impl fmt::Display for DataSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header: Vec<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
        writeln!(f, "{}", header.join("\t"))?;
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            writeln!(f, "{}", cells.join("\t"))?;
        }
        Ok(())
    }
}
