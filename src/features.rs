//! Numeric feature extraction.

use log::debug;
use ndarray::Array2;

use crate::dataset::{ColumnKind, DataSet, Value};
use crate::error::{Error, Result};

/// The N×D matrix of numeric ratings, rows in dataset order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    /// Names of the numeric columns, in schema order.
    pub columns: Vec<String>,
    pub data: Array2<f64>,
}

impl FeatureMatrix {
    /// Every numeric column of `data`; other columns are skipped by type, not by name.
    ///
    /// Missing numeric cells become NaN.
    pub fn extract(data: &DataSet) -> Result<Self> {
        let numeric: Vec<usize> = data
            .columns()
            .iter()
            .enumerate()
            .filter(|(_, c)| c.kind == ColumnKind::Numeric)
            .map(|(j, _)| j)
            .collect();

        if numeric.is_empty() {
            return Err(Error::InsufficientFeatures);
        }
        if data.is_empty() {
            return Err(Error::InsufficientRows);
        }

        let nrows = data.nrows();
        let ncols = numeric.len();
        let matrix = Array2::from_shape_fn((nrows, ncols), |(i, j)| {
            match data.rows()[i][numeric[j]] {
                Value::Number(x) => x,
                _ => f64::NAN,
            }
        });
        debug!("extracted {} x {} feature matrix", nrows, ncols);

        Ok(Self {
            columns: numeric.iter().map(|&j| data.columns()[j].name.clone()).collect(),
            data: matrix,
        })
    }

    pub fn nrows(&self) -> usize {
        self.data.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.data.ncols()
    }
}
