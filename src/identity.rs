//! Display labels for the rows of a dataset.

use crate::dataset::DataSet;

/// Column holding the brand names, when present.
pub const BRAND_COLUMN: &str = "brand";

/// Resolves one label per row: the brand column if the schema has one,
/// otherwise `"Brand {row index}"`.
#[derive(Debug, Clone, Copy)]
pub struct IdentityResolver {
    brand_index: Option<usize>,
}

impl IdentityResolver {
    pub fn new(data: &DataSet) -> Self {
        Self {
            brand_index: data.column_index(BRAND_COLUMN),
        }
    }

    pub fn has_brand_column(&self) -> bool {
        self.brand_index.is_some()
    }

    /// Labels in row order. Duplicates are kept as they are.
    pub fn labels(&self, data: &DataSet) -> Vec<String> {
        match self.brand_index {
            Some(j) => data.rows().iter().map(|r| r[j].to_string()).collect(),
            None => (0..data.nrows()).map(|i| format!("Brand {}", i)).collect(),
        }
    }
}
