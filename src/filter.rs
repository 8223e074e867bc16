//! Optional categorical equality filters (segment, region, time).

use log::debug;
use std::fmt;

use crate::dataset::DataSet;
use crate::error::{Error, Result};

/// Column names of the optional filters, in application order.
pub const SEGMENT_COLUMN: &str = "segment";
pub const REGION_COLUMN: &str = "region";
pub const TIME_COLUMN: &str = "time";

/// Label of the "no constraint" choice in the filter options.
pub const ALL: &str = "All";

/// The user's choice for one filter column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    /// No constraint on this column.
    #[default]
    All,
    /// Keep only rows whose value equals this one.
    Only(String),
}

impl Selection {
    /// Parse a choice as it appears in the option list; `"All"` is the sentinel.
    pub fn parse(choice: &str) -> Self {
        if choice == ALL {
            Selection::All
        } else {
            Selection::Only(choice.to_string())
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => f.write_str(ALL),
            Selection::Only(v) => f.write_str(v),
        }
    }
}

/// Selections for the three optional filter columns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Filters {
    pub segment: Selection,
    pub region: Selection,
    pub time: Selection,
}

impl Filters {
    /// `(column, selection)` pairs in application order.
    pub fn constraints(&self) -> [(&'static str, &Selection); 3] {
        [
            (SEGMENT_COLUMN, &self.segment),
            (REGION_COLUMN, &self.region),
            (TIME_COLUMN, &self.time),
        ]
    }

    pub fn is_unconstrained(&self) -> bool {
        self.constraints().iter().all(|(_, s)| **s == Selection::All)
    }
}

impl fmt::Display for Filters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .constraints()
            .iter()
            .map(|(col, sel)| format!("{}={}", col, sel))
            .collect();
        f.write_str(&parts.join(", "))
    }
}

/// One filter the schema supports, resolved to its column position.
#[derive(Debug, Clone)]
struct Constraint {
    column: &'static str,
    index: usize,
    value: String,
}

/// The filter stage for one dataset schema.
///
/// Which filter columns exist is decided once at construction; selections
/// for absent columns are dropped silently.
#[derive(Debug, Clone)]
pub struct FilterStage {
    filters: Filters,
    active: Vec<Constraint>,
}

impl FilterStage {
    pub fn new(data: &DataSet, filters: &Filters) -> Self {
        let active = filters
            .constraints()
            .into_iter()
            .filter_map(|(column, selection)| match selection {
                Selection::All => None,
                Selection::Only(value) => data.column_index(column).map(|index| Constraint {
                    column,
                    index,
                    value: value.clone(),
                }),
            })
            .collect();

        Self { filters: filters.clone(), active }
    }

    /// Number of constraints that will actually be applied.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Rows matching every active constraint, in input order.
    ///
    /// Fails with `EmptyFilterResult` when constraints were applied and no row
    /// survived them.
    pub fn apply(&self, data: &DataSet) -> Result<DataSet> {
        let mut current = data.clone();
        for c in &self.active {
            current = current.retain_rows(|row| row[c.index].matches(&c.value));
            debug!("filter {}={} keeps {} rows", c.column, c.value, current.nrows());
        }

        if !self.active.is_empty() && current.is_empty() {
            return Err(Error::EmptyFilterResult {
                filters: self.filters.to_string(),
            });
        }
        Ok(current)
    }

    /// The selectable choices for every filter column present in `data`.
    ///
    /// Each list starts with `"All"` followed by the sorted observed values.
    /// Options for a later column are taken from the rows left by the
    /// earlier filters, so only reachable combinations are offered.
    pub fn options(data: &DataSet, filters: &Filters) -> Vec<(&'static str, Vec<String>)> {
        let mut current = data.clone();
        let mut out = Vec::new();

        for (column, selection) in filters.constraints() {
            let Some(index) = current.column_index(column) else {
                continue;
            };
            let mut choices = vec![ALL.to_string()];
            choices.extend(current.distinct_values(column));
            out.push((column, choices));

            if let Selection::Only(value) = selection {
                current = current.retain_rows(|row| row[index].matches(value));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataSet {
        let csv = "brand,segment,region,style\n\
                   A,Youth,North,1\n\
                   B,Adult,North,2\n\
                   C,Youth,South,3\n\
                   D,Adult,South,4\n\
                   E,Youth,North,5\n";
        DataSet::from_reader(csv.as_bytes(), b',').unwrap()
    }

    fn brands(ds: &DataSet) -> Vec<String> {
        ds.rows().iter().map(|r| r[0].to_string()).collect()
    }

    #[test]
    fn test_default_is_unconstrained() {
        let filters = Filters::default();
        assert!(filters.is_unconstrained());
        let ds = sample();
        let out = FilterStage::new(&ds, &filters).apply(&ds).unwrap();
        assert_eq!(out, ds);
    }

    #[test]
    fn test_conjunction() {
        let ds = sample();
        let filters = Filters {
            segment: Selection::parse("Youth"),
            region: Selection::parse("North"),
            ..Default::default()
        };
        let out = FilterStage::new(&ds, &filters).apply(&ds).unwrap();
        assert_eq!(brands(&out), vec!["A", "E"]);
    }

    #[test]
    fn test_missing_column_is_ignored() {
        let ds = sample();
        let filters = Filters {
            time: Selection::parse("2021"),
            ..Default::default()
        };
        let stage = FilterStage::new(&ds, &filters);
        assert_eq!(stage.active_count(), 0);
        assert_eq!(stage.apply(&ds).unwrap().nrows(), 5);
    }

    #[test]
    fn test_empty_result_is_an_error() {
        let ds = sample();
        let filters = Filters {
            segment: Selection::parse("Senior"),
            ..Default::default()
        };
        let err = FilterStage::new(&ds, &filters).apply(&ds).unwrap_err();
        assert!(matches!(err, Error::EmptyFilterResult { .. }));
    }

    #[test]
    fn test_options_follow_earlier_selections() {
        let ds = sample();
        let filters = Filters {
            region: Selection::parse("South"),
            ..Default::default()
        };
        let opts = FilterStage::options(&ds, &filters);
        assert_eq!(opts.len(), 2);
        assert_eq!(opts[0], ("segment", vec!["All".to_string(), "Adult".into(), "Youth".into()]));
        assert_eq!(opts[1], ("region", vec!["All".to_string(), "North".into(), "South".into()]));

        let filters = Filters {
            segment: Selection::parse("Adult"),
            ..Default::default()
        };
        let opts = FilterStage::options(&ds, &filters);
        assert_eq!(opts[1].1, vec!["All", "North", "South"]);
    }
}
