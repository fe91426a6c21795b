use std::collections::HashSet;

use serde::Serialize;

use super::summary::SessionSummary;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    /// Day (`YYYY-MM-DD`) or bucket label.
    pub key: String,
    /// One value per column of the owning table.
    pub values: Vec<f64>,
}

/// Dense table of minutes: every row has a value for every column.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct SegmentTable {
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl SegmentTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: vec![],
        }
    }

    /// Adds a row of zeros and returns its values for filling.
    pub fn push_row(&mut self, key: String) -> &mut [f64] {
        self.rows.push(TableRow {
            key,
            values: vec![0.; self.columns.len()],
        });
        let last = self.rows.len() - 1;
        &mut self.rows[last].values
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|v| v == column)
    }

    pub fn value(&self, row: &str, column: &str) -> Option<f64> {
        let index = self.column_index(column)?;
        self.rows
            .iter()
            .find(|v| v.key == row)
            .map(|v| v.values[index])
    }

    pub fn row_keys(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|v| v.key.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Segment labels in the order they are first seen. Callers pass summaries already sorted by
/// date so that columns come out the same for the same data.
pub fn collect_segment_names<'a>(
    summaries: impl IntoIterator<Item = &'a SessionSummary>,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = vec![];
    for segment in summaries.into_iter().flat_map(|v| v.segments.iter()) {
        if seen.insert(segment.label.as_str()) {
            names.push(segment.label.clone());
        }
    }
    names
}
