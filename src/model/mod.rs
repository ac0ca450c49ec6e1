//! Types that represent the core data model, such as `Row`, `PendingQuestion` and `MappingEntry`.
mod cell;

pub use cell::{CellRef, Column};
pub(crate) use cell::split_range;
use serde::{Deserialize, Serialize};

/// A snapshot of one transaction row: the value whose category is being looked up and the
/// category cell beside it. Identity is the row index.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Row {
    index: usize,
    value: String,
    category: Option<String>,
}

impl Row {
    pub fn new(index: usize, value: impl Into<String>, category: Option<String>) -> Self {
        Self {
            index,
            value: value.into(),
            category,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// True when the category cell holds exactly the `missing` sentinel. An empty category cell is
    /// not considered missing.
    pub fn is_missing(&self, missing: &str) -> bool {
        self.category() == Some(missing)
    }
}

/// A row value that still needs a category from a human.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct PendingQuestion {
    value: String,
    index: usize,
}

impl PendingQuestion {
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The zero-based row this question was found at.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl From<&Row> for PendingQuestion {
    fn from(row: &Row) -> Self {
        Self {
            value: row.value.clone(),
            index: row.index,
        }
    }
}

/// One `(value, category)` pair appended to the mapping sheet.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct MappingEntry {
    value: String,
    category: String,
}

impl MappingEntry {
    pub fn new(value: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            category: category.into(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// The cells of this entry as they are written to the mapping sheet.
    pub fn to_row(&self) -> Vec<String> {
        vec![self.value.clone(), self.category.clone()]
    }
}

/// Where the workflow looks for data within the spreadsheet.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Layout {
    /// The worksheet holding the transaction rows.
    pub sheet: String,
    /// The worksheet that answers are appended to.
    pub mapping_sheet: String,
    pub value_column: Column,
    pub category_column: Column,
    /// How many of the most recent rows are inspected.
    pub recent_rows: usize,
    /// The category text that marks a row as needing an answer.
    pub missing: String,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            sheet: "current".to_string(),
            mapping_sheet: "mapping".to_string(),
            value_column: Column::new(3),
            category_column: Column::new(4),
            recent_rows: 20,
            missing: "not found".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_is_missing() {
        let missing = "not found";
        assert!(Row::new(0, "rent", Some("not found".to_string())).is_missing(missing));
        assert!(!Row::new(0, "rent", Some("Housing".to_string())).is_missing(missing));
        assert!(!Row::new(0, "rent", None).is_missing(missing));
        assert!(!Row::new(0, "rent", Some("Not Found".to_string())).is_missing(missing));
    }

    #[test]
    fn test_pending_from_row() {
        let row = Row::new(5, "rent", Some("not found".to_string()));
        let pending = PendingQuestion::from(&row);
        assert_eq!(pending.value(), "rent");
        assert_eq!(pending.index(), 5);
    }

    #[test]
    fn test_mapping_entry_to_row() {
        let entry = MappingEntry::new("gym", "Health");
        assert_eq!(entry.to_row(), vec!["gym".to_string(), "Health".to_string()]);
    }
}
