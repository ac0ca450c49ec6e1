//! A1-notation addressing for spreadsheet cells.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A zero-based spreadsheet column. Displays and parses as letters, e.g. `0` <-> `"A"`,
/// `3` <-> `"D"`, `26` <-> `"AA"`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Column(usize);

impl Column {
    pub const A: Column = Column(0);

    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut n = self.0 + 1;
        let mut letters = Vec::new();
        while n > 0 {
            let rem = (n - 1) % 26;
            letters.push((b'A' + rem as u8) as char);
            n = (n - 1) / 26;
        }
        let s: String = letters.into_iter().rev().collect();
        f.write_str(&s)
    }
}

impl FromStr for Column {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || !s.chars().all(|c| c.is_ascii_alphabetic()) {
            anyhow::bail!("Column must be one or more letters like 'D' or 'AB', got: '{s}'");
        }
        let mut n: usize = 0;
        for c in s.chars() {
            let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
            n = n
                .checked_mul(26)
                .and_then(|n| n.checked_add(digit))
                .ok_or_else(|| anyhow::anyhow!("Column '{s}' is out of range"))?;
        }
        Ok(Column(n - 1))
    }
}

/// A (row, column) position. The row is the zero-based position of the value within its column,
/// which is also how `Sheet::column` indexes its result. Displays in A1 notation, so
/// `CellRef::new(5, Column::new(4))` is `"E6"`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct CellRef {
    row: usize,
    col: Column,
}

impl CellRef {
    pub fn new(row: usize, col: Column) -> Self {
        Self { row, col }
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn col(&self) -> Column {
        self.col
    }

    /// The same row, a different column.
    pub fn with_col(&self, col: Column) -> Self {
        Self { row: self.row, col }
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.col, self.row + 1)
    }
}

impl FromStr for CellRef {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Expected format: "E6"
        let s = s.trim();
        let split = s
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| anyhow::anyhow!("Cell must be in A1 format, got: '{s}'"))?;
        let (letters, digits) = s.split_at(split);
        let col: Column = letters.parse()?;
        let row = digits
            .parse::<usize>()
            .map_err(|e| anyhow::anyhow!("Invalid row number in '{s}': {e}"))?;
        if row == 0 {
            anyhow::bail!("Row numbers start at 1, got: '{s}'");
        }
        Ok(CellRef::new(row - 1, col))
    }
}

impl Serialize for CellRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for CellRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        CellRef::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Splits a range like `mapping!A7:B7` into the sheet name and its top-left cell.
pub(crate) fn split_range(range: &str) -> anyhow::Result<(&str, CellRef)> {
    let (sheet, cells) = range
        .rsplit_once('!')
        .ok_or_else(|| anyhow::anyhow!("Range must include a sheet name, got: '{range}'"))?;
    let start = cells.split(':').next().unwrap_or(cells);
    Ok((sheet.trim_matches('\''), start.parse()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_display() {
        assert_eq!(Column::new(0).to_string(), "A");
        assert_eq!(Column::new(3).to_string(), "D");
        assert_eq!(Column::new(25).to_string(), "Z");
        assert_eq!(Column::new(26).to_string(), "AA");
        assert_eq!(Column::new(701).to_string(), "ZZ");
    }

    #[test]
    fn test_column_from_str() {
        assert_eq!("D".parse::<Column>().unwrap(), Column::new(3));
        assert_eq!("e".parse::<Column>().unwrap(), Column::new(4));
        assert_eq!("AA".parse::<Column>().unwrap(), Column::new(26));
        assert!("".parse::<Column>().is_err());
        assert!("D4".parse::<Column>().is_err());
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(CellRef::new(5, Column::new(4)).to_string(), "E6");
        assert_eq!(CellRef::new(0, Column::A).to_string(), "A1");
    }

    #[test]
    fn test_cell_from_str() {
        let cell: CellRef = "E6".parse().unwrap();
        assert_eq!(cell, CellRef::new(5, Column::new(4)));
        assert!("E0".parse::<CellRef>().is_err());
        assert!("6".parse::<CellRef>().is_err());
        assert!("E".parse::<CellRef>().is_err());
    }

    #[test]
    fn test_cell_serde() {
        let cell = CellRef::new(41, Column::new(1));
        let serialized = serde_json::to_string(&cell).unwrap();
        assert_eq!(serialized, r#""B42""#);
        let deserialized: CellRef = serde_json::from_str(&serialized).unwrap();
        assert_eq!(cell, deserialized);
    }

    #[test]
    fn test_split_range() {
        let (sheet, cell) = split_range("mapping!A7:B7").unwrap();
        assert_eq!(sheet, "mapping");
        assert_eq!(cell, CellRef::new(6, Column::A));

        let (sheet, cell) = split_range("'my sheet'!C3").unwrap();
        assert_eq!(sheet, "my sheet");
        assert_eq!(cell.to_string(), "C3");

        assert!(split_range("A7:B7").is_err());
    }
}
