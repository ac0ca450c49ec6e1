//! Implements the `Sheet` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without using Google Sheets.

use crate::api::{Sheet, SheetRange};
use crate::model::{split_range, CellRef, Column, Layout};
use crate::Result;
use anyhow::Context;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

type Sheets = HashMap<String, Vec<Vec<String>>>;

/// An implementation of the `Sheet` trait that does not use Google sheets. Clones share the same
/// data, so a test can keep one handle and inspect what the code under test wrote.
#[derive(Debug, Clone)]
pub(crate) struct TestSheet {
    data: Arc<Mutex<Sheets>>,
}

impl TestSheet {
    /// Create a new `TestSheet` using `data`. The map key is sheet name and the map value is the
    /// rows of the sheet.
    pub(crate) fn new(data: Sheets) -> Self {
        Self {
            data: Arc::new(Mutex::new(data)),
        }
    }

    /// Create a `TestSheet` with a transactions sheet named `sheet` whose value and category
    /// columns hold `rows`, and an empty `mapping` sheet.
    #[cfg(test)]
    pub(crate) fn with_rows(
        sheet: &str,
        value: Column,
        category: Column,
        rows: &[(&str, Option<&str>)],
    ) -> Self {
        let width = value.index().max(category.index()) + 1;
        let grid = rows
            .iter()
            .map(|(v, c)| {
                let mut row = vec![String::new(); width];
                row[value.index()] = v.to_string();
                row[category.index()] = c.unwrap_or_default().to_string();
                row
            })
            .collect();
        let mut map = HashMap::new();
        map.insert(sheet.to_string(), grid);
        map.insert("mapping".to_string(), Vec::new());
        Self::new(map)
    }

    /// Returns a copy of the rows of `sheet_name`.
    #[cfg(test)]
    pub(crate) fn rows(&self, sheet_name: &str) -> Vec<Vec<String>> {
        self.lock().get(sheet_name).cloned().unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Sheets> {
        // A panic while holding the lock leaves plain data behind, which is still usable.
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait::async_trait]
impl Sheet for TestSheet {
    async fn column(&mut self, sheet_name: &str, column: Column) -> Result<Vec<String>> {
        let data = self.lock();
        let rows = data
            .get(sheet_name)
            .with_context(|| format!("Sheet '{sheet_name}' not found"))?;
        let mut values: Vec<String> = rows
            .iter()
            .map(|row| row.get(column.index()).cloned().unwrap_or_default())
            .collect();
        while values.last().is_some_and(|v| v.is_empty()) {
            values.pop();
        }
        Ok(values)
    }

    async fn cell(&mut self, sheet_name: &str, cell: CellRef) -> Result<Option<String>> {
        let data = self.lock();
        let rows = data
            .get(sheet_name)
            .with_context(|| format!("Sheet '{sheet_name}' not found"))?;
        Ok(rows
            .get(cell.row())
            .and_then(|row| row.get(cell.col().index()))
            .filter(|value| !value.is_empty())
            .cloned())
    }

    async fn write_ranges(&mut self, ranges: &[SheetRange]) -> Result<()> {
        let mut data = self.lock();
        for range in ranges {
            let (sheet_name, start) = split_range(&range.range)?;
            let rows = data
                .get_mut(sheet_name)
                .with_context(|| format!("Sheet '{sheet_name}' not found"))?;
            for (r, values) in range.values.iter().enumerate() {
                let row_index = start.row() + r;
                if rows.len() <= row_index {
                    rows.resize(row_index + 1, Vec::new());
                }
                let row = &mut rows[row_index];
                for (c, value) in values.iter().enumerate() {
                    let col_index = start.col().index() + c;
                    if row.len() <= col_index {
                        row.resize(col_index + 1, String::new());
                    }
                    row[col_index] = value.clone();
                }
            }
        }
        Ok(())
    }

    async fn append_row(&mut self, sheet_name: &str, values: &[String]) -> Result<()> {
        let next = {
            let data = self.lock();
            let rows = data
                .get(sheet_name)
                .with_context(|| format!("Sheet '{sheet_name}' not found"))?;
            rows.iter()
                .rposition(|row| row.iter().any(|cell| !cell.is_empty()))
                .map_or(0, |last| last + 1)
        };
        let start = CellRef::new(next, Column::A);
        let end = start.with_col(Column::new(values.len().saturating_sub(1)));
        let range = SheetRange {
            range: format!("{sheet_name}!{start}:{end}"),
            values: vec![values.to_vec()],
        };
        self.write_ranges(&[range]).await
    }
}

impl TestSheet {
    /// Loads seed data from this module into the transactions and mapping sheets named by
    /// `layout`. The seed transactions keep their memo in column D and category in column E.
    pub(crate) fn seeded(layout: &Layout) -> Result<Self> {
        let mut map = HashMap::new();
        map.insert(layout.sheet.clone(), load_csv(TRANSACTION_DATA)?);
        map.insert(layout.mapping_sheet.clone(), load_csv(MAPPING_DATA)?);
        Ok(Self::new(map))
    }
}

/// Loads data from a CSV-formatted string.
fn load_csv(csv_data: &str) -> Result<Vec<Vec<String>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(Cursor::new(csv_data.as_bytes()));

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in rdr.records() {
        let record = result.context("Invalid seed CSV")?;
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }
    Ok(rows)
}

/// Seed transaction data. The memo column (D) is looked up in the mapping sheet to produce the
/// category column (E).
const TRANSACTION_DATA: &str = r##"date,amount,description,memo,category,account,hash,comment,scraped at,scraped by,identifier
2025-10-01,4200,Monthly rent,rent,Housing,checking,h001,,2025-10-02,leumi,t001
2025-10-02,312.40,Supermarket,shufersal,Food,visa,h002,,2025-10-03,max,t002
2025-10-04,89.90,Gas station,paz,Car,visa,h003,,2025-10-05,max,t003
2025-10-06,45,Pharmacy,super-pharm,not found,visa,h004,,2025-10-07,max,t004
2025-10-08,220,Gym membership,holmes place,not found,isracard,h005,,2025-10-09,isracard,t005
2025-10-11,58.50,Coffee,aroma,Eating out,visa,h006,,2025-10-12,max,t006
2025-10-15,129,Phone bill,partner,Bills,checking,h007,,2025-10-16,leumi,t007
2025-10-18,74.20,Bookstore,steimatzky,not found,visa,h008,,2025-10-19,max,t008
"##;

/// Seed mapping data.
const MAPPING_DATA: &str = r##"value,category
rent,Housing
shufersal,Food
paz,Car
aroma,Eating out
partner,Bills
"##;
