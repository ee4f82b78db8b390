//! Plain-text tables and CSV export.

use std::path::Path;

use comfy_table::{Cell, CellAlignment, ContentArrangement, presets::UTF8_FULL_CONDENSED};
use tracing::info;

use crate::error::Result;

pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Terminal rendering; the first column stays left-aligned, the
    /// others are right-aligned.
    pub fn render(&self) -> String {
        let mut table = comfy_table::Table::new();
        table
            .load_preset(UTF8_FULL_CONDENSED)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(&self.headers);
        for row in &self.rows {
            table.add_row(row.iter().map(Cell::new));
        }
        for column in table.column_iter_mut().skip(1) {
            column.set_cell_alignment(CellAlignment::Right);
        }
        table.to_string()
    }

    pub fn print(&self) {
        println!("{}", self.render());
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        info!(path = %path.display(), rows = self.rows.len(), "table exported");
        Ok(())
    }

    /// Prints the table, or writes it to `csv` when a path is given.
    pub fn emit(&self, csv: Option<&Path>) -> Result<()> {
        match csv {
            Some(path) => {
                self.write_csv(path)?;
                println!("Exported {} row(s) to {}", self.rows.len(), path.display());
            }
            None => self.print(),
        }
        Ok(())
    }
}

/// Percent change with an explicit sign, one decimal.
pub fn percent(value: f64) -> String {
    format!("{value:+.1}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_are_right_aligned() {
        let mut table = Table::new(["Category", "Total"]);
        table.push(vec!["Food".to_string(), "12.00€".to_string()]);
        table.push(vec!["Rent".to_string(), "700.00€".to_string()]);
        let rendered = table.render();

        let line = |needle: &str| rendered.lines().find(|l| l.contains(needle)).unwrap().to_string();
        let (food, rent) = (line("Food"), line("Rent"));
        assert!(line("Category").contains("Total"));
        assert_eq!(
            food.find("12.00€").unwrap() + "12.00€".len(),
            rent.find("700.00€").unwrap() + "700.00€".len()
        );
        assert_eq!(food.chars().count(), rent.chars().count());
    }

    #[test]
    fn csv_export_keeps_every_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("top.csv");
        let mut table = Table::new(["Label", "Total"]);
        table.push(vec!["CB CARREFOUR".to_string(), "42.50".to_string()]);
        table.write_csv(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "Label,Total\nCB CARREFOUR,42.50\n");
    }

    #[test]
    fn percent_has_a_sign() {
        assert_eq!(percent(10.0), "+10.0%");
        assert_eq!(percent(-2.26), "-2.3%");
    }
}
