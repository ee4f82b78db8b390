//! Client-side aggregation of the transaction list.
//!
//! An [`Analytics`] view is built from the full transaction list, the
//! category list and a [`TransactionFilter`]. Every chart and table is then
//! computed over the filtered rows, except the set of years of the yearly
//! table which always comes from the full list.

use std::collections::{BTreeSet, HashMap};

use chrono::Datelike;

use crate::{Category, MoneyCents, Transaction, TransactionType, UNCATEGORIZED};

mod charts;
mod filter;
mod monthly;
mod yearly;

pub use charts::{BalancePoint, CategoryShare, MonthTotals, OperationTotal, Totals};
pub use filter::TransactionFilter;
pub use monthly::{
    MonthCell, MonthlyRow, MonthlyTable, SEASONAL_FACTORS, YearMonth, forecast, forecast_months,
};
pub use yearly::{YearCell, YearlyRow, YearlyTable};

/// Number of operations kept by [`Analytics::top_operations`].
pub const TOP_OPERATIONS: usize = 10;

/// Percent change from `previous` to `current`.
///
/// A zero (or negative) previous value yields 100 when the current value is
/// positive and 0 otherwise.
pub fn variation(current: MoneyCents, previous: MoneyCents) -> f64 {
    if previous.is_positive() {
        (current.cents() - previous.cents()) as f64 * 100.0 / previous.cents() as f64
    } else if current.is_positive() {
        100.0
    } else {
        0.0
    }
}

#[derive(Debug)]
pub struct Analytics<'a> {
    all: &'a [Transaction],
    filtered: Vec<&'a Transaction>,
    names: HashMap<&'a str, &'a str>,
}

impl<'a> Analytics<'a> {
    pub fn new(
        transactions: &'a [Transaction],
        categories: &'a [Category],
        filter: &TransactionFilter,
    ) -> Self {
        let names: HashMap<&str, &str> = categories
            .iter()
            .map(|c| (c.id.as_str(), c.name.as_str()))
            .collect();
        let mut view = Self {
            all: transactions,
            filtered: Vec::new(),
            names,
        };
        let filtered = transactions
            .iter()
            .filter(|tx| filter.matches(tx, view.category_name(*tx)))
            .collect();
        view.filtered = filtered;
        view
    }

    /// Category name carried by the row, else looked up by id.
    fn category_name(&self, tx: &'a Transaction) -> Option<&'a str> {
        tx.category_name()
            .or_else(|| tx.category_id().and_then(|id| self.names.get(id).copied()))
    }

    fn category_label(&self, tx: &'a Transaction) -> String {
        self.category_name(tx)
            .filter(|name| !name.is_empty())
            .unwrap_or(UNCATEGORIZED)
            .to_string()
    }

    pub fn filtered(&self) -> &[&'a Transaction] {
        &self.filtered
    }

    fn of_kind(&self, kind: TransactionType) -> impl Iterator<Item = &'a Transaction> + '_ {
        self.filtered.iter().copied().filter(move |tx| tx.kind == kind)
    }

    /// Years present in the full list, most recent first.
    pub fn available_years(&self) -> Vec<i32> {
        let years: BTreeSet<i32> = self.all.iter().map(|tx| tx.date.year()).collect();
        years.into_iter().rev().collect()
    }

    /// Months present in the full list, most recent first.
    pub fn available_months(&self) -> Vec<YearMonth> {
        let months: BTreeSet<YearMonth> = self.all.iter().map(|tx| YearMonth::of(tx.date)).collect();
        months.into_iter().rev().collect()
    }
}
