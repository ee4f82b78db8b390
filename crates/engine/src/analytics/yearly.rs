use std::collections::BTreeMap;

use chrono::Datelike;
use serde::Serialize;

use super::{Analytics, variation};
use crate::{MoneyCents, TransactionType, util};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct YearCell {
    pub year: i32,
    pub amount: MoneyCents,
    /// Percent change against the previous calendar year.
    pub variation: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct YearlyRow {
    pub category: String,
    pub kind: TransactionType,
    pub cells: Vec<YearCell>,
    pub total: MoneyCents,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct YearlyTable {
    /// Every year of the unfiltered list, oldest first.
    pub years: Vec<i32>,
    pub debit_rows: Vec<YearlyRow>,
    pub credit_rows: Vec<YearlyRow>,
}

impl Analytics<'_> {
    /// Year-over-year sums per category and type.
    pub fn yearly_table(&self) -> YearlyTable {
        let mut years = self.available_years();
        years.reverse();

        let rows_for = |kind: TransactionType| {
            let mut grouped: util::Ordered<String, BTreeMap<i32, MoneyCents>> =
                util::Ordered::new();
            for tx in self.of_kind(kind) {
                *grouped
                    .entry(self.category_label(tx))
                    .entry(tx.date.year())
                    .or_default() += tx.amount.abs();
            }

            let mut rows: Vec<YearlyRow> = grouped
                .into_entries()
                .into_iter()
                .map(|(category, by_year)| {
                    let cells: Vec<YearCell> = years
                        .iter()
                        .map(|year| {
                            let amount = by_year.get(year).copied().unwrap_or_default();
                            let previous = by_year.get(&(year - 1)).copied().unwrap_or_default();
                            YearCell {
                                year: *year,
                                amount,
                                variation: variation(amount, previous),
                            }
                        })
                        .collect();
                    let total = cells.iter().map(|cell| cell.amount).sum();
                    YearlyRow {
                        category,
                        kind,
                        cells,
                        total,
                    }
                })
                .collect();
            rows.sort_by(|a, b| b.total.cmp(&a.total));
            rows
        };

        YearlyTable {
            debit_rows: rows_for(TransactionType::Debit),
            credit_rows: rows_for(TransactionType::Credit),
            years,
        }
    }
}
