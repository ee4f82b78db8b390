use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::{Analytics, YearMonth};
use crate::{MoneyCents, TransactionType, util};

/// Label width used to group operations in the top list.
const LABEL_WIDTH: usize = 30;
const UNKNOWN_LABEL: &str = "Unknown";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub credit: MoneyCents,
    pub debit: MoneyCents,
    pub balance: MoneyCents,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryShare {
    pub category: String,
    pub total: MoneyCents,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MonthTotals {
    pub month: YearMonth,
    pub credit: MoneyCents,
    pub debit: MoneyCents,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BalancePoint {
    pub date: NaiveDate,
    pub balance: MoneyCents,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OperationTotal {
    pub label: String,
    pub total: MoneyCents,
}

impl Analytics<'_> {
    pub fn totals(&self) -> Totals {
        let credit: MoneyCents = self
            .of_kind(TransactionType::Credit)
            .map(|tx| tx.amount.abs())
            .sum();
        let debit: MoneyCents = self
            .of_kind(TransactionType::Debit)
            .map(|tx| tx.amount.abs())
            .sum();
        Totals {
            credit,
            debit,
            balance: credit - debit,
        }
    }

    /// DEBIT totals per category name, in first-seen order.
    pub fn category_split(&self) -> Vec<CategoryShare> {
        let mut grouped: util::Ordered<String, MoneyCents> = util::Ordered::new();
        for tx in self.of_kind(TransactionType::Debit) {
            *grouped.entry(self.category_label(tx)) += tx.amount.abs();
        }
        grouped
            .into_entries()
            .into_iter()
            .map(|(category, total)| CategoryShare { category, total })
            .collect()
    }

    /// CREDIT and DEBIT sums per month, oldest month first.
    pub fn monthly_totals(&self) -> Vec<MonthTotals> {
        let mut by_month: BTreeMap<YearMonth, (MoneyCents, MoneyCents)> = BTreeMap::new();
        for tx in &self.filtered {
            let slot = by_month.entry(YearMonth::of(tx.date)).or_default();
            match tx.kind {
                TransactionType::Credit => slot.0 += tx.amount.abs(),
                TransactionType::Debit => slot.1 += tx.amount.abs(),
            }
        }
        by_month
            .into_iter()
            .map(|(month, (credit, debit))| MonthTotals {
                month,
                credit,
                debit,
            })
            .collect()
    }

    /// Running balance starting from zero, one point per transaction.
    ///
    /// Rows sharing a date keep their list order.
    pub fn cumulative_balance(&self) -> Vec<BalancePoint> {
        let mut sorted = self.filtered.clone();
        sorted.sort_by_key(|tx| tx.date);

        let mut balance = MoneyCents::ZERO;
        sorted
            .into_iter()
            .map(|tx| {
                balance += tx.signed_amount();
                BalancePoint {
                    date: tx.date,
                    balance,
                }
            })
            .collect()
    }

    /// Largest DEBIT operations, grouped by truncated label.
    pub fn top_operations(&self, limit: usize) -> Vec<OperationTotal> {
        let mut grouped: util::Ordered<String, MoneyCents> = util::Ordered::new();
        for tx in self.of_kind(TransactionType::Debit) {
            let label = if tx.operation.trim().is_empty() {
                UNKNOWN_LABEL.to_string()
            } else {
                util::truncate_chars(&tx.operation, LABEL_WIDTH)
            };
            *grouped.entry(label) += tx.amount.abs();
        }

        let mut entries = grouped.into_entries();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries
            .into_iter()
            .take(limit)
            .map(|(label, total)| OperationTotal { label, total })
            .collect()
    }
}
