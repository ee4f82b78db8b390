//! Yearly budget estimations per category.
//!
//! Each category carries an expected expense and an expected income for the
//! current year. When the server has no value yet, the baseline is what the
//! category actually did the year before (N-1).

use std::{cmp::Ordering, collections::HashMap};

use chrono::Datelike;
use serde::Serialize;

use crate::{Category, EngineError, MoneyCents, ResultEngine, Transaction, TransactionType, util};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EstimationLine {
    pub category_id: String,
    pub name: String,
    /// Actual N-1 total for this category and type.
    pub last_year: MoneyCents,
    pub value: MoneyCents,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EstimationTotals {
    pub income: MoneyCents,
    pub expense: MoneyCents,
    pub balance: MoneyCents,
}

/// Values to send for one category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EstimationChange {
    pub category_id: String,
    pub expense: MoneyCents,
    pub income: MoneyCents,
}

#[derive(Clone, Debug)]
pub struct EstimationBoard {
    pub year: i32,
    /// Sorted by category name.
    pub expense: Vec<EstimationLine>,
    /// Sorted by category name.
    pub income: Vec<EstimationLine>,
    last_saved: HashMap<String, (MoneyCents, MoneyCents)>,
}

fn by_name(a: &EstimationLine, b: &EstimationLine) -> Ordering {
    util::fold(&a.name).cmp(&util::fold(&b.name))
}

impl EstimationBoard {
    pub fn new(categories: &[Category], transactions: &[Transaction], year: i32) -> Self {
        let mut last_expense: HashMap<&str, MoneyCents> = HashMap::new();
        let mut last_income: HashMap<&str, MoneyCents> = HashMap::new();
        for tx in transactions.iter().filter(|tx| tx.date.year() == year - 1) {
            let Some(id) = tx.category_id() else {
                continue;
            };
            let slot = match tx.kind {
                TransactionType::Debit => last_expense.entry(id).or_default(),
                TransactionType::Credit => last_income.entry(id).or_default(),
            };
            *slot += tx.amount.abs();
        }

        let line = |category: &Category, last: &HashMap<&str, MoneyCents>, stored: MoneyCents| {
            let last_year = last.get(category.id.as_str()).copied().unwrap_or_default();
            EstimationLine {
                category_id: category.id.clone(),
                name: category.name.clone(),
                last_year,
                value: if stored.is_positive() { stored } else { last_year },
            }
        };

        let mut expense: Vec<EstimationLine> = categories
            .iter()
            .map(|c| line(c, &last_expense, c.estimated_expense))
            .collect();
        let mut income: Vec<EstimationLine> = categories
            .iter()
            .map(|c| line(c, &last_income, c.estimated_income))
            .collect();
        expense.sort_by(by_name);
        income.sort_by(by_name);

        let mut board = Self {
            year,
            expense,
            income,
            last_saved: HashMap::new(),
        };
        board.last_saved = categories
            .iter()
            .map(|c| (c.id.clone(), board.values_of(&c.id)))
            .collect();
        board
    }

    fn values_of(&self, category_id: &str) -> (MoneyCents, MoneyCents) {
        let find = |lines: &[EstimationLine]| {
            lines
                .iter()
                .find(|l| l.category_id == category_id)
                .map(|l| l.value)
                .unwrap_or_default()
        };
        (find(&self.expense), find(&self.income))
    }

    pub fn totals(&self) -> EstimationTotals {
        let income: MoneyCents = self.income.iter().map(|l| l.value).sum();
        let expense: MoneyCents = self.expense.iter().map(|l| l.value).sum();
        EstimationTotals {
            income,
            expense,
            balance: income - expense,
        }
    }

    /// Sets one value; negative amounts are clamped to zero.
    pub fn set(&mut self, category_id: &str, kind: TransactionType, value: MoneyCents) -> ResultEngine<()> {
        let lines = match kind {
            TransactionType::Debit => &mut self.expense,
            TransactionType::Credit => &mut self.income,
        };
        let line = lines
            .iter_mut()
            .find(|l| l.category_id == category_id)
            .ok_or_else(|| EngineError::KeyNotFound(category_id.to_string()))?;
        line.value = if value.is_negative() { MoneyCents::ZERO } else { value };
        Ok(())
    }

    /// The change to send for `category_id`, or `None` when nothing moved
    /// since the last save.
    pub fn pending_change(&self, category_id: &str) -> Option<EstimationChange> {
        let current = self.values_of(category_id);
        if self.last_saved.get(category_id) == Some(&current) {
            return None;
        }
        Some(EstimationChange {
            category_id: category_id.to_string(),
            expense: current.0,
            income: current.1,
        })
    }

    pub fn mark_saved(&mut self, change: &EstimationChange) {
        self.last_saved
            .insert(change.category_id.clone(), (change.expense, change.income));
    }
}
