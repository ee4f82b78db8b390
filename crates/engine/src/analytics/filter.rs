use chrono::{Datelike, NaiveDate};

use crate::{MoneyCents, Transaction, TransactionType, util};

/// Criteria narrowing the transaction list before aggregation.
///
/// Every field is optional; an empty filter keeps everything. Date bounds
/// are inclusive and amount bounds compare the unsigned magnitude.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub kind: Option<TransactionType>,
    pub category_id: Option<String>,
    pub min_amount: Option<MoneyCents>,
    pub max_amount: Option<MoneyCents>,
    /// Matched against the label or the category name, ignoring case.
    pub search: Option<String>,
}

impl TransactionFilter {
    /// Quick filter covering a whole calendar year.
    pub fn year(mut self, year: i32) -> Self {
        self.date_from = NaiveDate::from_ymd_opt(year, 1, 1);
        self.date_to = NaiveDate::from_ymd_opt(year, 12, 31);
        self
    }

    /// Quick filter covering one month.
    pub fn month(mut self, year: i32, month: u32) -> Self {
        let first = NaiveDate::from_ymd_opt(year, month, 1);
        self.date_from = first;
        self.date_to = first
            .and_then(|d| d.checked_add_months(chrono::Months::new(1)))
            .and_then(|d| d.pred_opt());
        self
    }

    /// Year the monthly table should show: the year of `date_from`, or the
    /// current year when no lower bound is set.
    pub fn selected_year(&self, today: NaiveDate) -> i32 {
        self.date_from.unwrap_or(today).year()
    }

    pub fn matches(&self, tx: &Transaction, category_name: Option<&str>) -> bool {
        if self.date_from.is_some_and(|from| tx.date < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| tx.date > to) {
            return false;
        }
        if self.kind.is_some_and(|kind| tx.kind != kind) {
            return false;
        }
        if let Some(category_id) = self.category_id.as_deref()
            && tx.category_id() != Some(category_id)
        {
            return false;
        }
        let amount = tx.amount.abs();
        if self.min_amount.is_some_and(|min| amount < min) {
            return false;
        }
        if self.max_amount.is_some_and(|max| amount > max) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                util::contains_folded(&tx.operation, term)
                    || category_name.is_some_and(|name| util::contains_folded(name, term))
            }
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CategoryRef;

    fn tx(date: &str, kind: TransactionType, cents: i64, category: (&str, &str)) -> Transaction {
        Transaction {
            id: date.to_string(),
            operation: "CB Boulangerie".to_string(),
            date: crate::parse_date(date).unwrap(),
            kind,
            amount: MoneyCents::new(cents),
            category: Some(CategoryRef {
                id: category.0.to_string(),
                name: Some(category.1.to_string()),
            }),
        }
    }

    #[test]
    fn date_bounds_are_inclusive() {
        let filter = TransactionFilter::default().month(2024, 2);
        assert_eq!(filter.date_to, NaiveDate::from_ymd_opt(2024, 2, 29));

        let first = tx("2024-02-01", TransactionType::Debit, 100, ("1", "Food"));
        let last = tx("2024-02-29", TransactionType::Debit, 100, ("1", "Food"));
        let after = tx("2024-03-01", TransactionType::Debit, 100, ("1", "Food"));
        assert!(filter.matches(&first, Some("Food")));
        assert!(filter.matches(&last, Some("Food")));
        assert!(!filter.matches(&after, Some("Food")));
    }

    #[test]
    fn search_looks_at_label_and_category_name() {
        let row = tx("2024-05-02", TransactionType::Debit, 450, ("1", "Food"));
        let by_label = TransactionFilter {
            search: Some("boulang".to_string()),
            ..TransactionFilter::default()
        };
        let by_category = TransactionFilter {
            search: Some("FOOD".to_string()),
            ..TransactionFilter::default()
        };
        let miss = TransactionFilter {
            search: Some("rent".to_string()),
            ..TransactionFilter::default()
        };
        assert!(by_label.matches(&row, Some("Food")));
        assert!(by_category.matches(&row, Some("Food")));
        assert!(!miss.matches(&row, Some("Food")));
    }

    #[test]
    fn type_category_and_amount_bounds() {
        let row = tx("2024-05-02", TransactionType::Credit, 2_000, ("7", "Salary"));
        let filter = TransactionFilter {
            kind: Some(TransactionType::Credit),
            category_id: Some("7".to_string()),
            min_amount: Some(MoneyCents::new(1_000)),
            max_amount: Some(MoneyCents::new(2_000)),
            ..TransactionFilter::default()
        };
        assert!(filter.matches(&row, None));

        let debit_only = TransactionFilter {
            kind: Some(TransactionType::Debit),
            ..TransactionFilter::default()
        };
        assert!(!debit_only.matches(&row, None));

        let other_category = TransactionFilter {
            category_id: Some("8".to_string()),
            ..TransactionFilter::default()
        };
        assert!(!other_category.matches(&row, None));
    }
}
