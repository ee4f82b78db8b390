//! Month-over-month table with a short forecast.
//!
//! The forecast of a month looks at the 12 months before it: the mean of the
//! last 3 plus a linear trend fitted by least squares, scaled by a fixed
//! seasonal factor and floored at zero.

use std::{collections::BTreeMap, fmt};

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};

use super::{Analytics, variation};
use crate::{MoneyCents, TransactionType, util};

/// Seasonal multiplier per calendar month, January first.
pub const SEASONAL_FACTORS: [f64; 12] = [1.1, 0.9, 1.0, 1.0, 1.1, 1.2, 1.3, 1.2, 1.0, 1.0, 1.1, 1.3];

const HISTORY_MONTHS: i32 = 12;
const RECENT_MONTHS: usize = 3;
const FORECAST_HORIZON: u32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    /// 1-12.
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn of(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month())
    }

    /// Shifts by `delta` months, crossing year boundaries.
    pub fn shift(self, delta: i32) -> Self {
        let index = self.year * 12 + (self.month as i32 - 1) + delta;
        Self::new(index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
    }

    pub fn prev(self) -> Self {
        self.shift(-1)
    }

    pub fn seasonal_factor(self) -> f64 {
        SEASONAL_FACTORS
            .get(self.month.saturating_sub(1) as usize)
            .copied()
            .unwrap_or(1.0)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Months to forecast when looking at `selected_year` on `today`.
///
/// The current year gets the 3 months after the current one (spilling into
/// next year), a future year gets its first 3 months, a past year nothing.
pub fn forecast_months(selected_year: i32, today: NaiveDate) -> Vec<YearMonth> {
    let current = YearMonth::of(today);
    if selected_year == current.year {
        (1..=FORECAST_HORIZON as i32).map(|i| current.shift(i)).collect()
    } else if selected_year > current.year {
        (1..=FORECAST_HORIZON)
            .map(|m| YearMonth::new(selected_year, m))
            .collect()
    } else {
        Vec::new()
    }
}

/// Predicted amount for `target` from the monthly `history`.
pub fn forecast(history: &BTreeMap<YearMonth, MoneyCents>, target: YearMonth) -> MoneyCents {
    let values: Vec<f64> = (1..=HISTORY_MONTHS)
        .rev()
        .map(|back| {
            history
                .get(&target.shift(-back))
                .map_or(0.0, |amount| amount.cents() as f64)
        })
        .collect();

    let recent = &values[values.len() - RECENT_MONTHS..];
    let recent_mean = recent.iter().sum::<f64>() / recent.len() as f64;

    let n = values.len() as f64;
    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_x2) = (0.0, 0.0, 0.0, 0.0);
    for (index, y) in values.iter().enumerate() {
        let x = (index + 1) as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_x2 += x * x;
    }
    let slope = (n * sum_xy - sum_x * sum_y) / (n * sum_x2 - sum_x * sum_x);
    let trend = slope * (n + 1.0);

    let prediction = (recent_mean + trend) * target.seasonal_factor();
    if prediction.is_finite() && prediction > 0.0 {
        MoneyCents::new(prediction.round() as i64)
    } else {
        MoneyCents::ZERO
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MonthCell {
    pub month: YearMonth,
    pub amount: MoneyCents,
    /// Percent change against the actual previous month.
    pub variation: f64,
    pub predicted: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MonthlyRow {
    pub category: String,
    pub kind: TransactionType,
    pub cells: Vec<MonthCell>,
    /// Sum over the 12 months of the selected year.
    pub total: MoneyCents,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MonthlyTable {
    pub selected_year: i32,
    pub forecast_months: Vec<YearMonth>,
    /// The 12 months of the year, then forecast months of the next year.
    pub columns: Vec<YearMonth>,
    pub debit_rows: Vec<MonthlyRow>,
    pub credit_rows: Vec<MonthlyRow>,
}

impl Analytics<'_> {
    /// Month-over-month table of `selected_year`, with forecasts relative
    /// to `today`.
    pub fn monthly_table(&self, selected_year: i32, today: NaiveDate) -> MonthlyTable {
        let year_months: Vec<YearMonth> = (1..=12).map(|m| YearMonth::new(selected_year, m)).collect();
        let forecast_months = forecast_months(selected_year, today);
        let mut columns = year_months.clone();
        columns.extend(forecast_months.iter().filter(|m| !year_months.contains(m)));

        let rows_for = |kind: TransactionType| {
            let mut grouped: util::Ordered<String, BTreeMap<YearMonth, MoneyCents>> =
                util::Ordered::new();
            for tx in self.of_kind(kind).filter(|tx| tx.date.year() == selected_year) {
                *grouped
                    .entry(self.category_label(tx))
                    .entry(YearMonth::of(tx.date))
                    .or_default() += tx.amount.abs();
            }

            let mut rows: Vec<MonthlyRow> = grouped
                .into_entries()
                .into_iter()
                .map(|(category, history)| {
                    let cells: Vec<MonthCell> = columns
                        .iter()
                        .map(|month| {
                            let predicted = forecast_months.contains(month);
                            let amount = if predicted {
                                forecast(&history, *month)
                            } else {
                                history.get(month).copied().unwrap_or_default()
                            };
                            let previous = history.get(&month.prev()).copied().unwrap_or_default();
                            MonthCell {
                                month: *month,
                                amount,
                                variation: variation(amount, previous),
                                predicted,
                            }
                        })
                        .collect();
                    let total = cells
                        .iter()
                        .filter(|cell| cell.month.year == selected_year)
                        .map(|cell| cell.amount)
                        .sum();
                    MonthlyRow {
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

        MonthlyTable {
            selected_year,
            debit_rows: rows_for(TransactionType::Debit),
            credit_rows: rows_for(TransactionType::Credit),
            forecast_months,
            columns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{TransactionFilter, fixtures::tx};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn history(start: YearMonth, values: &[i64]) -> BTreeMap<YearMonth, MoneyCents> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (start.shift(i as i32), MoneyCents::new(*v)))
            .collect()
    }

    #[test]
    fn shift_crosses_years() {
        assert_eq!(YearMonth::new(2025, 11).shift(3), YearMonth::new(2026, 2));
        assert_eq!(YearMonth::new(2025, 1).prev(), YearMonth::new(2024, 12));
        assert_eq!(YearMonth::new(2025, 3).shift(-15), YearMonth::new(2023, 12));
        assert_eq!(YearMonth::new(2025, 3).to_string(), "2025-03");
    }

    #[test]
    fn forecast_months_depend_on_selected_year() {
        let today = day(2025, 11, 15);
        assert_eq!(
            forecast_months(2025, today),
            vec![
                YearMonth::new(2025, 12),
                YearMonth::new(2026, 1),
                YearMonth::new(2026, 2)
            ]
        );
        assert_eq!(
            forecast_months(2027, today),
            vec![
                YearMonth::new(2027, 1),
                YearMonth::new(2027, 2),
                YearMonth::new(2027, 3)
            ]
        );
        assert!(forecast_months(2024, today).is_empty());
    }

    #[test]
    fn all_zero_history_forecasts_zero() {
        let empty = BTreeMap::new();
        for month in 1..=12 {
            assert_eq!(forecast(&empty, YearMonth::new(2025, month)), MoneyCents::ZERO);
        }
        let zeros = history(YearMonth::new(2024, 1), &[0; 12]);
        assert_eq!(forecast(&zeros, YearMonth::new(2025, 1)), MoneyCents::ZERO);
    }

    #[test]
    fn forecast_follows_linear_trend() {
        // April has a seasonal factor of 1.0.
        let rising = history(
            YearMonth::new(2024, 4),
            &[10, 20, 30, 40, 50, 60, 70, 80, 90, 100, 110, 120],
        );
        assert_eq!(forecast(&rising, YearMonth::new(2025, 4)), MoneyCents::new(240));

        let flat = history(YearMonth::new(2024, 4), &[500; 12]);
        assert_eq!(forecast(&flat, YearMonth::new(2025, 4)), MoneyCents::new(500));
        // July is scaled by 1.3.
        let flat_july = history(YearMonth::new(2024, 7), &[500; 12]);
        assert_eq!(forecast(&flat_july, YearMonth::new(2025, 7)), MoneyCents::new(650));
    }

    #[test]
    fn falling_trend_is_floored_at_zero() {
        let falling = history(
            YearMonth::new(2024, 4),
            &[120, 110, 100, 90, 80, 70, 60, 50, 40, 30, 20, 10],
        );
        assert_eq!(forecast(&falling, YearMonth::new(2025, 4)), MoneyCents::ZERO);
    }

    #[test]
    fn current_year_table_replaces_future_months_with_forecasts() {
        let mut rows = Vec::new();
        for month in 1..=10 {
            rows.push(tx(
                &format!("2025-{month:02}-05"),
                "Courses",
                TransactionType::Debit,
                100,
                Some("Food"),
            ));
        }
        rows.push(tx("2025-03-01", "Cinema", TransactionType::Debit, 50, Some("Leisure")));
        rows.push(tx("2024-06-01", "Old", TransactionType::Debit, 9_999, Some("Leisure")));

        let view = Analytics::new(&rows, &[], &TransactionFilter::default());
        let table = view.monthly_table(2025, day(2025, 10, 15));

        assert_eq!(table.columns.len(), 13);
        assert_eq!(table.columns[12], YearMonth::new(2026, 1));
        assert!(table.credit_rows.is_empty());
        assert_eq!(table.debit_rows.len(), 2);

        let food = &table.debit_rows[0];
        assert_eq!(food.category, "Food");
        let november = &food.cells[10];
        assert!(november.predicted);
        assert_eq!(november.amount, MoneyCents::new(210));
        assert_eq!(november.variation, 110.0);
        let december = &food.cells[11];
        assert_eq!(december.amount, MoneyCents::new(87));
        assert_eq!(food.cells[12].amount, MoneyCents::ZERO);
        assert_eq!(food.total, MoneyCents::new(1_000 + 210 + 87));
        assert!(!food.cells[9].predicted);

        let leisure = &table.debit_rows[1];
        assert_eq!(leisure.cells[2].amount, MoneyCents::new(50));
        assert_eq!(leisure.cells[3].variation, -100.0);
    }

    #[test]
    fn past_year_table_has_no_forecast() {
        let rows = vec![tx("2023-02-01", "a", TransactionType::Credit, 100, Some("Salary"))];
        let view = Analytics::new(&rows, &[], &TransactionFilter::default());
        let table = view.monthly_table(2023, day(2025, 10, 15));
        assert!(table.forecast_months.is_empty());
        assert_eq!(table.columns.len(), 12);
        assert_eq!(table.credit_rows[0].cells[1].variation, 100.0);
        assert!(table.credit_rows[0].cells.iter().all(|c| !c.predicted));
    }
}
