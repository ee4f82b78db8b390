//! Transaction primitives.
//!
//! A `Transaction` is a dated movement with an unsigned amount; its
//! [`TransactionType`] decides whether it adds to (CREDIT) or subtracts from
//! (DEBIT) a balance.

use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{EngineError, MoneyCents, ResultEngine};

/// Label used for transactions that carry no category.
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Debit,
    Credit,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debit => "DEBIT",
            Self::Credit => "CREDIT",
        }
    }

    /// Sign applied to the unsigned amount in balances.
    pub fn sign(self) -> i64 {
        match self {
            Self::Debit => -1,
            Self::Credit => 1,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "DEBIT" => Ok(Self::Debit),
            "CREDIT" => Ok(Self::Credit),
            other => Err(EngineError::Validation(format!(
                "invalid transaction type: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: String,
    pub name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub operation: String,
    pub date: NaiveDate,
    pub kind: TransactionType,
    /// Unsigned magnitude.
    pub amount: MoneyCents,
    pub category: Option<CategoryRef>,
}

impl Transaction {
    /// Amount with the sign implied by the type.
    pub fn signed_amount(&self) -> MoneyCents {
        MoneyCents::new(self.amount.abs().cents() * self.kind.sign())
    }

    pub fn category_id(&self) -> Option<&str> {
        self.category.as_ref().map(|c| c.id.as_str())
    }

    pub fn category_name(&self) -> Option<&str> {
        self.category.as_ref().and_then(|c| c.name.as_deref())
    }
}

/// Parses a `YYYY-MM-DD` date, ignoring any trailing time part.
pub fn parse_date(raw: &str) -> ResultEngine<NaiveDate> {
    let trimmed = raw.trim();
    let day = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|_| EngineError::InvalidDate(trimmed.to_string()))
}

/// Validated input of the transaction form, ready to be sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionDraft {
    pub operation: String,
    pub date: NaiveDate,
    pub kind: TransactionType,
    pub amount: MoneyCents,
    pub category_id: String,
}

impl TransactionDraft {
    /// Validates raw form fields.
    ///
    /// A missing date defaults to `today`. The amount must parse and be
    /// non-zero; its sign is dropped because the type carries it.
    pub fn from_form(
        operation: &str,
        date: Option<&str>,
        kind: TransactionType,
        amount: &str,
        category_id: Option<&str>,
        today: NaiveDate,
    ) -> ResultEngine<Self> {
        let operation = operation.trim();
        if operation.is_empty() {
            return Err(EngineError::Validation("operation label is required".to_string()));
        }

        let amount: MoneyCents = amount.parse()?;
        if amount.is_zero() {
            return Err(EngineError::InvalidAmount("amount must be non-zero".to_string()));
        }

        let category_id = category_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| EngineError::Validation("a category is required".to_string()))?;

        let date = match date.map(str::trim).filter(|d| !d.is_empty()) {
            Some(raw) => parse_date(raw)?,
            None => today,
        };

        Ok(Self {
            operation: operation.to_string(),
            date,
            kind,
            amount: amount.abs(),
            category_id: category_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    #[test]
    fn signed_amount_follows_type() {
        let mut tx = Transaction {
            id: "1".to_string(),
            operation: "Salary".to_string(),
            date: today(),
            kind: TransactionType::Credit,
            amount: MoneyCents::new(1000),
            category: None,
        };
        assert_eq!(tx.signed_amount(), MoneyCents::new(1000));
        tx.kind = TransactionType::Debit;
        assert_eq!(tx.signed_amount(), MoneyCents::new(-1000));
    }

    #[test]
    fn parse_date_ignores_time_part() {
        assert_eq!(
            parse_date("2025-03-10T08:00:00Z").unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
        );
        assert!(parse_date("10/03/2025").is_err());
    }

    #[test]
    fn type_parses_case_insensitively() {
        assert_eq!("debit".parse::<TransactionType>().unwrap(), TransactionType::Debit);
        assert_eq!(" CREDIT ".parse::<TransactionType>().unwrap(), TransactionType::Credit);
        assert!("refund".parse::<TransactionType>().is_err());
    }

    #[test]
    fn draft_rejects_zero_or_non_numeric_amounts() {
        let zero = TransactionDraft::from_form(
            "Rent",
            None,
            TransactionType::Debit,
            "0",
            Some("4"),
            today(),
        );
        assert!(matches!(zero, Err(EngineError::InvalidAmount(_))));

        let garbage = TransactionDraft::from_form(
            "Rent",
            None,
            TransactionType::Debit,
            "twelve",
            Some("4"),
            today(),
        );
        assert!(matches!(garbage, Err(EngineError::InvalidAmount(_))));
    }

    #[test]
    fn draft_requires_a_category_and_defaults_the_date() {
        let missing = TransactionDraft::from_form(
            "Rent",
            None,
            TransactionType::Debit,
            "700",
            Some("  "),
            today(),
        );
        assert!(matches!(missing, Err(EngineError::Validation(_))));

        let draft = TransactionDraft::from_form(
            " Rent ",
            None,
            TransactionType::Debit,
            "-700,50",
            Some("4"),
            today(),
        )
        .unwrap();
        assert_eq!(draft.operation, "Rent");
        assert_eq!(draft.date, today());
        assert_eq!(draft.amount, MoneyCents::new(70_050));
    }
}
