//! JSON bodies exchanged with the budgeting REST API.
//!
//! Field names follow the server's camelCase (and, for the finance objects,
//! French) naming. Identifiers are accepted as JSON strings or numbers and
//! always surface as `String`.

use serde::{Deserialize, Serialize};

/// Error body returned by the server on non-2xx responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
}

pub mod id {
    //! Helpers for ids that the server sends either as strings or numbers.

    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Turns a JSON scalar into an id string.
    ///
    /// Returns `None` for `null`, empty strings, objects and arrays.
    pub fn from_value(value: &Value) -> Option<String> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        from_value(&value).ok_or_else(|| serde::de::Error::custom("expected a string or numeric id"))
    }

    pub fn optional<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(from_value))
    }
}

pub mod user {
    use super::*;
    use serde_json::Value;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoginRequest {
        pub email: String,
        pub password: String,
    }

    /// Login payload. The user id may come under any of several names, or
    /// not at all (then it lives in the access token's claims).
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct LoginResponse {
        pub token: String,
        pub refresh_token: String,
        #[serde(default)]
        pub id: Option<Value>,
        #[serde(default)]
        pub user_id: Option<Value>,
        #[serde(default)]
        pub uuid: Option<Value>,
        #[serde(default, rename = "userUUID")]
        pub user_uuid: Option<Value>,
        #[serde(default, rename = "user_id")]
        pub user_id_snake: Option<Value>,
        #[serde(default)]
        pub email: Option<String>,
        #[serde(default)]
        pub display_name: Option<String>,
        #[serde(default)]
        pub is_admin: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RegisterRequest {
        pub email: String,
        pub password: String,
        pub display_name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RefreshRequest {
        pub refresh_token: String,
    }

    /// New token pair minted by `/user/refresh`.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TokenPair {
        pub token: String,
        pub refresh_token: String,
    }
}

pub mod category {
    use super::*;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: String,
    }

    /// Category as listed by `/categories` and `/categories/estimations`.
    ///
    /// The plain listing omits the estimation fields; they default to 0.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CategoryView {
        #[serde(deserialize_with = "crate::id::string")]
        pub id: String,
        pub name: String,
        #[serde(default)]
        pub estimation_depenses: Option<f64>,
        #[serde(default)]
        pub estimation_revenus: Option<f64>,
    }

    /// Body of `PUT /categories/{id}/estimations`.
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct EstimationUpdate {
        pub estimation_depenses: f64,
        pub estimation_revenus: f64,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "UPPERCASE")]
    pub enum TransactionType {
        Debit,
        Credit,
    }

    /// Category embedded in a transaction listing.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct CategoryRef {
        #[serde(deserialize_with = "crate::id::string")]
        pub id: String,
        #[serde(default)]
        pub name: Option<String>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct TransactionView {
        #[serde(deserialize_with = "crate::id::string")]
        pub id: String,
        #[serde(default)]
        pub operation: Option<String>,
        /// `YYYY-MM-DD`, optionally followed by a time part.
        pub date: String,
        #[serde(rename = "type")]
        pub kind: TransactionType,
        /// Unsigned amount in major units; the type carries the sign.
        /// Missing or `null` reads as zero.
        #[serde(default)]
        pub valeur: Option<f64>,
        #[serde(default)]
        pub categorie: Option<CategoryRef>,
    }

    /// Body for creating or updating a transaction.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionWrite {
        pub operation: String,
        pub date: String,
        #[serde(rename = "type")]
        pub kind: TransactionType,
        pub valeur: f64,
        pub categorie_id: String,
    }

    /// One line of a parsed bank statement (`/transactions/parse-ccf`).
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct StatementLine {
        #[serde(default)]
        pub date_operation: Option<String>,
        #[serde(default)]
        pub date_valeur: Option<String>,
        #[serde(default)]
        pub libelle: Option<String>,
        #[serde(default)]
        pub debit: Option<f64>,
        #[serde(default)]
        pub credit: Option<f64>,
        #[serde(default)]
        pub reference: Option<String>,
        #[serde(default)]
        pub page: Option<u32>,
    }

    /// Structured parse result. Unknown fields (account, period, totals)
    /// are kept verbatim so review sessions can be restored as received.
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct StatementParse {
        #[serde(default)]
        pub transactions: Vec<StatementLine>,
        #[serde(flatten)]
        pub extra: serde_json::Map<String, serde_json::Value>,
    }
}

pub mod savings {
    use super::*;

    /// Savings balance; older servers answer with a bare number.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum SavingsBalance {
        Account { valeur: f64 },
        Raw(f64),
    }

    impl SavingsBalance {
        pub fn value(&self) -> f64 {
            match self {
                Self::Account { valeur } => *valeur,
                Self::Raw(value) => *value,
            }
        }
    }
}
