//! Category registry as seen by the client.

use serde::{Deserialize, Serialize};

use crate::{EngineError, MoneyCents, ResultEngine, util};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    /// Yearly expense budget stored on the server (0 when unset).
    pub estimated_expense: MoneyCents,
    /// Yearly income budget stored on the server (0 when unset).
    pub estimated_income: MoneyCents,
}

/// Finds a category by id, or else by case-insensitive name.
pub fn resolve<'a>(categories: &'a [Category], id_or_name: &str) -> ResultEngine<&'a Category> {
    let needle = id_or_name.trim();
    categories
        .iter()
        .find(|c| c.id == needle)
        .or_else(|| {
            let folded = util::fold(needle);
            categories.iter().find(|c| util::fold(&c.name) == folded)
        })
        .ok_or_else(|| EngineError::KeyNotFound(needle.to_string()))
}
