//! Keyword rules for auto-categorization.
//!
//! A rule carries a keyword, a type and an optional category id. Applying a
//! rule list to a transaction scans the rules in stored order; the first rule
//! whose keyword occurs in the transaction label (ignoring case) wins and
//! overrides the type, plus the category when the rule has one.
//!
//! Rules live in the local key-value store under [`RULES_KEY`] and are
//! managed through a [`RuleBook`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, TransactionType,
    store::{KeyValueStore, StoredList, read_list, write_list},
    util,
};

pub const RULES_KEY: &str = "keywordRules";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub id: String,
    #[serde(default)]
    pub keyword: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Category id; empty leaves the category untouched.
    #[serde(default)]
    pub category: String,
}

impl KeywordRule {
    pub fn matches(&self, label: &str) -> bool {
        util::contains_folded(label, &self.keyword)
    }
}

/// Anything a keyword rule can be applied to.
pub trait RuleTarget {
    fn label(&self) -> &str;
    fn set_kind(&mut self, kind: TransactionType);
    fn set_category_id(&mut self, category_id: &str);
}

/// Returns the first rule matching `label`, in stored order.
pub fn matching_rule<'a>(label: &str, rules: &'a [KeywordRule]) -> Option<&'a KeywordRule> {
    rules.iter().find(|rule| rule.matches(label))
}

/// Applies `rules` to every item. Never fails; non-matching items are left
/// as they are.
pub fn apply_rules<T: RuleTarget>(items: &mut [T], rules: &[KeywordRule]) {
    for item in items.iter_mut() {
        let Some(rule) = matching_rule(item.label(), rules) else {
            continue;
        };
        item.set_kind(rule.kind);
        if !rule.category.trim().is_empty() {
            item.set_category_id(&rule.category);
        }
    }
}

/// Input of the rule form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewRule {
    pub keyword: String,
    pub kind: TransactionType,
    pub category: String,
}

impl NewRule {
    fn validate(&self) -> ResultEngine<()> {
        if self.keyword.trim().is_empty() {
            return Err(EngineError::Validation("keyword is required".to_string()));
        }
        if self.category.trim().is_empty() {
            return Err(EngineError::Validation("a category is required".to_string()));
        }
        Ok(())
    }
}

/// Partial update; `None` keeps the stored value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RulePatch {
    pub keyword: Option<String>,
    pub kind: Option<TransactionType>,
    pub category: Option<String>,
}

/// Persistent, ordered rule list.
#[derive(Clone)]
pub struct RuleBook {
    store: Arc<dyn KeyValueStore>,
}

impl RuleBook {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Stored rules in order. Entries that cannot be read are skipped, and a
    /// value that is not a list reads as no rules at all.
    pub fn list(&self) -> ResultEngine<Vec<KeywordRule>> {
        match read_list::<KeywordRule>(self.store.as_ref(), RULES_KEY) {
            Ok(stored) => Ok(stored.items),
            Err(EngineError::Json(err)) => {
                warn!(%err, "stored keyword rules are corrupt, ignoring them");
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }

    /// Current list for a change. Fails instead of letting a write replace
    /// data it could not read.
    fn load(&self) -> ResultEngine<StoredList<KeywordRule>> {
        read_list(self.store.as_ref(), RULES_KEY).map_err(|err| match err {
            EngineError::Json(err) => {
                EngineError::Storage(format!("stored keyword rules are unreadable: {err}"))
            }
            err => err,
        })
    }

    fn save(&self, stored: &StoredList<KeywordRule>) -> ResultEngine<()> {
        write_list(self.store.as_ref(), RULES_KEY, &stored.items, &stored.unreadable)
    }

    pub fn add(&self, rule: NewRule) -> ResultEngine<KeywordRule> {
        rule.validate()?;
        let mut stored = self.load()?;
        let created = KeywordRule {
            id: Uuid::new_v4().to_string(),
            keyword: rule.keyword.trim().to_string(),
            kind: rule.kind,
            category: rule.category.trim().to_string(),
        };
        stored.items.push(created.clone());
        self.save(&stored)?;
        debug!(id = %created.id, keyword = %created.keyword, "keyword rule added");
        Ok(created)
    }

    pub fn update(&self, id: &str, patch: RulePatch) -> ResultEngine<KeywordRule> {
        let mut stored = self.load()?;
        let rule = stored
            .items
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| EngineError::KeyNotFound(id.to_string()))?;

        let mut updated = rule.clone();
        if let Some(keyword) = patch.keyword {
            updated.keyword = keyword.trim().to_string();
        }
        if let Some(kind) = patch.kind {
            updated.kind = kind;
        }
        if let Some(category) = patch.category {
            updated.category = category.trim().to_string();
        }
        NewRule {
            keyword: updated.keyword.clone(),
            kind: updated.kind,
            category: updated.category.clone(),
        }
        .validate()?;

        *rule = updated.clone();
        self.save(&stored)?;
        Ok(updated)
    }

    pub fn delete(&self, id: &str) -> ResultEngine<()> {
        let mut stored = self.load()?;
        let before = stored.items.len();
        stored.items.retain(|r| r.id != id);
        if stored.items.len() == before {
            return Err(EngineError::KeyNotFound(id.to_string()));
        }
        self.save(&stored)
    }

    /// Removes every rule, unreadable entries included.
    pub fn clear(&self) -> ResultEngine<()> {
        self.save(&StoredList::default())
    }

    /// Rules whose keyword contains `query` (ignoring case). An empty query
    /// returns every rule.
    pub fn search(&self, query: &str) -> ResultEngine<Vec<KeywordRule>> {
        let rules = self.list()?;
        let query = query.trim();
        if query.is_empty() {
            return Ok(rules);
        }
        Ok(rules
            .into_iter()
            .filter(|r| util::contains_folded(&r.keyword, query))
            .collect())
    }

    /// Applies the stored rules to `items`.
    pub fn apply<T: RuleTarget>(&self, items: &mut [T]) -> ResultEngine<()> {
        let rules = self.list()?;
        apply_rules(items, &rules);
        Ok(())
    }
}
