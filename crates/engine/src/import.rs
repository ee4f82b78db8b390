//! Import sessions for parsed bank statements.
//!
//! A session goes `Upload -> Review -> Processing`. The rows extracted from a
//! statement become [`PendingTransaction`]s that the user reviews (edits,
//! confirms, cancels) before the confirmed ones are sent to the server one
//! by one. Sessions are snapshotted in the key-value store under
//! [`SESSIONS_KEY`] so that an interrupted review can be resumed.

use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    EngineError, MoneyCents, ResultEngine, TransactionType,
    rules::RuleTarget,
    store::{KeyValueStore, StoredList, read_list, write_list},
};

pub const SESSIONS_KEY: &str = "pdfImportSessions";

const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStep {
    Upload,
    Review,
    Processing,
}

/// One line extracted from a statement by the server.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatementRow {
    pub date_operation: Option<String>,
    pub date_valeur: Option<String>,
    pub label: Option<String>,
    pub debit: Option<f64>,
    pub credit: Option<f64>,
    pub reference: Option<String>,
    pub page: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTransaction {
    pub id: String,
    pub operation: String,
    /// `YYYY-MM-DD` when the statement date could be understood, else the
    /// raw text.
    pub date: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: MoneyCents,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub reference: String,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub confirmed: bool,
    #[serde(default)]
    pub modified: bool,
    #[serde(default)]
    pub cancelled: bool,
}

fn first_page() -> u32 {
    1
}

impl PendingTransaction {
    /// Confirmed and not cancelled.
    pub fn is_ready(&self) -> bool {
        self.confirmed && !self.cancelled
    }

    fn has_category(&self) -> bool {
        self.category_id
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty())
    }
}

impl RuleTarget for PendingTransaction {
    fn label(&self) -> &str {
        &self.operation
    }

    fn set_kind(&mut self, kind: TransactionType) {
        self.kind = kind;
    }

    fn set_category_id(&mut self, category_id: &str) {
        self.category_id = Some(category_id.to_string());
    }
}

/// Converts a statement date to `YYYY-MM-DD`.
///
/// `DD/MM` takes the year of `today`, `DD/MM/YY` is read as `20YY`. Text
/// without a slash is kept as it is; an empty or unusable value becomes
/// `today`.
pub fn normalize_statement_date(raw: Option<&str>, today: NaiveDate) -> String {
    let fallback = || today.format("%Y-%m-%d").to_string();
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return fallback();
    };
    if !raw.contains('/') {
        return raw.to_string();
    }

    let parts: Vec<&str> = raw.split('/').map(str::trim).collect();
    match parts.as_slice() {
        [day, month] => format!("{}-{month:0>2}-{day:0>2}", today.year()),
        [day, month, year] => {
            let year = if year.len() == 2 {
                format!("20{year}")
            } else {
                year.to_string()
            };
            format!("{year}-{month:0>2}-{day:0>2}")
        }
        _ => fallback(),
    }
}

/// Turns parsed statement lines into reviewable rows.
pub fn pending_from_statement(rows: &[StatementRow], today: NaiveDate) -> Vec<PendingTransaction> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let credit = row.credit.unwrap_or_default();
            let (kind, amount) = if credit > 0.0 {
                (TransactionType::Credit, MoneyCents::from_major(credit))
            } else {
                (
                    TransactionType::Debit,
                    MoneyCents::from_major(row.debit.unwrap_or_default()).abs(),
                )
            };
            let date = row.date_valeur.as_deref().or(row.date_operation.as_deref());
            PendingTransaction {
                id: format!("parsed-{index}"),
                operation: row.label.clone().unwrap_or_default(),
                date: normalize_statement_date(date, today),
                kind,
                amount,
                category_id: None,
                reference: row.reference.clone().unwrap_or_default(),
                page: row.page.filter(|p| *p > 0).unwrap_or(1),
                confirmed: false,
                modified: false,
                cancelled: false,
            }
        })
        .collect()
}

/// Checks the upload form: a session name and a PDF document.
pub fn validate_upload(session_name: &str, document: &[u8]) -> ResultEngine<()> {
    if session_name.trim().is_empty() {
        return Err(EngineError::Validation("a session name is required".to_string()));
    }
    if !document.starts_with(PDF_MAGIC) {
        return Err(EngineError::Validation("the file is not a PDF document".to_string()));
    }
    Ok(())
}

/// A single field change made during review.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RowEdit {
    Operation(String),
    Date(String),
    Kind(TransactionType),
    Amount(MoneyCents),
    Category(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSession {
    pub id: String,
    pub name: String,
    #[serde(rename = "date")]
    pub saved_at: DateTime<Utc>,
    /// Raw parser response, kept for reference.
    #[serde(default)]
    pub parse_result: serde_json::Value,
    #[serde(rename = "pendingTransactions", default)]
    pub pending: Vec<PendingTransaction>,
    pub step: ImportStep,
}

impl ImportSession {
    /// Starts a session in `Review` with rows already through the rules.
    pub fn new(
        name: &str,
        parse_result: serde_json::Value,
        pending: Vec<PendingTransaction>,
        now: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::Validation("a session name is required".to_string()));
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            saved_at: now,
            parse_result,
            pending,
            step: ImportStep::Review,
        })
    }

    fn row_mut(&mut self, row_id: &str) -> ResultEngine<&mut PendingTransaction> {
        self.pending
            .iter_mut()
            .find(|row| row.id == row_id)
            .ok_or_else(|| EngineError::KeyNotFound(row_id.to_string()))
    }

    pub fn edit(&mut self, row_id: &str, edit: RowEdit) -> ResultEngine<()> {
        let row = self.row_mut(row_id)?;
        match edit {
            RowEdit::Operation(operation) => row.operation = operation,
            RowEdit::Date(date) => row.date = date,
            RowEdit::Kind(kind) => row.kind = kind,
            RowEdit::Amount(amount) => row.amount = amount.abs(),
            RowEdit::Category(category) => {
                let category = category.trim();
                row.category_id = (!category.is_empty()).then(|| category.to_string());
            }
        }
        row.modified = true;
        Ok(())
    }

    pub fn toggle_confirmed(&mut self, row_id: &str) -> ResultEngine<bool> {
        let row = self.row_mut(row_id)?;
        row.confirmed = !row.confirmed;
        Ok(row.confirmed)
    }

    pub fn toggle_cancelled(&mut self, row_id: &str) -> ResultEngine<bool> {
        let row = self.row_mut(row_id)?;
        row.cancelled = !row.cancelled;
        Ok(row.cancelled)
    }

    /// Confirms every row that is not cancelled.
    pub fn confirm_all(&mut self) {
        for row in self.pending.iter_mut().filter(|row| !row.cancelled) {
            row.confirmed = true;
        }
    }

    /// Cancels every row, which also drops its confirmation.
    pub fn cancel_all(&mut self) {
        for row in &mut self.pending {
            row.cancelled = true;
            row.confirmed = false;
        }
    }

    pub fn confirmed_count(&self) -> usize {
        self.pending.iter().filter(|row| row.is_ready()).count()
    }

    pub fn cancelled_count(&self) -> usize {
        self.pending.iter().filter(|row| row.cancelled).count()
    }

    /// Rows still waiting for a decision (anything not cancelled).
    pub fn has_pending(&self) -> bool {
        self.pending.iter().any(|row| !row.cancelled)
    }

    /// Validates the review and moves to `Processing`, returning the rows to
    /// send.
    pub fn begin_processing(&mut self) -> ResultEngine<Vec<PendingTransaction>> {
        let ready: Vec<PendingTransaction> =
            self.pending.iter().filter(|row| row.is_ready()).cloned().collect();
        if ready.is_empty() {
            return Err(EngineError::Validation(
                "no confirmed transaction to import".to_string(),
            ));
        }
        let missing = ready.iter().filter(|row| !row.has_category()).count();
        if missing > 0 {
            return Err(EngineError::Validation(format!(
                "{missing} confirmed transaction(s) have no category"
            )));
        }
        self.step = ImportStep::Processing;
        Ok(ready)
    }

    /// Drops the rows that reached the server and goes back to `Review`.
    ///
    /// Returns whether rows are still pending.
    pub fn finish_processing(&mut self, imported_ids: &[String]) -> bool {
        self.pending.retain(|row| !imported_ids.contains(&row.id));
        self.step = ImportStep::Review;
        self.has_pending()
    }
}

/// Persisted list of session snapshots.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Saved snapshots. Unreadable entries are skipped, and a value that is
    /// not a list reads as no sessions.
    pub fn list(&self) -> ResultEngine<Vec<ImportSession>> {
        match read_list::<ImportSession>(self.store.as_ref(), SESSIONS_KEY) {
            Ok(stored) => Ok(stored.items),
            Err(EngineError::Json(err)) => {
                warn!(%err, "stored import sessions are corrupt, ignoring them");
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }

    /// Current list for a change; unreadable data is never overwritten.
    fn load(&self) -> ResultEngine<StoredList<ImportSession>> {
        read_list(self.store.as_ref(), SESSIONS_KEY).map_err(|err| match err {
            EngineError::Json(err) => {
                EngineError::Storage(format!("stored import sessions are unreadable: {err}"))
            }
            err => err,
        })
    }

    fn write(&self, stored: &StoredList<ImportSession>) -> ResultEngine<()> {
        write_list(self.store.as_ref(), SESSIONS_KEY, &stored.items, &stored.unreadable)
    }

    pub fn get(&self, id: &str) -> ResultEngine<ImportSession> {
        self.list()?
            .into_iter()
            .find(|session| session.id == id)
            .ok_or_else(|| EngineError::KeyNotFound(id.to_string()))
    }

    /// Inserts or replaces the snapshot with the same id.
    pub fn save(&self, session: &ImportSession) -> ResultEngine<()> {
        let mut stored = self.load()?;
        match stored.items.iter_mut().find(|s| s.id == session.id) {
            Some(existing) => *existing = session.clone(),
            None => stored.items.push(session.clone()),
        }
        self.write(&stored)?;
        debug!(id = %session.id, rows = session.pending.len(), "import session saved");
        Ok(())
    }

    /// Removes a snapshot; returns whether it existed.
    pub fn delete(&self, id: &str) -> ResultEngine<bool> {
        let mut stored = self.load()?;
        let before = stored.items.len();
        stored.items.retain(|s| s.id != id);
        if stored.items.len() == before {
            return Ok(false);
        }
        self.write(&stored)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        rules::{KeywordRule, apply_rules},
        store::MemoryStore,
    };

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn line(label: &str, date: Option<&str>, debit: Option<f64>, credit: Option<f64>) -> StatementRow {
        StatementRow {
            date_operation: date.map(str::to_string),
            label: Some(label.to_string()),
            debit,
            credit,
            ..StatementRow::default()
        }
    }

    fn session(rows: Vec<PendingTransaction>) -> ImportSession {
        ImportSession::new("June", serde_json::Value::Null, rows, Utc::now()).unwrap()
    }

    #[test]
    fn statement_dates_are_normalized() {
        assert_eq!(normalize_statement_date(Some("3/4"), today()), "2025-04-03");
        assert_eq!(normalize_statement_date(Some("03/04/24"), today()), "2024-04-03");
        assert_eq!(normalize_statement_date(Some("3/4/2023"), today()), "2023-04-03");
        assert_eq!(normalize_statement_date(Some("2023-01-31"), today()), "2023-01-31");
        assert_eq!(normalize_statement_date(Some("1/2/3/4"), today()), "2025-06-15");
        assert_eq!(normalize_statement_date(None, today()), "2025-06-15");
        assert_eq!(normalize_statement_date(Some("  "), today()), "2025-06-15");
    }

    #[test]
    fn value_date_wins_over_operation_date() {
        let row = StatementRow {
            date_valeur: Some("02/01".to_string()),
            ..line("x", Some("01/01"), Some(1.0), None)
        };
        let pending = pending_from_statement(&[row], today());
        assert_eq!(pending[0].date, "2025-01-02");
    }

    #[test]
    fn credit_and_debit_become_type_and_magnitude() {
        let rows = vec![
            line("VIR SALAIRE", Some("01/06"), None, Some(2_100.5)),
            line("CB LIDL", Some("02/06"), Some(-42.1), Some(0.0)),
            line("FRAIS", Some("03/06"), Some(3.0), None),
        ];
        let pending = pending_from_statement(&rows, today());
        assert_eq!(pending[0].id, "parsed-0");
        assert_eq!(pending[0].kind, TransactionType::Credit);
        assert_eq!(pending[0].amount, MoneyCents::new(210_050));
        assert_eq!(pending[1].kind, TransactionType::Debit);
        assert_eq!(pending[1].amount, MoneyCents::new(4_210));
        assert_eq!(pending[2].amount, MoneyCents::new(300));
        assert!(pending.iter().all(|p| !p.confirmed && !p.cancelled && !p.modified));
        assert!(pending.iter().all(|p| p.page == 1));
    }

    #[test]
    fn rules_apply_to_pending_rows() {
        let rules = vec![KeywordRule {
            id: "r1".to_string(),
            keyword: "lidl".to_string(),
            kind: TransactionType::Debit,
            category: "groceries".to_string(),
        }];
        let mut pending = pending_from_statement(
            &[line("CB LIDL 1234", None, None, Some(5.0))],
            today(),
        );
        apply_rules(&mut pending, &rules);
        assert_eq!(pending[0].kind, TransactionType::Debit);
        assert_eq!(pending[0].category_id.as_deref(), Some("groceries"));
        assert!(!pending[0].modified);
    }

    #[test]
    fn upload_requires_name_and_pdf() {
        assert!(validate_upload("June", b"%PDF-1.7 ...").is_ok());
        assert!(matches!(
            validate_upload("  ", b"%PDF-1.7"),
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            validate_upload("June", b"PK\x03\x04"),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn review_edits_and_toggles() {
        let rows = pending_from_statement(
            &[
                line("a", None, Some(1.0), None),
                line("b", None, Some(2.0), None),
                line("c", None, Some(3.0), None),
            ],
            today(),
        );
        let mut session = session(rows);
        assert_eq!(session.step, ImportStep::Review);

        session.edit("parsed-1", RowEdit::Category("4".to_string())).unwrap();
        assert!(session.pending[1].modified);
        assert!(session.toggle_cancelled("parsed-2").unwrap());

        session.confirm_all();
        assert_eq!(session.confirmed_count(), 2);
        assert!(!session.pending[2].confirmed);

        assert!(!session.toggle_confirmed("parsed-0").unwrap());
        assert_eq!(session.confirmed_count(), 1);

        session.cancel_all();
        assert_eq!(session.confirmed_count(), 0);
        assert_eq!(session.cancelled_count(), 3);
        assert!(!session.has_pending());

        assert_eq!(
            session.edit("missing", RowEdit::Date("x".to_string())),
            Err(EngineError::KeyNotFound("missing".to_string()))
        );
    }

    #[test]
    fn processing_requires_confirmed_rows_with_categories() {
        let rows = pending_from_statement(
            &[line("a", None, Some(1.0), None), line("b", None, Some(2.0), None)],
            today(),
        );
        let mut session = session(rows);
        assert!(matches!(session.begin_processing(), Err(EngineError::Validation(_))));

        session.confirm_all();
        session.edit("parsed-0", RowEdit::Category("4".to_string())).unwrap();
        assert!(matches!(session.begin_processing(), Err(EngineError::Validation(_))));
        assert_eq!(session.step, ImportStep::Review);

        session.toggle_confirmed("parsed-1").unwrap();
        let ready = session.begin_processing().unwrap();
        assert_eq!(ready.len(), 1);
        assert_eq!(session.step, ImportStep::Processing);

        let still_pending = session.finish_processing(&["parsed-0".to_string()]);
        assert!(still_pending);
        assert_eq!(session.step, ImportStep::Review);
        assert_eq!(session.pending.len(), 1);
        assert_eq!(session.pending[0].id, "parsed-1");
    }

    #[test]
    fn session_store_upserts_and_deletes() {
        let store = SessionStore::new(Arc::new(MemoryStore::new()));
        let mut first = session(Vec::new());
        store.save(&first).unwrap();
        first.name = "June (renamed)".to_string();
        store.save(&first).unwrap();
        let second = session(Vec::new());
        store.save(&second).unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(store.get(&first.id).unwrap().name, "June (renamed)");

        assert!(store.delete(&first.id).unwrap());
        assert!(!store.delete(&first.id).unwrap());
        assert_eq!(store.list().unwrap(), vec![second]);
    }

    #[test]
    fn session_name_is_required() {
        let result = ImportSession::new(" ", serde_json::Value::Null, Vec::new(), Utc::now());
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }

    #[test]
    fn unreadable_session_survives_saves_of_its_siblings() {
        let backing = Arc::new(MemoryStore::new());
        backing
            .set(SESSIONS_KEY, r#"[{"id":"old","name":"May"}]"#)
            .unwrap();
        let store = SessionStore::new(backing.clone());
        assert!(store.list().unwrap().is_empty());

        let june = session(Vec::new());
        store.save(&june).unwrap();
        assert_eq!(store.list().unwrap(), vec![june.clone()]);
        assert!(store.delete(&june.id).unwrap());

        let raw: serde_json::Value =
            serde_json::from_str(&backing.get(SESSIONS_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(raw, serde_json::json!([{ "id": "old", "name": "May" }]));
    }

    #[test]
    fn corrupt_sessions_are_not_overwritten() {
        let backing = Arc::new(MemoryStore::new());
        backing.set(SESSIONS_KEY, "{\"broken\"").unwrap();
        let store = SessionStore::new(backing.clone());

        assert!(store.list().unwrap().is_empty());
        assert!(matches!(
            store.save(&session(Vec::new())),
            Err(EngineError::Storage(_))
        ));
        assert_eq!(
            backing.get(SESSIONS_KEY).unwrap().as_deref(),
            Some("{\"broken\"")
        );
    }
}
