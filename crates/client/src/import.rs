//! Statement import: upload, review snapshots and the final commit.
//!
//! Rows that reach the server leave their session. When nothing is left to
//! decide the snapshot is deleted; otherwise it goes back to review and is
//! saved, so a partial failure can be retried later.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use chrono::{DateTime, NaiveDate, Utc};
use engine::{
    import::{ImportSession, SessionStore, pending_from_statement, validate_upload},
    rules::RuleBook,
    store::KeyValueStore,
};
use tracing::{info, warn};

use crate::{
    ClientError, Result,
    api::ApiClient,
    autosave::{Debouncer, Periodic},
    convert,
};

pub const SNAPSHOT_DEBOUNCE: Duration = Duration::from_millis(250);
pub const AUTOSAVE_PERIOD: Duration = Duration::from_secs(30);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportReport {
    pub session_id: String,
    pub succeeded: usize,
    pub failed: usize,
    /// Rows left in the session after the commit.
    pub remaining: usize,
    pub session_deleted: bool,
}

impl ImportReport {
    /// Turns a commit with failed rows into [`ClientError::PartialImportFailure`].
    pub fn ensure_complete(&self) -> Result<()> {
        if self.failed > 0 {
            return Err(ClientError::PartialImportFailure {
                succeeded: self.succeeded,
                failed: self.failed,
            });
        }
        Ok(())
    }
}

pub struct ImportWorkflow {
    api: ApiClient,
    rules: RuleBook,
    sessions: SessionStore,
    autosave: Debouncer<String>,
}

impl ImportWorkflow {
    pub fn new(api: ApiClient, store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_debounce(api, store, SNAPSHOT_DEBOUNCE)
    }

    pub fn with_debounce(api: ApiClient, store: Arc<dyn KeyValueStore>, delay: Duration) -> Self {
        Self {
            api,
            rules: RuleBook::new(store.clone()),
            sessions: SessionStore::new(store),
            autosave: Debouncer::new(delay),
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Uploads `document`, turns the parsed lines into reviewable rows with
    /// the keyword rules applied, and saves the new session.
    pub async fn start(
        &self,
        name: &str,
        file_name: &str,
        document: Vec<u8>,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<ImportSession> {
        validate_upload(name, &document)?;
        let parsed = self.api.parse_statement(file_name, document).await?;
        let mut pending = pending_from_statement(&convert::statement_rows(&parsed.transactions), today);
        self.rules.apply(&mut pending)?;
        let raw = serde_json::to_value(&parsed)
            .map_err(|err| ClientError::InvalidServerResponse(err.to_string()))?;
        let session = ImportSession::new(name, raw, pending, now)?;
        self.sessions.save(&session)?;
        info!(
            session = %session.id,
            rows = session.pending.len(),
            "statement parsed, review started"
        );
        Ok(session)
    }

    pub fn resume(&self, id: &str) -> Result<ImportSession> {
        Ok(self.sessions.get(id)?)
    }

    pub fn discard(&self, id: &str) -> Result<bool> {
        self.autosave.cancel(&id.to_string());
        Ok(self.sessions.delete(id)?)
    }

    /// Schedules a snapshot of `session`; later calls for the same session
    /// within the debounce window replace this one.
    pub fn schedule_save(&self, session: &ImportSession) {
        let sessions = self.sessions.clone();
        let mut snapshot = session.clone();
        self.autosave.schedule(session.id.clone(), move || async move {
            snapshot.saved_at = Utc::now();
            if let Err(err) = sessions.save(&snapshot) {
                warn!(session = %snapshot.id, %err, "could not save import snapshot");
            }
        });
    }

    /// Saves right away, dropping any scheduled snapshot.
    pub fn save_now(&self, session: &mut ImportSession) -> Result<()> {
        self.autosave.cancel(&session.id);
        session.saved_at = Utc::now();
        self.sessions.save(session)?;
        Ok(())
    }

    /// Snapshots the shared session every `period` until the handle is
    /// dropped.
    pub fn autosave_every(&self, session: Arc<Mutex<ImportSession>>, period: Duration) -> Periodic {
        let sessions = self.sessions.clone();
        Periodic::spawn(period, move || {
            let snapshot = session.lock().ok().map(|session| session.clone());
            let sessions = sessions.clone();
            async move {
                let Some(mut snapshot) = snapshot else {
                    return;
                };
                snapshot.saved_at = Utc::now();
                if let Err(err) = sessions.save(&snapshot) {
                    warn!(session = %snapshot.id, %err, "periodic import snapshot failed");
                }
            }
        })
    }

    /// Sends every confirmed row, one request per row. Rows that were sent
    /// are never rolled back. An authentication failure stops the loop,
    /// keeps what was already sent out of the session, and is returned.
    pub async fn commit(&self, session: &mut ImportSession) -> Result<ImportReport> {
        self.autosave.cancel(&session.id);
        let ready = session.begin_processing()?;

        let mut imported = Vec::with_capacity(ready.len());
        let mut failed = 0;
        for row in &ready {
            match self.api.create_imported(row).await {
                Ok(()) => imported.push(row.id.clone()),
                Err(err) if err.is_auth() => {
                    session.finish_processing(&imported);
                    self.sessions.save(session)?;
                    return Err(err);
                }
                Err(err) => {
                    warn!(session = %session.id, row = %row.id, %err, "row import failed");
                    failed += 1;
                }
            }
        }

        let still_pending = session.finish_processing(&imported);
        let session_deleted = if still_pending {
            self.save_now(session)?;
            false
        } else {
            self.sessions.delete(&session.id)?;
            true
        };
        info!(
            session = %session.id,
            succeeded = imported.len(),
            failed,
            "import committed"
        );
        Ok(ImportReport {
            session_id: session.id.clone(),
            succeeded: imported.len(),
            failed,
            remaining: session.pending.len(),
            session_deleted,
        })
    }
}
