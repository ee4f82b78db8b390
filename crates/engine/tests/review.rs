use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use engine::{
    MoneyCents, TransactionType,
    import::{ImportSession, RowEdit, SessionStore, StatementRow, pending_from_statement},
    rules::{NewRule, RuleBook},
    store::{JsonFileStore, KeyValueStore},
};

fn statement() -> Vec<StatementRow> {
    vec![
        StatementRow {
            date_operation: Some("02/03".to_string()),
            label: Some("CB CARREFOUR CITY".to_string()),
            debit: Some(-23.4),
            ..StatementRow::default()
        },
        StatementRow {
            date_operation: Some("05/03/25".to_string()),
            label: Some("VIR SALAIRE".to_string()),
            credit: Some(2_000.0),
            ..StatementRow::default()
        },
        StatementRow {
            date_operation: Some("07/03/2025".to_string()),
            label: Some("PRLV FREE MOBILE".to_string()),
            debit: Some(15.99),
            ..StatementRow::default()
        },
    ]
}

#[test]
fn review_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let today = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();

    let session_id = {
        let store: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::open(&path).unwrap());
        let rules = RuleBook::new(store.clone());
        rules
            .add(NewRule {
                keyword: "carrefour".to_string(),
                kind: TransactionType::Debit,
                category: "groceries".to_string(),
            })
            .unwrap();

        let mut pending = pending_from_statement(&statement(), today);
        rules.apply(&mut pending).unwrap();
        let mut session =
            ImportSession::new("March", serde_json::Value::Null, pending, Utc::now()).unwrap();
        session.toggle_confirmed("parsed-0").unwrap();
        session
            .edit("parsed-2", RowEdit::Category("phone".to_string()))
            .unwrap();

        SessionStore::new(store).save(&session).unwrap();
        session.id
    };

    let store: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::open(&path).unwrap());
    let sessions = SessionStore::new(store.clone());
    let mut session = sessions.get(&session_id).unwrap();

    assert_eq!(session.name, "March");
    assert_eq!(session.pending.len(), 3);
    assert_eq!(session.pending[0].date, "2025-03-02");
    assert_eq!(session.pending[0].category_id.as_deref(), Some("groceries"));
    assert!(session.pending[0].confirmed);
    assert_eq!(session.pending[1].kind, TransactionType::Credit);
    assert_eq!(session.pending[1].date, "2025-03-05");
    assert_eq!(session.pending[2].amount, MoneyCents::new(1_599));
    assert!(session.pending[2].modified);

    session.toggle_confirmed("parsed-2").unwrap();
    let ready = session.begin_processing().unwrap();
    let ids: Vec<String> = ready.iter().map(|row| row.id.clone()).collect();
    assert_eq!(ids, vec!["parsed-0", "parsed-2"]);

    assert!(session.finish_processing(&ids));
    sessions.save(&session).unwrap();
    assert_eq!(sessions.get(&session_id).unwrap().pending.len(), 1);
    assert_eq!(RuleBook::new(store).list().unwrap().len(), 1);
}
