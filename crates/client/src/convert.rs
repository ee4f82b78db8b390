//! Mapping between wire types and domain types.

use api_types::{
    category::CategoryView,
    transaction::{self as wire, StatementLine, TransactionView, TransactionWrite},
};
use engine::{
    Category, CategoryRef, MoneyCents, Transaction, TransactionDraft, TransactionType,
    import::{PendingTransaction, StatementRow},
    parse_date,
};
use serde_json::Value;
use tracing::warn;

pub fn kind_from_wire(kind: wire::TransactionType) -> TransactionType {
    match kind {
        wire::TransactionType::Debit => TransactionType::Debit,
        wire::TransactionType::Credit => TransactionType::Credit,
    }
}

pub fn kind_to_wire(kind: TransactionType) -> wire::TransactionType {
    match kind {
        TransactionType::Debit => wire::TransactionType::Debit,
        TransactionType::Credit => wire::TransactionType::Credit,
    }
}

pub fn category(view: CategoryView) -> Category {
    Category {
        id: view.id,
        name: view.name,
        estimated_expense: MoneyCents::from_major(view.estimation_depenses.unwrap_or_default()),
        estimated_income: MoneyCents::from_major(view.estimation_revenus.unwrap_or_default()),
    }
}

/// Converts a listing row by row. Rows that do not decode, or whose date
/// cannot be read, are dropped.
pub fn transactions(rows: Vec<Value>) -> Vec<Transaction> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value::<TransactionView>(row) {
            Ok(view) => transaction(view),
            Err(err) => {
                warn!(%err, "skipping unreadable transaction");
                None
            }
        })
        .collect()
}

fn transaction(view: TransactionView) -> Option<Transaction> {
    let date = match parse_date(&view.date) {
        Ok(date) => date,
        Err(err) => {
            warn!(id = %view.id, %err, "skipping transaction with unreadable date");
            return None;
        }
    };
    Some(Transaction {
        id: view.id,
        operation: view.operation.unwrap_or_default(),
        date,
        kind: kind_from_wire(view.kind),
        amount: MoneyCents::from_major(view.valeur.unwrap_or_default()).abs(),
        category: view.categorie.map(|c| CategoryRef {
            id: c.id,
            name: c.name,
        }),
    })
}

pub fn write_from_draft(draft: &TransactionDraft) -> TransactionWrite {
    TransactionWrite {
        operation: draft.operation.clone(),
        date: draft.date.format("%Y-%m-%d").to_string(),
        kind: kind_to_wire(draft.kind),
        valeur: draft.amount.abs().to_major(),
        categorie_id: draft.category_id.clone(),
    }
}

/// Body for an imported row. The date is sent as reviewed.
pub fn write_from_pending(row: &PendingTransaction) -> TransactionWrite {
    TransactionWrite {
        operation: row.operation.clone(),
        date: row.date.clone(),
        kind: kind_to_wire(row.kind),
        valeur: row.amount.abs().to_major(),
        categorie_id: row.category_id.clone().unwrap_or_default(),
    }
}

pub fn statement_rows(lines: &[StatementLine]) -> Vec<StatementRow> {
    lines
        .iter()
        .map(|line| StatementRow {
            date_operation: line.date_operation.clone(),
            date_valeur: line.date_valeur.clone(),
            label: line.libelle.clone(),
            debit: line.debit,
            credit: line.credit,
            reference: line.reference.clone(),
            page: line.page,
        })
        .collect()
}
