use chrono::Utc;
use client::ImportWorkflow;
use engine::{
    MoneyCents,
    import::{ImportSession, RowEdit},
};

use crate::{
    cli::ImportCommand,
    commands::Context,
    error::{AppError, Result},
    output::Table,
};

pub async fn run(ctx: &Context, command: ImportCommand) -> Result<()> {
    let workflow = ImportWorkflow::new(ctx.api.clone(), ctx.store.clone());
    match command {
        ImportCommand::Start { file, name } => {
            let document = tokio::fs::read(&file).await?;
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "statement.pdf".to_string());
            let session = workflow
                .start(&name, &file_name, document, ctx.today()?, Utc::now())
                .await?;
            println!("Session {} opened with {} row(s)", session.id, session.pending.len());
            print_session(&session);
        }
        ImportCommand::Sessions => {
            let mut table = Table::new(["Id", "Name", "Saved", "Rows", "Confirmed", "Step"]);
            for session in workflow.sessions().list()? {
                table.push(vec![
                    session.id.clone(),
                    session.name.clone(),
                    session.saved_at.format("%Y-%m-%d %H:%M").to_string(),
                    session.pending.len().to_string(),
                    session.confirmed_count().to_string(),
                    format!("{:?}", session.step).to_lowercase(),
                ]);
            }
            if table.is_empty() {
                println!("No saved import sessions.");
            } else {
                table.print();
            }
        }
        ImportCommand::Show { session } => print_session(&workflow.resume(&session)?),
        ImportCommand::Edit {
            session,
            row,
            operation,
            date,
            kind,
            amount,
            category,
        } => {
            let mut edits = Vec::new();
            if let Some(operation) = operation {
                edits.push(RowEdit::Operation(operation));
            }
            if let Some(date) = date {
                edits.push(RowEdit::Date(date));
            }
            if let Some(kind) = kind {
                edits.push(RowEdit::Kind(kind));
            }
            if let Some(amount) = amount {
                edits.push(RowEdit::Amount(amount.parse::<MoneyCents>()?));
            }
            if let Some(category) = category {
                edits.push(RowEdit::Category(ctx.category_id(&category).await?));
            }
            if edits.is_empty() {
                return Err(AppError::Input("nothing to change".to_string()));
            }
            update(&workflow, &session, |s| {
                for edit in edits {
                    s.edit(&row, edit)?;
                }
                Ok(())
            })?;
        }
        ImportCommand::Confirm { session, rows } => update(&workflow, &session, |s| {
            for row in &rows {
                s.toggle_confirmed(row)?;
            }
            Ok(())
        })?,
        ImportCommand::Cancel { session, rows } => update(&workflow, &session, |s| {
            for row in &rows {
                s.toggle_cancelled(row)?;
            }
            Ok(())
        })?,
        ImportCommand::ConfirmAll { session } => update(&workflow, &session, |s| {
            s.confirm_all();
            Ok(())
        })?,
        ImportCommand::CancelAll { session } => update(&workflow, &session, |s| {
            s.cancel_all();
            Ok(())
        })?,
        ImportCommand::Commit { session } => {
            let mut session = workflow.resume(&session)?;
            let report = workflow.commit(&mut session).await?;
            println!("{} transaction(s) imported", report.succeeded);
            if report.session_deleted {
                println!("Session {} completed and removed", report.session_id);
            } else {
                println!("{} row(s) left in session {}", report.remaining, report.session_id);
            }
            report.ensure_complete()?;
        }
        ImportCommand::Drop { session } => {
            if workflow.discard(&session)? {
                println!("Session {session} removed");
            } else {
                println!("No session {session}");
            }
        }
    }
    Ok(())
}

/// Loads a session, applies `change` and saves the snapshot.
fn update<F>(workflow: &ImportWorkflow, id: &str, change: F) -> Result<()>
where
    F: FnOnce(&mut ImportSession) -> engine::ResultEngine<()>,
{
    let mut session = workflow.resume(id)?;
    change(&mut session)?;
    workflow.save_now(&mut session)?;
    print_session(&session);
    Ok(())
}

fn print_session(session: &ImportSession) {
    println!(
        "{} ({} confirmed, {} cancelled)",
        session.name,
        session.confirmed_count(),
        session.cancelled_count()
    );
    let mut table = Table::new(["Row", "Date", "Operation", "Type", "Amount", "Category", "Status"]);
    for row in &session.pending {
        let status = match (row.cancelled, row.confirmed) {
            (true, _) => "cancelled",
            (false, true) => "confirmed",
            (false, false) => "pending",
        };
        let status = if row.modified {
            format!("{status}*")
        } else {
            status.to_string()
        };
        table.push(vec![
            row.id.clone(),
            row.date.clone(),
            row.operation.clone(),
            row.kind.to_string(),
            row.amount.to_string(),
            row.category_id.clone().unwrap_or_default(),
            status,
        ]);
    }
    table.print();
}
