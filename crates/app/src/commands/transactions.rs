use engine::{Transaction, TransactionDraft, analytics::Analytics};

use crate::{
    cli::{TransactionForm, TransactionsCommand},
    commands::{Context, build_filter},
    error::Result,
    output::Table,
};

pub async fn run(ctx: &Context, command: TransactionsCommand) -> Result<()> {
    match command {
        TransactionsCommand::List { filter } => {
            let categories = ctx.api.categories().await?;
            let mut transactions = ctx.api.transactions().await?;
            transactions.sort_by(|a, b| b.date.cmp(&a.date));
            let filter = build_filter(&filter, &categories)?;
            let view = Analytics::new(&transactions, &categories, &filter);
            print_transactions(view.filtered().iter().copied());
            let totals = view.totals();
            println!(
                "\n{} transaction(s)  credit {}  debit {}  balance {}",
                view.filtered().len(),
                totals.credit,
                totals.debit,
                totals.balance
            );
        }
        TransactionsCommand::Latest => {
            let transactions = ctx.api.latest_transactions().await?;
            print_transactions(transactions.iter());
        }
        TransactionsCommand::Add(form) => {
            let draft = draft(ctx, &form).await?;
            ctx.api.create_transaction(&draft).await?;
            println!("Added {} {} on {}", draft.kind, draft.amount, draft.date);
        }
        TransactionsCommand::Edit { id, form } => {
            let draft = draft(ctx, &form).await?;
            ctx.api.update_transaction(&id, &draft).await?;
            println!("Updated transaction {id}");
        }
        TransactionsCommand::Delete { id } => {
            ctx.api.delete_transaction(&id).await?;
            println!("Deleted transaction {id}");
        }
    }
    Ok(())
}

async fn draft(ctx: &Context, form: &TransactionForm) -> Result<TransactionDraft> {
    let category_id = ctx.category_id(&form.category).await?;
    Ok(TransactionDraft::from_form(
        &form.operation,
        form.date.as_deref(),
        form.kind,
        &form.amount,
        Some(&category_id),
        ctx.today()?,
    )?)
}

fn print_transactions<'a>(transactions: impl Iterator<Item = &'a Transaction>) {
    let mut table = Table::new(["Date", "Operation", "Type", "Amount", "Category", "Id"]);
    for tx in transactions {
        table.push(vec![
            tx.date.to_string(),
            tx.operation.clone(),
            tx.kind.to_string(),
            tx.signed_amount().to_string(),
            tx.category_name().unwrap_or_default().to_string(),
            tx.id.clone(),
        ]);
    }
    if table.is_empty() {
        println!("No transactions.");
    } else {
        table.print();
    }
}
