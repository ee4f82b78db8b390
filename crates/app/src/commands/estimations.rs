use chrono::Datelike;
use client::estimations::EstimationEditor;
use engine::{MoneyCents, TransactionType, estimations::EstimationLine};

use crate::{
    cli::EstimationsCommand,
    commands::Context,
    error::{AppError, Result},
    output::Table,
};

pub async fn run(ctx: &Context, command: EstimationsCommand) -> Result<()> {
    let current_year = ctx.today()?.year();
    match command {
        EstimationsCommand::Show { year } => {
            let editor = EstimationEditor::load(ctx.api.clone(), year.unwrap_or(current_year)).await?;
            let board = editor.board()?;
            println!("Estimations {}", board.year);
            print_lines("Expenses", &board.expense);
            print_lines("Income", &board.income);
            let totals = board.totals();
            println!(
                "\nExpected income {}  expected expenses {}  balance {}",
                totals.income, totals.expense, totals.balance
            );
        }
        EstimationsCommand::Get { category } => {
            let category_id = ctx.category_id(&category).await?;
            let saved = ctx.api.category_estimations(&category_id).await?;
            println!(
                "Expense {}  income {}",
                MoneyCents::from_major(saved.estimation_depenses),
                MoneyCents::from_major(saved.estimation_revenus)
            );
        }
        EstimationsCommand::Set {
            category,
            expense,
            income,
            year,
        } => {
            if expense.is_none() && income.is_none() {
                return Err(AppError::Input(
                    "give --expense and/or --income".to_string(),
                ));
            }
            let category_id = ctx.category_id(&category).await?;
            let editor = EstimationEditor::load(ctx.api.clone(), year.unwrap_or(current_year)).await?;
            if let Some(expense) = expense {
                editor.set(&category_id, TransactionType::Debit, expense)?;
            }
            if let Some(income) = income {
                editor.set(&category_id, TransactionType::Credit, income)?;
            }
            if editor.save_now(&category_id).await? {
                println!("Estimations saved");
            } else {
                println!("Nothing changed");
            }
        }
    }
    Ok(())
}

fn print_lines(title: &str, lines: &[EstimationLine]) {
    println!("\n{title}");
    let mut table = Table::new(["Category", "Last year", "Estimation"]);
    for line in lines {
        table.push(vec![
            line.name.clone(),
            line.last_year.to_string(),
            line.value.to_string(),
        ]);
    }
    table.print();
}
