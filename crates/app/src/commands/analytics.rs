use engine::{
    MoneyCents,
    analytics::{Analytics, MonthlyRow, TOP_OPERATIONS, YearlyRow},
};

use crate::{
    cli::{AnalyticsArgs, AnalyticsView},
    commands::{Context, build_filter},
    error::Result,
    output::{Table, percent},
};

pub async fn run(ctx: &Context, args: AnalyticsArgs) -> Result<()> {
    let categories = ctx.api.categories().await?;
    let transactions = ctx.api.transactions().await?;
    let filter = build_filter(&args.filter, &categories)?;
    let today = ctx.today()?;
    let view = Analytics::new(&transactions, &categories, &filter);

    match args.view {
        AnalyticsView::Summary => {
            let totals = view.totals();
            println!("Transactions: {}", view.filtered().len());
            println!("Credit:       {}", totals.credit);
            println!("Debit:        {}", totals.debit);
            println!("Balance:      {}", totals.balance);
            let years: Vec<String> = view.available_years().iter().map(i32::to_string).collect();
            if !years.is_empty() {
                println!("Years:        {}", years.join(", "));
            }
            let mut table = Table::new(["Month", "Credit", "Debit"]);
            for month in view.monthly_totals() {
                table.push(vec![
                    month.month.to_string(),
                    month.credit.to_string(),
                    month.debit.to_string(),
                ]);
            }
            if !table.is_empty() {
                println!();
                table.print();
            }
        }
        AnalyticsView::Pie { csv } => {
            let split = view.category_split();
            let total: MoneyCents = split.iter().map(|s| s.total).sum();
            let mut table = Table::new(["Category", "Total", "Share"]);
            for share in split {
                let ratio = if total.is_zero() {
                    0.0
                } else {
                    share.total.cents() as f64 * 100.0 / total.cents() as f64
                };
                table.push(vec![
                    share.category,
                    share.total.to_string(),
                    format!("{ratio:.1}%"),
                ]);
            }
            table.emit(csv.as_deref())?;
        }
        AnalyticsView::Monthly { csv } => {
            let monthly = view.monthly_table(filter.selected_year(today), today);
            let mut headers = vec!["Category".to_string(), "Type".to_string()];
            headers.extend(monthly.columns.iter().map(|month| {
                if monthly.forecast_months.contains(month) {
                    format!("{month}*")
                } else {
                    month.to_string()
                }
            }));
            headers.push("Total".to_string());
            let mut table = Table::new(headers);
            for row in monthly.debit_rows.iter().chain(&monthly.credit_rows) {
                table.push(monthly_row(row));
            }
            table.emit(csv.as_deref())?;
            if csv.is_none() && !monthly.forecast_months.is_empty() {
                println!("* forecast");
            }
        }
        AnalyticsView::Balance { csv } => {
            let mut table = Table::new(["Date", "Balance"]);
            for point in view.cumulative_balance() {
                table.push(vec![point.date.to_string(), point.balance.to_string()]);
            }
            table.emit(csv.as_deref())?;
        }
        AnalyticsView::Top { csv } => {
            let mut table = Table::new(["Operation", "Total"]);
            for op in view.top_operations(TOP_OPERATIONS) {
                table.push(vec![op.label, op.total.to_string()]);
            }
            table.emit(csv.as_deref())?;
        }
        AnalyticsView::Yearly { csv } => {
            let yearly = view.yearly_table();
            let mut headers = vec!["Category".to_string(), "Type".to_string()];
            headers.extend(yearly.years.iter().map(i32::to_string));
            headers.push("Total".to_string());
            let mut table = Table::new(headers);
            for row in yearly.debit_rows.iter().chain(&yearly.credit_rows) {
                table.push(yearly_row(row));
            }
            table.emit(csv.as_deref())?;
        }
        AnalyticsView::Forecast => {
            let monthly = view.monthly_table(filter.selected_year(today), today);
            if monthly.forecast_months.is_empty() {
                println!("No forecast for {}.", monthly.selected_year);
                return Ok(());
            }
            let mut headers = vec!["Category".to_string(), "Type".to_string()];
            headers.extend(monthly.forecast_months.iter().map(ToString::to_string));
            let mut table = Table::new(headers);
            for row in monthly.debit_rows.iter().chain(&monthly.credit_rows) {
                let mut cells = vec![row.category.clone(), row.kind.to_string()];
                cells.extend(
                    row.cells
                        .iter()
                        .filter(|cell| cell.predicted)
                        .map(|cell| cell.amount.to_string()),
                );
                table.push(cells);
            }
            table.print();
        }
    }
    Ok(())
}

fn monthly_row(row: &MonthlyRow) -> Vec<String> {
    let mut cells = vec![row.category.clone(), row.kind.to_string()];
    cells.extend(row.cells.iter().map(|cell| {
        if cell.amount.is_zero() && cell.variation == 0.0 {
            cell.amount.to_string()
        } else {
            format!("{} ({})", cell.amount, percent(cell.variation))
        }
    }));
    cells.push(row.total.to_string());
    cells
}

fn yearly_row(row: &YearlyRow) -> Vec<String> {
    let mut cells = vec![row.category.clone(), row.kind.to_string()];
    cells.extend(
        row.cells
            .iter()
            .map(|cell| format!("{} ({})", cell.amount, percent(cell.variation))),
    );
    cells.push(row.total.to_string());
    cells
}
