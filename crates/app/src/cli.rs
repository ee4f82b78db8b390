use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use engine::{MoneyCents, TransactionType};

#[derive(Debug, Parser)]
#[command(name = "budgetdesk", version, about = "Personal budget client")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Optional config file path (TOML).
    #[arg(long, global = true)]
    pub config: Option<String>,
    /// Override the API base URL (e.g. http://127.0.0.1:8080/api).
    #[arg(long, global = true)]
    pub base_url: Option<String>,
    /// Override the local state file.
    #[arg(long, global = true)]
    pub state_path: Option<PathBuf>,
    /// Override the timezone (IANA name) used for "today".
    #[arg(long, global = true)]
    pub timezone: Option<String>,
    /// Override the log level (error, warn, info, debug, trace).
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and store the session locally.
    Login {
        #[arg(long)]
        email: String,
        /// Read from the prompt when absent.
        #[arg(long, env = "BUDGETDESK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account.
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        display_name: String,
        #[arg(long, env = "BUDGETDESK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    Logout,
    /// Show the signed-in user.
    Whoami,
    #[command(subcommand)]
    Categories(CategoriesCommand),
    #[command(subcommand)]
    Transactions(TransactionsCommand),
    #[command(subcommand)]
    Savings(SavingsCommand),
    /// Keyword rules applied to imported statements.
    #[command(subcommand)]
    Rules(RulesCommand),
    /// Bank statement import.
    #[command(subcommand)]
    Import(ImportCommand),
    Analytics(AnalyticsArgs),
    #[command(subcommand)]
    Estimations(EstimationsCommand),
}

#[derive(Debug, Subcommand)]
pub enum CategoriesCommand {
    List,
    Add { name: String },
}

/// Fields of the transaction form.
#[derive(Debug, Args)]
pub struct TransactionForm {
    #[arg(long)]
    pub operation: String,
    /// Signed amounts are accepted; the type carries the sign.
    #[arg(long, allow_hyphen_values = true)]
    pub amount: String,
    #[arg(long = "type", default_value = "DEBIT")]
    pub kind: TransactionType,
    /// Category id or name.
    #[arg(long)]
    pub category: String,
    /// YYYY-MM-DD, today when absent.
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum TransactionsCommand {
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },
    Latest,
    Add(TransactionForm),
    Edit {
        id: String,
        #[command(flatten)]
        form: TransactionForm,
    },
    Delete {
        id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum SavingsCommand {
    Show,
    /// Positive amounts add, negative amounts withdraw.
    Move {
        #[arg(allow_hyphen_values = true)]
        amount: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum RulesCommand {
    List {
        #[arg(long)]
        search: Option<String>,
    },
    Add {
        keyword: String,
        #[arg(long = "type", default_value = "DEBIT")]
        kind: TransactionType,
        /// Category id or name.
        #[arg(long)]
        category: String,
    },
    Update {
        id: String,
        #[arg(long)]
        keyword: Option<String>,
        #[arg(long = "type")]
        kind: Option<TransactionType>,
        #[arg(long)]
        category: Option<String>,
    },
    Delete {
        id: String,
    },
    Clear,
}

#[derive(Debug, Subcommand)]
pub enum ImportCommand {
    /// Upload a PDF statement and open a review session.
    Start {
        file: PathBuf,
        #[arg(long)]
        name: String,
    },
    /// List saved review sessions.
    Sessions,
    Show {
        session: String,
    },
    /// Edit one row of a session.
    Edit {
        session: String,
        row: String,
        #[arg(long)]
        operation: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long = "type")]
        kind: Option<TransactionType>,
        #[arg(long, allow_hyphen_values = true)]
        amount: Option<String>,
        /// Category id or name.
        #[arg(long)]
        category: Option<String>,
    },
    /// Toggle the confirmation of rows.
    Confirm {
        session: String,
        #[arg(required = true)]
        rows: Vec<String>,
    },
    /// Toggle the cancellation of rows.
    Cancel {
        session: String,
        #[arg(required = true)]
        rows: Vec<String>,
    },
    ConfirmAll {
        session: String,
    },
    CancelAll {
        session: String,
    },
    /// Send the confirmed rows.
    Commit {
        session: String,
    },
    /// Delete a session without importing it.
    Drop {
        session: String,
    },
}

#[derive(Debug, Args)]
pub struct FilterArgs {
    /// First day included (YYYY-MM-DD).
    #[arg(long, global = true)]
    pub from: Option<String>,
    /// Last day included (YYYY-MM-DD).
    #[arg(long, global = true)]
    pub to: Option<String>,
    #[arg(long = "type", global = true)]
    pub kind: Option<TransactionType>,
    /// Category id or name.
    #[arg(long, global = true)]
    pub category: Option<String>,
    #[arg(long, global = true, allow_hyphen_values = true)]
    pub min: Option<MoneyCents>,
    #[arg(long, global = true, allow_hyphen_values = true)]
    pub max: Option<MoneyCents>,
    /// Text searched in labels and category names.
    #[arg(long, global = true)]
    pub search: Option<String>,
    /// Whole calendar year; replaces --from/--to.
    #[arg(long, global = true, conflicts_with = "month")]
    pub year: Option<i32>,
    /// One month (YYYY-MM); replaces --from/--to.
    #[arg(long, global = true)]
    pub month: Option<String>,
}

#[derive(Debug, Args)]
pub struct AnalyticsArgs {
    #[command(flatten)]
    pub filter: FilterArgs,
    #[command(subcommand)]
    pub view: AnalyticsView,
}

#[derive(Debug, Subcommand)]
pub enum AnalyticsView {
    /// Credit, debit and balance of the filtered list.
    Summary,
    /// Expenses per category.
    Pie {
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Month-over-month table with forecasts.
    Monthly {
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Cumulative balance over time.
    Balance {
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Largest expenses grouped by label.
    Top {
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Year-over-year table.
    Yearly {
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Forecast months only.
    Forecast,
}

#[derive(Debug, Subcommand)]
pub enum EstimationsCommand {
    Show {
        /// Defaults to the current year.
        #[arg(long)]
        year: Option<i32>,
    },
    /// Saved estimations of one category.
    Get {
        /// Category id or name.
        category: String,
    },
    Set {
        /// Category id or name.
        category: String,
        #[arg(long, allow_hyphen_values = true)]
        expense: Option<MoneyCents>,
        #[arg(long, allow_hyphen_values = true)]
        income: Option<MoneyCents>,
        #[arg(long)]
        year: Option<i32>,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn analytics_filters_follow_the_view() {
        let cli = Cli::try_parse_from([
            "budgetdesk",
            "analytics",
            "monthly",
            "--year",
            "2024",
            "--type",
            "debit",
            "--min",
            "12,50",
        ])
        .unwrap();
        let Command::Analytics(args) = cli.command else {
            panic!("expected analytics");
        };
        assert_eq!(args.filter.year, Some(2024));
        assert_eq!(args.filter.kind, Some(TransactionType::Debit));
        assert_eq!(args.filter.min, Some(MoneyCents::new(1250)));
        assert!(matches!(args.view, AnalyticsView::Monthly { csv: None }));
    }

    #[test]
    fn savings_move_accepts_negative_amounts() {
        let cli = Cli::try_parse_from(["budgetdesk", "savings", "move", "-20"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Savings(SavingsCommand::Move { ref amount }) if amount == "-20"
        ));
    }
}
