mod account;
mod analytics;
mod categories;
mod estimations;
mod import;
mod rules;
mod savings;
mod transactions;

use std::sync::Arc;

use chrono::NaiveDate;
use client::{ApiClient, ClientError, Route, Session};
use engine::{
    Category, analytics::TransactionFilter, categories::resolve, parse_date, store::KeyValueStore,
};

use crate::{
    cli::{Command, FilterArgs},
    config::AppConfig,
    error::{AppError, Result},
};

pub struct Context {
    pub config: AppConfig,
    pub store: Arc<dyn KeyValueStore>,
    pub api: ApiClient,
    pub session: Session,
}

impl Context {
    pub fn new(config: AppConfig, store: Arc<dyn KeyValueStore>) -> Self {
        let api = ApiClient::new(&config.base_url, store.clone());
        Self {
            config,
            store,
            session: Session::new(api.clone()),
            api,
        }
    }

    pub fn today(&self) -> Result<NaiveDate> {
        self.config.today()
    }

    /// Id of the signed-in user.
    pub fn user_id(&self) -> Result<String> {
        self.session
            .profile()?
            .map(|profile| profile.id)
            .ok_or(AppError::Client(ClientError::Unauthenticated))
    }

    /// Looks a category up by id or name on the server list.
    pub async fn category_id(&self, id_or_name: &str) -> Result<String> {
        let categories = self.api.categories().await?;
        Ok(resolve(&categories, id_or_name)?.id.clone())
    }
}

/// Screen a command belongs to, used for the login redirect.
pub fn route_of(command: &Command) -> Route {
    match command {
        Command::Login { .. } | Command::Logout => Route::Login,
        Command::Register { .. } => Route::Register,
        Command::Whoami => Route::Dashboard,
        Command::Categories(_) => Route::Categories,
        Command::Transactions(_) => Route::Transactions,
        Command::Savings(_) => Route::Savings,
        Command::Rules(_) => Route::Rules,
        Command::Import(_) => Route::Import,
        Command::Analytics(_) => Route::Analytics,
        Command::Estimations(_) => Route::Estimations,
    }
}

pub async fn dispatch(ctx: &Context, command: Command) -> Result<()> {
    match command {
        Command::Login { email, password } => account::login(ctx, &email, password).await,
        Command::Register {
            email,
            display_name,
            password,
        } => account::register(ctx, &email, &display_name, password).await,
        Command::Logout => account::logout(ctx),
        Command::Whoami => account::whoami(ctx).await,
        Command::Categories(command) => categories::run(ctx, command).await,
        Command::Transactions(command) => transactions::run(ctx, command).await,
        Command::Savings(command) => savings::run(ctx, command).await,
        Command::Rules(command) => rules::run(ctx, command).await,
        Command::Import(command) => import::run(ctx, command).await,
        Command::Analytics(args) => analytics::run(ctx, args).await,
        Command::Estimations(command) => estimations::run(ctx, command).await,
    }
}

/// Builds the engine filter from command-line flags. Category names are
/// resolved against `categories`.
pub fn build_filter(args: &FilterArgs, categories: &[Category]) -> Result<TransactionFilter> {
    let mut filter = TransactionFilter {
        date_from: args.from.as_deref().map(parse_date).transpose()?,
        date_to: args.to.as_deref().map(parse_date).transpose()?,
        kind: args.kind,
        category_id: args
            .category
            .as_deref()
            .map(|c| resolve(categories, c).map(|c| c.id.clone()))
            .transpose()?,
        min_amount: args.min,
        max_amount: args.max,
        search: args.search.clone().filter(|s| !s.trim().is_empty()),
    };
    if let Some(year) = args.year {
        filter = filter.year(year);
    }
    if let Some(month) = &args.month {
        let (year, month) = parse_month(month)?;
        filter = filter.month(year, month);
    }
    Ok(filter)
}

fn parse_month(raw: &str) -> Result<(i32, u32)> {
    let invalid = || AppError::Input(format!("invalid month \"{raw}\", expected YYYY-MM"));
    let (year, month) = raw.trim().split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok((year, month))
}

/// Reads a secret from the terminal, without echo, when it was not given.
pub fn password_or_prompt(password: Option<String>) -> Result<String> {
    match password {
        Some(password) => Ok(password),
        None => Ok(rpassword::prompt_password("Password: ")?),
    }
}

#[cfg(test)]
mod tests {
    use engine::{MoneyCents, TransactionType};

    use super::*;

    fn categories() -> Vec<Category> {
        vec![Category {
            id: "7".to_string(),
            name: "Groceries".to_string(),
            estimated_expense: MoneyCents::ZERO,
            estimated_income: MoneyCents::ZERO,
        }]
    }

    fn args() -> FilterArgs {
        FilterArgs {
            from: None,
            to: None,
            kind: None,
            category: None,
            min: None,
            max: None,
            search: None,
            year: None,
            month: None,
        }
    }

    #[test]
    fn month_flag_covers_the_whole_month() {
        let filter = build_filter(
            &FilterArgs {
                month: Some("2024-02".to_string()),
                category: Some("groceries".to_string()),
                kind: Some(TransactionType::Debit),
                ..args()
            },
            &categories(),
        )
        .unwrap();
        assert_eq!(filter.date_from, NaiveDate::from_ymd_opt(2024, 2, 1));
        assert_eq!(filter.date_to, NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(filter.category_id.as_deref(), Some("7"));
    }

    #[test]
    fn bad_flags_are_reported() {
        let bad_month = FilterArgs {
            month: Some("2024-13".to_string()),
            ..args()
        };
        assert!(matches!(
            build_filter(&bad_month, &categories()),
            Err(AppError::Input(_))
        ));

        let bad_date = FilterArgs {
            from: Some("01/02/2024".to_string()),
            ..args()
        };
        assert!(build_filter(&bad_date, &categories()).is_err());

        let unknown = FilterArgs {
            category: Some("Travel".to_string()),
            ..args()
        };
        assert!(matches!(
            build_filter(&unknown, &categories()),
            Err(AppError::Engine(engine::EngineError::KeyNotFound(_)))
        ));
    }

    #[test]
    fn given_password_skips_the_prompt() {
        assert_eq!(
            password_or_prompt(Some("s3cret".to_string())).unwrap(),
            "s3cret"
        );
    }
}
