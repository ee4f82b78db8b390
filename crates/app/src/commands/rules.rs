use engine::rules::{NewRule, RuleBook, RulePatch};

use crate::{cli::RulesCommand, commands::Context, error::Result, output::Table};

pub async fn run(ctx: &Context, command: RulesCommand) -> Result<()> {
    let book = RuleBook::new(ctx.store.clone());
    match command {
        RulesCommand::List { search } => {
            let rules = match search {
                Some(query) => book.search(&query)?,
                None => book.list()?,
            };
            let mut table = Table::new(["#", "Keyword", "Type", "Category", "Id"]);
            for (position, rule) in rules.into_iter().enumerate() {
                table.push(vec![
                    (position + 1).to_string(),
                    rule.keyword,
                    rule.kind.to_string(),
                    rule.category,
                    rule.id,
                ]);
            }
            if table.is_empty() {
                println!("No keyword rules.");
            } else {
                table.print();
            }
        }
        RulesCommand::Add {
            keyword,
            kind,
            category,
        } => {
            let category = ctx.category_id(&category).await?;
            let rule = book.add(NewRule {
                keyword,
                kind,
                category,
            })?;
            println!("Added rule \"{}\" (id {})", rule.keyword, rule.id);
        }
        RulesCommand::Update {
            id,
            keyword,
            kind,
            category,
        } => {
            let category = match category {
                Some(category) => Some(ctx.category_id(&category).await?),
                None => None,
            };
            let rule = book.update(
                &id,
                RulePatch {
                    keyword,
                    kind,
                    category,
                },
            )?;
            println!("Updated rule \"{}\"", rule.keyword);
        }
        RulesCommand::Delete { id } => {
            book.delete(&id)?;
            println!("Deleted rule {id}");
        }
        RulesCommand::Clear => {
            book.clear()?;
            println!("All keyword rules removed.");
        }
    }
    Ok(())
}
