use crate::{
    cli::CategoriesCommand,
    commands::Context,
    error::Result,
    output::Table,
};

pub async fn run(ctx: &Context, command: CategoriesCommand) -> Result<()> {
    match command {
        CategoriesCommand::List => {
            let mut categories = ctx.api.categories().await?;
            categories.sort_by_key(|c| c.name.to_lowercase());
            let mut table = Table::new(["Id", "Name"]);
            for category in categories {
                table.push(vec![category.id, category.name]);
            }
            table.print();
        }
        CategoriesCommand::Add { name } => {
            let category = ctx.api.create_category(&name).await?;
            println!("Created category {} (id {})", category.name, category.id);
        }
    }
    Ok(())
}
