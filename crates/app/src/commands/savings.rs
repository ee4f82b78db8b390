use engine::savings::SavingsMovement;

use crate::{cli::SavingsCommand, commands::Context, error::Result};

pub async fn run(ctx: &Context, command: SavingsCommand) -> Result<()> {
    let user_id = ctx.user_id()?;
    match command {
        SavingsCommand::Show => {
            let balance = ctx.api.savings_balance(&user_id).await?;
            println!("Savings: {balance}");
        }
        SavingsCommand::Move { amount } => {
            let movement = SavingsMovement::parse(&amount)?;
            let balance = ctx.api.move_savings(&user_id, movement).await?;
            match movement {
                SavingsMovement::Add(amount) => println!("Added {amount}. Savings: {balance}"),
                SavingsMovement::Remove(amount) => {
                    println!("Withdrew {amount}. Savings: {balance}")
                }
            }
        }
    }
    Ok(())
}
