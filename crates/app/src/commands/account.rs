use crate::{
    commands::{Context, password_or_prompt},
    error::Result,
};

pub async fn login(ctx: &Context, email: &str, password: Option<String>) -> Result<()> {
    let password = password_or_prompt(password)?;
    let profile = ctx.session.login(email, &password).await?;
    println!(
        "Signed in as {} (id {})",
        profile.display_name.as_deref().or(profile.email.as_deref()).unwrap_or(email),
        profile.id
    );
    Ok(())
}

pub async fn register(
    ctx: &Context,
    email: &str,
    display_name: &str,
    password: Option<String>,
) -> Result<()> {
    let password = password_or_prompt(password)?;
    ctx.session.register(email, &password, display_name).await?;
    println!("Account created. Run `budgetdesk login --email {email}` to sign in.");
    Ok(())
}

pub fn logout(ctx: &Context) -> Result<()> {
    ctx.session.logout()?;
    println!("Signed out.");
    Ok(())
}

/// Validates the stored session (refreshing it if needed) and prints it.
pub async fn whoami(ctx: &Context) -> Result<()> {
    let profile = ctx.session.restore().await?;
    println!("id:      {}", profile.id);
    if let Some(email) = &profile.email {
        println!("email:   {email}");
    }
    if let Some(name) = &profile.display_name {
        println!("name:    {name}");
    }
    if profile.is_admin {
        println!("role:    admin");
    }
    Ok(())
}
