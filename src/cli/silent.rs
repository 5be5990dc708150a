//! List users who stopped talking to their buddies.

use super::App;
use crate::error::Error;

/// Run the silent command. `days` defaults to `windows.silent_user_days`.
pub async fn run(app: &App, days: Option<i64>) -> Result<(), Error> {
    let days = days.unwrap_or(app.config.windows.silent_user_days);
    let users = app.engine.list_silent_users(days)?;

    if users.is_empty() {
        println!("No users silent for {}+ days.", days);
        return Ok(());
    }

    println!("Silent for {}+ days (most silent first):", days);
    for user_id in &users {
        println!("  {}", user_id);
    }
    Ok(())
}
