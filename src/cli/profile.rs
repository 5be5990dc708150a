//! Show profiles.

use chrono::{DateTime, Utc};

use super::{profile_line, App};
use crate::error::Error;

/// Recompute one user and print the profile as JSON.
pub async fn show(app: &App, user_id: &str, last_login: Option<DateTime<Utc>>) -> Result<(), Error> {
    let profile = app
        .engine
        .compute_profile(user_id, &app.fusion.thresholds, last_login)?;
    println!("{}", serde_json::to_string_pretty(&profile)?);
    Ok(())
}

/// Print every stored profile, highest priority first.
pub async fn list(app: &App) -> Result<(), Error> {
    let profiles = app.engine.list_all_profiles()?;
    if profiles.is_empty() {
        println!("No profiles yet. Run 'riskagg recompute' after ingesting messages.");
        return Ok(());
    }

    for profile in &profiles {
        println!("{}", profile_line(profile));
    }
    println!("{} profile(s).", profiles.len());
    Ok(())
}
