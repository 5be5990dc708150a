//! Intervention history for one user.

use super::App;
use crate::error::Error;

const DEFAULT_DAYS: i64 = 30;

/// Run the history command.
pub async fn run(app: &App, user_id: &str, days: Option<i64>) -> Result<(), Error> {
    let days = days.unwrap_or(DEFAULT_DAYS);
    let history = app.engine.intervention_history(user_id, days)?;

    if history.is_empty() {
        println!("No interventions for {} in the last {} days.", user_id, days);
        return Ok(());
    }

    for item in &history {
        println!(
            "  #{} {} {:<18} {:<15} {:<9} {}",
            item.id,
            item.timestamp.format("%Y-%m-%d %H:%M"),
            item.intervention_type,
            item.risk_label_at_time.as_str(),
            item.outcome.as_str(),
            item.context
        );
    }
    Ok(())
}
