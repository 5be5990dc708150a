//! Record a downstream action taken for a user.

use serde_json::Value;

use super::App;
use crate::error::Error;
use crate::model::{InterventionOutcome, RiskLabel};

/// Parse `--context`; it must be a JSON object.
fn parse_context(raw: Option<&str>) -> Result<Value, Error> {
    let Some(raw) = raw else {
        return Ok(Value::Object(Default::default()));
    };
    let value: Value = serde_json::from_str(raw)?;
    if !value.is_object() {
        return Err(Error::unknown("intervention context", raw));
    }
    Ok(value)
}

/// Log an intervention, stamped with the user's current stored label.
pub fn log(
    app: &App,
    user_id: &str,
    intervention_type: &str,
    context: Option<&str>,
    outcome: Option<&str>,
) -> Result<(i64, RiskLabel), Error> {
    let context = parse_context(context)?;
    let outcome = outcome
        .map(str::parse::<InterventionOutcome>)
        .transpose()?
        .unwrap_or_default();
    let label = app
        .engine
        .get_profile(user_id)?
        .map(|p| p.current_risk_label)
        .unwrap_or(RiskLabel::LowRisk);

    let id = app
        .engine
        .log_intervention(user_id, intervention_type, label, &context, outcome)?;
    Ok((id, label))
}

/// Run the intervene command.
pub async fn run(
    app: &App,
    user_id: &str,
    intervention_type: &str,
    context: Option<&str>,
    outcome: Option<&str>,
) -> Result<(), Error> {
    let (id, label) = log(app, user_id, intervention_type, context, outcome)?;
    println!(
        "Logged intervention #{} ({}) for {} at {}",
        id, intervention_type, user_id, label
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::test_support::app;
    use tempfile::TempDir;

    #[test]
    fn test_label_defaults_to_low_risk_without_profile() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);
        let (_, label) = log(&app, "u1", "buddy_nudge", None, None).unwrap();
        assert_eq!(label, RiskLabel::LowRisk);

        let history = app.engine.intervention_history("u1", 1).unwrap();
        assert_eq!(history[0].outcome, InterventionOutcome::Pending);
        assert!(history[0].context.as_object().unwrap().is_empty());
    }

    #[test]
    fn test_rejects_bad_context_and_outcome() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);
        assert!(log(&app, "u1", "buddy_nudge", Some("[1, 2]"), None).is_err());
        assert!(log(&app, "u1", "buddy_nudge", None, Some("maybe")).is_err());
        assert!(app.engine.intervention_history("u1", 1).unwrap().is_empty());

        let (_, _) = log(
            &app,
            "u1",
            "counselor_alert",
            Some(r#"{"auto_generated": true}"#),
            Some("escalated"),
        )
        .unwrap();
        let history = app.engine.intervention_history("u1", 1).unwrap();
        assert_eq!(history[0].outcome, InterventionOutcome::Escalated);
    }
}
