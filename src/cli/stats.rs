//! System-wide risk distribution.

use super::App;
use crate::error::Error;
use crate::model::LabelDistribution;

fn render(dist: &LabelDistribution) -> String {
    format!(
        "Users: {}\n  HIGH_RISK       {}\n  MODERATE_RISK   {}\n  ISOLATION_ONLY  {}\n  LOW_RISK        {}",
        dist.total_users, dist.high_risk, dist.moderate_risk, dist.isolation_only, dist.low_risk
    )
}

/// Run the stats command.
pub async fn run(app: &App, json: bool) -> Result<(), Error> {
    let dist = app.engine.label_distribution()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&dist)?);
    } else {
        println!("{}", render(&dist));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RiskLabel;

    #[test]
    fn test_render_lists_every_label() {
        let mut dist = LabelDistribution::default();
        dist.add(RiskLabel::HighRisk, 2);
        dist.add(RiskLabel::LowRisk, 5);

        let text = render(&dist);
        assert!(text.starts_with("Users: 7"));
        assert!(text.contains("HIGH_RISK       2"));
        assert!(text.contains("ISOLATION_ONLY  0"));
    }
}
