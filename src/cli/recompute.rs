//! Recompute every user's profile.
//!
//! Users are independent, so recomputations run on the blocking pool,
//! each with its own pooled connection and transaction. A failure for one
//! user is reported and the rest carry on.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use super::App;
use crate::error::Error;
use crate::model::RiskLabel;

/// Outcome of one bulk recomputation.
#[derive(Debug, Default)]
pub struct RecomputeSummary {
    pub updated: Vec<(String, RiskLabel)>,
    pub failed: Vec<(String, String)>,
}

/// Recompute all users with stored messages, at most `recompute_concurrency` at a time.
pub async fn recompute_all(app: &App) -> Result<RecomputeSummary, Error> {
    let users = app.engine.list_user_ids()?;
    let limit = Arc::new(Semaphore::new(app.config.daemon.recompute_concurrency.max(1)));
    let mut tasks = JoinSet::new();

    info!(users = users.len(), "Recomputing profiles");
    for user_id in users {
        let permit = limit
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| Error::other(e.to_string()))?;
        let engine = app.engine.clone();
        let thresholds = app.fusion.thresholds;
        tasks.spawn_blocking(move || {
            let _permit = permit;
            let result = engine.compute_profile(&user_id, &thresholds, None);
            (user_id, result)
        });
    }

    let mut summary = RecomputeSummary::default();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((user_id, Ok(profile))) => {
                summary.updated.push((user_id, profile.current_risk_label));
            }
            Ok((user_id, Err(e))) => {
                warn!(user_id = %user_id, error = %e, "Profile recompute failed");
                summary.failed.push((user_id, e.to_string()));
            }
            Err(e) => {
                warn!(error = %e, "Recompute task aborted");
                summary.failed.push(("<unknown>".to_string(), e.to_string()));
            }
        }
    }
    summary.updated.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(summary)
}

/// Run the recompute command.
pub async fn run(app: &App) -> Result<(), Error> {
    let summary = recompute_all(app).await?;

    for (user_id, label) in &summary.updated {
        println!("  {} - {}", user_id, label);
    }
    for (user_id, error) in &summary.failed {
        eprintln!("  {} - error: {}", user_id, error);
    }
    println!(
        "Recompute complete. {} updated, {} failed.",
        summary.updated.len(),
        summary.failed.len()
    );
    Ok(())
}
