//! Trailing-window aggregation.

use chrono::{DateTime, Duration, Utc};

use crate::model::{MessagePrediction, WindowMetrics};

/// `risk_score` at or above this marks a message high-risk.
const HIGH_RISK_SCORE: f64 = 0.7;
/// `p_relapse` / `p_craving` at or above this marks a message high-risk.
const HIGH_RISK_AXIS: f64 = 0.5;
/// `p_toxic` at or above this counts as a toxic incident.
const TOXIC_INCIDENT: f64 = 0.7;

/// High-risk along any axis, not only the fused score.
pub fn is_high_risk(message: &MessagePrediction) -> bool {
    let p = &message.predictions;
    p.risk_score >= HIGH_RISK_SCORE || p.p_relapse >= HIGH_RISK_AXIS || p.p_craving >= HIGH_RISK_AXIS
}

/// Summarize the messages with `timestamp >= now - window_days`.
///
/// An empty window yields the zero record.
pub fn window_metrics(
    messages: &[MessagePrediction],
    window_days: i64,
    now: DateTime<Utc>,
) -> WindowMetrics {
    let cutoff = now - Duration::days(window_days);
    let windowed: Vec<&MessagePrediction> =
        messages.iter().filter(|m| m.timestamp >= cutoff).collect();

    if windowed.is_empty() {
        return WindowMetrics::default();
    }

    let count = windowed.len() as f64;
    let risk_sum: f64 = windowed.iter().map(|m| m.predictions.risk_score).sum();
    let isolation_sum: f64 = windowed.iter().map(|m| m.predictions.p_isolation).sum();
    let max_risk = windowed
        .iter()
        .map(|m| m.predictions.risk_score)
        .fold(0.0_f64, f64::max);

    WindowMetrics {
        avg_risk_score: risk_sum / count,
        max_risk_score: max_risk,
        avg_isolation: isolation_sum / count,
        high_risk_count: windowed.iter().filter(|m| is_high_risk(m)).count() as u32,
        toxic_incidents: windowed
            .iter()
            .filter(|m| m.predictions.p_toxic >= TOXIC_INCIDENT)
            .count() as u32,
        message_count: windowed.len() as u32,
    }
}
