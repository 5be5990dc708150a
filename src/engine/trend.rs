//! Directional change between the last week and the week before.
//!
//! Ages are whole elapsed days, so a message 7 days and 20 hours old still
//! belongs to the recent week.

use chrono::{DateTime, Utc};

use crate::model::{MessagePrediction, PredictionVector, Trend};

/// Below this many messages the trend is always `stable`.
const MIN_MESSAGES: usize = 5;
const RECENT_DAYS: i64 = 7;
const PREVIOUS_DAYS: i64 = 14;
const SPIKE_DAYS: i64 = 2;
const SPIKE_VALUE: f64 = 0.8;
/// Dead band around zero delta; keeps small fluctuations from flipping the trend.
const DELTA_BAND: f64 = 0.15;

/// Per-message value a trend is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendMetric {
    RiskScore,
    Isolation,
}

impl TrendMetric {
    pub fn value(&self, p: &PredictionVector) -> f64 {
        match self {
            TrendMetric::RiskScore => p.risk_score,
            TrendMetric::Isolation => p.p_isolation,
        }
    }
}

fn age_days(message: &MessagePrediction, now: DateTime<Utc>) -> i64 {
    (now - message.timestamp).num_days()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Classify the trend of `metric` over `messages`.
pub fn detect_trend(messages: &[MessagePrediction], metric: TrendMetric, now: DateTime<Utc>) -> Trend {
    if messages.len() < MIN_MESSAGES {
        return Trend::Stable;
    }

    let mut recent = Vec::new();
    let mut previous = Vec::new();
    let mut spike = false;
    for message in messages {
        let age = age_days(message, now);
        let value = metric.value(&message.predictions);
        if age <= RECENT_DAYS {
            recent.push(value);
        } else if age <= PREVIOUS_DAYS {
            previous.push(value);
        }
        if age <= SPIKE_DAYS && value >= SPIKE_VALUE {
            spike = true;
        }
    }

    if recent.is_empty() || previous.is_empty() {
        return Trend::Stable;
    }

    // A recent spike outranks the slower week-over-week signal.
    if spike {
        return Trend::RapidDecline;
    }

    let delta = mean(&recent) - mean(&previous);
    if delta < -DELTA_BAND {
        Trend::Improving
    } else if delta > DELTA_BAND {
        Trend::Declining
    } else {
        Trend::Stable
    }
}
