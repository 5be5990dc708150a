//! Rule-based fusion of risk signals into one label.
//!
//! Message-level and user-level decisions are ordered rule tables run by
//! the same evaluator. Rules are checked top to bottom and the first match
//! wins; only that rule's reason is reported. Every table ends in an
//! unconditional LOW_RISK rule, so evaluation is total.

use serde::{Deserialize, Serialize};

use crate::config::Thresholds;
use crate::model::{PredictionVector, RiskLabel, Trend, WindowMetrics};

/// Short-window high-risk message count that escalates a user.
const HIGH_RISK_MESSAGE_COUNT: u32 = 3;
/// Buddy silence (days) that counts as withdrawal.
const WITHDRAWAL_DAYS: i64 = 5;
/// Average risk above which withdrawal escalates to MODERATE_RISK.
const WITHDRAWAL_MIN_AVG_RISK: f64 = 0.2;
/// Average risk below which high isolation alone is reported.
const ISOLATION_ONLY_MAX_AVG_RISK: f64 = 0.3;

/// Label plus the justification of the rule that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub label: RiskLabel,
    pub reasons: Vec<String>,
}

/// One row of a rule table.
pub struct Rule<I> {
    pub label: RiskLabel,
    pub applies: fn(&I, &Thresholds) -> bool,
    pub reason: fn(&I, &Thresholds) -> String,
}

/// Run `rules` in order and return the first match.
pub fn evaluate<I>(rules: &[Rule<I>], input: &I, thresholds: &Thresholds) -> Decision {
    rules
        .iter()
        .find(|rule| (rule.applies)(input, thresholds))
        .map(|rule| Decision {
            label: rule.label,
            reasons: vec![(rule.reason)(input, thresholds)],
        })
        .unwrap_or_else(|| Decision {
            label: RiskLabel::LowRisk,
            reasons: vec!["No significant risk indicators".to_string()],
        })
}

// ========== Message level ==========

fn high_signal_reason(p: &PredictionVector, t: &Thresholds) -> String {
    if p.p_relapse >= t.relapse {
        format!("Relapse probability {:.3} at or above {:.3}", p.p_relapse, t.relapse)
    } else if p.p_craving >= t.craving {
        format!("Craving probability {:.3} at or above {:.3}", p.p_craving, t.craving)
    } else {
        format!("Risk score {:.3} at or above {:.3}", p.risk_score, t.high)
    }
}

pub const MESSAGE_RULES: &[Rule<PredictionVector>] = &[
    Rule {
        label: RiskLabel::HighRisk,
        applies: |p, t| p.p_relapse >= t.relapse || p.p_craving >= t.craving || p.risk_score >= t.high,
        reason: high_signal_reason,
    },
    Rule {
        label: RiskLabel::HighRisk,
        applies: |p, t| p.risk_score >= t.iso_escalate && p.p_isolation >= t.iso,
        reason: |p, _| {
            format!(
                "Isolation {:.3} escalating elevated risk score {:.3}",
                p.p_isolation, p.risk_score
            )
        },
    },
    Rule {
        label: RiskLabel::ModerateRisk,
        applies: |p, t| p.risk_score >= t.mid,
        reason: |p, _| format!("Risk score elevated: {:.3}", p.risk_score),
    },
    Rule {
        label: RiskLabel::IsolationOnly,
        applies: |p, t| p.p_isolation >= t.iso,
        reason: |p, _| format!("High isolation without addiction risk: {:.3}", p.p_isolation),
    },
    Rule {
        label: RiskLabel::LowRisk,
        applies: |_, _| true,
        reason: |_, _| "No significant risk indicators".to_string(),
    },
];

/// Message-level decision plus the informational toxicity flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageAssessment {
    pub label: RiskLabel,
    pub reasons: Vec<String>,
    pub toxic_flag: bool,
}

/// Classify one prediction vector.
///
/// `toxic_flag` is computed on its own and never changes the label.
pub fn assess_message(p: &PredictionVector, thresholds: &Thresholds) -> MessageAssessment {
    let Decision { label, reasons } = evaluate(MESSAGE_RULES, p, thresholds);
    MessageAssessment {
        label,
        reasons,
        toxic_flag: p.p_toxic >= thresholds.toxic,
    }
}

// ========== User level ==========

/// Aggregated inputs to the user-level decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UserSignals {
    pub short: WindowMetrics,
    pub risk_trend: Trend,
    pub days_since_last_buddy_msg: i64,
}

pub const USER_RULES: &[Rule<UserSignals>] = &[
    Rule {
        label: RiskLabel::HighRisk,
        applies: |u, t| u.short.max_risk_score >= t.high,
        reason: |u, _| {
            format!(
                "Max risk score in last 7 days: {:.3}",
                u.short.max_risk_score
            )
        },
    },
    Rule {
        label: RiskLabel::HighRisk,
        applies: |u, _| u.short.high_risk_count >= HIGH_RISK_MESSAGE_COUNT,
        reason: |u, _| {
            format!(
                "Multiple high-risk messages in short window: {}",
                u.short.high_risk_count
            )
        },
    },
    Rule {
        label: RiskLabel::HighRisk,
        applies: |u, _| u.risk_trend == Trend::RapidDecline,
        reason: |_, _| "Detected rapid decline in user state".to_string(),
    },
    Rule {
        label: RiskLabel::HighRisk,
        applies: |u, t| u.short.avg_risk_score >= t.iso_escalate && u.short.avg_isolation >= t.iso,
        reason: |_, _| "Isolation escalating moderate base risk".to_string(),
    },
    Rule {
        label: RiskLabel::ModerateRisk,
        applies: |u, t| u.short.avg_risk_score >= t.mid,
        reason: |u, _| {
            format!(
                "Average risk score elevated: {:.3}",
                u.short.avg_risk_score
            )
        },
    },
    Rule {
        label: RiskLabel::ModerateRisk,
        applies: |u, _| u.risk_trend == Trend::Declining,
        reason: |_, _| "Risk trend is declining (worsening)".to_string(),
    },
    Rule {
        label: RiskLabel::ModerateRisk,
        applies: |u, _| {
            u.days_since_last_buddy_msg > WITHDRAWAL_DAYS
                && u.short.avg_risk_score > WITHDRAWAL_MIN_AVG_RISK
        },
        reason: |u, _| {
            format!(
                "Social withdrawal ({} days without buddy contact) with mild risk",
                u.days_since_last_buddy_msg
            )
        },
    },
    Rule {
        label: RiskLabel::IsolationOnly,
        applies: |u, t| {
            u.short.avg_isolation >= t.iso && u.short.avg_risk_score < ISOLATION_ONLY_MAX_AVG_RISK
        },
        reason: |_, _| "High isolation without addiction risk".to_string(),
    },
    Rule {
        label: RiskLabel::LowRisk,
        applies: |_, _| true,
        reason: |_, _| "No significant risk indicators".to_string(),
    },
];

/// Classify a user from aggregated signals.
pub fn decide_user(signals: &UserSignals, thresholds: &Thresholds) -> Decision {
    evaluate(USER_RULES, signals, thresholds)
}
