//! Domain records shared by the engine, the database and the CLI.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Sentinel for `days_since_last_buddy_msg` when the user has no buddy message.
pub const NO_BUDDY_MESSAGE_DAYS: i64 = 999;

/// Tolerance when checking a supplied `risk_score` against its derivation.
const RISK_SCORE_TOLERANCE: f64 = 1e-6;

/// Channel a message was sent on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationType {
    #[default]
    Buddy,
    Counselor,
    Group,
    Family,
}

impl ConversationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationType::Buddy => "buddy",
            ConversationType::Counselor => "counselor",
            ConversationType::Group => "group",
            ConversationType::Family => "family",
        }
    }
}

impl FromStr for ConversationType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buddy" => Ok(ConversationType::Buddy),
            "counselor" => Ok(ConversationType::Counselor),
            "group" => Ok(ConversationType::Group),
            "family" => Ok(ConversationType::Family),
            other => Err(Error::unknown("conversation type", other)),
        }
    }
}

/// Terminal classification of a message or a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLabel {
    HighRisk,
    ModerateRisk,
    IsolationOnly,
    LowRisk,
}

impl RiskLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLabel::HighRisk => "HIGH_RISK",
            RiskLabel::ModerateRisk => "MODERATE_RISK",
            RiskLabel::IsolationOnly => "ISOLATION_ONLY",
            RiskLabel::LowRisk => "LOW_RISK",
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLabel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HIGH_RISK" => Ok(RiskLabel::HighRisk),
            "MODERATE_RISK" => Ok(RiskLabel::ModerateRisk),
            "ISOLATION_ONLY" => Ok(RiskLabel::IsolationOnly),
            "LOW_RISK" => Ok(RiskLabel::LowRisk),
            other => Err(Error::unknown("risk label", other)),
        }
    }
}

/// Direction of change of a metric. "declining" means the user's state is worsening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Stable,
    Declining,
    RapidDecline,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Improving => "improving",
            Trend::Stable => "stable",
            Trend::Declining => "declining",
            Trend::RapidDecline => "rapid_decline",
        }
    }
}

impl FromStr for Trend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "improving" => Ok(Trend::Improving),
            "stable" => Ok(Trend::Stable),
            "declining" => Ok(Trend::Declining),
            "rapid_decline" => Ok(Trend::RapidDecline),
            other => Err(Error::unknown("trend", other)),
        }
    }
}

/// Result of an intervention, as reported by the downstream consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterventionOutcome {
    #[default]
    Pending,
    Engaged,
    Ignored,
    Escalated,
}

impl InterventionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterventionOutcome::Pending => "pending",
            InterventionOutcome::Engaged => "engaged",
            InterventionOutcome::Ignored => "ignored",
            InterventionOutcome::Escalated => "escalated",
        }
    }
}

impl FromStr for InterventionOutcome {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InterventionOutcome::Pending),
            "engaged" => Ok(InterventionOutcome::Engaged),
            "ignored" => Ok(InterventionOutcome::Ignored),
            "escalated" => Ok(InterventionOutcome::Escalated),
            other => Err(Error::unknown("intervention outcome", other)),
        }
    }
}

/// Classifier output for one message. Every field is a probability in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PredictionVector {
    #[serde(default)]
    pub p_craving: f64,
    #[serde(default)]
    pub p_relapse: f64,
    #[serde(default)]
    pub p_negative_mood: f64,
    #[serde(default)]
    pub p_neutral: f64,
    #[serde(default)]
    pub p_toxic: f64,
    #[serde(default)]
    pub p_isolation: f64,
    #[serde(default)]
    pub risk_score: f64,
}

impl PredictionVector {
    /// `max(p_relapse, p_craving, neg_weight * p_negative_mood)`.
    pub fn derive_risk_score(&self, neg_weight: f64) -> f64 {
        self.p_relapse
            .max(self.p_craving)
            .max(neg_weight * self.p_negative_mood)
    }

    /// Copy with `risk_score` replaced by its derivation.
    pub fn with_derived_risk_score(mut self, neg_weight: f64) -> Self {
        self.risk_score = self.derive_risk_score(neg_weight);
        self
    }

    fn fields(&self) -> [(&'static str, f64); 7] {
        [
            ("p_craving", self.p_craving),
            ("p_relapse", self.p_relapse),
            ("p_negative_mood", self.p_negative_mood),
            ("p_neutral", self.p_neutral),
            ("p_toxic", self.p_toxic),
            ("p_isolation", self.p_isolation),
            ("risk_score", self.risk_score),
        ]
    }

    /// Reject NaN and values outside [0, 1].
    pub fn validate(&self) -> Result<(), Error> {
        for (field, value) in self.fields() {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidPrediction { field, value });
            }
        }
        Ok(())
    }

    /// Range check plus the `risk_score` derivation invariant.
    pub fn validate_with_weight(&self, neg_weight: f64) -> Result<(), Error> {
        self.validate()?;
        let expected = self.derive_risk_score(neg_weight);
        if (self.risk_score - expected).abs() > RISK_SCORE_TOLERANCE {
            return Err(Error::InconsistentRiskScore {
                actual: self.risk_score,
                expected,
            });
        }
        Ok(())
    }
}

/// One stored, analyzed message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePrediction {
    pub id: i64,
    pub user_id: String,
    pub message_text: String,
    pub timestamp: DateTime<Utc>,
    pub conversation_type: ConversationType,
    #[serde(flatten)]
    pub predictions: PredictionVector,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg_risk_label: Option<RiskLabel>,
}

/// Reduction of a message subset restricted to a trailing window.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WindowMetrics {
    pub avg_risk_score: f64,
    pub max_risk_score: f64,
    pub avg_isolation: f64,
    pub high_risk_count: u32,
    pub toxic_incidents: u32,
    pub message_count: u32,
}

/// Activity signals, independent of risk probabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Engagement {
    pub total_messages_7d: u32,
    pub buddy_messages_7d: u32,
    pub counselor_messages_7d: u32,
    pub last_message_time: Option<DateTime<Utc>>,
    pub days_since_last_buddy_msg: i64,
}

impl Default for Engagement {
    fn default() -> Self {
        Self {
            total_messages_7d: 0,
            buddy_messages_7d: 0,
            counselor_messages_7d: 0,
            last_message_time: None,
            days_since_last_buddy_msg: NO_BUDDY_MESSAGE_DAYS,
        }
    }
}

/// Durable per-user output of the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRiskProfile {
    pub user_id: String,
    pub current_risk_label: RiskLabel,
    pub risk_label_since: DateTime<Utc>,
    pub reasons: Vec<String>,
    pub short_window: WindowMetrics,
    pub medium_window: WindowMetrics,
    pub risk_trend: Trend,
    pub isolation_trend: Trend,
    pub engagement: Engagement,
    pub last_login_time: Option<DateTime<Utc>>,
    pub days_since_last_login: i64,
    pub last_updated: DateTime<Utc>,
}

/// Stored profile counts per label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LabelDistribution {
    pub total_users: u32,
    pub high_risk: u32,
    pub moderate_risk: u32,
    pub isolation_only: u32,
    pub low_risk: u32,
}

impl LabelDistribution {
    pub fn add(&mut self, label: RiskLabel, count: u32) {
        self.total_users += count;
        match label {
            RiskLabel::HighRisk => self.high_risk += count,
            RiskLabel::ModerateRisk => self.moderate_risk += count,
            RiskLabel::IsolationOnly => self.isolation_only += count,
            RiskLabel::LowRisk => self.low_risk += count,
        }
    }
}

/// Audit record of a downstream action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intervention {
    pub id: i64,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub intervention_type: String,
    pub risk_label_at_time: RiskLabel,
    pub context: serde_json::Value,
    pub outcome: InterventionOutcome,
}
