//! Database schema and row mapping.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC text (nanosecond
//! precision, `Z` suffix) so that string comparison in SQL matches
//! chronological order.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Result, Row};

use crate::error::Error;
use crate::model::{
    Engagement, Intervention, MessagePrediction, PredictionVector, UserRiskProfile, WindowMetrics,
};

/// Initialize database with all tables.
pub fn init_db(conn: &Connection) -> Result<(), Error> {
    // Per-message classifier output. (user_id, timestamp) is the idempotency key.
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS message_predictions (
            id                INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id           TEXT NOT NULL,
            message_text      TEXT NOT NULL,
            timestamp         TEXT NOT NULL,
            p_craving         REAL NOT NULL,
            p_relapse         REAL NOT NULL,
            p_negative_mood   REAL NOT NULL,
            p_neutral         REAL NOT NULL,
            p_toxic           REAL NOT NULL,
            p_isolation       REAL NOT NULL,
            risk_score        REAL NOT NULL,
            conversation_type TEXT NOT NULL,
            msg_risk_label    TEXT,
            UNIQUE (user_id, timestamp)
        );

        CREATE INDEX IF NOT EXISTS idx_predictions_user_time
            ON message_predictions(user_id, timestamp DESC);
        CREATE INDEX IF NOT EXISTS idx_predictions_time
            ON message_predictions(timestamp DESC);
        "#,
    )?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS user_risk_profiles (
            user_id                   TEXT PRIMARY KEY,
            last_updated              TEXT NOT NULL,

            short_avg_risk_score      REAL NOT NULL,
            short_max_risk_score      REAL NOT NULL,
            short_avg_isolation       REAL NOT NULL,
            short_high_risk_count     INTEGER NOT NULL,
            short_toxic_incidents     INTEGER NOT NULL,
            short_message_count       INTEGER NOT NULL,

            medium_avg_risk_score     REAL NOT NULL,
            medium_max_risk_score     REAL NOT NULL,
            medium_avg_isolation      REAL NOT NULL,
            medium_high_risk_count    INTEGER NOT NULL,
            medium_toxic_incidents    INTEGER NOT NULL,
            medium_message_count      INTEGER NOT NULL,

            risk_trend                TEXT NOT NULL,
            isolation_trend           TEXT NOT NULL,

            current_risk_label        TEXT NOT NULL,
            risk_label_since          TEXT NOT NULL,
            reasons_json              TEXT NOT NULL,

            total_messages_7d         INTEGER NOT NULL,
            buddy_messages_7d         INTEGER NOT NULL,
            counselor_messages_7d     INTEGER NOT NULL,
            last_message_time         TEXT,
            days_since_last_buddy_msg INTEGER NOT NULL,
            last_login_time           TEXT,
            days_since_last_login     INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_profiles_label
            ON user_risk_profiles(current_risk_label);
        "#,
    )?;

    // Append-only audit log. No foreign key: interventions may be logged
    // before a profile has ever been stored for the user.
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS interventions (
            id                 INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id            TEXT NOT NULL,
            timestamp          TEXT NOT NULL,
            intervention_type  TEXT NOT NULL,
            risk_label_at_time TEXT NOT NULL,
            context            TEXT NOT NULL,
            outcome            TEXT NOT NULL DEFAULT 'pending'
        );

        CREATE INDEX IF NOT EXISTS idx_interventions_user_time
            ON interventions(user_id, timestamp DESC);
        "#,
    )?;

    Ok(())
}

/// Format a timestamp for storage.
pub fn fmt_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn conversion_error(
    row: &Row<'_>,
    col: &str,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    let idx = row.as_ref().column_index(col).unwrap_or(0);
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn get_ts(row: &Row<'_>, col: &str) -> Result<DateTime<Utc>> {
    let text: String = row.get(col)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| conversion_error(row, col, e))
}

fn get_opt_ts(row: &Row<'_>, col: &str) -> Result<Option<DateTime<Utc>>> {
    let text: Option<String> = row.get(col)?;
    text.map(|t| {
        DateTime::parse_from_rfc3339(&t)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|e| conversion_error(row, col, e))
    })
    .transpose()
}

fn get_parsed<T: FromStr<Err = Error>>(row: &Row<'_>, col: &str) -> Result<T> {
    let text: String = row.get(col)?;
    text.parse().map_err(|e| conversion_error(row, col, e))
}

impl MessagePrediction {
    pub fn from_row(row: &Row<'_>) -> Result<Self> {
        let msg_risk_label: Option<String> = row.get("msg_risk_label")?;
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            message_text: row.get("message_text")?,
            timestamp: get_ts(row, "timestamp")?,
            conversation_type: get_parsed(row, "conversation_type")?,
            predictions: PredictionVector {
                p_craving: row.get("p_craving")?,
                p_relapse: row.get("p_relapse")?,
                p_negative_mood: row.get("p_negative_mood")?,
                p_neutral: row.get("p_neutral")?,
                p_toxic: row.get("p_toxic")?,
                p_isolation: row.get("p_isolation")?,
                risk_score: row.get("risk_score")?,
            },
            msg_risk_label: msg_risk_label
                .map(|l| l.parse().map_err(|e| conversion_error(row, "msg_risk_label", e)))
                .transpose()?,
        })
    }
}

fn window_from_row(row: &Row<'_>, prefix: &str) -> Result<WindowMetrics> {
    let col = |name: &str| format!("{}_{}", prefix, name);
    Ok(WindowMetrics {
        avg_risk_score: row.get(col("avg_risk_score").as_str())?,
        max_risk_score: row.get(col("max_risk_score").as_str())?,
        avg_isolation: row.get(col("avg_isolation").as_str())?,
        high_risk_count: row.get(col("high_risk_count").as_str())?,
        toxic_incidents: row.get(col("toxic_incidents").as_str())?,
        message_count: row.get(col("message_count").as_str())?,
    })
}

impl UserRiskProfile {
    pub fn from_row(row: &Row<'_>) -> Result<Self> {
        let reasons_json: String = row.get("reasons_json")?;
        let reasons: Vec<String> = serde_json::from_str(&reasons_json)
            .map_err(|e| conversion_error(row, "reasons_json", e))?;

        Ok(Self {
            user_id: row.get("user_id")?,
            current_risk_label: get_parsed(row, "current_risk_label")?,
            risk_label_since: get_ts(row, "risk_label_since")?,
            reasons,
            short_window: window_from_row(row, "short")?,
            medium_window: window_from_row(row, "medium")?,
            risk_trend: get_parsed(row, "risk_trend")?,
            isolation_trend: get_parsed(row, "isolation_trend")?,
            engagement: Engagement {
                total_messages_7d: row.get("total_messages_7d")?,
                buddy_messages_7d: row.get("buddy_messages_7d")?,
                counselor_messages_7d: row.get("counselor_messages_7d")?,
                last_message_time: get_opt_ts(row, "last_message_time")?,
                days_since_last_buddy_msg: row.get("days_since_last_buddy_msg")?,
            },
            last_login_time: get_opt_ts(row, "last_login_time")?,
            days_since_last_login: row.get("days_since_last_login")?,
            last_updated: get_ts(row, "last_updated")?,
        })
    }
}

impl Intervention {
    pub fn from_row(row: &Row<'_>) -> Result<Self> {
        let context: String = row.get("context")?;
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            timestamp: get_ts(row, "timestamp")?,
            intervention_type: row.get("intervention_type")?,
            risk_label_at_time: get_parsed(row, "risk_label_at_time")?,
            context: serde_json::from_str(&context)
                .map_err(|e| conversion_error(row, "context", e))?,
            outcome: get_parsed(row, "outcome")?,
        })
    }
}
