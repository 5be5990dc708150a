//! SQLite storage for predictions, profiles and interventions.
//!
//! Connections come from an r2d2 pool so recomputations for different
//! users never share a handle. Per-user read-modify-write goes through
//! [`Database::with_transaction`], which takes SQLite's write lock up front.

mod schema;

pub use schema::{fmt_ts, init_db};

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use tracing::{debug, info};

use crate::error::Error;
use crate::model::{
    ConversationType, Intervention, InterventionOutcome, LabelDistribution, MessagePrediction,
    PredictionVector, RiskLabel, UserRiskProfile,
};

const CONNECTION_PRAGMAS: &str = "PRAGMA journal_mode = WAL;
     PRAGMA synchronous = NORMAL;
     PRAGMA busy_timeout = 5000;";

/// A prediction ready to be stored.
#[derive(Debug, Clone)]
pub struct NewPrediction<'a> {
    pub user_id: &'a str,
    pub message_text: &'a str,
    pub conversation_type: ConversationType,
    pub timestamp: DateTime<Utc>,
    pub predictions: PredictionVector,
    pub msg_risk_label: Option<RiskLabel>,
}

/// A new audit record.
#[derive(Debug, Clone)]
pub struct NewIntervention<'a> {
    pub user_id: &'a str,
    pub timestamp: DateTime<Utc>,
    pub intervention_type: &'a str,
    pub risk_label: RiskLabel,
    pub context: &'a serde_json::Value,
    pub outcome: InterventionOutcome,
}

/// Label state read back before a profile write.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoredLabel {
    pub label: RiskLabel,
    pub since: DateTime<Utc>,
}

/// Pooled database handle. Cloning shares the pool.
#[derive(Clone)]
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Open or create database at path.
    pub fn open(path: &Path, pool_size: u32) -> Result<Self, Error> {
        info!(path = %path.display(), pool_size, "Opening risk database");
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let manager = SqliteConnectionManager::file(path)
            .with_init(|conn| conn.execute_batch(CONNECTION_PRAGMAS));
        let pool = Pool::builder().max_size(pool_size.max(1)).build(manager)?;
        init_db(&*pool.get()?)?;
        Ok(Self { pool })
    }

    /// Open in-memory database for testing.
    ///
    /// Every in-memory connection is its own database, so the pool holds one.
    pub fn open_memory() -> Result<Self, Error> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager)?;
        init_db(&*pool.get()?)?;
        Ok(Self { pool })
    }

    /// Check out a connection.
    pub fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, Error> {
        Ok(self.pool.get()?)
    }

    /// Run `f` inside an immediate transaction on a pooled connection.
    ///
    /// Commits if `f` succeeds; any error rolls the whole unit back.
    pub fn with_transaction<T, F>(&self, f: F) -> Result<T, Error>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, Error>,
    {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }

    // ========== Predictions ==========

    /// Insert a prediction, or overwrite the one stored for the same
    /// `(user_id, timestamp)`. Returns the row id.
    pub fn store_prediction(&self, new: &NewPrediction<'_>) -> Result<i64, Error> {
        let conn = self.conn()?;
        let p = &new.predictions;
        let id: i64 = conn.query_row(
            r#"
            INSERT INTO message_predictions (
                user_id, message_text, timestamp,
                p_craving, p_relapse, p_negative_mood, p_neutral, p_toxic,
                p_isolation, risk_score, conversation_type, msg_risk_label
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ON CONFLICT (user_id, timestamp) DO UPDATE SET
                message_text = excluded.message_text,
                p_craving = excluded.p_craving,
                p_relapse = excluded.p_relapse,
                p_negative_mood = excluded.p_negative_mood,
                p_neutral = excluded.p_neutral,
                p_toxic = excluded.p_toxic,
                p_isolation = excluded.p_isolation,
                risk_score = excluded.risk_score,
                conversation_type = excluded.conversation_type,
                msg_risk_label = excluded.msg_risk_label
            RETURNING id
            "#,
            params![
                new.user_id,
                new.message_text,
                fmt_ts(&new.timestamp),
                p.p_craving,
                p.p_relapse,
                p.p_negative_mood,
                p.p_neutral,
                p.p_toxic,
                p.p_isolation,
                p.risk_score,
                new.conversation_type.as_str(),
                new.msg_risk_label.map(|l| l.as_str()),
            ],
            |row| row.get(0),
        )?;
        debug!(user_id = %new.user_id, id, "Stored prediction");
        Ok(id)
    }

    /// Messages for a user in `[now - days_back, now]`, oldest first.
    pub fn get_messages(
        &self,
        user_id: &str,
        days_back: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<MessagePrediction>, Error> {
        let conn = self.conn()?;
        let cutoff = fmt_ts(&(now - Duration::days(days_back)));
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM message_predictions
            WHERE user_id = ?1 AND timestamp >= ?2 AND timestamp <= ?3
            ORDER BY timestamp ASC, id ASC
            "#,
        )?;
        let messages = stmt
            .query_map(
                params![user_id, cutoff, fmt_ts(&now)],
                MessagePrediction::from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(messages)
    }

    /// Every user with at least one stored prediction.
    pub fn list_user_ids(&self) -> Result<Vec<String>, Error> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT DISTINCT user_id FROM message_predictions ORDER BY user_id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(ids)
    }

    // ========== Profiles ==========

    /// Get the stored profile for a user.
    pub fn get_profile(&self, user_id: &str) -> Result<Option<UserRiskProfile>, Error> {
        let conn = self.conn()?;
        let profile = conn
            .query_row(
                "SELECT * FROM user_risk_profiles WHERE user_id = ?1",
                [user_id],
                UserRiskProfile::from_row,
            )
            .optional()?;
        Ok(profile)
    }

    /// All profiles: HIGH_RISK, MODERATE_RISK, ISOLATION_ONLY, LOW_RISK,
    /// then by descending short-window average risk.
    pub fn list_profiles(&self) -> Result<Vec<UserRiskProfile>, Error> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM user_risk_profiles
            ORDER BY
                CASE current_risk_label
                    WHEN 'HIGH_RISK' THEN 1
                    WHEN 'MODERATE_RISK' THEN 2
                    WHEN 'ISOLATION_ONLY' THEN 3
                    ELSE 4
                END,
                short_avg_risk_score DESC,
                user_id ASC
            "#,
        )?;
        let profiles = stmt
            .query_map([], UserRiskProfile::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(profiles)
    }

    /// Users silent with buddies for at least `days_silent` days, excluding
    /// HIGH_RISK users. Most silent first.
    pub fn list_silent_users(&self, days_silent: i64) -> Result<Vec<String>, Error> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT user_id FROM user_risk_profiles
            WHERE days_since_last_buddy_msg >= ?1
              AND current_risk_label != 'HIGH_RISK'
            ORDER BY days_since_last_buddy_msg DESC, user_id ASC
            "#,
        )?;
        let ids = stmt
            .query_map([days_silent], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(ids)
    }

    /// Number of stored profiles per current label.
    pub fn label_distribution(&self) -> Result<LabelDistribution, Error> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT current_risk_label, COUNT(*) FROM user_risk_profiles GROUP BY current_risk_label",
        )?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut dist = LabelDistribution::default();
        for (label, count) in rows {
            dist.add(label.parse()?, count);
        }
        Ok(dist)
    }

    // ========== Interventions ==========

    /// Append an intervention. Returns its id.
    pub fn insert_intervention(&self, new: &NewIntervention<'_>) -> Result<i64, Error> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO interventions (
                user_id, timestamp, intervention_type, risk_label_at_time, context, outcome
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                new.user_id,
                fmt_ts(&new.timestamp),
                new.intervention_type,
                new.risk_label.as_str(),
                serde_json::to_string(new.context)?,
                new.outcome.as_str(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Interventions for a user no older than `days_back` days, newest first.
    pub fn get_interventions(
        &self,
        user_id: &str,
        days_back: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Intervention>, Error> {
        let conn = self.conn()?;
        let cutoff = fmt_ts(&(now - Duration::days(days_back)));
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM interventions
            WHERE user_id = ?1 AND timestamp >= ?2
            ORDER BY timestamp DESC, id DESC
            "#,
        )?;
        let rows = stmt
            .query_map(params![user_id, cutoff], Intervention::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

// ========== Profile writes (run inside a transaction) ==========

/// Read the label currently stored for a user.
pub fn stored_label(conn: &Connection, user_id: &str) -> Result<Option<StoredLabel>, Error> {
    let row = conn
        .query_row(
            "SELECT current_risk_label, risk_label_since FROM user_risk_profiles WHERE user_id = ?1",
            [user_id],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        )
        .optional()?;

    row.map(|(label, since)| {
        let since = DateTime::parse_from_rfc3339(&since)
            .map_err(|e| Error::Other(format!("bad risk_label_since for {}: {}", user_id, e)))?
            .with_timezone(&Utc);
        Ok(StoredLabel {
            label: label.parse()?,
            since,
        })
    })
    .transpose()
}

/// Insert or replace the profile row keyed by `user_id`.
pub fn upsert_profile(conn: &Connection, profile: &UserRiskProfile) -> Result<(), Error> {
    let s = &profile.short_window;
    let m = &profile.medium_window;
    let e = &profile.engagement;
    conn.execute(
        r#"
        INSERT INTO user_risk_profiles (
            user_id, last_updated,
            short_avg_risk_score, short_max_risk_score, short_avg_isolation,
            short_high_risk_count, short_toxic_incidents, short_message_count,
            medium_avg_risk_score, medium_max_risk_score, medium_avg_isolation,
            medium_high_risk_count, medium_toxic_incidents, medium_message_count,
            risk_trend, isolation_trend,
            current_risk_label, risk_label_since, reasons_json,
            total_messages_7d, buddy_messages_7d, counselor_messages_7d,
            last_message_time, days_since_last_buddy_msg,
            last_login_time, days_since_last_login
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
            ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26
        )
        ON CONFLICT (user_id) DO UPDATE SET
            last_updated = excluded.last_updated,
            short_avg_risk_score = excluded.short_avg_risk_score,
            short_max_risk_score = excluded.short_max_risk_score,
            short_avg_isolation = excluded.short_avg_isolation,
            short_high_risk_count = excluded.short_high_risk_count,
            short_toxic_incidents = excluded.short_toxic_incidents,
            short_message_count = excluded.short_message_count,
            medium_avg_risk_score = excluded.medium_avg_risk_score,
            medium_max_risk_score = excluded.medium_max_risk_score,
            medium_avg_isolation = excluded.medium_avg_isolation,
            medium_high_risk_count = excluded.medium_high_risk_count,
            medium_toxic_incidents = excluded.medium_toxic_incidents,
            medium_message_count = excluded.medium_message_count,
            risk_trend = excluded.risk_trend,
            isolation_trend = excluded.isolation_trend,
            current_risk_label = excluded.current_risk_label,
            risk_label_since = excluded.risk_label_since,
            reasons_json = excluded.reasons_json,
            total_messages_7d = excluded.total_messages_7d,
            buddy_messages_7d = excluded.buddy_messages_7d,
            counselor_messages_7d = excluded.counselor_messages_7d,
            last_message_time = excluded.last_message_time,
            days_since_last_buddy_msg = excluded.days_since_last_buddy_msg,
            last_login_time = excluded.last_login_time,
            days_since_last_login = excluded.days_since_last_login
        "#,
        params![
            profile.user_id,
            fmt_ts(&profile.last_updated),
            s.avg_risk_score,
            s.max_risk_score,
            s.avg_isolation,
            s.high_risk_count,
            s.toxic_incidents,
            s.message_count,
            m.avg_risk_score,
            m.max_risk_score,
            m.avg_isolation,
            m.high_risk_count,
            m.toxic_incidents,
            m.message_count,
            profile.risk_trend.as_str(),
            profile.isolation_trend.as_str(),
            profile.current_risk_label.as_str(),
            fmt_ts(&profile.risk_label_since),
            serde_json::to_string(&profile.reasons)?,
            e.total_messages_7d,
            e.buddy_messages_7d,
            e.counselor_messages_7d,
            e.last_message_time.as_ref().map(fmt_ts),
            e.days_since_last_buddy_msg,
            profile.last_login_time.as_ref().map(fmt_ts),
            profile.days_since_last_login,
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use tempfile::tempdir;

    use crate::model::{Engagement, Trend, WindowMetrics};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()
    }

    fn prediction(risk: f64) -> PredictionVector {
        PredictionVector {
            p_craving: risk,
            p_relapse: 0.1,
            p_negative_mood: 0.1,
            p_neutral: 0.5,
            p_toxic: 0.0,
            p_isolation: 0.2,
            risk_score: risk,
        }
    }

    fn new_prediction<'a>(user: &'a str, ts: DateTime<Utc>, risk: f64) -> NewPrediction<'a> {
        NewPrediction {
            user_id: user,
            message_text: "hello",
            conversation_type: ConversationType::Buddy,
            timestamp: ts,
            predictions: prediction(risk),
            msg_risk_label: None,
        }
    }

    fn profile(user: &str, label: RiskLabel, avg: f64, silent_days: i64) -> UserRiskProfile {
        UserRiskProfile {
            user_id: user.to_string(),
            current_risk_label: label,
            risk_label_since: now(),
            reasons: vec!["test".to_string()],
            short_window: WindowMetrics {
                avg_risk_score: avg,
                message_count: 1,
                ..WindowMetrics::default()
            },
            medium_window: WindowMetrics::default(),
            risk_trend: Trend::Stable,
            isolation_trend: Trend::Stable,
            engagement: Engagement {
                days_since_last_buddy_msg: silent_days,
                ..Engagement::default()
            },
            last_login_time: None,
            days_since_last_login: 0,
            last_updated: now(),
        }
    }

    #[test]
    fn test_store_prediction_is_idempotent_by_user_and_timestamp() {
        let db = Database::open_memory().unwrap();
        let ts = now() - Duration::hours(1);

        let first = db.store_prediction(&new_prediction("u1", ts, 0.2)).unwrap();
        let second = db.store_prediction(&new_prediction("u1", ts, 0.6)).unwrap();
        assert_eq!(first, second);

        let messages = db.get_messages("u1", 30, now()).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].predictions.risk_score, 0.6);
    }

    #[test]
    fn test_same_timestamp_different_users_are_distinct() {
        let db = Database::open_memory().unwrap();
        let ts = now() - Duration::hours(1);
        let a = db.store_prediction(&new_prediction("a", ts, 0.2)).unwrap();
        let b = db.store_prediction(&new_prediction("b", ts, 0.2)).unwrap();
        assert_ne!(a, b);
        assert_eq!(db.list_user_ids().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_get_messages_filters_and_orders() {
        let db = Database::open_memory().unwrap();
        db.store_prediction(&new_prediction("u1", now() - Duration::days(2), 0.3))
            .unwrap();
        db.store_prediction(&new_prediction("u1", now() - Duration::days(40), 0.9))
            .unwrap();
        db.store_prediction(&new_prediction("u1", now() - Duration::days(10), 0.1))
            .unwrap();
        db.store_prediction(&new_prediction("u2", now() - Duration::days(1), 0.5))
            .unwrap();

        let messages = db.get_messages("u1", 30, now()).unwrap();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].timestamp < messages[1].timestamp);
        assert_eq!(messages[0].predictions.risk_score, 0.1);
    }

    #[test]
    fn test_profile_round_trip_and_stored_label() {
        let db = Database::open_memory().unwrap();
        let p = profile("u1", RiskLabel::ModerateRisk, 0.4, 2);

        db.with_transaction(|tx| upsert_profile(tx, &p)).unwrap();

        let loaded = db.get_profile("u1").unwrap().unwrap();
        assert_eq!(loaded, p);

        let conn = db.conn().unwrap();
        let label = stored_label(&conn, "u1").unwrap().unwrap();
        assert_eq!(label.label, RiskLabel::ModerateRisk);
        assert_eq!(label.since, now());
        assert!(stored_label(&conn, "nobody").unwrap().is_none());
    }

    #[test]
    fn test_failed_transaction_rolls_back() {
        let db = Database::open_memory().unwrap();
        let p = profile("u1", RiskLabel::LowRisk, 0.1, 0);

        let result: Result<(), Error> = db.with_transaction(|tx| {
            upsert_profile(tx, &p)?;
            Err(Error::other("simulated failure"))
        });
        assert!(result.is_err());
        assert!(db.get_profile("u1").unwrap().is_none());
    }

    #[test]
    fn test_list_profiles_priority_order() {
        let db = Database::open_memory().unwrap();
        let rows = [
            profile("low", RiskLabel::LowRisk, 0.05, 0),
            profile("iso", RiskLabel::IsolationOnly, 0.1, 0),
            profile("mod-a", RiskLabel::ModerateRisk, 0.35, 0),
            profile("mod-b", RiskLabel::ModerateRisk, 0.55, 0),
            profile("high", RiskLabel::HighRisk, 0.2, 0),
        ];
        db.with_transaction(|tx| {
            for p in &rows {
                upsert_profile(tx, p)?;
            }
            Ok(())
        })
        .unwrap();

        let ids: Vec<String> = db
            .list_profiles()
            .unwrap()
            .into_iter()
            .map(|p| p.user_id)
            .collect();
        assert_eq!(ids, vec!["high", "mod-b", "mod-a", "iso", "low"]);
    }

    #[test]
    fn test_get_messages_excludes_messages_after_now() {
        let db = Database::open_memory().unwrap();
        db.store_prediction(&new_prediction("u1", now() - Duration::hours(2), 0.2))
            .unwrap();
        db.store_prediction(&new_prediction("u1", now(), 0.3))
            .unwrap();
        db.store_prediction(&new_prediction("u1", now() + Duration::hours(1), 0.9))
            .unwrap();

        let messages = db.get_messages("u1", 30, now()).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].timestamp, now());
    }

    #[test]
    fn test_sub_microsecond_timestamps_are_distinct_messages() {
        let db = Database::open_memory().unwrap();
        let ts = now() - Duration::hours(1);
        let later = ts + Duration::nanoseconds(500);

        let first = db.store_prediction(&new_prediction("u1", ts, 0.2)).unwrap();
        let second = db.store_prediction(&new_prediction("u1", later, 0.4)).unwrap();
        assert_ne!(first, second);

        let messages = db.get_messages("u1", 30, now()).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].timestamp, ts);
        assert_eq!(messages[1].timestamp, later);
    }

    #[test]
    fn test_label_distribution_counts_profiles() {
        let db = Database::open_memory().unwrap();
        assert_eq!(db.label_distribution().unwrap(), LabelDistribution::default());

        let rows = [
            profile("a", RiskLabel::HighRisk, 0.8, 0),
            profile("b", RiskLabel::HighRisk, 0.9, 0),
            profile("c", RiskLabel::IsolationOnly, 0.1, 0),
            profile("d", RiskLabel::LowRisk, 0.0, 0),
        ];
        db.with_transaction(|tx| {
            for p in &rows {
                upsert_profile(tx, p)?;
            }
            Ok(())
        })
        .unwrap();

        let dist = db.label_distribution().unwrap();
        assert_eq!(dist.total_users, 4);
        assert_eq!(dist.high_risk, 2);
        assert_eq!(dist.moderate_risk, 0);
        assert_eq!(dist.isolation_only, 1);
        assert_eq!(dist.low_risk, 1);
    }

    #[test]
    fn test_list_silent_users_excludes_high_risk() {
        let db = Database::open_memory().unwrap();
        let rows = [
            profile("quiet-high", RiskLabel::HighRisk, 0.8, 999),
            profile("quiet-low", RiskLabel::LowRisk, 0.1, 4),
            profile("quieter-mod", RiskLabel::ModerateRisk, 0.4, 9),
            profile("chatty", RiskLabel::LowRisk, 0.1, 1),
        ];
        db.with_transaction(|tx| {
            for p in &rows {
                upsert_profile(tx, p)?;
            }
            Ok(())
        })
        .unwrap();

        let silent = db.list_silent_users(3).unwrap();
        assert_eq!(silent, vec!["quieter-mod", "quiet-low"]);
    }

    #[test]
    fn test_interventions_history_newest_first() {
        let db = Database::open_memory().unwrap();
        let context = json!({"reason": "High risk detected", "auto_generated": true});

        for (hours_ago, kind) in [(50, "buddy_nudge"), (2, "counselor_alert")] {
            db.insert_intervention(&NewIntervention {
                user_id: "u1",
                timestamp: now() - Duration::hours(hours_ago),
                intervention_type: kind,
                risk_label: RiskLabel::HighRisk,
                context: &context,
                outcome: InterventionOutcome::Pending,
            })
            .unwrap();
        }

        let history = db.get_interventions("u1", 30, now()).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].intervention_type, "counselor_alert");
        assert_eq!(history[0].context["auto_generated"], json!(true));
        assert_eq!(history[1].outcome, InterventionOutcome::Pending);

        assert_eq!(db.get_interventions("u1", 1, now()).unwrap().len(), 1);
    }

    #[test]
    fn test_file_database_shares_state_across_pool() {
        let dir = tempdir().unwrap();
        let db = Database::open(&dir.path().join("risk.db"), 4).unwrap();
        db.store_prediction(&new_prediction("u1", now(), 0.4))
            .unwrap();

        let reopened = Database::open(&dir.path().join("risk.db"), 2).unwrap();
        assert_eq!(reopened.get_messages("u1", 1, now()).unwrap().len(), 1);
    }
}
