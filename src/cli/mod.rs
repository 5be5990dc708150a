//! CLI commands for riskagg.

pub mod config;
pub mod history;
pub mod ingest;
pub mod intervene;
pub mod profile;
pub mod recompute;
pub mod silent;
pub mod stats;

use crate::config::{Config, FusionConfig};
use crate::db::Database;
use crate::engine::RiskEngine;
use crate::error::Error;
use crate::model::UserRiskProfile;

/// Validated configuration plus an open engine, shared by every command.
pub struct App {
    pub config: Config,
    pub fusion: FusionConfig,
    pub engine: RiskEngine,
}

impl App {
    /// Open the configured database.
    pub fn open(config: Config, fusion: FusionConfig) -> Result<Self, Error> {
        let db = Database::open(&config.db_path(), config.database.pool_size)?;
        let engine = RiskEngine::new(db, config.windows);
        Ok(Self {
            config,
            fusion,
            engine,
        })
    }
}

/// One-line summary used by the listing commands.
pub(crate) fn profile_line(profile: &UserRiskProfile) -> String {
    format!(
        "{:<24} {:<15} avg7={:.3} max7={:.3} trend={:<13} silent={}d",
        profile.user_id,
        profile.current_risk_label.as_str(),
        profile.short_window.avg_risk_score,
        profile.short_window.max_risk_score,
        profile.risk_trend.as_str(),
        profile.engagement.days_since_last_buddy_msg,
    )
}

#[cfg(test)]
pub(crate) mod test_support {
    use tempfile::TempDir;

    use super::App;
    use crate::config::{Config, FusionConfig, Thresholds};

    pub fn fusion() -> FusionConfig {
        FusionConfig {
            thresholds: Thresholds {
                relapse: 0.5,
                craving: 0.5,
                high: 0.7,
                mid: 0.3,
                iso: 0.9,
                iso_escalate: 0.7,
                toxic: 0.7,
            },
            neg_weight: 0.8,
        }
    }

    /// App backed by a database inside `dir`.
    pub fn app(dir: &TempDir) -> App {
        let mut config = Config::default();
        config.database.path = Some(dir.path().join("riskagg.db"));
        config.database.pool_size = 4;
        App::open(config, fusion()).unwrap()
    }
}
