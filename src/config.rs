//! Configuration management for riskagg.
//!
//! Everything except the fusion block has defaults. Fusion thresholds are
//! product decisions and must be supplied, either inline in `config.toml`
//! or from a `fusion_v2.json`-style file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Global riskagg configuration (`~/.riskagg/config.toml`).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub windows: WindowsConfig,

    #[serde(default)]
    pub daemon: DaemonConfig,

    /// Raw fusion block, validated into [`FusionConfig`] at startup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fusion: Option<RawFusion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database file. Defaults to `~/.riskagg/riskagg.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            pool_size: default_pool_size(),
        }
    }
}

/// Aggregation windows, in days.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowsConfig {
    #[serde(default = "default_short_days")]
    pub short_days: i64,

    #[serde(default = "default_medium_days")]
    pub medium_days: i64,

    /// How far back messages are loaded for one recomputation.
    #[serde(default = "default_history_days")]
    pub history_days: i64,

    #[serde(default = "default_silent_user_days")]
    pub silent_user_days: i64,
}

impl Default for WindowsConfig {
    fn default() -> Self {
        Self {
            short_days: default_short_days(),
            medium_days: default_medium_days(),
            history_days: default_history_days(),
            silent_user_days: default_silent_user_days(),
        }
    }
}

impl WindowsConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.short_days <= 0 || self.medium_days <= 0 {
            return Err(Error::InvalidConfig(
                "window lengths must be positive".to_string(),
            ));
        }
        if self.history_days < self.medium_days {
            return Err(Error::InvalidConfig(format!(
                "history_days ({}) must cover medium_days ({})",
                self.history_days, self.medium_days
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Maximum number of users recomputed at once by `recompute`.
    #[serde(default = "default_recompute_concurrency")]
    pub recompute_concurrency: usize,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            recompute_concurrency: default_recompute_concurrency(),
        }
    }
}

fn default_pool_size() -> u32 {
    10
}

fn default_short_days() -> i64 {
    7
}

fn default_medium_days() -> i64 {
    30
}

fn default_history_days() -> i64 {
    30
}

fn default_silent_user_days() -> i64 {
    3
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_recompute_concurrency() -> usize {
    4
}

/// Unvalidated fusion block, as written in TOML or in a fusion JSON file.
///
/// `neg_weight` may sit at the top level (TOML) or under `risk_score`
/// (the JSON layout).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFusion {
    #[serde(default)]
    pub thresholds: BTreeMap<String, f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neg_weight: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<RiskScoreSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskScoreSection {
    #[serde(default)]
    pub neg_weight: Option<f64>,
}

/// Fusion thresholds, one per rule input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub relapse: f64,
    pub craving: f64,
    pub high: f64,
    pub mid: f64,
    pub iso: f64,
    pub iso_escalate: f64,
    pub toxic: f64,
}

impl Thresholds {
    pub const KEYS: [&'static str; 7] = [
        "T_relapse",
        "T_craving",
        "T_high",
        "T_mid",
        "T_iso",
        "T_iso_escalate",
        "T_toxic",
    ];

    /// Build from a key/value map. Every key in [`Self::KEYS`] is required.
    pub fn from_map(map: &BTreeMap<String, f64>) -> Result<Self, Error> {
        let get = |key: &'static str| -> Result<f64, Error> {
            let value = *map.get(key).ok_or(Error::MissingThreshold(key))?;
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidConfig(format!(
                    "{} = {} is outside [0, 1]",
                    key, value
                )));
            }
            Ok(value)
        };

        Ok(Self {
            relapse: get("T_relapse")?,
            craving: get("T_craving")?,
            high: get("T_high")?,
            mid: get("T_mid")?,
            iso: get("T_iso")?,
            iso_escalate: get("T_iso_escalate")?,
            toxic: get("T_toxic")?,
        })
    }
}

/// Validated fusion configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionConfig {
    pub thresholds: Thresholds,
    pub neg_weight: f64,
}

impl FusionConfig {
    pub fn from_raw(raw: &RawFusion) -> Result<Self, Error> {
        let thresholds = Thresholds::from_map(&raw.thresholds)?;
        let neg_weight = raw
            .neg_weight
            .or_else(|| raw.risk_score.as_ref().and_then(|r| r.neg_weight))
            .ok_or_else(|| Error::InvalidConfig("fusion neg_weight is missing".to_string()))?;
        if !(0.0..=1.0).contains(&neg_weight) {
            return Err(Error::InvalidConfig(format!(
                "neg_weight = {} is outside [0, 1]",
                neg_weight
            )));
        }
        Ok(Self {
            thresholds,
            neg_weight,
        })
    }

    /// Load a fusion JSON file (`{"thresholds": {..}, "risk_score": {"neg_weight": w}}`).
    pub fn load_json(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)?;
        let raw: RawFusion =
            serde_json::from_str(&content).map_err(|e| Error::ConfigParse(e.to_string()))?;
        Self::from_raw(&raw)
    }
}

impl Config {
    /// Load config from an explicit path, or `~/.riskagg/config.toml`.
    ///
    /// A missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, Error> {
        let config: Config = toml::from_str(content)?;
        config.windows.validate()?;
        Ok(config)
    }

    /// Validated fusion block. An explicit JSON file wins over the inline block.
    pub fn fusion(&self, json_override: Option<&Path>) -> Result<FusionConfig, Error> {
        if let Some(path) = json_override {
            return FusionConfig::load_json(path);
        }
        let raw = self
            .fusion
            .as_ref()
            .ok_or_else(|| Error::InvalidConfig("no [fusion] section configured".to_string()))?;
        FusionConfig::from_raw(raw)
    }

    /// Path to global riskagg directory (~/.riskagg/)
    pub fn global_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".riskagg")
    }

    /// Path to config file
    pub fn path() -> PathBuf {
        Self::global_dir().join("config.toml")
    }

    /// Path to the database, from config or the global default.
    pub fn db_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| Self::global_dir().join("riskagg.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const FULL: &str = r#"
[database]
pool_size = 4

[windows]
short_days = 7
medium_days = 30

[fusion]
neg_weight = 0.8

[fusion.thresholds]
T_relapse = 0.5
T_craving = 0.5
T_high = 0.7
T_mid = 0.3
T_iso = 0.9
T_iso_escalate = 0.7
T_toxic = 0.7
"#;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.database.pool_size, 10);
        assert_eq!(config.windows.short_days, 7);
        assert_eq!(config.windows.medium_days, 30);
        assert_eq!(config.daemon.log_level, "info");
        assert!(config.fusion.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_toml_str(FULL).unwrap();
        assert_eq!(config.database.pool_size, 4);
        let fusion = config.fusion(None).unwrap();
        assert_eq!(fusion.neg_weight, 0.8);
        assert_eq!(fusion.thresholds.iso_escalate, 0.7);
        assert_eq!(fusion.thresholds.mid, 0.3);
    }

    #[test]
    fn test_missing_threshold_fails_fast() {
        let content = FULL.replace("T_toxic = 0.7\n", "");
        let config = Config::from_toml_str(&content).unwrap();
        match config.fusion(None) {
            Err(Error::MissingThreshold(key)) => assert_eq!(key, "T_toxic"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_threshold_out_of_range() {
        let content = FULL.replace("T_mid = 0.3", "T_mid = 3.0");
        let config = Config::from_toml_str(&content).unwrap();
        assert!(matches!(config.fusion(None), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_missing_fusion_section() {
        let config = Config::default();
        assert!(matches!(config.fusion(None), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_fusion_json_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fusion_v2.json");
        std::fs::write(
            &path,
            r#"{
                "thresholds": {
                    "T_relapse": 0.6, "T_craving": 0.6, "T_high": 0.7, "T_mid": 0.3,
                    "T_iso": 0.9, "T_iso_escalate": 0.7, "T_toxic": 0.75
                },
                "risk_score": { "neg_weight": 0.5 }
            }"#,
        )
        .unwrap();

        let fusion = Config::default().fusion(Some(path.as_path())).unwrap();
        assert_eq!(fusion.neg_weight, 0.5);
        assert_eq!(fusion.thresholds.toxic, 0.75);
    }

    #[test]
    fn test_invalid_windows_rejected() {
        let err = Config::from_toml_str("[windows]\nmedium_days = 60\n").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(Some(dir.path().join("absent.toml").as_path())).unwrap();
        assert_eq!(config.windows.history_days, 30);
    }
}
