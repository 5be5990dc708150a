//! Load classified messages from a JSON Lines file.
//!
//! Each line is one record:
//! `{"user_id", "message_text", "conversation_type", "timestamp"?, "predictions": {..}}`.
//! When `predictions.risk_score` is absent it is derived from the other
//! probabilities; when present it must match the derivation.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::config::FusionConfig;
use crate::engine::{RecordedMessage, RiskEngine};
use crate::error::Error;
use crate::model::{ConversationType, PredictionVector};

#[derive(Debug, Deserialize)]
struct IngestRecord {
    user_id: String,
    #[serde(default)]
    message_text: String,
    #[serde(default)]
    conversation_type: ConversationType,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
    predictions: Map<String, Value>,
}

/// Result of ingesting one file.
#[derive(Debug, Default)]
pub struct IngestSummary {
    pub stored: Vec<RecordedMessage>,
    pub errors: Vec<String>,
}

fn parse_predictions(raw: Map<String, Value>, neg_weight: f64) -> Result<PredictionVector, Error> {
    let supplied = raw.contains_key("risk_score");
    let vector: PredictionVector = serde_json::from_value(Value::Object(raw))?;
    if supplied {
        Ok(vector)
    } else {
        Ok(vector.with_derived_risk_score(neg_weight))
    }
}

fn ingest_line(
    engine: &RiskEngine,
    fusion: &FusionConfig,
    line: &str,
) -> Result<RecordedMessage, Error> {
    let record: IngestRecord = serde_json::from_str(line)?;
    let predictions = parse_predictions(record.predictions, fusion.neg_weight)?;
    engine.record_message(
        &record.user_id,
        &record.message_text,
        predictions,
        record.conversation_type,
        record.timestamp,
        fusion,
    )
}

/// Store every valid line of `content`. Bad lines are collected, not fatal.
pub fn ingest_str(engine: &RiskEngine, fusion: &FusionConfig, content: &str) -> IngestSummary {
    let mut summary = IngestSummary::default();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match ingest_line(engine, fusion, line) {
            Ok(recorded) => summary.stored.push(recorded),
            Err(e) => {
                warn!(line = idx + 1, error = %e, "Rejected record");
                summary.errors.push(format!("line {}: {}", idx + 1, e));
            }
        }
    }
    summary
}

/// Run the ingest command.
pub async fn run(app: &super::App, path: &Path) -> Result<(), Error> {
    let content = tokio::fs::read_to_string(path).await?;
    let summary = ingest_str(&app.engine, &app.fusion, &content);

    for recorded in &summary.stored {
        let a = &recorded.assessment;
        println!(
            "  #{} {}{}",
            recorded.message_id,
            a.label,
            if a.toxic_flag { " (toxic)" } else { "" }
        );
    }
    for error in &summary.errors {
        eprintln!("  {}", error);
    }

    info!(
        path = %path.display(),
        stored = summary.stored.len(),
        rejected = summary.errors.len(),
        "Ingest finished"
    );
    println!(
        "Ingested {} message(s), {} rejected.",
        summary.stored.len(),
        summary.errors.len()
    );
    Ok(())
}
