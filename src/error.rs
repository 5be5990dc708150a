//! Error types for the risk aggregation engine.

use thiserror::Error;

/// Engine error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Missing fusion threshold: {0}")]
    MissingThreshold(&'static str),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Config parse error: {0}")]
    ConfigParse(String),

    #[error("Invalid prediction: {field} = {value} is outside [0, 1]")]
    InvalidPrediction { field: &'static str, value: f64 },

    #[error("Inconsistent risk_score: got {actual}, expected {expected}")]
    InconsistentRiskScore { actual: f64, expected: f64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown {kind}: {value}")]
    UnknownValue { kind: &'static str, value: String },

    #[error("{0}")]
    Other(String),
}

/// Coarse failure class, so callers can tell "no risk" from "risk could not be computed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Input,
    Storage,
    Internal,
}

impl Error {
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    pub fn unknown(kind: &'static str, value: impl Into<String>) -> Self {
        Error::UnknownValue {
            kind,
            value: value.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingThreshold(_) | Error::InvalidConfig(_) | Error::ConfigParse(_) => {
                ErrorKind::Config
            }
            Error::InvalidPrediction { .. }
            | Error::InconsistentRiskScore { .. }
            | Error::InvalidInput(_)
            | Error::UnknownValue { .. } => ErrorKind::Input,
            Error::Sqlite(_) | Error::Pool(_) => ErrorKind::Storage,
            Error::Io(_) | Error::Json(_) | Error::Other(_) => ErrorKind::Internal,
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::ConfigParse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::MissingThreshold("T_mid").kind(), ErrorKind::Config);
        assert_eq!(
            Error::InvalidPrediction {
                field: "p_toxic",
                value: 1.5
            }
            .kind(),
            ErrorKind::Input
        );
        let sqlite = Error::from(rusqlite::Error::QueryReturnedNoRows);
        assert_eq!(sqlite.kind(), ErrorKind::Storage);
        assert_eq!(Error::other("boom").kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_error_display() {
        let err = Error::unknown("conversation type", "forum");
        assert_eq!(err.to_string(), "Unknown conversation type: forum");

        let err = Error::InvalidInput("user_id must not be empty".to_string());
        assert_eq!(err.to_string(), "Invalid input: user_id must not be empty");
        assert_eq!(err.kind(), ErrorKind::Input);
    }
}
