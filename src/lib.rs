//! riskagg library.
//!
//! Temporal risk aggregation over per-message classifier output: windowed
//! metrics, trends, engagement and rule-based fusion into a persistent
//! per-user risk profile.

pub mod cli;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod model;

pub use error::Error;
