//! Show the effective configuration.

use std::path::Path;

use crate::config::{Config, FusionConfig, Thresholds};
use crate::error::Error;

/// Print the merged config as TOML, with resolved paths and thresholds.
pub fn show(config: &Config, config_path: &Path, fusion: &FusionConfig) -> Result<(), Error> {
    let rendered = toml::to_string_pretty(config).map_err(|e| Error::other(e.to_string()))?;

    println!("# config file: {}", config_path.display());
    println!("# database:    {}", config.db_path().display());
    println!("{}", rendered.trim_end());
    println!();
    println!("# effective fusion");
    println!("#   neg_weight = {}", fusion.neg_weight);
    let t = &fusion.thresholds;
    for (key, value) in Thresholds::KEYS.iter().zip([
        t.relapse,
        t.craving,
        t.high,
        t.mid,
        t.iso,
        t.iso_escalate,
        t.toxic,
    ]) {
        println!("#   {} = {}", key, value);
    }
    Ok(())
}
