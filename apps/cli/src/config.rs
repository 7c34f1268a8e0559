//! Config file loading.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use mempool::PoolConfig;
use serde::Deserialize;

/// Top-level layout of the config file
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    pool: PoolConfig,
}

/// Reads the `[pool]` table from `path`, or returns the defaults
pub fn load(path: Option<&Path>) -> Result<PoolConfig> {
    let Some(path) = path else {
        return Ok(PoolConfig::default());
    };

    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let file: ConfigFile = toml::from_str(&text)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    file.pool
        .validate()
        .with_context(|| format!("invalid pool config in {}", path.display()))?;

    tracing::debug!(path = %path.display(), config = ?file.pool, "loaded config");
    Ok(file.pool)
}
