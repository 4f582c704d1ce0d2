use anyhow::{Context, Result};
use github::ClientConfig;
use ranker::RankConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Settings file layout: `{ "client": {...}, "rank": {...} }`, every field optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub client: ClientConfig,
    pub rank: RankConfig,
}

impl AppConfig {
    /// Read `path` if given, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = Self::from_file(path)?;
        Ok(Self { client: file.client.with_env(), rank: file.rank })
    }

    /// Settings from `path` alone; defaults when there is no file.
    pub fn from_file(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => {
                let text = fs::read_to_string(p).with_context(|| format!("reading config {}", p.display()))?;
                serde_json::from_str(&text).with_context(|| format!("parsing config {}", p.display()))
            }
            None => Ok(AppConfig::default()),
        }
    }
}
