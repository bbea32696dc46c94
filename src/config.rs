use std::{fs, path::{Path, PathBuf}};
use serde::Deserialize;
use anyhow::{self, Context};

#[derive(Debug, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Ledger file the CLI reads and writes
    pub path: PathBuf
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct CliConfig {
    /// Filter handed to the logger, e.g. "info" or "bankbook=debug"
    pub log_level: Option<String>,
    pub storage: StorageConfig
}

impl CliConfig {
    pub fn read(filepath: impl AsRef<Path>) -> anyhow::Result<Self> {
        let filepath = filepath.as_ref();
        let file_content = fs::read_to_string(filepath)
            .with_context(|| format!("failed to read config file {}", filepath.display()))?;
        return Self::parse(&file_content)
            .with_context(|| format!("failed to parse config file {}", filepath.display()));
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str(content)?;
        return Ok(config);
    }
}
