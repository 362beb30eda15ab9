use crate::errors::{AppError, AppResult};
use crate::models::DEFAULT_PAGE_SIZE;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub database_file: String,
    pub page_size: u32,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            database_file: "myspace.sqlite".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Reads a JSON config file; fields it leaves out keep their defaults.
    pub fn load(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))
            .map_err(|error| AppError::Config(format!("{error:#}")))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("parsing config {}", path.display()))
            .map_err(|error| AppError::Config(format!("{error:#}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::default();
        if let Ok(data_dir) = env::var("MYSPACE_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }
        if let Ok(page_size) = env::var("MYSPACE_PAGE_SIZE") {
            config.page_size = page_size
                .trim()
                .parse()
                .map_err(|_| AppError::Config(format!("MYSPACE_PAGE_SIZE is not a number: {page_size}")))?;
        }
        if let Ok(filter) = env::var("MYSPACE_LOG") {
            config.log_filter = filter;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.page_size == 0 {
            return Err(AppError::Config("pageSize must be at least 1".to_string()));
        }
        if self.database_file.trim().is_empty() {
            return Err(AppError::Config("databaseFile cannot be empty".to_string()));
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}
