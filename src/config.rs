use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use super::calendar::{CalendarWindow, DEFAULT_LOOKAHEAD_DAYS};
use super::error::WindowError;

/// Settings read from `resolver.toml` in the config directory.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    pub lookahead_days: i64,
    /// Evaluate from this date instead of today, e.g. to replay a snapshot.
    pub base_date: Option<NaiveDate>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            lookahead_days: DEFAULT_LOOKAHEAD_DAYS,
            base_date: None,
        }
    }
}

impl ResolverConfig {
    /// Loads `{config_path}/resolver.toml`, falling back to defaults when the
    /// file does not exist.
    pub fn load(config_path: &str) -> Result<Self> {
        let path = Path::new(config_path).join("resolver.toml");
        if !path.exists() {
            info!("No {} found, using defaults", path.display());
            return Ok(ResolverConfig::default());
        }
        let file = fs_err::read_to_string(&path)?;
        Self::parse(&file).with_context(|| format!("Invalid resolver config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn window(&self) -> Result<CalendarWindow, WindowError> {
        match self.base_date {
            Some(base_date) => CalendarWindow::new(base_date, self.lookahead_days),
            None => CalendarWindow::today(self.lookahead_days),
        }
    }
}
