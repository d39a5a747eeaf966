//! Store configuration

use crate::model::StateNode;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Environment variable that turns log mode on
pub const ENV_LOG_MODE: &str = "STATETREE_LOG_MODE";

/// Environment variable overriding the root id
pub const ENV_ROOT_ID: &str = "STATETREE_ROOT_ID";

/// Construction-time settings for a [`Store`](crate::Store)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Log every reduce and middleware hop at `info`
    pub log_mode: bool,
    /// Id given to the root created by [`StoreConfig::initial_root`]
    pub root_id: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            log_mode: false,
            root_id: "root".to_string(),
        }
    }
}

impl StoreConfig {
    /// Parse a JSON config; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: StoreConfig = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Invalid store config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `STATETREE_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = StoreConfig::default();
        if let Some(value) = var(ENV_LOG_MODE) {
            config.log_mode = parse_flag(ENV_LOG_MODE, &value)?;
        }
        if let Some(root_id) = var(ENV_ROOT_ID) {
            config.root_id = root_id;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn with_log_mode(mut self, on: bool) -> Self {
        self.log_mode = on;
        self
    }

    pub fn with_root_id(mut self, root_id: impl Into<String>) -> Self {
        self.root_id = root_id.into();
        self
    }

    /// An empty root node with the configured id
    pub fn initial_root(&self) -> StateNode {
        StateNode::root(self.root_id.clone())
    }

    pub fn validate(&self) -> Result<()> {
        if self.root_id.trim().is_empty() {
            return Err(Error::Config("root_id must not be empty".into()));
        }
        if self.root_id == StateNode::EMPTY_ID {
            return Err(Error::Config(format!(
                "root_id must not be the reserved id '{}'",
                StateNode::EMPTY_ID
            )));
        }
        Ok(())
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" | "" => Ok(false),
        other => Err(Error::Config(format!(
            "{} expects a boolean, got '{}'",
            key, other
        ))),
    }
}
