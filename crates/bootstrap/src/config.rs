//! Bootstrap configuration.
//!
//! The configuration is an explicit value handed to token assignment and
//! to the streamer factory; nothing here is global.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BootstrapError, Result};

/// Default number of vnodes per node.
pub const DEFAULT_NUM_TOKENS: i64 = 256;

/// Operator settings that shape token assignment and range movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Explicit tokens, separated by commas and/or whitespace. When
    /// non-empty this wins over `num_tokens`.
    pub initial_token: String,
    /// Number of random tokens to pick when `initial_token` is empty.
    pub num_tokens: i64,
    /// Stream each range from the replica that gives it up, failing if
    /// that replica is unavailable.
    pub consistent_range_movement: bool,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            initial_token: String::new(),
            num_tokens: DEFAULT_NUM_TOKENS,
            consistent_range_movement: true,
        }
    }
}

impl BootstrapConfig {
    pub fn initial_token(&self) -> &str {
        &self.initial_token
    }

    pub fn num_tokens(&self) -> i64 {
        self.num_tokens
    }

    pub fn with_initial_token(mut self, tokens: impl Into<String>) -> Self {
        self.initial_token = tokens.into();
        self
    }

    pub fn with_num_tokens(mut self, num_tokens: i64) -> Self {
        self.num_tokens = num_tokens;
        self
    }

    pub fn with_consistent_range_movement(mut self, enabled: bool) -> Self {
        self.consistent_range_movement = enabled;
        self
    }

    /// Parses a JSON document. Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| BootstrapError::Config(format!("invalid bootstrap config: {}", e)))
    }

    /// Loads a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            BootstrapError::Config(format!("unable to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }
}
