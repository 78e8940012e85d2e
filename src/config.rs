//! Client configuration
//!
//! Every field has a default matching the stock backend, so a page that
//! ships no config at all still works. A page can override any subset by
//! embedding a JSON object:
//!
//! ```html
//! <script type="application/json" id="calcboard-config">
//!   { "poll_interval_ms": 1000, "show_user_banner": true }
//! </script>
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Id of the optional config element in the page
pub const CONFIG_ELEMENT_ID: &str = "calcboard-config";

/// Text prefixes for each rendered field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    pub id: String,
    pub status: String,
    pub expression: String,
    pub result: String,
    /// Status shown on a placeholder before the server lists the task
    pub submitted: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            id: "ID: ".to_string(),
            status: "Status: ".to_string(),
            expression: "Expression: ".to_string(),
            result: "Result: ".to_string(),
            submitted: "Submitted".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub expressions_url: String,
    pub calculate_url: String,
    pub user_url: String,
    /// Where to send the browser when the backend answers 401
    pub auth_url: String,
    pub poll_interval_ms: u32,
    pub container_id: String,
    pub input_id: String,
    pub show_user_banner: bool,
    /// Applied snapshots a placeholder survives without a matching task
    pub tentative_ttl_cycles: u32,
    /// Client ids are drawn from `[0, max_client_id)`
    pub max_client_id: u32,
    pub labels: Labels,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            expressions_url: "/api/v1/expressions".to_string(),
            calculate_url: "/api/v1/calculate".to_string(),
            user_url: "/user".to_string(),
            auth_url: "/auth".to_string(),
            poll_interval_ms: 500,
            container_id: "tasks-container".to_string(),
            input_id: "expression".to_string(),
            show_user_banner: false,
            tentative_ttl_cycles: 10,
            max_client_id: 1_000_000,
            labels: Labels::default(),
        }
    }
}

impl ClientConfig {
    /// Parse a (possibly partial) JSON config and validate it
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll_interval_ms must be > 0".into()));
        }
        if self.max_client_id == 0 {
            return Err(ConfigError::Invalid("max_client_id must be > 0".into()));
        }
        Ok(())
    }
}
