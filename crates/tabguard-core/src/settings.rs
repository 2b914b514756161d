//! User settings read by the pipeline at dispatch time.

use serde::{Deserialize, Serialize};

/// Replacement `User-Agent` used when none is configured.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Read-only view of user settings.
pub trait UserSettings: Send + Sync {
    /// When true, hyperlink-auditing beacons are cancelled.
    fn process_hyperlink_auditing(&self) -> bool;

    /// Value written to `User-Agent` when the `ua-spoof` switch is on.
    fn user_agent_replace_str(&self) -> String;
}

/// Plain settings value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Cancel hyperlink-auditing beacons.
    pub process_hyperlink_auditing: bool,
    /// Replacement `User-Agent` string.
    pub user_agent_replace_str: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            process_hyperlink_auditing: true,
            user_agent_replace_str: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl UserSettings for Settings {
    fn process_hyperlink_auditing(&self) -> bool {
        self.process_hyperlink_auditing
    }

    fn user_agent_replace_str(&self) -> String {
        self.user_agent_replace_str.clone()
    }
}
