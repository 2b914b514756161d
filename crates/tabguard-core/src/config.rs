//! Pipeline configuration.

use serde::{Deserialize, Serialize};

/// Explanatory page shown in place of a blocked top-level document.
pub const DEFAULT_BLOCKED_PAGE_URL: &str = "tabguard-extension://main-blocked.html";

/// Policy appended to responses whose inline script must not run.
pub const DEFAULT_INLINE_SCRIPT_CSP: &str = "script-src 'none'";

/// Query parameter carrying the blocked-page token.
pub const DETAILS_PARAM: &str = "details";

/// Tunables of the interception pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Base URL of the explanatory page for blocked navigations.
    pub blocked_page_url: String,
    /// `Content-Security-Policy` value used to forbid script.
    pub inline_script_csp: String,
    /// `Content-Type` prefixes that mark a main-frame response as a download.
    pub download_content_types: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            blocked_page_url: DEFAULT_BLOCKED_PAGE_URL.to_string(),
            inline_script_csp: DEFAULT_INLINE_SCRIPT_CSP.to_string(),
            download_content_types: vec![
                "application/x-".to_string(),
                "application/octet-stream".to_string(),
            ],
        }
    }
}

impl PipelineConfig {
    /// Builds the redirect target for a blocked navigation.
    pub fn blocked_page_url_for(&self, token: &str) -> String {
        let separator = if self.blocked_page_url.contains('?') {
            '&'
        } else {
            '?'
        };
        format!(
            "{}{}{}={}",
            self.blocked_page_url, separator, DETAILS_PARAM, token
        )
    }

    /// Returns true if `content_type` denotes a file download.
    pub fn is_download(&self, content_type: &str) -> bool {
        let content_type = content_type.trim().to_ascii_lowercase();
        self.download_content_types
            .iter()
            .any(|prefix| content_type.starts_with(prefix.as_str()))
    }
}
