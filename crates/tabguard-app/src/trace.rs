//! Recorded lifecycle events.
//!
//! A trace is a JSON array of events in the order the host delivered them:
//!
//! ```json
//! [
//!   { "phase": "before_request", "tab_id": 1, "url": "https://a.test/", "type": "main_frame" },
//!   { "phase": "headers_received", "tab_id": 1, "url": "https://a.test/", "type": "main_frame",
//!     "headers": [["Content-Type", "text/html"]] },
//!   { "phase": "tab_closed", "tab_id": 1 }
//! ]
//! ```

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tabguard_core::request::NO_PARENT_FRAME;
use tabguard_core::{HeaderSet, Request, TabId};

/// Lifecycle event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    BeforeRequest,
    BeforeSendHeaders,
    HeadersReceived,
    TabClosed,
}

/// One recorded event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEvent {
    pub phase: Phase,
    pub tab_id: TabId,
    #[serde(default)]
    pub url: String,
    #[serde(default, rename = "type")]
    pub resource_type: String,
    #[serde(default = "no_parent_frame")]
    pub parent_frame_id: i64,
    #[serde(default)]
    pub headers: HeaderSet,
}

fn no_parent_frame() -> i64 {
    NO_PARENT_FRAME
}

impl TraceEvent {
    /// The request this event refers to.
    pub fn request(&self) -> Request {
        Request::new(self.tab_id, self.url.as_str(), self.resource_type.as_str())
            .with_parent_frame(self.parent_frame_id)
    }
}

/// Reads a trace file.
pub fn load_trace(path: &Path) -> anyhow::Result<Vec<TraceEvent>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read trace {}", path.display()))?;
    parse_trace(&raw).with_context(|| format!("invalid trace {}", path.display()))
}

/// Parses a trace from JSON text.
pub fn parse_trace(raw: &str) -> anyhow::Result<Vec<TraceEvent>> {
    Ok(serde_json::from_str(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tabguard_core::Category;

    #[test]
    fn parses_full_event() {
        let events = parse_trace(
            r#"[{
                "phase": "before_send_headers",
                "tab_id": 3,
                "url": "https://cdn.test/lib.js",
                "type": "script",
                "parent_frame_id": 0,
                "headers": [["Cookie", "a=1"], ["Accept", "*/*"]]
            }]"#,
        )
        .unwrap();

        let event = &events[0];
        assert_eq!(event.phase, Phase::BeforeSendHeaders);
        assert_eq!(event.headers.get("cookie"), "a=1");

        let request = event.request();
        assert_eq!(request.tab_id, TabId(3));
        assert_eq!(request.hostname, "cdn.test");
        assert_eq!(request.category(), Category::Script);
        assert!(!request.is_top_level());
    }

    #[test]
    fn optional_fields_default() {
        let events = parse_trace(r#"[{ "phase": "tab_closed", "tab_id": 9 }]"#).unwrap();
        assert_eq!(events[0].parent_frame_id, NO_PARENT_FRAME);
        assert!(events[0].headers.is_empty());
        assert!(events[0].url.is_empty());
    }

    #[test]
    fn unknown_phase_is_rejected() {
        assert!(parse_trace(r#"[{ "phase": "on_completed", "tab_id": 1 }]"#).is_err());
    }

    #[test]
    fn load_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = load_trace(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("invalid trace"));
    }
}
