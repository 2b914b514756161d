//! Transient description of an intercepted request.

use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::tab_context::TabId;
use crate::uri;

/// Parent frame id the host uses for top-level frames.
pub const NO_PARENT_FRAME: i64 = -1;

/// A request as delivered by the host for one lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Owning tab.
    pub tab_id: TabId,
    /// Full request URL.
    pub url: String,
    /// Hostname being contacted.
    pub hostname: String,
    /// Parent frame, negative for the top-level frame.
    pub parent_frame_id: i64,
    /// Host resource type before classification.
    pub resource_type: String,
}

impl Request {
    /// Creates a top-level-frame request, deriving the hostname from `url`.
    pub fn new(tab_id: TabId, url: impl Into<String>, resource_type: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            tab_id,
            hostname: uri::hostname_from_url(&url),
            url,
            parent_frame_id: NO_PARENT_FRAME,
            resource_type: resource_type.into(),
        }
    }

    /// Sets the parent frame.
    pub fn with_parent_frame(mut self, parent_frame_id: i64) -> Self {
        self.parent_frame_id = parent_frame_id;
        self
    }

    /// Canonical category of this request.
    pub fn category(&self) -> Category {
        Category::from_resource_type(&self.resource_type)
    }

    /// Lowercase scheme of the request URL.
    pub fn scheme(&self) -> String {
        uri::scheme_from_url(&self.url)
    }

    /// Returns true if the request was issued by the top-level frame.
    pub fn is_top_level(&self) -> bool {
        self.parent_frame_id < 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_derives_hostname_and_scheme() {
        let request = Request::new(TabId(1), "https://CDN.test/app.js", "script");
        assert_eq!(request.hostname, "cdn.test");
        assert_eq!(request.scheme(), "https");
        assert_eq!(request.category(), Category::Script);
        assert!(request.is_top_level());
    }

    #[test]
    fn parent_frame_marks_nested_request() {
        let request = Request::new(TabId(1), "http://a.test/", "main_frame").with_parent_frame(0);
        assert!(!request.is_top_level());
    }
}
