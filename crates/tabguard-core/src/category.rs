//! Request categories shared by the policy oracle, page store, and audit log.

use serde::{Deserialize, Serialize};

/// Canonical request category.
///
/// Rule matrices and audit logs are keyed on these names, so the string forms
/// returned by [`Category::as_str`] must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Top-level document.
    Doc,
    /// Nested document (iframe).
    Frame,
    /// Script.
    Script,
    /// Stylesheet or font.
    Css,
    /// Image.
    Image,
    /// XMLHttpRequest / fetch.
    Xhr,
    /// Plugin object.
    Plugin,
    /// Hyperlink-auditing beacon.
    Ping,
    /// Anything else.
    Other,
    /// Cookie header. Policy-only; never produced by classification.
    Cookie,
}

impl Category {
    /// Returns every category a request can be classified into.
    pub fn all() -> &'static [Category] {
        &[
            Category::Doc,
            Category::Frame,
            Category::Script,
            Category::Css,
            Category::Image,
            Category::Xhr,
            Category::Plugin,
            Category::Ping,
            Category::Other,
        ]
    }

    /// Returns the stable string form of this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Doc => "doc",
            Category::Frame => "frame",
            Category::Script => "script",
            Category::Css => "css",
            Category::Image => "image",
            Category::Xhr => "xhr",
            Category::Plugin => "plugin",
            Category::Ping => "ping",
            Category::Other => "other",
            Category::Cookie => "cookie",
        }
    }

    /// Parses the stable string form back into a category.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "doc" => Some(Category::Doc),
            "frame" => Some(Category::Frame),
            "script" => Some(Category::Script),
            "css" => Some(Category::Css),
            "image" => Some(Category::Image),
            "xhr" => Some(Category::Xhr),
            "plugin" => Some(Category::Plugin),
            "ping" => Some(Category::Ping),
            "other" => Some(Category::Other),
            "cookie" => Some(Category::Cookie),
            _ => None,
        }
    }

    /// Maps a host resource type (`main_frame`, `stylesheet`, ...) to a category.
    ///
    /// Unrecognized types degrade to [`Category::Other`].
    pub fn from_resource_type(resource_type: &str) -> Self {
        match resource_type {
            "main_frame" => Category::Doc,
            "sub_frame" => Category::Frame,
            "script" => Category::Script,
            "stylesheet" | "font" => Category::Css,
            "image" => Category::Image,
            "xmlhttprequest" => Category::Xhr,
            "object" => Category::Plugin,
            "ping" => Category::Ping,
            _ => Category::Other,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
