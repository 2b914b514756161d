//! Inline-script suppression through an injected `Content-Security-Policy`.
//!
//! Once a document response has arrived, cancelling is no longer possible, so
//! script is forbidden by appending a restrictive policy header. The header is
//! appended rather than set: policies from the origin server stay in force and
//! browsers enforce the intersection of all of them.

use crate::headers::{HeaderSet, CONTENT_SECURITY_POLICY};

/// Suffix marking a synthetic audit entry for suppressed inline script.
pub const INLINE_SCRIPT_MARKER: &str = "{inline_script}";

/// Returns `url` annotated as an inline-script audit entry.
pub fn inline_script_url(url: &str) -> String {
    format!("{}{}", url, INLINE_SCRIPT_MARKER)
}

/// Appends `policy` as an additional `Content-Security-Policy` header.
pub fn forbid_inline_script(headers: &mut HeaderSet, policy: &str) {
    headers.append(CONTENT_SECURITY_POLICY, policy);
}
