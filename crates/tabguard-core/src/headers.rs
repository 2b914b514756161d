//! Ordered HTTP header collection used for request and response headers.
//!
//! Names compare ASCII case-insensitively. Values are trimmed on read, and a
//! missing header reads as the empty string so call sites stay branch-free.

use serde::{Deserialize, Serialize};

/// `Content-Security-Policy` response header.
pub const CONTENT_SECURITY_POLICY: &str = "Content-Security-Policy";
/// `Content-Type` response header.
pub const CONTENT_TYPE: &str = "Content-Type";
/// `Cookie` request header.
pub const COOKIE: &str = "Cookie";
/// `Ping-To` header carried by hyperlink-auditing beacons.
pub const PING_TO: &str = "Ping-To";
/// `Referer` request header.
pub const REFERER: &str = "Referer";
/// `User-Agent` request header.
pub const USER_AGENT: &str = "User-Agent";

/// Ordered sequence of `(name, value)` pairs.
///
/// Duplicate names are allowed; [`HeaderSet::get`] returns the first match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeaderSet {
    headers: Vec<(String, String)>,
}

impl HeaderSet {
    /// Creates an empty header set.
    pub fn new() -> Self {
        Self {
            headers: Vec::new(),
        }
    }

    /// Returns the trimmed value of the first header named `name`, or `""`.
    pub fn get(&self, name: &str) -> &str {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.trim())
            .unwrap_or("")
    }

    /// Returns the trimmed value of the last header named `name`, or `""`.
    pub fn get_last(&self, name: &str) -> &str {
        self.headers
            .iter()
            .rev()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.trim())
            .unwrap_or("")
    }

    /// Returns every trimmed value for `name`, in order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.trim())
    }

    /// Returns true if at least one header named `name` is present.
    pub fn contains(&self, name: &str) -> bool {
        self.headers.iter().any(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    /// Replaces every occurrence of `name` with a single `name: value` entry.
    ///
    /// An empty `value` removes the header. Returns true iff the header list
    /// differs from what it was before the call.
    pub fn set(&mut self, name: &str, value: &str) -> bool {
        let mut matches = self
            .headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name));
        let first = matches.next();
        let single = matches.next().is_none();

        match first {
            None if value.is_empty() => return false,
            Some((_, current)) if single && current.as_str() == value => return false,
            _ => {}
        }

        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        if !value.is_empty() {
            self.headers.push((name.to_string(), value.to_string()));
        }
        true
    }

    /// Appends a header without touching existing entries of the same name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// Removes every occurrence of `name`. Returns true if anything was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.headers.len();
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.len() != before
    }

    /// Number of header entries, duplicates included.
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Returns true if there are no headers.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Iterates over `(name, raw value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl<N, V> FromIterator<(N, V)> for HeaderSet
where
    N: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self {
            headers: iter
                .into_iter()
                .map(|(n, v)| (n.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> HeaderSet {
        HeaderSet::from_iter([
            ("Host", "shop.example.com"),
            ("cookie", " session=abc "),
            ("Accept", "*/*"),
        ])
    }

    // ==================== Lookup Tests ====================

    #[test]
    fn get_is_case_insensitive_and_trims() {
        let headers = sample();
        assert_eq!(headers.get("COOKIE"), "session=abc");
        assert_eq!(headers.get("host"), "shop.example.com");
    }

    #[test]
    fn get_missing_returns_empty() {
        assert_eq!(sample().get("Referer"), "");
        assert!(!sample().contains("referer"));
    }

    #[test]
    fn get_returns_first_duplicate() {
        let headers = HeaderSet::from_iter([("X-A", "one"), ("x-a", "two")]);
        assert_eq!(headers.get("x-a"), "one");
        assert_eq!(headers.get_all("X-A").collect::<Vec<_>>(), vec!["one", "two"]);
    }

    #[test]
    fn get_last_returns_last_duplicate() {
        let headers = HeaderSet::from_iter([
            ("Content-Type", "text/html"),
            ("content-type", " application/x-msdownload "),
        ]);
        assert_eq!(headers.get_last("CONTENT-TYPE"), "application/x-msdownload");
        assert_eq!(headers.get_last("missing"), "");
    }

    // ==================== Set Tests ====================

    #[test]
    fn set_replaces_all_occurrences() {
        let mut headers = HeaderSet::from_iter([("X-A", "one"), ("Accept", "*/*"), ("x-a", "two")]);
        assert!(headers.set("X-A", "three"));
        assert_eq!(headers.get_all("x-a").collect::<Vec<_>>(), vec!["three"]);
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn set_same_value_reports_unchanged() {
        let mut headers = sample();
        assert!(!headers.set("Accept", "*/*"));
        assert_eq!(headers, sample());
    }

    #[test]
    fn set_empty_removes_header() {
        let mut headers = sample();
        assert!(headers.set("Cookie", ""));
        assert!(!headers.contains("cookie"));
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn set_empty_on_missing_header_is_noop() {
        let mut headers = HeaderSet::from_iter([("Accept", "*/*")]);
        assert!(!headers.set("Cookie", ""));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn set_adds_missing_header() {
        let mut headers = HeaderSet::new();
        assert!(headers.set("User-Agent", "Spoofed/1.0"));
        assert_eq!(headers.get("user-agent"), "Spoofed/1.0");
    }

    // ==================== Append / Remove Tests ====================

    #[test]
    fn append_keeps_existing_entries() {
        let mut headers = HeaderSet::from_iter([(CONTENT_SECURITY_POLICY, "img-src 'self'")]);
        headers.append(CONTENT_SECURITY_POLICY, "script-src 'none'");
        let values: Vec<_> = headers.get_all("content-security-policy").collect();
        assert_eq!(values, vec!["img-src 'self'", "script-src 'none'"]);
    }

    #[test]
    fn remove_reports_whether_anything_changed() {
        let mut headers = sample();
        assert!(headers.remove("HOST"));
        assert!(!headers.remove("host"));
    }

    #[test]
    fn serializes_as_pairs() {
        let headers = HeaderSet::from_iter([("Accept", "*/*")]);
        let json = serde_json::to_string(&headers).unwrap();
        assert_eq!(json, r#"[["Accept","*/*"]]"#);

        let back: HeaderSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, headers);
    }
}
