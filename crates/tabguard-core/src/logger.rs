//! Audit log collaborator.
//!
//! Every network decision the pipeline makes is written here, allowed
//! requests included. This is separate from diagnostic `tracing` output,
//! though [`TracingLogger`] bridges the two.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::tab_context::TabId;

/// Default number of entries kept by [`MemoryLogger`].
pub const DEFAULT_LOG_CAPACITY: usize = 1000;

/// Kind of audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    /// A network request decision.
    Net,
}

impl LogKind {
    /// Returns the kind as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogKind::Net => "net",
        }
    }
}

/// One audit log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// When the decision was made.
    pub timestamp: DateTime<Utc>,
    /// Tab the request belongs to.
    pub tab_id: TabId,
    /// Entry kind.
    pub kind: LogKind,
    /// Root hostname the request was evaluated against.
    pub source_hostname: String,
    /// Request URL, possibly annotated.
    pub url: String,
    /// Request category.
    pub category: Category,
    /// Whether the request was blocked.
    pub blocked: bool,
}

impl LogEntry {
    /// Creates a network decision entry stamped with the current time.
    pub fn net(
        tab_id: TabId,
        source_hostname: &str,
        url: &str,
        category: Category,
        blocked: bool,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            tab_id,
            kind: LogKind::Net,
            source_hostname: source_hostname.to_string(),
            url: url.to_string(),
            category,
            blocked,
        }
    }
}

/// Append-only audit sink.
pub trait RequestLogger: Send + Sync {
    /// Appends one entry.
    fn write_one(&self, entry: LogEntry);
}

/// Bounded in-memory audit log. Oldest entries are evicted first.
#[derive(Debug)]
pub struct MemoryLogger {
    capacity: usize,
    entries: RwLock<VecDeque<LogEntry>>,
}

impl Default for MemoryLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLogger {
    /// Creates a logger holding up to [`DEFAULT_LOG_CAPACITY`] entries.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }

    /// Creates a logger holding up to `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: RwLock::new(VecDeque::new()),
        }
    }

    /// Returns a copy of all entries, oldest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.read().iter().cloned().collect()
    }

    /// Returns the entries written for `tab_id`.
    pub fn entries_for(&self, tab_id: TabId) -> Vec<LogEntry> {
        self.entries
            .read()
            .iter()
            .filter(|e| e.tab_id == tab_id)
            .cloned()
            .collect()
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if no entries are held.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drops all entries.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl RequestLogger for MemoryLogger {
    fn write_one(&self, entry: LogEntry) {
        let mut entries = self.entries.write();
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }
}

/// Emits every entry as a structured `tracing` event on target `tabguard::audit`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl RequestLogger for TracingLogger {
    fn write_one(&self, entry: LogEntry) {
        tracing::info!(
            target: crate::AUDIT_TARGET,
            tab = %entry.tab_id,
            kind = entry.kind.as_str(),
            source = %entry.source_hostname,
            url = %entry.url,
            category = entry.category.as_str(),
            blocked = entry.blocked,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn net_entry_fields() {
        let entry = LogEntry::net(TabId(4), "a.test", "http://cdn.test/app.js", Category::Script, false);
        assert_eq!(entry.kind, LogKind::Net);
        assert_eq!(entry.source_hostname, "a.test");
        assert!(!entry.blocked);
    }

    #[test]
    fn memory_logger_appends_in_order() {
        let logger = MemoryLogger::new();
        logger.write_one(LogEntry::net(TabId(1), "a.test", "http://a.test/", Category::Doc, false));
        logger.write_one(LogEntry::net(TabId(2), "b.test", "http://b.test/", Category::Doc, true));

        let entries = logger.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].tab_id, TabId(1));
        assert_eq!(logger.entries_for(TabId(2)).len(), 1);
    }

    #[test]
    fn memory_logger_evicts_oldest() {
        let logger = MemoryLogger::with_capacity(2);
        for i in 0..3 {
            logger.write_one(LogEntry::net(TabId(i), "a.test", "http://a.test/", Category::Doc, false));
        }
        let ids: Vec<_> = logger.entries().iter().map(|e| e.tab_id).collect();
        assert_eq!(ids, vec![TabId(1), TabId(2)]);

        logger.clear();
        assert!(logger.is_empty());
    }

    #[test]
    fn entry_serializes_kind_and_category() {
        let entry = LogEntry::net(TabId(1), "a.test", "http://a.test/", Category::Doc, true);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["kind"], "net");
        assert_eq!(json["category"], "doc");
        assert_eq!(json["tab_id"], 1);
    }

    #[test]
    fn tracing_logger_accepts_entries() {
        TracingLogger.write_one(LogEntry::net(TabId(1), "a.test", "http://a.test/", Category::Doc, false));
    }
}
