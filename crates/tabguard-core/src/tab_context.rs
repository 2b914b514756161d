//! Per-tab navigation context.
//!
//! Every request is attributed to the hostname of the top-level document
//! committed in its tab. A top-level navigation is first pushed as a
//! *candidate*; the candidate is either committed once the response turns out
//! to be a document, or rolled back with [`TabContextManager::unpush`] when it
//! turns out to be a file download.
//!
//! ```
//! use tabguard_core::tab_context::{TabContextManager, TabId};
//!
//! let mut tabs = TabContextManager::new();
//! let tab = TabId(7);
//!
//! tabs.push(tab, "https://home.test/");
//! tabs.commit(tab, "https://home.test/");
//! tabs.push(tab, "https://home.test/setup.exe");
//! tabs.unpush(tab, "https://home.test/setup.exe");
//!
//! assert_eq!(tabs.must_lookup(tab).unwrap().root_url(), "https://home.test/");
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::uri;

/// Committed navigations kept per tab for rollback.
pub const MAX_HISTORY: usize = 8;

/// Host-assigned tab identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub i64);

impl TabId {
    /// Identifier the host uses for requests that belong to no tab.
    pub const BEHIND_THE_SCENE: TabId = TabId(-1);

    /// Returns true if this identifier can denote a real tab.
    pub fn is_tab(&self) -> bool {
        self.0 >= 0
    }
}

impl std::fmt::Display for TabId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tab context lookup errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TabContextError {
    /// The identifier can never have a context.
    #[error("tab {0} is not a browser tab")]
    NotATab(TabId),

    /// The tab exists but no navigation has been pushed for it.
    #[error("no navigation context for tab {0}")]
    Missing(TabId),
}

/// Result type for tab context operations.
pub type Result<T> = std::result::Result<T, TabContextError>;

/// One top-level navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationEntry {
    /// Document URL.
    pub url: String,
    /// Hostname derived from `url`.
    pub hostname: String,
    /// Whether `url` uses a secure scheme.
    pub secure: bool,
    /// False while the navigation is still a candidate.
    pub committed: bool,
    /// Pushes of this same URL absorbed since the entry was created or committed.
    #[serde(skip)]
    repeated_pushes: u32,
}

impl NavigationEntry {
    fn candidate(url: &str) -> Self {
        Self {
            url: url.to_string(),
            hostname: uri::hostname_from_url(url),
            secure: uri::is_secure_scheme(&uri::scheme_from_url(url)),
            committed: false,
            repeated_pushes: 0,
        }
    }
}

/// Navigation state of a single tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabContext {
    tab_id: TabId,
    stack: Vec<NavigationEntry>,
}

impl TabContext {
    fn new(tab_id: TabId) -> Self {
        Self {
            tab_id,
            stack: Vec::new(),
        }
    }

    /// The owning tab.
    pub fn tab_id(&self) -> TabId {
        self.tab_id
    }

    /// Hostname of the current top-level document, `""` if unset.
    pub fn root_hostname(&self) -> &str {
        self.current().map(|e| e.hostname.as_str()).unwrap_or("")
    }

    /// URL of the current top-level document, `""` if unset.
    pub fn root_url(&self) -> &str {
        self.current().map(|e| e.url.as_str()).unwrap_or("")
    }

    /// Whether the current top-level document was loaded over a secure scheme.
    pub fn secure(&self) -> bool {
        self.current().map(|e| e.secure).unwrap_or(false)
    }

    /// Returns true if the current root is a candidate not yet committed.
    pub fn is_pending(&self) -> bool {
        self.current().map(|e| !e.committed).unwrap_or(false)
    }

    /// The current top-level navigation.
    pub fn current(&self) -> Option<&NavigationEntry> {
        self.stack.last()
    }

    /// Number of navigations remembered for this tab.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn push(&mut self, url: &str) -> bool {
        match self.stack.last_mut() {
            Some(top) if top.url == url => {
                top.repeated_pushes += 1;
                return false;
            }
            Some(top) if !top.committed => {
                *top = NavigationEntry::candidate(url);
                return true;
            }
            _ => {}
        }
        self.stack.push(NavigationEntry::candidate(url));
        if self.stack.len() > MAX_HISTORY {
            let excess = self.stack.len() - MAX_HISTORY;
            self.stack.drain(..excess);
        }
        true
    }

    /// Only the push that created the top entry can remove it; a repeated
    /// push of the same URL is reverted by consuming its count.
    fn unpush(&mut self, url: &str) -> bool {
        let Some(top) = self.stack.last_mut() else {
            return false;
        };
        if top.url != url {
            return false;
        }
        if top.repeated_pushes > 0 {
            top.repeated_pushes -= 1;
            return true;
        }
        if top.committed {
            return false;
        }
        self.stack.pop();
        true
    }

    fn commit(&mut self, url: &str) {
        let is_top = self.current().map_or(false, |top| top.url == url);
        if !is_top {
            self.push(url);
        }
        if let Some(top) = self.stack.last_mut() {
            top.committed = true;
            top.repeated_pushes = 0;
        }
    }
}

/// Owns the navigation context of every live tab.
#[derive(Debug, Default)]
pub struct TabContextManager {
    contexts: HashMap<TabId, TabContext>,
}

impl TabContextManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self {
            contexts: HashMap::new(),
        }
    }

    /// Records `url` as the candidate top-level navigation of `tab_id`.
    ///
    /// Replaces an uncommitted candidate. Pushing the current candidate again
    /// is a no-op. Returns true if the context changed.
    pub fn push(&mut self, tab_id: TabId, url: &str) -> bool {
        let changed = self
            .contexts
            .entry(tab_id)
            .or_insert_with(|| TabContext::new(tab_id))
            .push(url);
        if changed {
            tracing::debug!(tab = %tab_id, url, "pushed navigation candidate");
        }
        changed
    }

    /// Finalizes `url` as the committed root of `tab_id`, pushing it first if needed.
    pub fn commit(&mut self, tab_id: TabId, url: &str) {
        self.contexts
            .entry(tab_id)
            .or_insert_with(|| TabContext::new(tab_id))
            .commit(url);
    }

    /// Reverts the most recent push if it was for `url`; no-op otherwise.
    ///
    /// A tab left with no navigation loses its context entirely. Returns true
    /// if anything was reverted.
    pub fn unpush(&mut self, tab_id: TabId, url: &str) -> bool {
        let Some(context) = self.contexts.get_mut(&tab_id) else {
            return false;
        };
        if !context.unpush(url) {
            return false;
        }
        tracing::debug!(tab = %tab_id, url, "reverted navigation candidate");
        if context.depth() == 0 {
            self.contexts.remove(&tab_id);
        }
        true
    }

    /// Returns the context of `tab_id`, if any.
    pub fn lookup(&self, tab_id: TabId) -> Option<&TabContext> {
        self.contexts.get(&tab_id)
    }

    /// Returns the context of `tab_id`, which the caller guarantees exists.
    ///
    /// Failure is a contract violation by the caller, never a condition to
    /// paper over with a default root.
    pub fn must_lookup(&self, tab_id: TabId) -> Result<&TabContext> {
        if !tab_id.is_tab() {
            return Err(TabContextError::NotATab(tab_id));
        }
        self.contexts
            .get(&tab_id)
            .ok_or(TabContextError::Missing(tab_id))
    }

    /// Discards the context of a closed tab.
    pub fn remove(&mut self, tab_id: TabId) -> Option<TabContext> {
        self.contexts.remove(&tab_id)
    }

    /// Number of tabs with a context.
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    /// Returns true if no tab has a context.
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}
