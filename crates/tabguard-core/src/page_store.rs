//! Per-tab page statistics collaborator.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::Serialize;

use crate::category::Category;
use crate::tab_context::TabId;

/// Per-tab accumulation of request outcomes.
///
/// The pipeline only reports into it; storage is the implementation's business.
pub trait PageStore: Send + Sync {
    /// Associates `tab_id` with the page at `page_url`.
    fn bind_tab(&self, tab_id: TabId, page_url: &str);

    /// Records the outcome of one request.
    fn record_request(&self, tab_id: TabId, category: Category, url: &str, blocked: bool);

    /// Records whether script execution is forbidden for the whole page.
    fn set_page_script_blocked(&self, tab_id: TabId, blocked: bool);

    /// Takes a snapshot of the cookies set by the page load.
    fn record_page_cookies(&self, tab_id: TabId);

    /// Undoes the most recent [`PageStore::bind_tab`] if it bound `page_url`,
    /// restoring the page that was bound before it.
    fn rollback_tab(&self, tab_id: TabId, page_url: &str);

    /// Drops everything kept for a closed tab.
    fn discard_tab(&self, tab_id: TabId);
}

/// One recorded request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedRequest {
    /// Request category.
    pub category: Category,
    /// Request URL, possibly annotated.
    pub url: String,
    /// Whether the request was blocked.
    pub blocked: bool,
}

/// Statistics for the page currently bound to a tab.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageStats {
    /// URL of the bound page.
    pub page_url: String,
    /// Requests in the order they were recorded.
    pub requests: Vec<RecordedRequest>,
    /// Whether script was forbidden for the page.
    pub script_blocked: bool,
    /// Number of cookie snapshots taken.
    pub cookie_snapshots: u32,
}

impl PageStats {
    fn for_page(page_url: &str) -> Self {
        Self {
            page_url: page_url.to_string(),
            ..Self::default()
        }
    }

    /// Number of allowed requests.
    pub fn allowed_count(&self) -> usize {
        self.requests.iter().filter(|r| !r.blocked).count()
    }

    /// Number of blocked requests.
    pub fn blocked_count(&self) -> usize {
        self.requests.iter().filter(|r| r.blocked).count()
    }

    /// Number of requests in `category` with the given outcome.
    pub fn count(&self, category: Category, blocked: bool) -> usize {
        self.requests
            .iter()
            .filter(|r| r.category == category && r.blocked == blocked)
            .count()
    }
}

/// What the most recent bind did, so it can be undone.
#[derive(Debug, Default)]
enum LastBind {
    /// The page was already bound.
    #[default]
    Unchanged,
    /// The bind replaced these statistics.
    Replaced(PageStats),
    /// The bind created the tab's first page.
    Created,
}

/// Statistics of one tab.
#[derive(Debug, Default)]
struct TabPages {
    current: PageStats,
    last_bind: LastBind,
}

/// In-memory [`PageStore`].
#[derive(Debug, Default)]
pub struct MemoryPageStore {
    tabs: RwLock<HashMap<TabId, TabPages>>,
}

impl MemoryPageStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the statistics for `tab_id`.
    pub fn stats(&self, tab_id: TabId) -> Option<PageStats> {
        self.tabs.read().get(&tab_id).map(|t| t.current.clone())
    }

    /// Number of tabs with statistics.
    pub fn len(&self) -> usize {
        self.tabs.read().len()
    }

    /// Returns true if no tab has statistics.
    pub fn is_empty(&self) -> bool {
        self.tabs.read().is_empty()
    }
}

impl PageStore for MemoryPageStore {
    fn bind_tab(&self, tab_id: TabId, page_url: &str) {
        let mut tabs = self.tabs.write();
        let Some(pages) = tabs.get_mut(&tab_id) else {
            tabs.insert(
                tab_id,
                TabPages {
                    current: PageStats::for_page(page_url),
                    last_bind: LastBind::Created,
                },
            );
            return;
        };
        if pages.current.page_url == page_url {
            pages.last_bind = LastBind::Unchanged;
            return;
        }
        let replaced = std::mem::replace(&mut pages.current, PageStats::for_page(page_url));
        pages.last_bind = LastBind::Replaced(replaced);
    }

    fn record_request(&self, tab_id: TabId, category: Category, url: &str, blocked: bool) {
        self.tabs
            .write()
            .entry(tab_id)
            .or_default()
            .current
            .requests
            .push(RecordedRequest {
                category,
                url: url.to_string(),
                blocked,
            });
    }

    fn set_page_script_blocked(&self, tab_id: TabId, blocked: bool) {
        if let Some(pages) = self.tabs.write().get_mut(&tab_id) {
            pages.current.script_blocked = blocked;
        }
    }

    fn record_page_cookies(&self, tab_id: TabId) {
        if let Some(pages) = self.tabs.write().get_mut(&tab_id) {
            pages.current.cookie_snapshots += 1;
        }
    }

    fn rollback_tab(&self, tab_id: TabId, page_url: &str) {
        let mut tabs = self.tabs.write();
        let Some(pages) = tabs.get_mut(&tab_id) else {
            return;
        };
        if pages.current.page_url != page_url {
            return;
        }
        match std::mem::take(&mut pages.last_bind) {
            LastBind::Replaced(previous) => {
                pages.current = previous;
                tracing::debug!(tab = %tab_id, page_url, "restored page stats");
            }
            LastBind::Created => {
                tabs.remove(&tab_id);
            }
            LastBind::Unchanged => {}
        }
    }

    fn discard_tab(&self, tab_id: TabId) {
        self.tabs.write().remove(&tab_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAB: TabId = TabId(1);

    #[test]
    fn records_requests_per_tab() {
        let store = MemoryPageStore::new();
        store.bind_tab(TAB, "http://a.test/");
        store.record_request(TAB, Category::Script, "http://cdn.test/app.js", false);
        store.record_request(TAB, Category::Image, "http://ads.test/px.gif", true);

        let stats = store.stats(TAB).unwrap();
        assert_eq!(stats.page_url, "http://a.test/");
        assert_eq!(stats.allowed_count(), 1);
        assert_eq!(stats.blocked_count(), 1);
        assert_eq!(stats.count(Category::Image, true), 1);
        assert!(store.stats(TabId(2)).is_none());
    }

    #[test]
    fn binding_a_new_page_resets_stats() {
        let store = MemoryPageStore::new();
        store.bind_tab(TAB, "http://a.test/");
        store.record_request(TAB, Category::Doc, "http://a.test/", false);
        store.bind_tab(TAB, "http://a.test/");
        assert_eq!(store.stats(TAB).unwrap().requests.len(), 1);

        store.bind_tab(TAB, "http://b.test/");
        assert!(store.stats(TAB).unwrap().requests.is_empty());
    }

    #[test]
    fn script_flag_and_cookie_snapshots() {
        let store = MemoryPageStore::new();
        store.bind_tab(TAB, "http://a.test/");
        store.set_page_script_blocked(TAB, true);
        store.record_page_cookies(TAB);

        let stats = store.stats(TAB).unwrap();
        assert!(stats.script_blocked);
        assert_eq!(stats.cookie_snapshots, 1);
    }

    #[test]
    fn rollback_restores_replaced_page() {
        let store = MemoryPageStore::new();
        store.bind_tab(TAB, "http://home.test/");
        store.record_request(TAB, Category::Script, "http://home.test/app.js", false);
        store.bind_tab(TAB, "http://a.test/file.exe");
        store.record_request(TAB, Category::Doc, "http://a.test/file.exe", false);

        store.rollback_tab(TAB, "http://a.test/file.exe");

        let stats = store.stats(TAB).unwrap();
        assert_eq!(stats.page_url, "http://home.test/");
        assert_eq!(stats.requests.len(), 1);
        assert_eq!(stats.requests[0].url, "http://home.test/app.js");
    }

    #[test]
    fn rollback_of_other_page_is_noop() {
        let store = MemoryPageStore::new();
        store.bind_tab(TAB, "http://home.test/");
        store.bind_tab(TAB, "http://a.test/");

        store.rollback_tab(TAB, "http://b.test/file.exe");
        assert_eq!(store.stats(TAB).unwrap().page_url, "http://a.test/");
    }

    #[test]
    fn rollback_after_rebinding_same_page_keeps_stats() {
        let store = MemoryPageStore::new();
        store.bind_tab(TAB, "http://home.test/");
        store.bind_tab(TAB, "http://a.test/report");
        store.record_request(TAB, Category::Image, "http://a.test/chart.png", false);
        store.bind_tab(TAB, "http://a.test/report");

        store.rollback_tab(TAB, "http://a.test/report");

        let stats = store.stats(TAB).unwrap();
        assert_eq!(stats.page_url, "http://a.test/report");
        assert_eq!(stats.requests.len(), 1);
    }

    #[test]
    fn rollback_of_first_page_drops_tab() {
        let store = MemoryPageStore::new();
        store.bind_tab(TAB, "http://a.test/setup.bin");
        store.rollback_tab(TAB, "http://a.test/setup.bin");
        assert!(store.stats(TAB).is_none());
    }

    #[test]
    fn discard_drops_tab() {
        let store = MemoryPageStore::new();
        store.bind_tab(TAB, "http://a.test/");
        store.bind_tab(TabId(2), "http://b.test/");

        store.discard_tab(TAB);

        assert!(store.stats(TAB).is_none());
        assert_eq!(store.len(), 1);
    }
}
