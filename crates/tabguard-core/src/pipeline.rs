//! Three-phase request interception pipeline.
//!
//! The host delivers up to three events per request, always in this order:
//!
//! ```text
//! before_request ──► before_send_headers ──► headers_received
//!  (cancel/redirect)   (cancel/mutate req)     (mutate response, doc/frame only)
//! ```
//!
//! - **Before request** classifies the request and asks the policy oracle.
//!   Top-level documents push a navigation candidate first, and a blocked one
//!   is redirected to the explanatory page instead of being cancelled.
//! - **Before send headers** cancels foiled hyperlink-auditing beacons and
//!   sanitizes outgoing headers.
//! - **Headers received** settles the navigation candidate and injects a
//!   script-forbidding CSP into documents and frames the policy denies script.
//!
//! Every phase is a plain method returning a [`Verdict`]; all state lives in
//! the [`Pipeline`] and collaborators are injected through [`Collaborators`].

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::blocked::{BlockedDetails, BlockedDetailsError};
use crate::category::Category;
use crate::config::PipelineConfig;
use crate::csp;
use crate::headers::{HeaderSet, CONTENT_TYPE, PING_TO};
use crate::logger::{LogEntry, RequestLogger};
use crate::page_store::PageStore;
use crate::policy::{PolicyOracle, Switch};
use crate::request::Request;
use crate::sanitizer;
use crate::settings::UserSettings;
use crate::tab_context::{TabContext, TabContextError, TabContextManager, TabId};
use crate::uri;

/// Scheme of in-browser virtual filesystem URLs, which are never enforced on.
const FILESYSTEM_SCHEME: &str = "filesystem";

/// Pipeline errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A tab context the event depends on does not exist.
    #[error(transparent)]
    TabContext(#[from] TabContextError),

    /// The blocked-page token could not be built.
    #[error("failed to encode blocked-page token: {0}")]
    Token(#[from] BlockedDetailsError),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Outcome of one lifecycle event, returned to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Verdict {
    /// Let the request continue unmodified.
    Proceed,
    /// Cancel the request.
    Cancel,
    /// Cancel the request and load `url` in the tab instead.
    Redirect {
        /// Tab whose content is replaced.
        tab_id: TabId,
        /// Replacement URL.
        url: String,
    },
    /// Send the request with these headers.
    RequestHeaders {
        /// Full outgoing header set.
        headers: HeaderSet,
    },
    /// Deliver the response with these headers.
    ResponseHeaders {
        /// Full response header set.
        headers: HeaderSet,
    },
}

impl Verdict {
    /// Returns true if the request does not reach its destination.
    pub fn is_cancel(&self) -> bool {
        matches!(self, Verdict::Cancel | Verdict::Redirect { .. })
    }

    /// Returns true if the request passes through unmodified.
    pub fn is_proceed(&self) -> bool {
        matches!(self, Verdict::Proceed)
    }
}

/// Diagnostic counters. Each only increments when its action took effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    /// Hyperlink-auditing beacons cancelled.
    pub hyperlink_auditing_foiled: u64,
    /// `Cookie` headers removed.
    pub cookie_header_foiled: u64,
    /// `Referer` headers rewritten.
    pub referer_header_foiled: u64,
    /// `User-Agent` headers replaced.
    pub user_agent_spoofed: u64,
}

/// External components the pipeline reports to and queries.
#[derive(Clone)]
pub struct Collaborators {
    /// Rule matrix.
    pub oracle: Arc<dyn PolicyOracle>,
    /// Per-tab statistics.
    pub page_store: Arc<dyn PageStore>,
    /// Audit sink.
    pub logger: Arc<dyn RequestLogger>,
    /// User settings.
    pub settings: Arc<dyn UserSettings>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("oracle", &"PolicyOracle")
            .field("page_store", &"PageStore")
            .field("logger", &"RequestLogger")
            .field("settings", &"UserSettings")
            .finish()
    }
}

/// The interception state machine.
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    collaborators: Collaborators,
    tabs: TabContextManager,
    counters: Counters,
}

impl Pipeline {
    /// Creates a pipeline with no tab state.
    pub fn new(config: PipelineConfig, collaborators: Collaborators) -> Self {
        Self {
            config,
            collaborators,
            tabs: TabContextManager::new(),
            counters: Counters::default(),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Diagnostic counters so far.
    pub fn counters(&self) -> Counters {
        self.counters
    }

    /// Navigation contexts of all tabs.
    pub fn tabs(&self) -> &TabContextManager {
        &self.tabs
    }

    /// Discards the navigation context and page statistics of a closed tab.
    pub fn on_tab_closed(&mut self, tab_id: TabId) {
        if self.tabs.remove(tab_id).is_some() {
            tracing::debug!(tab = %tab_id, "discarded tab context");
        }
        self.collaborators.page_store.discard_tab(tab_id);
    }

    // ==================== Phase 1: before request ====================

    /// Decides whether a request may start.
    pub fn on_before_request(&mut self, request: &Request) -> Result<Verdict> {
        let scheme = request.scheme();
        if scheme == FILESYSTEM_SCHEME {
            return Ok(Verdict::Proceed);
        }

        let category = request.category();
        if category == Category::Doc && request.is_top_level() {
            return self.on_before_root_frame_request(request);
        }

        if !uri::is_network_scheme(&scheme) {
            return Ok(Verdict::Proceed);
        }

        let context = must_lookup(&self.tabs, request.tab_id)?;
        let root_hostname = context.root_hostname().to_string();
        let root_secure = context.secure();

        let oracle = &self.collaborators.oracle;
        let block = (root_secure
            && !uri::is_secure_scheme(&scheme)
            && oracle.evaluate_switch(Switch::HttpsStrict, &root_hostname))
            || oracle.must_block(&root_hostname, &request.hostname, category);

        self.record(request.tab_id, &root_hostname, category, &request.url, block);

        if block {
            tracing::info!(
                tab = %request.tab_id,
                root = %root_hostname,
                url = %request.url,
                category = category.as_str(),
                "blocked request"
            );
            return Ok(Verdict::Cancel);
        }
        Ok(Verdict::Proceed)
    }

    fn on_before_root_frame_request(&mut self, request: &Request) -> Result<Verdict> {
        let tab_id = request.tab_id;
        self.tabs.push(tab_id, &request.url);
        let root_hostname = must_lookup(&self.tabs, tab_id)?.root_hostname().to_string();

        self.collaborators.page_store.bind_tab(tab_id, &request.url);

        let block = self
            .collaborators
            .oracle
            .must_block(&root_hostname, &root_hostname, Category::Doc);

        self.record(tab_id, &root_hostname, Category::Doc, &request.url, block);

        if !block {
            self.collaborators.page_store.record_page_cookies(tab_id);
            return Ok(Verdict::Proceed);
        }

        let token = BlockedDetails::new(&request.url, &request.hostname).encode()?;
        let url = self.config.blocked_page_url_for(&token);
        tracing::info!(tab = %tab_id, url = %request.url, "blocked top-level navigation");
        Ok(Verdict::Redirect { tab_id, url })
    }

    // ==================== Phase 2: before send headers ====================

    /// Cancels hyperlink auditing and sanitizes outgoing headers.
    pub fn on_before_send_headers(
        &mut self,
        request: &Request,
        mut headers: HeaderSet,
    ) -> Result<Verdict> {
        let tab_id = request.tab_id;
        let page_hostname = must_lookup(&self.tabs, tab_id)?.root_hostname().to_string();

        if request.category() == Category::Ping {
            let ping_to = headers.get(PING_TO).to_string();
            if !ping_to.is_empty() {
                let block = self.collaborators.settings.process_hyperlink_auditing();
                // The beacon has no source of its own: the page store files it
                // under `other` and the log entry carries no source hostname.
                let annotated = format!("{}{{Ping-To:{}}}", request.url, ping_to);
                self.collaborators
                    .page_store
                    .record_request(tab_id, Category::Other, &annotated, block);
                self.collaborators.logger.write_one(LogEntry::net(
                    tab_id,
                    "",
                    &annotated,
                    Category::Ping,
                    block,
                ));
                if block {
                    self.counters.hyperlink_auditing_foiled += 1;
                    tracing::info!(tab = %tab_id, url = %request.url, ping_to = %ping_to, "foiled hyperlink auditing");
                    return Ok(Verdict::Cancel);
                }
            }
        }

        let outcome = sanitizer::sanitize_request_headers(
            self.collaborators.oracle.as_ref(),
            self.collaborators.settings.as_ref(),
            &page_hostname,
            request,
            &mut headers,
        );
        if outcome.cookie_stripped {
            self.counters.cookie_header_foiled += 1;
        }
        if outcome.referer_spoofed {
            self.counters.referer_header_foiled += 1;
        }
        if outcome.user_agent_spoofed {
            self.counters.user_agent_spoofed += 1;
        }

        if outcome.changed() {
            Ok(Verdict::RequestHeaders { headers })
        } else {
            Ok(Verdict::Proceed)
        }
    }

    // ==================== Phase 3: headers received ====================

    /// Settles navigation state and injects CSP into document responses.
    pub fn on_headers_received(&mut self, request: &Request, headers: HeaderSet) -> Result<Verdict> {
        if !uri::is_network_scheme(&request.scheme()) {
            return Ok(Verdict::Proceed);
        }
        let verdict = match request.category() {
            Category::Doc => self.on_main_doc_headers_received(request, headers),
            Category::Frame => self.on_sub_doc_headers_received(request, headers),
            _ => Verdict::Proceed,
        };
        Ok(verdict)
    }

    fn on_main_doc_headers_received(&mut self, request: &Request, mut headers: HeaderSet) -> Verdict {
        let tab_id = request.tab_id;

        if self.config.is_download(headers.get_last(CONTENT_TYPE)) {
            if self.tabs.unpush(tab_id, &request.url) {
                self.collaborators
                    .page_store
                    .rollback_tab(tab_id, &request.url);
            }
        } else {
            self.tabs.commit(tab_id, &request.url);
        }

        let Some(context) = self.tabs.lookup(tab_id) else {
            tracing::debug!(tab = %tab_id, "no tab context for document response");
            return Verdict::Proceed;
        };
        let root_hostname = context.root_hostname().to_string();

        let block_script = self
            .collaborators
            .oracle
            .must_block(&root_hostname, &root_hostname, Category::Script);
        self.collaborators
            .page_store
            .set_page_script_blocked(tab_id, block_script);

        if !block_script {
            return Verdict::Proceed;
        }

        self.collaborators.logger.write_one(LogEntry::net(
            tab_id,
            &root_hostname,
            &csp::inline_script_url(&request.url),
            Category::Script,
            true,
        ));
        csp::forbid_inline_script(&mut headers, &self.config.inline_script_csp);
        Verdict::ResponseHeaders { headers }
    }

    fn on_sub_doc_headers_received(&mut self, request: &Request, mut headers: HeaderSet) -> Verdict {
        let tab_id = request.tab_id;
        let Some(context) = self.tabs.lookup(tab_id) else {
            tracing::debug!(tab = %tab_id, "no tab context for frame response");
            return Verdict::Proceed;
        };
        let root_hostname = context.root_hostname();

        if self
            .collaborators
            .oracle
            .must_allow(root_hostname, &request.hostname, Category::Script)
        {
            return Verdict::Proceed;
        }

        self.collaborators.logger.write_one(LogEntry::net(
            tab_id,
            root_hostname,
            &csp::inline_script_url(&request.url),
            Category::Script,
            true,
        ));
        csp::forbid_inline_script(&mut headers, &self.config.inline_script_csp);
        Verdict::ResponseHeaders { headers }
    }

    fn record(&self, tab_id: TabId, source_hostname: &str, category: Category, url: &str, blocked: bool) {
        self.collaborators
            .page_store
            .record_request(tab_id, category, url, blocked);
        self.collaborators.logger.write_one(LogEntry::net(
            tab_id,
            source_hostname,
            url,
            category,
            blocked,
        ));
    }
}

fn must_lookup(tabs: &TabContextManager, tab_id: TabId) -> Result<&TabContext> {
    tabs.must_lookup(tab_id).map_err(|e| {
        tracing::error!(tab = %tab_id, error = %e, "tab context contract violated");
        PipelineError::from(e)
    })
}
