//! TabGuard Core - request interception pipeline for a per-tab privacy filter.
//!
//! The pipeline sits between a browser's network stack and a policy oracle.
//! For every request it decides whether to let it through, cancel it, or
//! redirect the tab, and it rewrites request and response headers to limit
//! tracking.
//!
//! ## Features
//!
//! - Per-tab navigation context with provisional pushes that survive
//!   downloads (see [`tab_context`])
//! - Request classification into policy categories (see [`category`])
//! - Blocked top-level navigations replaced with an explanatory page
//! - Cookie stripping, referrer and user-agent spoofing (see [`sanitizer`])
//! - Hyperlink-auditing beacons cancelled
//! - Inline script forbidden through an appended CSP header (see [`csp`])
//!
//! ## Architecture
//!
//! ```text
//! Host event → Pipeline ──► TabContextManager (root hostname, secure)
//!                  │
//!                  ├──► PolicyOracle   (must_block / evaluate_switch)
//!                  ├──► PageStore      (per-tab statistics)
//!                  ├──► RequestLogger  (audit trail)
//!                  └──► UserSettings
//!                  │
//!                  ▼
//!               Verdict ─► Proceed | Cancel | Redirect | RequestHeaders | ResponseHeaders
//! ```

pub mod blocked;
pub mod category;
pub mod config;
pub mod csp;
pub mod headers;
pub mod logger;
pub mod page_store;
pub mod pipeline;
pub mod policy;
pub mod request;
pub mod sanitizer;
pub mod settings;
pub mod tab_context;
pub mod uri;

pub use blocked::{BlockedDetails, BlockedDetailsError};
pub use category::Category;
pub use config::PipelineConfig;
pub use headers::HeaderSet;
pub use logger::{LogEntry, LogKind, MemoryLogger, RequestLogger, TracingLogger};
pub use page_store::{MemoryPageStore, PageStats, PageStore, RecordedRequest};
pub use pipeline::{Collaborators, Counters, Pipeline, PipelineError, Verdict};
pub use policy::{PolicyOracle, PolicyRule, RuleAction, StaticPolicy, Switch, SwitchRule};
pub use request::Request;
pub use sanitizer::SanitizeOutcome;
pub use settings::{Settings, UserSettings};
pub use tab_context::{TabContext, TabContextError, TabContextManager, TabId, MAX_HISTORY};

/// Target of the audit events emitted by [`TracingLogger`].
pub const AUDIT_TARGET: &str = "tabguard::audit";
