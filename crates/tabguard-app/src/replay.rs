//! Feeds a trace through a pipeline built from in-memory collaborators.

use std::sync::Arc;

use serde::Serialize;
use tabguard_core::{
    Collaborators, Counters, LogEntry, MemoryLogger, MemoryPageStore, PageStats, Pipeline,
    RequestLogger, TabId, TracingLogger, Verdict,
};

use crate::config::AppConfig;
use crate::trace::{Phase, TraceEvent};

/// Audit sink that keeps entries in memory and mirrors them to `tracing`.
#[derive(Debug, Default)]
struct ReplayLog {
    memory: MemoryLogger,
    tracing: TracingLogger,
}

impl RequestLogger for ReplayLog {
    fn write_one(&self, entry: LogEntry) {
        self.tracing.write_one(entry.clone());
        self.memory.write_one(entry);
    }
}

/// Outcome of one replayed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayRecord {
    /// Position in the trace.
    pub index: usize,
    pub phase: Phase,
    pub tab_id: TabId,
    pub url: String,
    /// Present unless the event failed or closed a tab.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Final state after a replay.
#[derive(Debug, Clone, Serialize)]
pub struct ReplaySummary {
    pub events: usize,
    pub errors: usize,
    pub counters: Counters,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<Vec<LogEntry>>,
}

/// A pipeline plus the collaborators it reports to.
pub struct Replay {
    pipeline: Pipeline,
    page_store: Arc<MemoryPageStore>,
    log: Arc<ReplayLog>,
}

impl Replay {
    /// Builds a pipeline from `config`.
    pub fn new(config: AppConfig) -> Self {
        let page_store = Arc::new(MemoryPageStore::new());
        let log = Arc::new(ReplayLog::default());
        let pipeline = Pipeline::new(
            config.pipeline,
            Collaborators {
                oracle: Arc::new(config.policy),
                page_store: page_store.clone(),
                logger: log.clone(),
                settings: Arc::new(config.settings),
            },
        );
        Self {
            pipeline,
            page_store,
            log,
        }
    }

    /// Replays one event.
    pub fn run_event(&mut self, index: usize, event: &TraceEvent) -> ReplayRecord {
        let request = event.request();
        let result = match event.phase {
            Phase::BeforeRequest => self.pipeline.on_before_request(&request).map(Some),
            Phase::BeforeSendHeaders => self
                .pipeline
                .on_before_send_headers(&request, event.headers.clone())
                .map(Some),
            Phase::HeadersReceived => self
                .pipeline
                .on_headers_received(&request, event.headers.clone())
                .map(Some),
            Phase::TabClosed => {
                self.pipeline.on_tab_closed(event.tab_id);
                Ok(None)
            }
        };

        let (verdict, error) = match result {
            Ok(verdict) => (verdict, None),
            Err(e) => {
                tracing::warn!(index, tab = %event.tab_id, error = %e, "event failed");
                (None, Some(e.to_string()))
            }
        };

        ReplayRecord {
            index,
            phase: event.phase,
            tab_id: event.tab_id,
            url: event.url.clone(),
            verdict,
            error,
        }
    }

    /// Replays every event in order.
    pub fn run(&mut self, events: &[TraceEvent]) -> Vec<ReplayRecord> {
        events
            .iter()
            .enumerate()
            .map(|(index, event)| self.run_event(index, event))
            .collect()
    }

    /// Summary of the replay so far.
    pub fn summary(&self, records: &[ReplayRecord], include_log: bool) -> ReplaySummary {
        ReplaySummary {
            events: records.len(),
            errors: records.iter().filter(|r| r.error.is_some()).count(),
            counters: self.pipeline.counters(),
            log: include_log.then(|| self.log.memory.entries()),
        }
    }

    /// Page statistics of a tab.
    pub fn page_stats(&self, tab_id: TabId) -> Option<PageStats> {
        self.page_store.stats(tab_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::parse_trace;
    use tabguard_core::{Category, StaticPolicy, Switch};

    fn config(policy: StaticPolicy) -> AppConfig {
        AppConfig {
            policy,
            ..AppConfig::default()
        }
    }

    const BROWSE: &str = r#"[
        { "phase": "before_request", "tab_id": 1, "url": "https://news.test/", "type": "main_frame" },
        { "phase": "headers_received", "tab_id": 1, "url": "https://news.test/", "type": "main_frame",
          "headers": [["Content-Type", "text/html"]] },
        { "phase": "before_request", "tab_id": 1, "url": "https://ads.test/b.js", "type": "script",
          "parent_frame_id": 0 },
        { "phase": "before_request", "tab_id": 1, "url": "https://news.test/app.js", "type": "script",
          "parent_frame_id": 0 },
        { "phase": "before_send_headers", "tab_id": 1, "url": "https://news.test/app.js", "type": "script",
          "parent_frame_id": 0, "headers": [["Cookie", "sid=1"], ["User-Agent", "Real/1"]] },
        { "phase": "tab_closed", "tab_id": 1 }
    ]"#;

    #[test]
    fn browse_trace_produces_one_record_per_event() {
        let policy = StaticPolicy::allow_all()
            .block("news.test", "ads.test", None)
            .with_switch(Switch::UaSpoof, "news.test");
        let mut replay = Replay::new(config(policy));
        let events = parse_trace(BROWSE).unwrap();

        let records = replay.run(&events);

        assert_eq!(records.len(), events.len());
        assert_eq!(records[0].verdict, Some(Verdict::Proceed));
        assert_eq!(records[2].verdict, Some(Verdict::Cancel));
        assert_eq!(records[3].verdict, Some(Verdict::Proceed));
        assert!(matches!(records[4].verdict, Some(Verdict::RequestHeaders { .. })));
        assert_eq!(records[5].verdict, None);
        assert!(records.iter().all(|r| r.error.is_none()));

        let summary = replay.summary(&records, true);
        assert_eq!(summary.counters.user_agent_spoofed, 1);
        assert_eq!(summary.counters.cookie_header_foiled, 0);
        assert_eq!(summary.log.unwrap().len(), 3);
        assert!(replay.page_stats(TabId(1)).is_none());
    }

    #[test]
    fn contract_violation_is_reported_not_fatal() {
        let events = parse_trace(
            r#"[
                { "phase": "before_request", "tab_id": 7, "url": "https://cdn.test/x.js", "type": "script",
                  "parent_frame_id": 0 },
                { "phase": "before_request", "tab_id": 7, "url": "https://a.test/", "type": "main_frame" }
            ]"#,
        )
        .unwrap();
        let mut replay = Replay::new(AppConfig::default());

        let records = replay.run(&events);

        assert!(records[0].error.is_some());
        assert_eq!(records[0].verdict, None);
        assert_eq!(records[1].verdict, Some(Verdict::Proceed));
        assert_eq!(replay.summary(&records, false).errors, 1);
        let stats = replay.page_stats(TabId(7)).unwrap();
        assert_eq!(stats.count(Category::Doc, false), 1);
    }

    #[test]
    fn record_serializes_verdict() {
        let mut replay = Replay::new(config(StaticPolicy::block_all()));
        let events = parse_trace(
            r#"[{ "phase": "before_request", "tab_id": 2, "url": "http://a.test/", "type": "main_frame" }]"#,
        )
        .unwrap();

        let records = replay.run(&events);
        let json = serde_json::to_value(&records[0]).unwrap();

        assert_eq!(json["phase"], "before_request");
        assert_eq!(json["verdict"]["action"], "redirect");
        assert!(json["verdict"]["url"].as_str().unwrap().contains("details="));
        assert!(json.get("error").is_none());
    }

    #[test]
    fn demo_trace_runs_cleanly() {
        let demos = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos");
        let config = AppConfig::load(&demos.join("config.json")).unwrap();
        let events = crate::trace::load_trace(&demos.join("browse.json")).unwrap();
        let mut replay = Replay::new(config);

        let records = replay.run(&events);

        assert!(records.iter().all(|r| r.error.is_none()));
        assert_eq!(records[2].verdict, Some(Verdict::Cancel));
        assert_eq!(records[3].verdict, Some(Verdict::Cancel));
        assert!(matches!(records[6].verdict, Some(Verdict::ResponseHeaders { .. })));
        assert_eq!(records[7].verdict, Some(Verdict::Cancel));
        assert!(matches!(records[10].verdict, Some(Verdict::Redirect { .. })));

        let counters = replay.summary(&records, false).counters;
        assert_eq!(counters.cookie_header_foiled, 1);
        assert_eq!(counters.referer_header_foiled, 1);
        assert_eq!(counters.user_agent_spoofed, 1);
        assert_eq!(counters.hyperlink_auditing_foiled, 1);
    }
}
