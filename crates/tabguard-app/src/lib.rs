//! TabGuard - replay harness for the interception pipeline.
//!
//! Stands in for the browser host during development: recorded lifecycle
//! events are read from a JSON trace and fed through a [`tabguard_core::Pipeline`]
//! in order, producing one verdict per event.
//!
//! # Usage
//!
//! ```ignore
//! use tabguard_app::config::AppConfig;
//! use tabguard_app::replay::Replay;
//! use tabguard_app::trace::load_trace;
//!
//! let events = load_trace("events.json".as_ref())?;
//! let mut replay = Replay::new(AppConfig::default());
//! for record in replay.run(&events) {
//!     println!("{}", serde_json::to_string(&record)?);
//! }
//! ```

pub mod config;
pub mod replay;
pub mod trace;

pub use config::AppConfig;
pub use replay::{Replay, ReplayRecord, ReplaySummary};
pub use trace::{load_trace, parse_trace, Phase, TraceEvent};
