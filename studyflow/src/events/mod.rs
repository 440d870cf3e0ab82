//! Pipeline event sinks.
//!
//! The orchestrator reports `pipeline.*` and `stage.*` lifecycle events to
//! an injected [`EventSink`]. Sinks are observability only: they cannot
//! fail a run and never see the learning-event side channel.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
