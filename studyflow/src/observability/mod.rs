//! Observability utilities.

mod tracing;
mod wide_events;

pub use tracing::{init_tracing, RunSpanAttributes, SpanTimer, StageSpanAttributes};
pub use wide_events::WideEventEmitter;
