//! Console message ingestion — resolution, batching, and logpoints.

mod logpoints;
mod pipeline;
mod queue;

pub use logpoints::{LogGroupState, LogpointTracker};
pub use pipeline::{ConsoleCommand, ConsolePipeline, FLUSH_INTERVAL, LOGPOINT_LOADING_TEXT};
pub use queue::PendingQueue;
