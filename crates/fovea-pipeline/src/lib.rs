//! # fovea-pipeline
//!
//! The scan orchestrator and the long-running watch loop.
//!
//! One scan cycle: enumerate candidate photos not yet represented in the
//! vault, run the pre-filter, run the extractor, run the writer, update
//! persisted state, and report per-item events on the broadcast bus.
//! The watch loop repeats cycles on an interval and shuts down gracefully,
//! always letting the in-flight cycle finish and persist state.

pub mod orchestrator;
pub mod watch;

pub use orchestrator::Orchestrator;
pub use watch::{Watcher, WatcherHandle};
