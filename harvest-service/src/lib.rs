//! The harvest pipeline: discover threads, flatten their comment trees and
//! write one CSV row per comment.

pub mod discover;
pub mod flatten;
pub mod orchestrator;
pub mod sink;

pub use discover::ThreadDiscoverer;
pub use flatten::{CommentFlattener, Traversal, STUB_EXPANSION_BUDGET};
pub use orchestrator::{
    run, HarvestContext, HarvestRequest, HarvestSummary, Harvester, ThreadOutcome,
};
pub use sink::RowSink;
