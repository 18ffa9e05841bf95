//! Collection pipeline orchestration
//!
//! The collector runs one source end-to-end, the merger deduplicates its
//! candidates into the store, and the runner sweeps all collectable sources
//! writing one audit log row per source.

mod collector;
mod merger;
mod runner;

pub use collector::{collect_source, CollectOutcome};
pub use merger::{merge_candidates, MergeCounts};
pub use runner::{run_source, run_source_by_name, run_sweep, SourceRunSummary};
