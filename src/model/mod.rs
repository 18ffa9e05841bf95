//! Core domain types shared across the pipeline
//!
//! This module defines the in-memory candidate event produced by extraction
//! and normalization, plus the source descriptor that configures how one
//! external origin is harvested.

mod event;
mod source;

pub use event::{AgeRange, Category, RawEvent};
pub use source::{
    ApiSettings, DetailSelectors, FetchMethod, PageSettings, SourceDescriptor, SourceKind,
    SourceSettings,
};
