//! Selector handling and per-item field extraction
//!
//! The extractor consumes one structural unit (a list row on a page, or one
//! record in an API payload is handled by the API connector directly) plus a
//! set of named selectors and yields best-effort field values. Missing
//! matches are absent, never errors.

mod fields;
mod selectors;

pub use fields::{
    element_text, extract_fields, meaningful_title, select_href, select_text, PartialFields,
};
pub use selectors::{
    compile_selector, SelectorSet, DEFAULT_DATE_SELECTOR, DEFAULT_TITLE_SELECTOR,
    FALLBACK_LIST_SELECTORS,
};
