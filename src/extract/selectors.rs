use scraper::Selector;

use crate::model::PageSettings;
use crate::HarvestError;

/// Ordered fallback chain probed when the configured list selector matches
/// zero items
///
/// Shared with the site analyzer's candidate battery. Fixed by design; the
/// probe order is part of the observable behavior.
pub const FALLBACK_LIST_SELECTORS: &[&str] = &[
    "table tbody tr",
    ".board-list tr",
    "ul.list li",
    ".event-list .item",
    ".list-item",
    "article",
];

/// Default item-level selectors applied when a page source does not
/// configure its own
pub const DEFAULT_TITLE_SELECTOR: &str = "a, .title, td:nth-child(2)";
pub const DEFAULT_DATE_SELECTOR: &str = ".date, td:nth-child(3)";

/// Compiled selectors for list-page extraction
pub struct SelectorSet {
    pub list: Selector,
    pub title: Selector,
    pub date: Selector,
    pub description: Option<Selector>,
    pub link: Option<Selector>,
}

impl SelectorSet {
    /// Compiles the selectors configured on a page source
    ///
    /// Title and date fall back to the crate defaults; the list selector
    /// falls back to the first entry of the fallback chain when absent.
    pub fn compile(settings: &PageSettings) -> Result<Self, HarvestError> {
        let list = settings.list_selector().unwrap_or(FALLBACK_LIST_SELECTORS[0]);
        let title = settings
            .title_selector
            .as_deref()
            .unwrap_or(DEFAULT_TITLE_SELECTOR);
        let date = settings
            .date_selector
            .as_deref()
            .unwrap_or(DEFAULT_DATE_SELECTOR);

        Ok(Self {
            list: compile_selector(list)?,
            title: compile_selector(title)?,
            date: compile_selector(date)?,
            description: settings
                .description_selector
                .as_deref()
                .map(compile_selector)
                .transpose()?,
            link: settings
                .link_selector
                .as_deref()
                .map(compile_selector)
                .transpose()?,
        })
    }
}

/// Compiles a single CSS selector, carrying the offending text on failure
pub fn compile_selector(selector: &str) -> Result<Selector, HarvestError> {
    Selector::parse(selector).map_err(|e| HarvestError::Selector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}
