//! Page connector
//!
//! Fetches one or more listing pages for a source, locates list items via
//! the configured (or fallback-chain) selector, and turns each item into a
//! candidate event. Optionally follows each item's link to a detail page
//! whose values override the list-row values.

use std::time::Duration;

use chrono::{Datelike, Local, NaiveDate, Timelike};
use reqwest::Client;
use scraper::Html;
use tracing::{debug, warn};
use url::Url;

use crate::connector::http::{
    fetch_text, DEFAULT_PAGE_TIMEOUT, DETAIL_FETCH_DELAY, PAGE_FETCH_DELAY,
};
use crate::connector::render::render_page;
use crate::extract::{
    compile_selector, element_text, extract_fields, select_text, SelectorSet,
    FALLBACK_LIST_SELECTORS,
};
use crate::model::{FetchMethod, PageSettings, RawEvent, SourceDescriptor};
use crate::normalize::{
    map_category, parse_age_range, parse_date, parse_date_range, parse_time_range, TimeRange,
};
use crate::storage::RegionRecord;
use crate::Result;

/// Hard ceiling on URLs generated for one source, regardless of the
/// configured pagination or calendar values
pub const MAX_GENERATED_PAGES: usize = 50;

/// Month offsets expanded by default in calendar mode (current + next)
const DEFAULT_CALENDAR_MONTHS: u32 = 2;

/// Default labels introducing a date in detail-page prose
const DEFAULT_DATE_LABELS: &[&str] = &["date", "when", "schedule"];

/// Default labels introducing a time in detail-page prose
const DEFAULT_TIME_LABELS: &[&str] = &["time", "hours"];

/// One extracted list item, fully detached from the parsed document
struct ListItem {
    title: String,
    date_text: Option<String>,
    description: Option<String>,
    link: Option<String>,
}

/// Values re-extracted from a detail page
#[derive(Default)]
struct DetailFields {
    title: Option<String>,
    description: Option<String>,
    location: Option<String>,
    organizer: Option<String>,
    contact: Option<String>,
    date: Option<NaiveDate>,
    time: Option<TimeRange>,
}

/// Collects candidate events from a page source
///
/// Individual page or detail fetch failures degrade to a partial result;
/// the call only errors when every page failed and nothing was extracted.
pub async fn collect_page_events(
    client: &Client,
    source: &SourceDescriptor,
    settings: &PageSettings,
    region: &RegionRecord,
) -> Result<Vec<RawEvent>> {
    let base = Url::parse(&source.url)?;
    let urls = build_page_urls(&source.url, settings);
    let selectors = SelectorSet::compile(settings)?;
    let timeout = settings
        .timeout
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_PAGE_TIMEOUT);

    let mut events = Vec::new();
    let mut page_errors = Vec::new();

    for (index, page_url) in urls.iter().enumerate() {
        if index > 0 {
            // Politeness delay between successive page fetches
            tokio::time::sleep(PAGE_FETCH_DELAY).await;
        }

        let html = match fetch_page(client, page_url, settings, timeout).await {
            Ok(html) => html,
            Err(e) => {
                warn!("'{}': page fetch failed for {}: {}", source.name, page_url, e);
                page_errors.push(e);
                continue;
            }
        };

        let page_base = Url::parse(page_url).unwrap_or_else(|_| base.clone());
        let items = extract_list_items(&source.name, &html, &selectors, &page_base);
        debug!("'{}': {} items on {}", source.name, items.len(), page_url);

        for item in items {
            events.push(build_candidate(client, source, settings, region, item, timeout).await);
        }
    }

    if events.is_empty() {
        if let Some(error) = page_errors.into_iter().next() {
            return Err(error);
        }
    }
    Ok(events)
}

/// Generates the URL set for one source
///
/// Default is the single configured URL. Pagination mode substitutes a
/// `{page}` token for pages 2 and up; calendar mode substitutes a `{yyyymm}`
/// token per month offset. Both are clamped to [`MAX_GENERATED_PAGES`].
pub fn build_page_urls(base_url: &str, settings: &PageSettings) -> Vec<String> {
    if settings.calendar_mode {
        let months = settings
            .calendar_months
            .unwrap_or(DEFAULT_CALENDAR_MONTHS)
            .max(1)
            .min(MAX_GENERATED_PAGES as u32);
        let today = Local::now().date_naive();
        return (0..months)
            .map(|offset| base_url.replace("{yyyymm}", &year_month(today, offset)))
            .collect();
    }

    let mut urls = vec![base_url.to_string()];
    if settings.pagination_enabled {
        if let Some(pattern) = &settings.pagination_url_pattern {
            let max_pages = settings.pagination_max_pages.unwrap_or(1);
            for page in 2..=max_pages {
                if urls.len() >= MAX_GENERATED_PAGES {
                    break;
                }
                urls.push(pattern.replace("{page}", &page.to_string()));
            }
        }
    }
    urls
}

fn year_month(from: NaiveDate, offset: u32) -> String {
    let zero_based = from.month0() + offset;
    let year = from.year() + (zero_based / 12) as i32;
    let month = zero_based % 12 + 1;
    format!("{:04}{:02}", year, month)
}

async fn fetch_page(
    client: &Client,
    url: &str,
    settings: &PageSettings,
    timeout: Duration,
) -> Result<String> {
    match settings.method {
        FetchMethod::Static => fetch_text(client, url, timeout).await,
        FetchMethod::Dynamic => {
            render_page(client, url, settings.wait_for_selector.as_deref(), timeout).await
        }
    }
}

/// Locates and extracts list items from one fetched page
///
/// When the configured list selector matches zero items the fixed fallback
/// chain is probed in order; the first selector with matches is logged and
/// used for the extraction pass.
fn extract_list_items(
    source_name: &str,
    html: &str,
    selectors: &SelectorSet,
    page_base: &Url,
) -> Vec<ListItem> {
    let document = Html::parse_document(html);

    let mut matched: Vec<_> = document.select(&selectors.list).collect();
    if matched.is_empty() {
        for fallback in FALLBACK_LIST_SELECTORS {
            let Ok(selector) = compile_selector(fallback) else {
                continue;
            };
            let hits: Vec<_> = document.select(&selector).collect();
            if !hits.is_empty() {
                warn!(
                    "'{}': configured list selector matched nothing; switching to fallback '{}' ({} items)",
                    source_name,
                    fallback,
                    hits.len()
                );
                matched = hits;
                break;
            }
        }
    }

    matched
        .into_iter()
        .filter_map(|item| extract_fields(item, selectors))
        .map(|fields| ListItem {
            link: fields
                .link
                .as_deref()
                .and_then(|href| resolve_item_link(page_base, href)),
            title: fields.title,
            date_text: fields.date_text,
            description: fields.description,
        })
        .collect()
}

/// Resolves an item link to an absolute URL
///
/// Absolute http(s) links are kept; everything else resolves against the
/// referring page. Bare relative targets (script endpoints like
/// `View.do?...`) thereby keep the referring page's directory rather than
/// being pinned to the site root.
pub fn resolve_item_link(page_url: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
    {
        return None;
    }

    match Url::parse(href) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute.to_string())
        }
        Ok(_) => None,
        Err(_) => page_url.join(href).ok().map(|url| url.to_string()),
    }
}

/// Builds one candidate event from a list item, following the detail page
/// when configured
async fn build_candidate(
    client: &Client,
    source: &SourceDescriptor,
    settings: &PageSettings,
    region: &RegionRecord,
    item: ListItem,
    timeout: Duration,
) -> RawEvent {
    let mut title = item.title;
    let mut description = item.description;
    let mut location = None;
    let mut organizer = None;
    let mut contact = None;
    let mut time = None;
    let mut date = item.date_text.as_deref().and_then(parse_date_range);

    if settings.crawl_detail_page {
        if let Some(link) = &item.link {
            // Politeness delay before each detail fetch
            tokio::time::sleep(DETAIL_FETCH_DELAY).await;
            match fetch_text(client, link, timeout).await {
                Ok(html) => {
                    let detail = extract_detail(&html, settings);
                    if let Some(value) = detail.title {
                        title = value;
                    }
                    if detail.description.is_some() {
                        description = detail.description;
                    }
                    location = detail.location;
                    organizer = detail.organizer;
                    contact = detail.contact;
                    time = detail.time;
                    if let Some(found) = detail.date {
                        let end = date.and_then(|(_, end)| end);
                        date = Some((found, end));
                    }
                }
                // Non-fatal: the list-page values stand as-is
                Err(e) => warn!("'{}': detail fetch failed for {}: {}", source.name, link, e),
            }
        }
    }

    let start = match date {
        Some((day, _)) => day.and_hms_opt(0, 0, 0).unwrap_or_else(fallback_now),
        None => {
            debug!(
                "'{}': no resolvable date for '{}', defaulting to now",
                source.name, title
            );
            fallback_now()
        }
    };

    let origin_url = item.link.unwrap_or_else(|| source.url.clone());
    let mut event = RawEvent::new(title, start, origin_url, region.id);
    event.end = date.and_then(|(_, end)| end).and_then(|d| d.and_hms_opt(0, 0, 0));
    event.category = map_category(&event.title);
    event.location = location;
    event.organizer = organizer;
    event.contact = contact;
    if let Some(range) = time {
        event.start_time = Some(range.start);
        event.end_time = range.end;
    }
    if let Some(text) = &description {
        if let Some(range) = parse_age_range(text) {
            event.age_range = range;
        }
    }
    event.description = description;
    event
}

fn fallback_now() -> chrono::NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Re-extracts fields from a fetched detail page
fn extract_detail(html: &str, settings: &PageSettings) -> DetailFields {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let detail = &settings.detail_selectors;
    let mut fields = DetailFields::default();

    let selected = |expr: &Option<String>| {
        expr.as_deref()
            .and_then(|s| compile_selector(s).ok())
            .and_then(|selector| select_text(root, &selector))
    };

    fields.title = selected(&detail.title);
    fields.description = selected(&detail.content);
    fields.location = selected(&detail.location);
    fields.organizer = selected(&detail.department);
    fields.contact = selected(&detail.contact);

    // Prose searched for labeled date/time values: the content block when
    // selected, otherwise the whole page text.
    let prose = fields
        .description
        .clone()
        .unwrap_or_else(|| element_text(root));

    let date_labels = label_set(&settings.detail_date_labels, DEFAULT_DATE_LABELS);
    let time_labels = label_set(&settings.detail_time_labels, DEFAULT_TIME_LABELS);

    fields.date = selected(&detail.date)
        .and_then(|text| parse_date(&text))
        .or_else(|| labeled_date(&prose, &date_labels));
    fields.time = labeled_time(&prose, &time_labels)
        .or_else(|| fields.description.as_deref().and_then(parse_time_range));

    fields
}

fn label_set<'a>(configured: &'a [String], defaults: &'a [&'a str]) -> Vec<&'a str> {
    if configured.is_empty() {
        defaults.to_vec()
    } else {
        configured.iter().map(String::as_str).collect()
    }
}

/// Finds a date introduced by one of the label words in free text
fn labeled_date(text: &str, labels: &[&str]) -> Option<NaiveDate> {
    scan_labeled(text, labels, |window| parse_date(window))
}

/// Finds a time range introduced by one of the label words in free text
fn labeled_time(text: &str, labels: &[&str]) -> Option<TimeRange> {
    scan_labeled(text, labels, |window| parse_time_range(window))
}

fn scan_labeled<T>(text: &str, labels: &[&str], parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    let lowered = text.to_lowercase();
    for label in labels {
        let label = label.to_lowercase();
        let mut from = 0;
        while let Some(pos) = lowered[from..].find(&label) {
            let at = from + pos + label.len();
            let window: String = lowered[at..].chars().take(60).collect();
            if let Some(value) = parse(&window) {
                return Some(value);
            }
            from = at;
        }
    }
    None
}
