//! Site analyzer
//!
//! Applies the extraction primitives heuristically to an unknown page and
//! suggests a source configuration. Purely advisory: the suggestion is for
//! a human to confirm, never auto-applied.

use reqwest::Client;
use scraper::Html;

use crate::connector::{fetch_text, DEFAULT_PAGE_TIMEOUT};
use crate::extract::{
    compile_selector, element_text, DEFAULT_DATE_SELECTOR, DEFAULT_TITLE_SELECTOR,
    FALLBACK_LIST_SELECTORS,
};
use crate::Result;

/// Minimum matches a candidate selector needs to count as a listing
const MIN_LIST_MATCHES: usize = 3;

/// Maximum sample items reported back
const MAX_SAMPLES: usize = 5;

/// Maximum characters per sample item
const SAMPLE_CHARS: usize = 200;

/// Analysis result for one URL
#[derive(Debug)]
pub struct SiteAnalysis {
    pub url: String,
    pub title: Option<String>,
    pub html_length: usize,
    /// Match count of the winning selector, 0 when nothing qualified
    pub match_count: usize,
    pub suggested: Option<SuggestedConfig>,
    pub samples: Vec<String>,
}

/// A selector configuration suggestion
#[derive(Debug)]
pub struct SuggestedConfig {
    pub list_selector: String,
    pub title_selector: String,
    pub date_selector: String,
}

/// Fetches a page and suggests a listing configuration for it
///
/// Probes the fixed candidate battery and picks the selector with the most
/// matches at or above the minimum threshold.
pub async fn analyze_site(client: &Client, url: &str) -> Result<SiteAnalysis> {
    let html = fetch_text(client, url, DEFAULT_PAGE_TIMEOUT).await?;
    let document = Html::parse_document(&html);

    let title = compile_selector("title")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .map(element_text)
        .filter(|t| !t.is_empty());

    let mut best: Option<(&str, usize)> = None;
    for candidate in FALLBACK_LIST_SELECTORS {
        let Ok(selector) = compile_selector(candidate) else {
            continue;
        };
        let count = document.select(&selector).count();
        if count >= MIN_LIST_MATCHES && count > best.map(|(_, c)| c).unwrap_or(0) {
            best = Some((candidate, count));
        }
    }

    let mut samples = Vec::new();
    if let Some((winner, _)) = best {
        if let Ok(selector) = compile_selector(winner) {
            samples = document
                .select(&selector)
                .take(MAX_SAMPLES)
                .map(|item| element_text(item).chars().take(SAMPLE_CHARS).collect())
                .collect();
        }
    }

    Ok(SiteAnalysis {
        url: url.to_string(),
        title,
        html_length: html.len(),
        match_count: best.map(|(_, count)| count).unwrap_or(0),
        suggested: best.map(|(winner, _)| SuggestedConfig {
            list_selector: winner.to_string(),
            title_selector: DEFAULT_TITLE_SELECTOR.to_string(),
            date_selector: DEFAULT_DATE_SELECTOR.to_string(),
        }),
        samples,
    })
}
