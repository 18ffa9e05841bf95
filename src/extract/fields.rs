use scraper::{ElementRef, Selector};

use crate::extract::selectors::SelectorSet;

/// Best-effort field values extracted from one list item
#[derive(Debug, Clone)]
pub struct PartialFields {
    pub title: String,
    pub date_text: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
}

/// Extracts candidate fields from one structural unit of a page
///
/// Missing matches yield absent fields. Items whose extracted title carries
/// fewer than 2 meaningful (alphanumeric) characters are rejected outright
/// and contribute nothing to the result set.
pub fn extract_fields(item: ElementRef<'_>, selectors: &SelectorSet) -> Option<PartialFields> {
    let title = select_text(item, &selectors.title)?;
    if !meaningful_title(&title) {
        return None;
    }

    let date_text = select_text(item, &selectors.date);
    let description = selectors
        .description
        .as_ref()
        .and_then(|sel| select_text(item, sel));

    let link = match &selectors.link {
        Some(sel) => select_href(item, sel),
        None => first_href(item),
    };

    Some(PartialFields {
        title,
        date_text,
        description,
        link,
    })
}

/// Text content of the first match within an item, whitespace-collapsed
pub fn select_text(item: ElementRef<'_>, selector: &Selector) -> Option<String> {
    item.select(selector)
        .map(element_text)
        .find(|text| !text.is_empty())
}

/// `href` of the first match within an item
///
/// When the matched element is not itself an anchor, the first anchor
/// beneath it is used.
pub fn select_href(item: ElementRef<'_>, selector: &Selector) -> Option<String> {
    for element in item.select(selector) {
        if let Some(href) = element.value().attr("href") {
            let href = href.trim();
            if !href.is_empty() {
                return Some(href.to_string());
            }
        }
        if let Some(href) = first_href(element) {
            return Some(href);
        }
    }
    None
}

/// Collapsed text content of an element
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn first_href(item: ElementRef<'_>) -> Option<String> {
    let anchor = Selector::parse("a[href]").ok()?;
    // The item itself may be the anchor
    if let Some(href) = item.value().attr("href") {
        let href = href.trim();
        if !href.is_empty() {
            return Some(href.to_string());
        }
    }
    item.select(&anchor)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .find(|href| !href.is_empty())
        .map(str::to_string)
}

/// Whether a title carries at least 2 meaningful (alphanumeric) characters
pub fn meaningful_title(text: &str) -> bool {
    text.chars().filter(|c| c.is_alphanumeric()).count() >= 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PageSettings;
    use scraper::Html;

    fn selectors() -> SelectorSet {
        let settings = PageSettings {
            list_selector: Some("tr".to_string()),
            title_selector: Some("td.subject a".to_string()),
            date_selector: Some("td.date".to_string()),
            link_selector: Some("td.subject a".to_string()),
            ..PageSettings::default()
        };
        SelectorSet::compile(&settings).unwrap()
    }

    fn first_row(document: &Html, set: &SelectorSet) -> Option<PartialFields> {
        let item = document.select(&set.list).next().unwrap();
        extract_fields(item, set)
    }

    #[test]
    fn test_extracts_all_fields() {
        let html = r#"<table><tr>
            <td class="subject"><a href="view.do?id=7">Harbor Lantern Walk</a></td>
            <td class="date">2025-04-01</td>
        </tr></table>"#;
        let document = Html::parse_document(html);
        let fields = first_row(&document, &selectors()).unwrap();

        assert_eq!(fields.title, "Harbor Lantern Walk");
        assert_eq!(fields.date_text.as_deref(), Some("2025-04-01"));
        assert_eq!(fields.link.as_deref(), Some("view.do?id=7"));
    }

    #[test]
    fn test_missing_fields_are_absent() {
        let html = r#"<table><tr>
            <td class="subject"><a>No link here</a></td>
        </tr></table>"#;
        let document = Html::parse_document(html);
        let fields = first_row(&document, &selectors()).unwrap();

        assert_eq!(fields.date_text, None);
        assert_eq!(fields.link, None);
    }

    #[test]
    fn test_rejects_near_empty_title() {
        let html = r#"<table><tr>
            <td class="subject"><a href="/x">-</a></td>
            <td class="date">2025-04-01</td>
        </tr></table>"#;
        let document = Html::parse_document(html);
        assert!(first_row(&document, &selectors()).is_none());
    }

    #[test]
    fn test_collapses_whitespace_in_title() {
        let html = "<table><tr><td class=\"subject\"><a>\n  Night \t Market  \n</a></td></tr></table>";
        let document = Html::parse_document(html);
        let fields = first_row(&document, &selectors()).unwrap();
        assert_eq!(fields.title, "Night Market");
    }

    #[test]
    fn test_link_found_without_link_selector() {
        let settings = PageSettings {
            list_selector: Some("li".to_string()),
            title_selector: Some("a".to_string()),
            ..PageSettings::default()
        };
        let set = SelectorSet::compile(&settings).unwrap();
        let html = r#"<ul><li><a href="/events/9">Cherry Blossom Picnic</a> 2025.04.05</li></ul>"#;
        let document = Html::parse_document(html);
        let item = document.select(&set.list).next().unwrap();
        let fields = extract_fields(item, &set).unwrap();

        assert_eq!(fields.link.as_deref(), Some("/events/9"));
    }
}
