use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::SettingsError;

/// The kind of an external origin
///
/// Immutable after the descriptor is created: switching extraction strategy
/// requires a new descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Api,
    Page,
}

impl SourceKind {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Page => "page",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "api" => Some(Self::Api),
            "page" => Some(Self::Page),
            _ => None,
        }
    }
}

/// Configuration for one external origin
///
/// The kind-specific configuration is carried as opaque JSON text in
/// `settings` and parsed into [`SourceSettings`] at connector invocation
/// time. `last_collected_at` is only written by the runner after a
/// collection attempt.
#[derive(Debug, Clone)]
pub struct SourceDescriptor {
    pub id: i64,
    pub name: String,
    pub kind: SourceKind,
    pub url: String,
    pub region_id: i64,
    pub enabled: bool,
    pub settings: String,
    pub last_collected_at: Option<NaiveDateTime>,
}

/// Kind-specific settings, parsed from the descriptor's opaque JSON text
///
/// Modeled as a discriminated union keyed by the descriptor kind so API
/// fields can never leak into a page source and vice versa.
#[derive(Debug, Clone)]
pub enum SourceSettings {
    Api(ApiSettings),
    Page(PageSettings),
}

impl SourceSettings {
    /// Parses the opaque settings text under the descriptor's kind
    ///
    /// Empty or whitespace-only text yields the kind's defaults.
    pub fn parse(kind: SourceKind, raw: &str) -> Result<Self, SettingsError> {
        let raw = raw.trim();
        match kind {
            SourceKind::Api => {
                if raw.is_empty() {
                    return Ok(Self::Api(ApiSettings::default()));
                }
                Ok(Self::Api(serde_json::from_str(raw)?))
            }
            SourceKind::Page => {
                if raw.is_empty() {
                    return Ok(Self::Page(PageSettings::default()));
                }
                let settings: PageSettings = serde_json::from_str(raw)?;
                settings.check()?;
                Ok(Self::Page(settings))
            }
        }
    }
}

/// Settings for an API source
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiSettings {
    /// Stored access key substituted into the endpoint template
    pub api_key: Option<String>,

    /// Endpoint template with `{key}`, `{service}`, `{start}` and `{end}`
    /// tokens. When absent the descriptor URL is requested verbatim.
    pub endpoint: Option<String>,

    /// Vendor service name (also the envelope's wrapper key)
    pub service: Option<String>,

    /// Row window size for the `{start}`/`{end}` paging indices
    pub page_size: Option<u32>,

    /// Region-name substring filter applied per row before mapping
    pub district_filter: Option<String>,

    /// Per-source request timeout in milliseconds
    pub timeout: Option<u64>,
}

/// How a page source is fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMethod {
    /// Plain HTTP fetch + parse
    #[default]
    Static,
    /// Scripted render for pages that build their listing client-side
    Dynamic,
}

/// Detail-page selector overrides
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetailSelectors {
    pub title: Option<String>,
    pub content: Option<String>,
    pub location: Option<String>,
    pub date: Option<String>,
    pub department: Option<String>,
    pub contact: Option<String>,
}

/// Settings for a page source
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageSettings {
    pub method: FetchMethod,

    pub list_selector: Option<String>,
    /// Legacy alias for `listSelector`
    pub selector: Option<String>,
    pub title_selector: Option<String>,
    pub date_selector: Option<String>,
    pub description_selector: Option<String>,
    pub link_selector: Option<String>,

    /// Only meaningful for `method: dynamic`
    pub wait_for_selector: Option<String>,

    /// Per-source request timeout in milliseconds
    pub timeout: Option<u64>,

    pub crawl_detail_page: bool,
    pub detail_selectors: DetailSelectors,

    /// Label words that introduce a date in detail-page prose
    pub detail_date_labels: Vec<String>,
    /// Label words that introduce a time in detail-page prose
    pub detail_time_labels: Vec<String>,

    pub pagination_enabled: bool,
    /// URL pattern carrying a `{page}` token
    pub pagination_url_pattern: Option<String>,
    pub pagination_max_pages: Option<u32>,

    pub calendar_mode: bool,
    /// Number of month offsets to expand, starting from the current month
    pub calendar_months: Option<u32>,
}

impl PageSettings {
    /// The configured list selector, honoring the legacy `selector` alias
    pub fn list_selector(&self) -> Option<&str> {
        self.list_selector.as_deref().or(self.selector.as_deref())
    }

    fn check(&self) -> Result<(), SettingsError> {
        if self.pagination_enabled {
            match &self.pagination_url_pattern {
                Some(pattern) if pattern.contains("{page}") => {}
                Some(_) => {
                    return Err(SettingsError::Invalid(
                        "paginationUrlPattern must contain a {page} token".to_string(),
                    ))
                }
                None => {
                    return Err(SettingsError::Invalid(
                        "paginationEnabled requires paginationUrlPattern".to_string(),
                    ))
                }
            }
        }
        if self.wait_for_selector.is_some() && self.method != FetchMethod::Dynamic {
            return Err(SettingsError::Invalid(
                "waitForSelector is only valid with method: dynamic".to_string(),
            ));
        }
        Ok(())
    }
}
