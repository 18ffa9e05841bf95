//! API connector
//!
//! Reaches vendor open-data endpoints that wrap their rows in a service
//! block carrying a `RESULT` status and a `row` array. A vendor error code
//! embedded in the payload is a hard failure for the source's current run,
//! exactly like a transport failure.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::connector::http::{fetch_json, DEFAULT_API_TIMEOUT};
use crate::extract::meaningful_title;
use crate::model::{ApiSettings, RawEvent, SourceDescriptor};
use crate::normalize::{map_category, parse_age_range, parse_date_range, parse_time_range};
use crate::storage::RegionRecord;
use crate::{HarvestError, Result};

/// Vendor status code signalling a successful response
const VENDOR_SUCCESS_CODE: &str = "INFO-000";

// Per-field fallback chains over vendor row keys; first non-empty wins.
const TITLE_FIELDS: &[&str] = &["TITLE", "SVCNM", "EVENT_NM"];
const DATE_FIELDS: &[&str] = &["STRTDATE", "DATE", "SVCOPNBGNDT"];
const END_DATE_FIELDS: &[&str] = &["END_DATE", "ENDDATE", "SVCOPNENDDT"];
const TIME_FIELDS: &[&str] = &["EVENT_TM", "TIME"];
const PLACE_FIELDS: &[&str] = &["PLACE", "PLACENM", "VENUE"];
const DISTRICT_FIELDS: &[&str] = &["GUNAME", "DISTRICT", "AREANM"];
const DESCRIPTION_FIELDS: &[&str] = &["PROGRAM", "ETC_DESC", "DESCRIPTION"];
const FEE_FIELDS: &[&str] = &["USE_FEE", "FEE"];
const FREE_FLAG_FIELDS: &[&str] = &["IS_FREE"];
const LINK_FIELDS: &[&str] = &["ORG_LINK", "HMPG_ADDR", "LINK"];
const IMAGE_FIELDS: &[&str] = &["MAIN_IMG", "IMGURL"];
const ORGANIZER_FIELDS: &[&str] = &["ORG_NAME", "MNG_DEPT"];
const CONTACT_FIELDS: &[&str] = &["TELNO", "CONTACT"];
const AUDIENCE_FIELDS: &[&str] = &["USE_TRGT", "TARGET"];

/// Collects candidate events from an API source
pub async fn collect_api_events(
    client: &Client,
    source: &SourceDescriptor,
    settings: &ApiSettings,
    region: &RegionRecord,
) -> Result<Vec<RawEvent>> {
    let url = build_request_url(source, settings);
    let timeout = settings
        .timeout
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_API_TIMEOUT);

    debug!("API request for '{}': {}", source.name, url);
    let payload = fetch_json(client, &url, timeout).await?;
    let rows = unwrap_envelope(&payload, &url, settings.service.as_deref())?;

    let mut events = Vec::new();
    let mut dropped = 0usize;
    for row in rows {
        if !passes_district_filter(row, settings.district_filter.as_deref()) {
            continue;
        }
        match map_row(row, source, region) {
            Some(event) => events.push(event),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        warn!(
            "'{}': dropped {} rows without a usable title or date",
            source.name, dropped
        );
    }

    Ok(events)
}

/// Builds the request URL
///
/// Either the endpoint template with `{key}`/`{service}`/`{start}`/`{end}`
/// tokens substituted, or the descriptor URL verbatim when the address
/// already embeds its access key and path.
fn build_request_url(source: &SourceDescriptor, settings: &ApiSettings) -> String {
    match &settings.endpoint {
        Some(template) => {
            let page_size = settings.page_size.unwrap_or(100);
            template
                .replace("{key}", settings.api_key.as_deref().unwrap_or(""))
                .replace("{service}", settings.service.as_deref().unwrap_or(""))
                .replace("{start}", "1")
                .replace("{end}", &page_size.to_string())
        }
        None => source.url.clone(),
    }
}

/// Locates the vendor envelope's row array, surfacing embedded error codes
fn unwrap_envelope<'a>(
    payload: &'a Value,
    url: &str,
    service: Option<&str>,
) -> Result<&'a Vec<Value>> {
    // Error responses carry a bare top-level RESULT block and no rows
    if let Some(result) = payload.get("RESULT") {
        check_result_block(result, url)?;
    }

    let block = match service.and_then(|name| payload.get(name)) {
        Some(block) => block,
        None => payload
            .as_object()
            .and_then(|obj| obj.values().find(|v| v.get("row").is_some()))
            .ok_or_else(|| HarvestError::PayloadShape {
                url: url.to_string(),
                message: "no service block with a row array".to_string(),
            })?,
    };

    if let Some(result) = block.get("RESULT") {
        check_result_block(result, url)?;
    }

    block
        .get("row")
        .and_then(Value::as_array)
        .ok_or_else(|| HarvestError::PayloadShape {
            url: url.to_string(),
            message: "service block has no row array".to_string(),
        })
}

fn check_result_block(result: &Value, url: &str) -> Result<()> {
    let code = result.get("CODE").and_then(Value::as_str).unwrap_or("");
    if !code.is_empty() && code != VENDOR_SUCCESS_CODE {
        return Err(HarvestError::VendorApi {
            url: url.to_string(),
            code: code.to_string(),
            message: result
                .get("MESSAGE")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string(),
        });
    }
    Ok(())
}

fn passes_district_filter(row: &Value, filter: Option<&str>) -> bool {
    let Some(filter) = filter else {
        return true;
    };
    first_str(row, DISTRICT_FIELDS)
        .or_else(|| first_str(row, PLACE_FIELDS))
        .map(|text| text.contains(filter))
        .unwrap_or(false)
}

/// Maps one vendor row onto a candidate event
///
/// Rows without a usable title are rejected; rows whose date text cannot be
/// parsed are dropped entirely (the page connector's now-fallback does not
/// apply here).
fn map_row(row: &Value, source: &SourceDescriptor, region: &RegionRecord) -> Option<RawEvent> {
    let title = first_str(row, TITLE_FIELDS)?.trim().to_string();
    if !meaningful_title(&title) {
        return None;
    }

    let date_text = first_str(row, DATE_FIELDS)?;
    let (start_date, end_from_range) = parse_date_range(date_text)?;
    let start = start_date.and_hms_opt(0, 0, 0)?;

    let end = first_str(row, END_DATE_FIELDS)
        .and_then(parse_date_range)
        .map(|(date, _)| date)
        .or(end_from_range)
        .and_then(|date| date.and_hms_opt(0, 0, 0));

    let origin_url = first_str(row, LINK_FIELDS)
        .map(str::to_string)
        .unwrap_or_else(|| source.url.clone());

    let mut event = RawEvent::new(title, start, origin_url, region.id);
    event.end = end;
    event.category = map_category(&event.title);
    event.description = first_str(row, DESCRIPTION_FIELDS).map(str::to_string);
    event.location = first_str(row, PLACE_FIELDS).map(str::to_string);
    event.image_url = first_str(row, IMAGE_FIELDS).map(str::to_string);
    event.organizer = first_str(row, ORGANIZER_FIELDS).map(str::to_string);
    event.contact = first_str(row, CONTACT_FIELDS).map(str::to_string);

    if let Some(time_text) = first_str(row, TIME_FIELDS) {
        if let Some(range) = parse_time_range(time_text) {
            event.start_time = Some(range.start);
            event.end_time = range.end;
        }
    }

    event.fee = first_str(row, FEE_FIELDS)
        .map(str::to_string)
        .filter(|fee| !fee.is_empty());
    event.is_free = match first_str(row, FREE_FLAG_FIELDS) {
        Some(flag) => flag.eq_ignore_ascii_case("free"),
        None => event.fee.is_none(),
    };

    if let Some(audience) = first_str(row, AUDIENCE_FIELDS) {
        event.target_groups = vec![audience.to_string()];
        if let Some(range) = parse_age_range(audience) {
            event.age_range = range;
        }
    }

    Some(event)
}

/// First non-empty string value among the given row keys
fn first_str<'a>(row: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| row.get(key))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SourceKind;
    use serde_json::json;

    fn test_source() -> SourceDescriptor {
        SourceDescriptor {
            id: 1,
            name: "Open Data Events".to_string(),
            kind: SourceKind::Api,
            url: "http://data.example.com/KEY/json/events/1/100".to_string(),
            region_id: 1,
            enabled: true,
            settings: "{}".to_string(),
            last_collected_at: None,
        }
    }

    fn test_region() -> RegionRecord {
        RegionRecord {
            id: 1,
            name: "Riverdale".to_string(),
            code: "riverdale".to_string(),
            enabled: true,
        }
    }

    #[test]
    fn test_build_request_url_from_template() {
        let source = test_source();
        let settings = ApiSettings {
            api_key: Some("SECRET".to_string()),
            endpoint: Some("http://data.example.com/{key}/json/{service}/{start}/{end}".to_string()),
            service: Some("culturalEventInfo".to_string()),
            page_size: Some(50),
            ..ApiSettings::default()
        };

        assert_eq!(
            build_request_url(&source, &settings),
            "http://data.example.com/SECRET/json/culturalEventInfo/1/50"
        );
    }

    #[test]
    fn test_build_request_url_precomposed() {
        let source = test_source();
        let settings = ApiSettings::default();
        assert_eq!(build_request_url(&source, &settings), source.url);
    }

    #[test]
    fn test_unwrap_envelope_success() {
        let payload = json!({
            "culturalEventInfo": {
                "list_total_count": 2,
                "RESULT": {"CODE": "INFO-000", "MESSAGE": "OK"},
                "row": [{"TITLE": "A"}, {"TITLE": "B"}]
            }
        });
        let rows = unwrap_envelope(&payload, "http://x.test/", None).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_unwrap_envelope_vendor_error() {
        let payload = json!({
            "culturalEventInfo": {
                "RESULT": {"CODE": "INFO-200", "MESSAGE": "no data"},
                "row": []
            }
        });
        let result = unwrap_envelope(&payload, "http://x.test/", Some("culturalEventInfo"));
        assert!(matches!(result, Err(HarvestError::VendorApi { .. })));
    }

    #[test]
    fn test_unwrap_envelope_top_level_error() {
        let payload = json!({
            "RESULT": {"CODE": "ERROR-500", "MESSAGE": "auth failure"}
        });
        let result = unwrap_envelope(&payload, "http://x.test/", None);
        assert!(matches!(result, Err(HarvestError::VendorApi { .. })));
    }

    #[test]
    fn test_unwrap_envelope_no_rows() {
        let payload = json!({"something": {"else": true}});
        let result = unwrap_envelope(&payload, "http://x.test/", None);
        assert!(matches!(result, Err(HarvestError::PayloadShape { .. })));
    }

    #[test]
    fn test_map_row_full() {
        let row = json!({
            "TITLE": "Riverside Jazz Concert",
            "STRTDATE": "2025-05-01 00:00:00.0",
            "END_DATE": "2025-05-03 00:00:00.0",
            "PLACE": "Riverdale Amphitheater",
            "USE_FEE": "10 dollars",
            "ORG_LINK": "https://events.example.com/jazz",
            "USE_TRGT": "adult",
            "EVENT_TM": "19:00~21:00"
        });
        let event = map_row(&row, &test_source(), &test_region()).unwrap();

        assert_eq!(event.title, "Riverside Jazz Concert");
        assert_eq!(event.start.date().to_string(), "2025-05-01");
        assert_eq!(event.end.map(|e| e.date().to_string()).as_deref(), Some("2025-05-03"));
        assert_eq!(event.location.as_deref(), Some("Riverdale Amphitheater"));
        assert!(!event.is_free);
        assert_eq!(event.origin_url, "https://events.example.com/jazz");
        assert_eq!(event.age_range.min, 20);
        assert_eq!(event.start_time.as_deref(), Some("19:00"));
        assert_eq!(event.end_time.as_deref(), Some("21:00"));
        assert_eq!(event.region_id, 1);
    }

    #[test]
    fn test_map_row_title_fallback_chain() {
        let row = json!({"SVCNM": "Pottery Class", "STRTDATE": "2025-05-01"});
        let event = map_row(&row, &test_source(), &test_region()).unwrap();
        assert_eq!(event.title, "Pottery Class");
    }

    #[test]
    fn test_map_row_unparseable_date_is_dropped() {
        let row = json!({"TITLE": "Mystery Event", "STRTDATE": "to be announced"});
        assert!(map_row(&row, &test_source(), &test_region()).is_none());
    }

    #[test]
    fn test_map_row_missing_date_is_dropped() {
        let row = json!({"TITLE": "Mystery Event"});
        assert!(map_row(&row, &test_source(), &test_region()).is_none());
    }

    #[test]
    fn test_district_filter() {
        let in_district = json!({"GUNAME": "Riverdale", "TITLE": "A"});
        let elsewhere = json!({"GUNAME": "Oakton", "TITLE": "B"});
        let no_district = json!({"TITLE": "C"});

        assert!(passes_district_filter(&in_district, Some("Riverdale")));
        assert!(!passes_district_filter(&elsewhere, Some("Riverdale")));
        assert!(!passes_district_filter(&no_district, Some("Riverdale")));
        assert!(passes_district_filter(&no_district, None));
    }

    #[test]
    fn test_free_flag() {
        let flagged = json!({"TITLE": "A", "STRTDATE": "2025-05-01", "IS_FREE": "Free"});
        let event = map_row(&flagged, &test_source(), &test_region()).unwrap();
        assert!(event.is_free);

        let no_fee = json!({"TITLE": "B", "STRTDATE": "2025-05-01"});
        let event = map_row(&no_fee, &test_source(), &test_region()).unwrap();
        assert!(event.is_free);
        assert_eq!(event.fee, None);
    }
}
