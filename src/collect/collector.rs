//! Per-source collection
//!
//! Dispatches to the right connector by descriptor kind and contains every
//! connector-level failure: collection for one source never throws past
//! this boundary.

use reqwest::Client;
use tracing::{info, warn};

use crate::connector::{collect_api_events, collect_page_events};
use crate::model::{RawEvent, SourceDescriptor, SourceSettings};
use crate::storage::RegionRecord;

/// Result of collecting one source
#[derive(Debug, Default)]
pub struct CollectOutcome {
    pub candidates: Vec<RawEvent>,
    pub errors: Vec<String>,
}

impl CollectOutcome {
    fn from_error(message: String) -> Self {
        Self {
            candidates: Vec::new(),
            errors: vec![message],
        }
    }
}

/// Collects candidate events from one source
///
/// Any failure is recorded in the outcome's `errors` instead of
/// propagating, so a broken source can never abort the sweep.
pub async fn collect_source(
    client: &Client,
    source: &SourceDescriptor,
    region: &RegionRecord,
) -> CollectOutcome {
    info!("Collecting '{}' ({})", source.name, source.kind.to_db_string());

    let settings = match SourceSettings::parse(source.kind, &source.settings) {
        Ok(settings) => settings,
        Err(e) => {
            warn!("'{}': unusable settings: {}", source.name, e);
            return CollectOutcome::from_error(format!("settings: {}", e));
        }
    };

    let result = match &settings {
        SourceSettings::Api(api) => collect_api_events(client, source, api, region).await,
        SourceSettings::Page(page) => collect_page_events(client, source, page, region).await,
    };

    match result {
        Ok(candidates) => {
            info!("'{}': {} candidates", source.name, candidates.len());
            CollectOutcome {
                candidates,
                errors: Vec::new(),
            }
        }
        Err(e) => {
            warn!("'{}': collection failed: {}", source.name, e);
            CollectOutcome::from_error(e.to_string())
        }
    }
}
