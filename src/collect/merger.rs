//! Candidate merging
//!
//! Deduplicates candidates against persisted events by the (title, start)
//! identity and decides insert vs. update. Each candidate is merged
//! independently; one storage failure never blocks the rest of the batch.
//! The lookup-then-write sequence is not atomic across concurrent runs.

use chrono::Local;
use tracing::warn;

use crate::model::RawEvent;
use crate::storage::Storage;

/// Counts returned by one merge pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeCounts {
    pub added: u32,
    pub updated: u32,
}

/// Merges candidates into the persisted store
///
/// An existing event with the same identity only gets its description (when
/// the candidate provides one), origin URL, and sync timestamp refreshed;
/// a new identity is inserted carrying all candidate fields plus the owning
/// source reference.
pub fn merge_candidates<S: Storage>(
    storage: &mut S,
    candidates: &[RawEvent],
    source_id: i64,
) -> MergeCounts {
    let now = Local::now().naive_local();
    let mut counts = MergeCounts::default();

    for candidate in candidates {
        match storage.find_event_by_identity(&candidate.title, candidate.start) {
            Ok(Some(existing)) => {
                match storage.refresh_event(
                    existing.id,
                    candidate.description.as_deref(),
                    &candidate.origin_url,
                    now,
                ) {
                    Ok(()) => counts.updated += 1,
                    Err(e) => warn!("failed to refresh '{}': {}", candidate.title, e),
                }
            }
            Ok(None) => match storage.insert_event(candidate, source_id, now) {
                Ok(_) => counts.added += 1,
                Err(e) => warn!("failed to insert '{}': {}", candidate.title, e),
            },
            Err(e) => warn!("identity lookup failed for '{}': {}", candidate.title, e),
        }
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SourceKind, RawEvent};
    use crate::storage::{NewSource, SqliteStorage};
    use chrono::NaiveDate;

    fn ts(y: i32, m: u32, d: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn setup() -> (SqliteStorage, i64, i64) {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let region_id = storage.upsert_region("Riverdale", "riverdale", true).unwrap();
        let source_id = storage
            .insert_source(&NewSource {
                name: "Board".to_string(),
                kind: SourceKind::Page,
                url: "https://x.test/events".to_string(),
                region_id,
                enabled: true,
                settings: "{}".to_string(),
            })
            .unwrap();
        (storage, region_id, source_id)
    }

    fn candidates(region_id: i64) -> Vec<RawEvent> {
        vec![
            RawEvent::new("Harvest Fair", ts(2025, 10, 1), "https://x.test/e/1", region_id),
            RawEvent::new("Night Market", ts(2025, 10, 2), "https://x.test/e/2", region_id),
        ]
    }

    #[test]
    fn test_first_merge_adds_all() {
        let (mut storage, region_id, source_id) = setup();

        let counts = merge_candidates(&mut storage, &candidates(region_id), source_id);
        assert_eq!(counts, MergeCounts { added: 2, updated: 0 });
        assert_eq!(storage.count_events().unwrap(), 2);
    }

    #[test]
    fn test_remerge_is_idempotent() {
        let (mut storage, region_id, source_id) = setup();
        let batch = candidates(region_id);

        merge_candidates(&mut storage, &batch, source_id);
        let counts = merge_candidates(&mut storage, &batch, source_id);

        // Second pass adds nothing; both candidates only refresh
        assert_eq!(counts, MergeCounts { added: 0, updated: 2 });
        assert_eq!(storage.count_events().unwrap(), 2);
    }

    #[test]
    fn test_same_title_different_start_is_new_identity() {
        let (mut storage, region_id, source_id) = setup();

        let first = vec![RawEvent::new("Fair", ts(2025, 10, 1), "https://x.test/1", region_id)];
        let second = vec![RawEvent::new("Fair", ts(2025, 10, 8), "https://x.test/1", region_id)];

        merge_candidates(&mut storage, &first, source_id);
        let counts = merge_candidates(&mut storage, &second, source_id);

        assert_eq!(counts.added, 1);
        assert_eq!(storage.count_events().unwrap(), 2);
    }

    #[test]
    fn test_update_refreshes_origin_url_and_description() {
        let (mut storage, region_id, source_id) = setup();

        let mut original = RawEvent::new("Fair", ts(2025, 10, 1), "https://x.test/old", region_id);
        original.location = Some("Main Square".to_string());
        merge_candidates(&mut storage, &[original], source_id);

        let mut update = RawEvent::new("Fair", ts(2025, 10, 1), "https://x.test/new", region_id);
        update.description = Some("Bigger this year".to_string());
        update.location = Some("Other Square".to_string());
        merge_candidates(&mut storage, &[update], source_id);

        let event = storage
            .find_event_by_identity("Fair", ts(2025, 10, 1))
            .unwrap()
            .unwrap();
        assert_eq!(event.origin_url, "https://x.test/new");
        assert_eq!(event.description.as_deref(), Some("Bigger this year"));
        // Location keeps the originally recorded value
        assert_eq!(event.location.as_deref(), Some("Main Square"));
    }

    #[test]
    fn test_one_bad_candidate_does_not_block_the_rest() {
        let (mut storage, region_id, source_id) = setup();

        let mut batch = candidates(region_id);
        // A nonexistent region violates the foreign key for one candidate
        batch.insert(
            1,
            RawEvent::new("Broken", ts(2025, 10, 3), "https://x.test/e/3", region_id + 999),
        );

        let counts = merge_candidates(&mut storage, &batch, source_id);
        assert_eq!(counts.added, 2);
        assert_eq!(storage.count_events().unwrap(), 2);
    }
}
