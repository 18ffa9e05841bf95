use chrono::NaiveDateTime;

/// Event category tag
///
/// The closed set of category tags assigned to harvested events. Titles are
/// mapped onto this set by the normalizer's keyword table; `Culture` is the
/// default when nothing matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Culture,
    Sports,
    Education,
    Festival,
    Administration,
    Welfare,
}

impl Category {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Culture => "culture",
            Self::Sports => "sports",
            Self::Education => "education",
            Self::Festival => "festival",
            Self::Administration => "administration",
            Self::Welfare => "welfare",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "culture" => Some(Self::Culture),
            "sports" => Some(Self::Sports),
            "education" => Some(Self::Education),
            "festival" => Some(Self::Festival),
            "administration" => Some(Self::Administration),
            "welfare" => Some(Self::Welfare),
            _ => None,
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::Culture
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// Inclusive target age range for an event
///
/// Candidates without any age-group keyword default to the open range
/// `[0, 999]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeRange {
    pub min: u32,
    pub max: u32,
}

impl AgeRange {
    /// The open range used when no age group is detected
    pub const OPEN: AgeRange = AgeRange { min: 0, max: 999 };

    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }
}

impl Default for AgeRange {
    fn default() -> Self {
        Self::OPEN
    }
}

/// A normalized candidate event, not yet persisted
///
/// Produced by a connector for one extracted item during one collection run.
/// The deduplication identity is `(title, start)`.
#[derive(Debug, Clone)]
pub struct RawEvent {
    pub title: String,
    pub description: Option<String>,
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub location: Option<String>,
    pub address: Option<String>,
    pub age_range: AgeRange,
    pub target_groups: Vec<String>,
    pub is_free: bool,
    pub fee: Option<String>,
    pub origin_url: String,
    pub registration_url: Option<String>,
    pub image_url: Option<String>,
    pub category: Category,
    pub organizer: Option<String>,
    pub contact: Option<String>,
    pub region_id: i64,
}

impl RawEvent {
    /// Creates a candidate with the required fields and defaults elsewhere
    pub fn new(
        title: impl Into<String>,
        start: NaiveDateTime,
        origin_url: impl Into<String>,
        region_id: i64,
    ) -> Self {
        Self {
            title: title.into(),
            description: None,
            start,
            end: None,
            start_time: None,
            end_time: None,
            location: None,
            address: None,
            age_range: AgeRange::OPEN,
            target_groups: Vec::new(),
            is_free: true,
            fee: None,
            origin_url: origin_url.into(),
            registration_url: None,
            image_url: None,
            category: Category::default(),
            organizer: None,
            contact: None,
            region_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_category_roundtrip() {
        for category in &[
            Category::Culture,
            Category::Sports,
            Category::Education,
            Category::Festival,
            Category::Administration,
            Category::Welfare,
        ] {
            let db_str = category.to_db_string();
            assert_eq!(Category::from_db_string(db_str), Some(*category));
        }
    }

    #[test]
    fn test_category_invalid() {
        assert_eq!(Category::from_db_string("carnival"), None);
    }

    #[test]
    fn test_age_range_default_is_open() {
        let range = AgeRange::default();
        assert_eq!(range.min, 0);
        assert_eq!(range.max, 999);
    }

    #[test]
    fn test_raw_event_defaults() {
        let start = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let event = RawEvent::new("Spring Concert", start, "https://example.com/1", 1);

        assert_eq!(event.age_range, AgeRange::OPEN);
        assert_eq!(event.category, Category::Culture);
        assert!(event.is_free);
        assert!(event.target_groups.is_empty());
    }
}
