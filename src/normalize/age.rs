use crate::model::AgeRange;

/// Ordered keyword classes mapped to canonical age ranges
///
/// The first keyword found in the text wins, so narrower classes (young
/// adult) must appear before the broader words they contain (adult).
const AGE_KEYWORDS: &[(&str, u32, u32)] = &[
    ("infant", 0, 7),
    ("toddler", 0, 7),
    ("preschool", 0, 7),
    ("child", 8, 13),
    ("kids", 8, 13),
    ("elementary", 8, 13),
    ("teen", 14, 19),
    ("youth", 14, 19),
    ("adolescent", 14, 19),
    ("young adult", 20, 29),
    ("college", 20, 29),
    ("university", 20, 29),
    ("adult", 20, 64),
    ("senior", 65, 999),
    ("elder", 65, 999),
];

/// Maps age-group text onto a canonical range
///
/// Returns `None` when no keyword class matches; callers default to the
/// open `[0, 999]` range.
pub fn parse_age_range(text: &str) -> Option<AgeRange> {
    let lowered = text.to_lowercase();
    AGE_KEYWORDS
        .iter()
        .find(|(keyword, _, _)| lowered.contains(keyword))
        .map(|(_, min, max)| AgeRange::new(*min, *max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_classes() {
        assert_eq!(parse_age_range("Infant massage"), Some(AgeRange::new(0, 7)));
        assert_eq!(
            parse_age_range("Elementary school program"),
            Some(AgeRange::new(8, 13))
        );
        assert_eq!(parse_age_range("Teen coding camp"), Some(AgeRange::new(14, 19)));
        assert_eq!(
            parse_age_range("Young adult book club"),
            Some(AgeRange::new(20, 29))
        );
        assert_eq!(parse_age_range("Adults only"), Some(AgeRange::new(20, 64)));
        assert_eq!(
            parse_age_range("Senior wellness fair"),
            Some(AgeRange::new(65, 999))
        );
    }

    #[test]
    fn test_first_match_wins() {
        // "young adult" is listed before "adult" and must shadow it
        assert_eq!(
            parse_age_range("for young adult readers"),
            Some(AgeRange::new(20, 29))
        );
    }

    #[test]
    fn test_no_match_is_absent() {
        assert_eq!(parse_age_range("Open to everyone"), None);
        assert_eq!(parse_age_range(""), None);
    }
}
