use crate::model::Category;

/// Ordered category keyword table
///
/// Checked top to bottom over the title; the first category with a matching
/// keyword wins, which makes the mapping deterministic for titles carrying
/// keywords from several categories.
const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Festival,
        &["festival", "fair", "parade", "celebration"],
    ),
    (
        Category::Sports,
        &["sport", "marathon", "fitness", "tournament", "league", "race"],
    ),
    (
        Category::Education,
        &["class", "lecture", "course", "workshop", "seminar", "academy"],
    ),
    (
        Category::Welfare,
        &["welfare", "volunteer", "health", "care", "support group"],
    ),
    (
        Category::Administration,
        &["notice", "hearing", "briefing", "recruitment", "town hall"],
    ),
    (
        Category::Culture,
        &["concert", "exhibition", "museum", "theater", "gallery", "film"],
    ),
];

/// Maps a title onto its category tag
///
/// Pure and deterministic; titles matching nothing fall back to `Culture`.
pub fn map_category(title: &str) -> Category {
    let lowered = title.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_mapping() {
        assert_eq!(map_category("Riverside Jazz Concert"), Category::Culture);
        assert_eq!(map_category("Spring Flower Festival"), Category::Festival);
        assert_eq!(map_category("Youth Marathon 2025"), Category::Sports);
        assert_eq!(map_category("Watercolor workshop for beginners"), Category::Education);
        assert_eq!(map_category("Free health screening"), Category::Welfare);
        assert_eq!(map_category("Public hearing on zoning"), Category::Administration);
    }

    #[test]
    fn test_default_category() {
        assert_eq!(map_category("Something unclassifiable"), Category::Culture);
    }

    #[test]
    fn test_first_match_wins_across_categories() {
        // Festival is checked before Culture, so a title with both keywords
        // resolves to Festival.
        assert_eq!(map_category("Summer festival concert"), Category::Festival);
    }

    #[test]
    fn test_deterministic() {
        let title = "Night market fair with live concert";
        assert_eq!(map_category(title), map_category(title));
    }
}
