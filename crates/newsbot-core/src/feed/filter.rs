use std::collections::HashSet;

use super::models::Item;

/// Decide whether an item is dropped before storage
///
/// An item is skipped when a keyword equals one of its categories exactly, or
/// occurs in its lowercased title. An empty keyword list never skips.
pub fn should_skip(item: &Item, keywords: &[String]) -> bool {
    if keywords.is_empty() {
        return false;
    }

    let categories: HashSet<&str> = item.categories.iter().map(String::as_str).collect();
    let title = item.title.to_lowercase();

    keywords
        .iter()
        .any(|keyword| categories.contains(keyword.as_str()) || title.contains(keyword.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(title: &str, categories: &[&str]) -> Item {
        Item {
            title: title.to_string(),
            link: "https://example.com/a".to_string(),
            summary: String::new(),
            published_at: Utc::now(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
            source_name: "test".to_string(),
        }
    }

    fn keywords(list: &[&str]) -> Vec<String> {
        list.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_empty_keywords_never_skip() {
        assert!(!should_skip(&item("Sponsored post", &["ads"]), &[]));
    }

    #[test]
    fn test_category_match_is_exact_and_case_sensitive() {
        let kw = keywords(&["Ads"]);
        assert!(should_skip(&item("Quarterly results", &["Ads", "Business"]), &kw));
        assert!(!should_skip(&item("Quarterly results", &["ads"]), &kw));
        assert!(!should_skip(&item("Quarterly results", &["Adsense"]), &kw));
    }

    #[test]
    fn test_category_match_ignores_title() {
        let kw = keywords(&["crypto"]);
        assert!(should_skip(&item("Nothing relevant in the title", &["crypto"]), &kw));
    }

    #[test]
    fn test_title_substring_is_case_insensitive() {
        let kw = keywords(&["sponsored"]);
        assert!(should_skip(&item("SPONSORED: Buy now", &[]), &kw));
        assert!(should_skip(&item("A non-sponsored review", &["Tech"]), &kw));
        assert!(!should_skip(&item("Regular news", &["Tech"]), &kw));
    }

    #[test]
    fn test_uppercase_keyword_never_matches_title() {
        // titles are lowercased, keywords are not
        let kw = keywords(&["Sponsored"]);
        assert!(!should_skip(&item("Sponsored post", &[]), &kw));
    }
}
