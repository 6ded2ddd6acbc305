//! In-memory search index over one catalog snapshot
//!
//! The index applies a view's category filter once at construction and then
//! answers substring queries against the resulting base set. Every query is a
//! pure function of the base set and its input.

use tracing::debug;

use crate::error::{CatalogError, Result};
use crate::types::{CatalogItem, Category};

/// Default number of autocomplete suggestions
pub const DEFAULT_SUGGESTION_LIMIT: usize = 5;

/// Normalize raw query text for matching.
///
/// Trims surrounding whitespace and lowercases.
///
/// # Example
/// ```
/// use bestflix_core::index::normalize_query;
///
/// assert_eq!(normalize_query("  Matrix  "), "matrix");
/// ```
pub fn normalize_query(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[derive(Debug, Clone)]
struct Entry {
    item: CatalogItem,
    /// Lowercased name, `None` for items that can never match
    key: Option<String>,
}

impl Entry {
    fn matches(&self, needle: &str) -> bool {
        self.key.as_deref().is_some_and(|key| key.contains(needle))
    }
}

/// Search index over an immutable snapshot of catalog items
#[derive(Debug, Clone, Default)]
pub struct CatalogSearchIndex {
    entries: Vec<Entry>,
    category: Option<Category>,
}

impl CatalogSearchIndex {
    /// Build an index from a snapshot.
    ///
    /// `items` is `None` when the source produced no snapshot at all; that is
    /// the only failure. An empty snapshot is valid and yields no results.
    ///
    /// # Errors
    /// Returns `CatalogError::EmptyInput` if `items` is `None`.
    pub fn build(items: Option<Vec<CatalogItem>>, category: Option<Category>) -> Result<Self> {
        let items = items.ok_or(CatalogError::EmptyInput)?;
        let snapshot_len = items.len();

        let entries: Vec<Entry> = items
            .into_iter()
            .filter(|item| match &category {
                Some(wanted) => item.category.as_ref() == Some(wanted),
                None => true,
            })
            .map(|item| Entry {
                key: item.name.as_deref().map(str::to_lowercase),
                item,
            })
            .collect();

        debug!(
            snapshot = snapshot_len,
            base_set = entries.len(),
            category = ?category,
            "built catalog index"
        );

        Ok(Self { entries, category })
    }

    /// Build an index from a raw backend JSON body.
    ///
    /// # Errors
    /// - `CatalogError::EmptyInput` if the body is JSON `null`
    /// - `CatalogError::JsonError` if the body is not an array of items
    pub fn from_json(body: &str, category: Option<Category>) -> Result<Self> {
        let items: Option<Vec<CatalogItem>> = serde_json::from_str(body)?;
        Self::build(items, category)
    }

    /// Category restriction applied at construction
    pub fn category(&self) -> Option<&Category> {
        self.category.as_ref()
    }

    /// Number of items in the base set
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the base set is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The whole base set in snapshot order
    pub fn base_set(&self) -> Vec<&CatalogItem> {
        self.entries.iter().map(|entry| &entry.item).collect()
    }

    /// All base-set items whose name contains `query`, case-insensitively.
    ///
    /// A blank query returns the entire base set, which keeps "no filter"
    /// distinct from "filter matching nothing". Snapshot order is preserved.
    pub fn filter(&self, query: &str) -> Vec<&CatalogItem> {
        let needle = normalize_query(query);
        if needle.is_empty() {
            return self.base_set();
        }
        self.entries
            .iter()
            .filter(|entry| entry.matches(&needle))
            .map(|entry| &entry.item)
            .collect()
    }

    /// Up to `limit` suggestions for `query`, in snapshot order.
    ///
    /// Unlike [`filter`](Self::filter), a blank query yields nothing.
    pub fn autocomplete(&self, query: &str, limit: usize) -> Vec<&CatalogItem> {
        let needle = normalize_query(query);
        if needle.is_empty() {
            return Vec::new();
        }
        self.entries
            .iter()
            .filter(|entry| entry.matches(&needle))
            .map(|entry| &entry.item)
            .take(limit)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ItemId;

    fn snapshot() -> Vec<CatalogItem> {
        vec![
            CatalogItem::new(1, "The Matrix", Category::Movie),
            CatalogItem::new(2, "The Matrix Reloaded", Category::Movie),
            CatalogItem::new(3, "Breaking Bad", Category::TvShow),
            CatalogItem::new(4, "matrix", Category::TvShow),
            CatalogItem::new(5, "Dark", Category::TvShow),
            CatalogItem::new(6, "Inception", Category::Movie),
        ]
    }

    fn ids(items: &[&CatalogItem]) -> Vec<ItemId> {
        items.iter().map(|item| item.id.clone()).collect()
    }

    #[test]
    fn test_build_rejects_missing_snapshot() {
        let result = CatalogSearchIndex::build(None, None);
        assert!(matches!(result, Err(CatalogError::EmptyInput)));
    }

    #[test]
    fn test_build_accepts_empty_snapshot() {
        let index = CatalogSearchIndex::build(Some(Vec::new()), None).unwrap();
        assert!(index.is_empty());
        assert!(index.filter("").is_empty());
        assert!(index.filter("anything").is_empty());
    }

    #[test]
    fn test_build_applies_category_once() {
        let index = CatalogSearchIndex::build(Some(snapshot()), Some(Category::TvShow)).unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.category(), Some(&Category::TvShow));
        assert!(index
            .filter("")
            .iter()
            .all(|item| item.category == Some(Category::TvShow)));
    }

    #[test]
    fn test_filter_empty_query_returns_base_set_in_order() {
        let index = CatalogSearchIndex::build(Some(snapshot()), None).unwrap();
        let all = index.filter("   ");
        assert_eq!(
            ids(&all),
            (1..=6).map(ItemId::Number).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_filter_normalizes_query() {
        let index = CatalogSearchIndex::build(Some(snapshot()), None).unwrap();
        let found = index.filter("  Matrix  ");
        assert_eq!(
            ids(&found),
            vec![ItemId::Number(1), ItemId::Number(2), ItemId::Number(4)]
        );
    }

    #[test]
    fn test_filter_no_match_is_empty() {
        let index = CatalogSearchIndex::build(Some(snapshot()), None).unwrap();
        assert!(index.filter("zzz").is_empty());
    }

    #[test]
    fn test_filter_respects_category() {
        let index = CatalogSearchIndex::build(Some(snapshot()), Some(Category::Movie)).unwrap();
        let found = index.filter("matrix");
        assert_eq!(ids(&found), vec![ItemId::Number(1), ItemId::Number(2)]);
    }

    #[test]
    fn test_nameless_items_never_match() {
        let mut items = snapshot();
        items.push(CatalogItem {
            name: None,
            ..CatalogItem::new(7, "", Category::Movie)
        });
        let index = CatalogSearchIndex::build(Some(items), None).unwrap();

        assert_eq!(index.filter("").len(), 7);
        assert!(index.filter("a").iter().all(|item| item.name.is_some()));
    }

    #[test]
    fn test_autocomplete_blank_is_empty() {
        let index = CatalogSearchIndex::build(Some(snapshot()), None).unwrap();
        assert!(index.autocomplete("", DEFAULT_SUGGESTION_LIMIT).is_empty());
        assert!(index.autocomplete("  ", DEFAULT_SUGGESTION_LIMIT).is_empty());
    }

    #[test]
    fn test_autocomplete_truncates_in_order() {
        let index = CatalogSearchIndex::build(Some(snapshot()), None).unwrap();
        let found = index.autocomplete("a", 2);
        assert_eq!(ids(&found), vec![ItemId::Number(1), ItemId::Number(2)]);
    }

    #[test]
    fn test_from_json_null_is_empty_input() {
        let result = CatalogSearchIndex::from_json("null", None);
        assert!(matches!(result, Err(CatalogError::EmptyInput)));
    }

    #[test]
    fn test_from_json_array() {
        let body = r#"[
            {"id": 1, "movieName": "Dark", "category": "TV Show"},
            {"id": 2, "movieName": "Up", "category": "Movie"},
            {"id": 3, "movieName": null, "category": "TV Show"}
        ]"#;
        let index = CatalogSearchIndex::from_json(body, Some(Category::TvShow)).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.filter("dark").len(), 1);
    }

    #[test]
    fn test_from_json_rejects_non_array() {
        let result = CatalogSearchIndex::from_json(r#"{"id": 1}"#, None);
        assert!(matches!(result, Err(CatalogError::JsonError(_))));
    }
}
