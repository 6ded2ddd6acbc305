use bestflix_core::pagination::{paginate, PageSize, PageWindow};
use bestflix_core::{CatalogItem, CatalogSearchIndex, Category, ItemId};
use proptest::prelude::*;

fn snapshot_from(names: Vec<String>) -> Vec<CatalogItem> {
    names
        .into_iter()
        .enumerate()
        .map(|(i, name)| CatalogItem::new(i as i64, name, Category::Movie))
        .collect()
}

fn id_number(item: &CatalogItem) -> i64 {
    match item.id {
        ItemId::Number(n) => n,
        ItemId::Text(_) => unreachable!("test snapshots use numeric ids"),
    }
}

fn names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-zA-Z ]{0,12}", 0..80)
}

proptest! {
    #[test]
    fn blank_filter_returns_whole_snapshot(names in names(), blank in "[ \t]{0,3}") {
        let snapshot = snapshot_from(names);
        let index = CatalogSearchIndex::build(Some(snapshot.clone()), None).unwrap();

        let found: Vec<CatalogItem> = index.filter(&blank).into_iter().cloned().collect();
        prop_assert_eq!(found, snapshot);
    }

    #[test]
    fn filter_is_ordered_subset_of_matches(names in names(), query in "[a-zA-Z ]{0,4}") {
        let snapshot = snapshot_from(names);
        let index = CatalogSearchIndex::build(Some(snapshot.clone()), None).unwrap();
        let needle = query.trim().to_lowercase();

        let found = index.filter(&query);
        let ids: Vec<i64> = found.iter().map(|item| id_number(item)).collect();
        prop_assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));

        for item in &found {
            let name = item.name.as_deref().unwrap().to_lowercase();
            prop_assert!(name.contains(&needle));
        }

        let expected = snapshot
            .iter()
            .filter(|item| item.name.as_deref().unwrap().to_lowercase().contains(&needle))
            .count();
        prop_assert_eq!(found.len(), expected);
    }

    #[test]
    fn pages_partition_results(count in 0usize..200, size in 1usize..40) {
        let results: Vec<usize> = (0..count).collect();
        let page_size = PageSize::new(size).unwrap();
        let total = paginate(&results, 1, page_size).total_pages;

        let mut joined = Vec::new();
        for page in 1..=total {
            let slice = paginate(&results, page, page_size);
            prop_assert!(slice.items.len() <= size);
            prop_assert_eq!(slice.total_pages, total);
            joined.extend(slice.items);
        }

        prop_assert_eq!(joined, results);
        prop_assert!(paginate(&[] as &[usize], 1, page_size).total_pages == 1);
    }

    #[test]
    fn autocomplete_is_bounded(names in names(), query in "[a-zA-Z ]{0,4}", limit in 0usize..10) {
        let index = CatalogSearchIndex::build(Some(snapshot_from(names)), None).unwrap();

        prop_assert!(index.autocomplete("", limit).is_empty());

        let suggestions = index.autocomplete(&query, limit);
        prop_assert!(suggestions.len() <= limit);

        let filtered = index.filter(&query);
        if !query.trim().is_empty() {
            let expected: Vec<&CatalogItem> = filtered.into_iter().take(limit).collect();
            prop_assert_eq!(suggestions, expected);
        }
    }

    #[test]
    fn window_contains_current_page(total in 1u32..100, current in 0u32..300) {
        let window = PageWindow::select(current, total);

        prop_assert!(window.start >= 1);
        prop_assert!(window.start <= window.end);
        prop_assert!(window.end <= total);
        prop_assert_eq!(window.len(), total.min(3) as usize);
        prop_assert!(window.pages().contains(&current.clamp(1, total)));
    }
}

fn spreadsheet_names(count: usize) -> Vec<String> {
    let letters: Vec<char> = ('A'..='Z').collect();
    (0..count)
        .map(|i| {
            if i < 26 {
                letters[i].to_string()
            } else {
                format!("A{}", letters[i - 26])
            }
        })
        .collect()
}

#[test]
fn thirty_items_split_into_two_pages() {
    let names = spreadsheet_names(30);
    assert_eq!(names.last().map(String::as_str), Some("AD"));

    let index = CatalogSearchIndex::build(Some(snapshot_from(names)), None).unwrap();
    let results = index.filter("");

    let first = paginate(&results, 1, PageSize::PUBLIC);
    let second = paginate(&results, 2, PageSize::PUBLIC);

    assert_eq!(first.items.len(), 24);
    assert_eq!(second.items.len(), 6);
    assert_eq!(first.total_pages, 2);
}

#[test]
fn last_of_five_pages_is_flush_right() {
    let window = PageWindow::select(5, 5);
    assert_eq!((window.start, window.end), (3, 5));
}

#[test]
fn padded_mixed_case_query_matches() {
    let snapshot = vec![
        CatalogItem::new(1, "The Matrix Reloaded", Category::Movie),
        CatalogItem::new(2, "matrix", Category::Movie),
        CatalogItem::new(3, "Inception", Category::Movie),
    ];
    let index = CatalogSearchIndex::build(Some(snapshot), None).unwrap();

    let found: Vec<&str> = index
        .filter("  Matrix  ")
        .iter()
        .filter_map(|item| item.name.as_deref())
        .collect();
    assert_eq!(found, vec!["The Matrix Reloaded", "matrix"]);
}
