//! Per-view search state and its address-bar form
//!
//! A `SearchState` is what a view needs to reproduce exactly what the user was
//! looking at: the query, the page and the view's fixed category. It round
//! trips through a location query string so reloads and history navigation
//! land on the same page.

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};
use crate::index::normalize_query;
use crate::pagination::PageSize;
use crate::types::{Category, ItemId};

/// Query-string key for the search text
const QUERY_PARAM: &str = "query";
/// Query-string key for the page number
const PAGE_PARAM: &str = "page";
/// Query-string key for the category restriction
const CATEGORY_PARAM: &str = "category";
/// Query-string key for an item on detail pages
const ID_PARAM: &str = "id";

/// The fixed view contexts of the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CatalogView {
    /// Every public title, 24 per page
    AllTitles,
    /// Public TV shows only, 24 per page
    TvShows,
    /// The signed-in user's own uploads, 16 per page
    MyCollection,
}

impl CatalogView {
    /// Page capacity of the view
    pub fn page_size(self) -> PageSize {
        match self {
            CatalogView::AllTitles | CatalogView::TvShows => PageSize::PUBLIC,
            CatalogView::MyCollection => PageSize::PRIVATE,
        }
    }

    /// Category restriction applied to the view's base set
    pub fn category(self) -> Option<Category> {
        match self {
            CatalogView::TvShows => Some(Category::TvShow),
            CatalogView::AllTitles | CatalogView::MyCollection => None,
        }
    }

    /// Whether the view needs a signed-in user
    pub fn requires_session(self) -> bool {
        matches!(self, CatalogView::MyCollection)
    }

    /// Public view selected by a location's `category` parameter.
    ///
    /// Search result links carry `category=tvshows` when they were started
    /// from the TV-shows view; anything else lands on all titles.
    pub fn from_location(location: &str) -> Self {
        let category = parse_params(location)
            .into_iter()
            .find(|(key, _)| key == CATEGORY_PARAM)
            .map(|(_, value)| value);

        match category.as_deref().and_then(category_from_param) {
            Some(Category::TvShow) => CatalogView::TvShows,
            _ => CatalogView::AllTitles,
        }
    }
}

/// Mutable search state owned by one view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchState {
    /// Normalized search text, empty for "no filter"
    pub query: String,
    /// Fixed category restriction of the view
    pub category: Option<Category>,
    /// Current page (1-based)
    pub page: u32,
    /// Page capacity of the view
    pub page_size: PageSize,
}

impl SearchState {
    /// Fresh state for a view: no query, first page
    pub fn new(view: CatalogView) -> Self {
        Self {
            query: String::new(),
            category: view.category(),
            page: 1,
            page_size: view.page_size(),
        }
    }

    /// Reconstruct the state of `view` from a location query string.
    ///
    /// A leading `?` is optional. Unknown keys are ignored, a missing or
    /// unparsable page falls back to 1, and the view's own category always
    /// wins over whatever the location carries.
    ///
    /// # Example
    /// ```
    /// use bestflix_core::state::{CatalogView, SearchState};
    ///
    /// let state = SearchState::from_query_string(CatalogView::AllTitles, "?query=The+Matrix&page=2");
    /// assert_eq!(state.query, "the matrix");
    /// assert_eq!(state.page, 2);
    /// ```
    pub fn from_query_string(view: CatalogView, location: &str) -> Self {
        let mut state = Self::new(view);

        for (key, value) in parse_params(location) {
            match key.as_str() {
                QUERY_PARAM => state.query = normalize_query(&value),
                PAGE_PARAM => {
                    state.page = value.trim().parse::<u32>().ok().filter(|p| *p > 0).unwrap_or(1)
                }
                _ => {}
            }
        }

        state
    }

    /// Serialize into a location query string, including the leading `?`.
    ///
    /// The query is omitted when empty and the category when the view has none.
    pub fn to_query_string(&self) -> String {
        let mut params = Vec::with_capacity(3);

        if !self.query.is_empty() {
            params.push(format!("{}={}", QUERY_PARAM, urlencoding::encode(&self.query)));
        }
        if let Some(category) = &self.category {
            params.push(format!(
                "{}={}",
                CATEGORY_PARAM,
                urlencoding::encode(&category_to_param(category))
            ));
        }
        params.push(format!("{}={}", PAGE_PARAM, self.page));

        format!("?{}", params.join("&"))
    }

    /// Whether a search filter is active
    pub fn is_searching(&self) -> bool {
        !self.query.is_empty()
    }
}

/// Item addressed by a detail or edit page location (`?id=42`).
///
/// # Errors
/// Returns `CatalogError::InvalidId` if the location carries no usable `id`.
pub fn item_id_from_location(location: &str) -> Result<ItemId> {
    parse_params(location)
        .into_iter()
        .find(|(key, _)| key == ID_PARAM)
        .ok_or_else(|| CatalogError::InvalidId(location.to_string()))?
        .1
        .parse()
}

/// Location of the detail or edit page of `id`
pub fn item_location(id: &ItemId) -> String {
    format!("?{}={}", ID_PARAM, urlencoding::encode(&id.to_string()))
}

fn category_to_param(category: &Category) -> String {
    match category {
        Category::Movie => "movies".to_string(),
        Category::TvShow => "tvshows".to_string(),
        Category::Other(label) => label.clone(),
    }
}

fn category_from_param(value: &str) -> Option<Category> {
    match value.trim().to_lowercase().as_str() {
        "" => None,
        "tvshows" => Some(Category::TvShow),
        "movies" => Some(Category::Movie),
        _ => Some(Category::from(value.to_string())),
    }
}

/// Split a query string into decoded key/value pairs
fn parse_params(location: &str) -> Vec<(String, String)> {
    let query = match location.split_once('?') {
        Some((_, query)) => query,
        None => location,
    };
    let query = query.split('#').next().unwrap_or_default();

    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key), decode_component(value))
        })
        .collect()
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_page_sizes() {
        assert_eq!(CatalogView::AllTitles.page_size().get(), 24);
        assert_eq!(CatalogView::TvShows.page_size().get(), 24);
        assert_eq!(CatalogView::MyCollection.page_size().get(), 16);
    }

    #[test]
    fn test_view_categories() {
        assert_eq!(CatalogView::TvShows.category(), Some(Category::TvShow));
        assert_eq!(CatalogView::AllTitles.category(), None);
        assert!(CatalogView::MyCollection.requires_session());
    }

    #[test]
    fn test_view_from_location() {
        assert_eq!(
            CatalogView::from_location("resultPage.html?category=tvshows&query=dark"),
            CatalogView::TvShows
        );
        assert_eq!(
            CatalogView::from_location("resultPage.html?query=dark"),
            CatalogView::AllTitles
        );
    }

    #[test]
    fn test_new_state() {
        let state = SearchState::new(CatalogView::MyCollection);
        assert!(state.query.is_empty());
        assert_eq!(state.page, 1);
        assert_eq!(state.page_size, PageSize::PRIVATE);
        assert!(!state.is_searching());
    }

    #[test]
    fn test_to_query_string() {
        let mut state = SearchState::new(CatalogView::TvShows);
        state.query = "breaking bad".to_string();
        state.page = 3;
        assert_eq!(
            state.to_query_string(),
            "?query=breaking%20bad&category=tvshows&page=3"
        );
    }

    #[test]
    fn test_to_query_string_without_query() {
        let state = SearchState::new(CatalogView::AllTitles);
        assert_eq!(state.to_query_string(), "?page=1");
    }

    #[test]
    fn test_round_trip() {
        let mut state = SearchState::new(CatalogView::TvShows);
        state.query = "rick & morty?".to_string();
        state.page = 7;

        let restored = SearchState::from_query_string(CatalogView::TvShows, &state.to_query_string());
        assert_eq!(restored, state);
    }

    #[test]
    fn test_invalid_page_falls_back_to_first() {
        for location in ["?page=abc", "?page=0", "?page=-2", "?page=", ""] {
            let state = SearchState::from_query_string(CatalogView::AllTitles, location);
            assert_eq!(state.page, 1, "location {:?}", location);
        }
    }

    #[test]
    fn test_query_is_normalized_and_plus_decoded() {
        let state = SearchState::from_query_string(CatalogView::AllTitles, "query=++The+Matrix++");
        assert_eq!(state.query, "the matrix");
    }

    #[test]
    fn test_view_category_wins() {
        let state = SearchState::from_query_string(CatalogView::AllTitles, "?category=tvshows");
        assert_eq!(state.category, None);

        let state = SearchState::from_query_string(CatalogView::TvShows, "?page=2");
        assert_eq!(state.category, Some(Category::TvShow));
    }

    #[test]
    fn test_item_id_from_location() {
        assert_eq!(
            item_id_from_location("movie.html?id=17").unwrap(),
            ItemId::Number(17)
        );
        assert_eq!(
            item_id_from_location(&item_location(&ItemId::from("x y"))).unwrap(),
            ItemId::from("x y")
        );
        assert!(matches!(
            item_id_from_location("movie.html"),
            Err(CatalogError::InvalidId(_))
        ));
        assert!(matches!(
            item_id_from_location("?id="),
            Err(CatalogError::InvalidId(_))
        ));
    }

    #[test]
    fn test_full_location_with_fragment() {
        let state = SearchState::from_query_string(
            CatalogView::AllTitles,
            "/html/allmovies.html?page=4#top",
        );
        assert_eq!(state.page, 4);
    }
}
