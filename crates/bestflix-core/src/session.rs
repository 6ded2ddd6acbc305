//! Browsing session state machine
//!
//! A `BrowseSession` is the view controller for one catalog view. It owns the
//! view's index and `SearchState` and turns user actions into rendered pages
//! plus the history update the view should apply:
//!
//! - typing: autocomplete suggestions, state untouched
//! - submitting a query: filter, page 1, push history
//! - changing page: paginate, push history
//! - back/forward navigation: rebuild state from the location, no push

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::index::{CatalogSearchIndex, DEFAULT_SUGGESTION_LIMIT};
use crate::pagination::{paginate, total_pages, PageControls};
use crate::state::{CatalogView, SearchState};
use crate::types::CatalogItem;

/// History change the view should apply after a transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryUpdate {
    /// Push a new entry with this location query string
    Push(String),
    /// Leave history alone
    Keep,
}

/// One rendered page of results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsPage {
    /// Items on the visible page
    pub items: Vec<CatalogItem>,
    /// Pagination bar
    pub controls: PageControls,
    /// Number of results across all pages
    pub total_results: usize,
    /// Active normalized query, empty when browsing
    pub query: String,
}

impl ResultsPage {
    /// Whether an active search matched nothing
    pub fn is_not_found(&self) -> bool {
        !self.query.is_empty() && self.total_results == 0
    }
}

/// Outcome of a state-changing action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// Page to render
    pub page: ResultsPage,
    /// History change to apply
    pub history: HistoryUpdate,
}

/// Autocomplete panel contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestions {
    /// Suggested items in snapshot order
    pub items: Vec<CatalogItem>,
    /// Query for the trailing "view all results" entry, present only with items
    pub view_all_query: Option<String>,
}

impl Suggestions {
    fn empty() -> Self {
        Self {
            items: Vec::new(),
            view_all_query: None,
        }
    }

    /// Whether the suggestion panel should be suppressed
    pub fn is_hidden(&self) -> bool {
        self.items.is_empty()
    }
}

/// View controller for one catalog view
#[derive(Debug, Clone)]
pub struct BrowseSession {
    view: CatalogView,
    index: CatalogSearchIndex,
    state: SearchState,
}

impl BrowseSession {
    /// Open a view at `location`, restoring query and page from it.
    pub fn open(view: CatalogView, index: CatalogSearchIndex, location: &str) -> Self {
        let state = SearchState::from_query_string(view, location);
        debug!(?view, query = %state.query, page = state.page, "opened browse session");
        Self { view, index, state }
    }

    /// The view this session drives
    pub fn view(&self) -> CatalogView {
        self.view
    }

    /// Current search state
    pub fn state(&self) -> &SearchState {
        &self.state
    }

    /// Current location query string
    pub fn location(&self) -> String {
        self.state.to_query_string()
    }

    /// Render the current state
    pub fn render(&self) -> ResultsPage {
        let results = self.index.filter(&self.state.query);
        let page = paginate(&results, self.state.page, self.state.page_size);
        let controls = PageControls::for_page(&page, results.len());

        ResultsPage {
            items: page.items.into_iter().cloned().collect(),
            controls,
            total_results: results.len(),
            query: self.state.query.clone(),
        }
    }

    /// Suggestions for text typed so far. State is not changed.
    pub fn type_query(&self, text: &str) -> Suggestions {
        let items: Vec<CatalogItem> = self
            .index
            .autocomplete(text, DEFAULT_SUGGESTION_LIMIT)
            .into_iter()
            .cloned()
            .collect();

        if items.is_empty() {
            return Suggestions::empty();
        }

        Suggestions {
            items,
            view_all_query: Some(text.trim().to_string()),
        }
    }

    /// Run a search and show its first page
    pub fn submit_query(&mut self, text: &str) -> Transition {
        self.state.query = crate::index::normalize_query(text);
        self.state.page = 1;
        info!(view = ?self.view, query = %self.state.query, "search submitted");
        self.push()
    }

    /// Jump to page `page`.
    ///
    /// Returns `None` when the page is outside `1..=total_pages`, which is the
    /// same as a disabled button.
    pub fn change_page(&mut self, page: u32) -> Option<Transition> {
        if page < 1 || page > self.total_pages() {
            return None;
        }
        self.state.page = page;
        Some(self.push())
    }

    /// Go to the following page, `None` on the last page
    pub fn next_page(&mut self) -> Option<Transition> {
        self.change_page(self.state.page.saturating_add(1))
    }

    /// Go to the preceding page, `None` on the first page
    pub fn prev_page(&mut self) -> Option<Transition> {
        self.change_page(self.state.page.saturating_sub(1))
    }

    /// Restore state after back/forward navigation. Never touches history.
    pub fn navigate(&mut self, location: &str) -> Transition {
        self.state = SearchState::from_query_string(self.view, location);
        debug!(view = ?self.view, page = self.state.page, "restored state from history");
        Transition {
            page: self.render(),
            history: HistoryUpdate::Keep,
        }
    }

    /// Swap in a freshly loaded snapshot, keeping query and page.
    ///
    /// The page is pulled back to the last one when the new snapshot is
    /// shorter, e.g. after deleting the only item on the last page.
    pub fn replace_index(&mut self, index: CatalogSearchIndex) -> ResultsPage {
        self.index = index;
        self.state.page = self.state.page.min(self.total_pages());
        self.render()
    }

    fn total_pages(&self) -> u32 {
        total_pages(self.index.filter(&self.state.query).len(), self.state.page_size)
    }

    fn push(&self) -> Transition {
        Transition {
            page: self.render(),
            history: HistoryUpdate::Push(self.location()),
        }
    }
}

/// Ticket identifying one snapshot load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket(u64);

/// Orders snapshot loads so that only the newest one is applied.
///
/// Start every fetch with [`begin`](Self::begin) and check
/// [`is_current`](Self::is_current) when it completes; a superseded result is
/// dropped instead of replacing the index.
#[derive(Debug, Default)]
pub struct LoadSequencer {
    latest: AtomicU64,
}

impl LoadSequencer {
    /// Create a sequencer with no loads issued
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket for a new load, superseding all earlier ones
    pub fn begin(&self) -> LoadTicket {
        LoadTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether `ticket` belongs to the most recent load
    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        let current = self.latest.load(Ordering::SeqCst) == ticket.0;
        if !current {
            debug!(ticket = ticket.0, "dropping stale snapshot load");
        }
        current
    }
}
