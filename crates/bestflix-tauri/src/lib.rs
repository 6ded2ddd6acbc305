//! Bestflix Tauri Integration
//!
//! This crate provides Tauri commands that bind the Bestflix catalog core to
//! a web view. The web view only renders; search, paging, history locations
//! and backend calls all happen here.
//!
//! # Usage
//!
//! ```rust,ignore
//! use bestflix_tauri::AppState;
//! use tauri::Manager;
//!
//! fn main() {
//!     bestflix_tauri::init_tracing();
//!
//!     tauri::Builder::default()
//!         .setup(|app| {
//!             app.manage(AppState::new()?);
//!             Ok(())
//!         })
//!         .invoke_handler(tauri::generate_handler![
//!             bestflix_tauri::commands::auth_status,
//!             bestflix_tauri::commands::login,
//!             bestflix_tauri::commands::logout,
//!             bestflix_tauri::commands::register,
//!             bestflix_tauri::commands::forgot_password,
//!             bestflix_tauri::commands::reset_password,
//!             bestflix_tauri::commands::open_view,
//!             bestflix_tauri::commands::reload_view,
//!             bestflix_tauri::commands::autocomplete,
//!             bestflix_tauri::commands::submit_search,
//!             bestflix_tauri::commands::change_page,
//!             bestflix_tauri::commands::next_page,
//!             bestflix_tauri::commands::prev_page,
//!             bestflix_tauri::commands::navigate,
//!             bestflix_tauri::commands::get_item,
//!             bestflix_tauri::commands::open_item,
//!             bestflix_tauri::commands::media_urls,
//!             bestflix_tauri::commands::upload_item,
//!             bestflix_tauri::commands::update_item,
//!             bestflix_tauri::commands::delete_item,
//!         ])
//!         .run(tauri::generate_context!())
//!         .expect("error while running tauri application");
//! }
//! ```

pub mod commands;

use std::collections::HashMap;

use tokio::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bestflix_core::{
    BrowseSession, CatalogClient, CatalogSearchIndex, CatalogService, CatalogView, ClientConfig,
    LoadSequencer, LoadTicket, ResultsPage, SessionToken,
};

/// Message returned when a command targets a view that was never opened
const VIEW_NOT_OPEN: &str = "View is not open";

/// Install a `fmt` subscriber filtered by `RUST_LOG` (default `info`).
///
/// Calling it twice is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok();
    if installed {
        info!("Tracing initialized");
    }
}

/// Shared application state managed by Tauri.
///
/// Each view keeps its own browse session. Sessions sit behind an async mutex
/// because commands may run concurrently; the lock is never held across a
/// network call.
pub struct AppState {
    service: CatalogService,
    token: Mutex<Option<SessionToken>>,
    sessions: Mutex<HashMap<CatalogView, BrowseSession>>,
    loads: ViewLoads,
}

/// One load sequencer per view
#[derive(Default)]
struct ViewLoads {
    all_titles: LoadSequencer,
    tv_shows: LoadSequencer,
    my_collection: LoadSequencer,
}

impl ViewLoads {
    fn get(&self, view: CatalogView) -> &LoadSequencer {
        match view {
            CatalogView::AllTitles => &self.all_titles,
            CatalogView::TvShows => &self.tv_shows,
            CatalogView::MyCollection => &self.my_collection,
        }
    }
}

impl AppState {
    /// Create state with a client configured from the environment.
    ///
    /// # Errors
    /// Returns an error string if the HTTP client cannot be created.
    pub fn new() -> Result<Self, String> {
        let client = CatalogClient::with_config(ClientConfig::from_env()).map_err(|e| e.to_string())?;
        Ok(Self::with_service(CatalogService::with_client(client)))
    }

    /// Create state around an existing service.
    pub fn with_service(service: CatalogService) -> Self {
        Self {
            service,
            token: Mutex::new(None),
            sessions: Mutex::new(HashMap::new()),
            loads: ViewLoads::default(),
        }
    }

    /// The catalog service
    pub fn service(&self) -> &CatalogService {
        &self.service
    }

    /// Current bearer token, if signed in
    pub async fn token(&self) -> Option<SessionToken> {
        self.token.lock().await.clone()
    }

    /// Store or clear the bearer token.
    ///
    /// Any private collection load still in flight belongs to the previous
    /// token and is superseded. Clearing also closes the private view.
    pub async fn set_token(&self, token: Option<SessionToken>) {
        let signed_out = token.is_none();
        *self.token.lock().await = token;
        self.loads.get(CatalogView::MyCollection).begin();
        if signed_out {
            self.sessions.lock().await.remove(&CatalogView::MyCollection);
        }
    }

    /// Fetch a fresh snapshot for `view` and install it.
    ///
    /// An open session keeps its query and page and gets the new index; a
    /// closed view is opened at `location`. Returns `Ok(None)` when a newer
    /// load for the same view started in the meantime.
    ///
    /// # Errors
    /// Returns an error string if the snapshot cannot be loaded.
    pub async fn load_view(
        &self,
        view: CatalogView,
        location: Option<&str>,
    ) -> Result<Option<ResultsPage>, String> {
        let ticket = self.loads.get(view).begin();

        let token = self.token().await;
        let index = self
            .service
            .load_index(view, token.as_ref())
            .await
            .map_err(|e| e.to_string())?;

        Ok(self.install(view, ticket, index, location).await)
    }

    /// Rebuild every view a mutation may have changed.
    ///
    /// Open public views are reloaded in place; a failure there is logged
    /// and leaves the old snapshot. The private collection is reloaded (or
    /// opened) and its page returned.
    ///
    /// # Errors
    /// Returns an error string if the private collection cannot be loaded.
    pub async fn refresh_after_mutation(&self) -> Result<Option<ResultsPage>, String> {
        for view in [CatalogView::AllTitles, CatalogView::TvShows] {
            let open = self.sessions.lock().await.contains_key(&view);
            if !open {
                continue;
            }
            if let Err(e) = self.load_view(view, None).await {
                warn!(?view, "reload after mutation failed: {}", e);
            }
        }
        self.load_view(CatalogView::MyCollection, None).await
    }

    /// Install a loaded index unless `ticket` was superseded.
    ///
    /// The ticket is checked under the sessions lock, so a sign-out or a
    /// newer load cannot slip in between the check and the install.
    async fn install(
        &self,
        view: CatalogView,
        ticket: LoadTicket,
        index: CatalogSearchIndex,
        location: Option<&str>,
    ) -> Option<ResultsPage> {
        let mut sessions = self.sessions.lock().await;
        if !self.loads.get(view).is_current(ticket) {
            return None;
        }

        if location.is_none() {
            if let Some(session) = sessions.get_mut(&view) {
                return Some(session.replace_index(index));
            }
        }

        let session = BrowseSession::open(view, index, location.unwrap_or_default());
        let page = session.render();
        sessions.insert(view, session);
        Some(page)
    }

    /// Run `action` against the open session of `view`.
    ///
    /// # Errors
    /// Returns an error string if the view has not been opened.
    pub async fn with_session<R>(
        &self,
        view: CatalogView,
        action: impl FnOnce(&mut BrowseSession) -> R,
    ) -> Result<R, String> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(&view)
            .ok_or_else(|| VIEW_NOT_OPEN.to_string())?;
        Ok(action(session))
    }
}
