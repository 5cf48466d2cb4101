//! Search Suggestion Pipeline
//!
//! Keystrokes are debounced on the search channel: every input begins a new
//! search token, so a keystroke both restarts the quiet period and drops any
//! older query still in flight. Completed queries replace the suggestion list
//! wholesale.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{GeoError, Result};
use crate::services::{Geocoder, SearchHit};
use crate::supersession::{Channel, OperationToken, SupersessionController};

// == Navigation Keys ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NavKey {
    Up,
    Down,
    Enter,
    Escape,
}

// == Status Line ==
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "count", rename_all = "snake_case")]
pub enum SearchStatus {
    #[default]
    Idle,
    Searching,
    Results(usize),
    NothingFound,
    Failed,
    RateLimited,
}

impl SearchStatus {
    pub fn message(&self) -> String {
        match self {
            SearchStatus::Idle => String::new(),
            SearchStatus::Searching => "Searching…".to_string(),
            SearchStatus::Results(1) => "1 result".to_string(),
            SearchStatus::Results(n) => format!("{n} results"),
            SearchStatus::NothingFound => "Nothing found".to_string(),
            SearchStatus::Failed => "Search failed".to_string(),
            SearchStatus::RateLimited => "Too many requests, try again shortly".to_string(),
        }
    }
}

// == Suggestion List ==
/// Ranked candidates with at most one highlighted entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SuggestionList {
    items: Vec<SearchHit>,
    highlight: Option<usize>,
}

/// Result of a key press on the list.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyOutcome {
    Highlighted(usize),
    Commit(SearchHit),
    Cleared,
    Ignored,
}

impl SuggestionList {
    pub fn items(&self) -> &[SearchHit] {
        &self.items
    }

    pub fn highlight(&self) -> Option<usize> {
        self.highlight
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn replace(&mut self, items: Vec<SearchHit>) {
        self.items = items;
        self.highlight = None;
    }

    pub fn clear(&mut self) {
        self.replace(Vec::new());
    }

    pub fn key(&mut self, key: NavKey) -> KeyOutcome {
        let len = self.items.len();
        match key {
            NavKey::Escape => {
                self.clear();
                KeyOutcome::Cleared
            }
            _ if len == 0 => KeyOutcome::Ignored,
            NavKey::Down => {
                let next = self.highlight.map_or(0, |i| (i + 1) % len);
                self.highlight = Some(next);
                KeyOutcome::Highlighted(next)
            }
            NavKey::Up => {
                let next = self.highlight.map_or(len - 1, |i| (i + len - 1) % len);
                self.highlight = Some(next);
                KeyOutcome::Highlighted(next)
            }
            NavKey::Enter => {
                let index = self.highlight.unwrap_or(0);
                match self.items.get(index).cloned() {
                    Some(hit) => {
                        self.clear();
                        KeyOutcome::Commit(hit)
                    }
                    None => KeyOutcome::Ignored,
                }
            }
        }
    }
}

// == Search Outcome ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SearchOutcome {
    Suggestions { count: usize },
    /// Too short or empty; nothing was sent.
    Skipped,
    Superseded,
}

#[derive(Debug, Default)]
struct SearchState {
    query: String,
    status: SearchStatus,
    suggestions: SuggestionList,
}

/// Serializable copy of the pipeline state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchSnapshot {
    pub query: String,
    pub status: SearchStatus,
    pub message: String,
    pub suggestions: SuggestionList,
}

// == Search Pipeline ==
pub struct SearchPipeline {
    geocoder: Arc<dyn Geocoder>,
    supersession: Arc<SupersessionController>,
    debounce: Duration,
    min_chars: usize,
    state: Mutex<SearchState>,
}

impl SearchPipeline {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        supersession: Arc<SupersessionController>,
        debounce: Duration,
        min_chars: usize,
    ) -> Self {
        Self {
            geocoder,
            supersession,
            debounce,
            min_chars,
            state: Mutex::new(SearchState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, SearchState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        let state = self.state();
        SearchSnapshot {
            query: state.query.clone(),
            status: state.status,
            message: state.status.message(),
            suggestions: state.suggestions.clone(),
        }
    }

    // == Input ==
    /// A keystroke. Queries once the text has been quiet for the debounce
    /// period and is at least `min_chars` long.
    pub async fn input(&self, text: &str) -> Result<SearchOutcome> {
        let query = text.trim().to_string();
        let token = self.supersession.begin(Channel::Search);
        self.state().query = query.clone();

        if query.chars().count() < self.min_chars {
            self.stand_down(&token);
            return Ok(SearchOutcome::Skipped);
        }

        let quiet = self
            .supersession
            .guard(&token, tokio::time::sleep(self.debounce))
            .await;
        if quiet.is_none() {
            debug!("Search input {:?} superseded while debouncing", query);
            return Ok(SearchOutcome::Superseded);
        }

        self.run(token, query).await
    }

    // == Submit ==
    /// Form submit: searches right away, any non-empty text.
    pub async fn submit(&self, text: &str) -> Result<SearchOutcome> {
        let query = text.trim().to_string();
        let token = self.supersession.begin(Channel::Search);
        self.state().query = query.clone();

        if query.is_empty() {
            self.stand_down(&token);
            return Ok(SearchOutcome::Skipped);
        }
        self.run(token, query).await
    }

    async fn run(&self, token: OperationToken, query: String) -> Result<SearchOutcome> {
        self.state().status = SearchStatus::Searching;

        let Some(result) = self
            .supersession
            .guard(&token, self.geocoder.search(&query))
            .await
        else {
            return Ok(SearchOutcome::Superseded);
        };

        let mut state = self.state();
        if !self.supersession.is_current(&token) {
            return Ok(SearchOutcome::Superseded);
        }
        self.supersession.settle(&token);

        match result {
            Ok(hits) => {
                let count = hits.len();
                debug!("Search {:?} returned {} candidates", query, count);
                state.status = if count == 0 {
                    SearchStatus::NothingFound
                } else {
                    SearchStatus::Results(count)
                };
                state.suggestions.replace(hits);
                Ok(SearchOutcome::Suggestions { count })
            }
            Err(e) => {
                warn!("Search {:?} failed: {}", query, e);
                state.status = match e {
                    GeoError::RateLimited => SearchStatus::RateLimited,
                    _ => SearchStatus::Failed,
                };
                Err(e)
            }
        }
    }

    // == Keyboard ==
    /// Escape also drops a pending query so the list stays closed.
    pub fn key(&self, key: NavKey) -> KeyOutcome {
        if key == NavKey::Escape {
            self.cancel_pending();
        }
        self.state().suggestions.key(key)
    }

    /// Click outside the search region.
    pub fn dismiss(&self) {
        self.cancel_pending();
        self.state().suggestions.clear();
    }

    // == Choose ==
    /// Pointer selection of entry `index`; closes the list like Enter does.
    pub fn choose(&self, index: usize) -> Option<SearchHit> {
        let hit = {
            let mut state = self.state();
            let hit = state.suggestions.items().get(index).cloned()?;
            state.suggestions.clear();
            hit
        };
        self.cancel_pending();
        Some(hit)
    }

    fn cancel_pending(&self) {
        let token = self.supersession.begin(Channel::Search);
        self.stand_down(&token);
    }

    /// Settles `token` and clears the status line under one lock, so no
    /// "searching" status outlives the query it described.
    fn stand_down(&self, token: &OperationToken) {
        let mut state = self.state();
        self.supersession.settle(token);
        state.status = SearchStatus::Idle;
    }
}
