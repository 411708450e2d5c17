//! Search form state and client-side pagination

use crate::constants::SEARCH_PAGE_SIZE;
use crate::types::{SearchResultEntry, SearchType, Source};
use serde::Deserialize;
use tracing::debug;

/// Structured detail the backend attaches to a failed search
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchDebugInfo {
    pub return_code: Option<i64>,
    pub stdout_preview: Option<String>,
    pub exception_type: Option<String>,
}

/// Result of one search call
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Results(Vec<SearchResultEntry>),
    /// A normal "nothing found", optionally with the backend's explanation
    Empty { message: Option<String> },
    /// The search itself failed
    Failed { error: String, debug: Option<SearchDebugInfo> },
}

/// Inputs of the search bar with the per-source capability gate
#[derive(Debug, Clone, PartialEq)]
pub struct SearchForm {
    pub query: String,
    search_type: SearchType,
    source: Source,
}

impl SearchForm {
    pub fn new(search_type: SearchType, source: Source) -> Self {
        let mut form = Self { query: String::new(), search_type, source };
        form.set_source(source);
        form
    }

    pub fn search_type(&self) -> SearchType {
        self.search_type
    }

    pub fn source(&self) -> Source {
        self.source
    }

    /// Switch service; an unsupported type falls back to tracks
    pub fn set_source(&mut self, source: Source) {
        self.source = source;
        if !source.supports(self.search_type) {
            debug!(source = source.as_str(), from = self.search_type.as_str(), "Search type forced to track");
            self.search_type = SearchType::Track;
        }
    }

    /// Returns false when the current source does not offer `search_type`
    pub fn set_search_type(&mut self, search_type: SearchType) -> bool {
        if !self.type_enabled(search_type) {
            return false;
        }
        self.search_type = search_type;
        true
    }

    pub fn type_enabled(&self, search_type: SearchType) -> bool {
        self.source.supports(search_type)
    }
}

/// Identifies one issued search so late responses can be recognised
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTicket(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum SearchState {
    Idle,
    Loading,
    Done(SearchOutcome),
}

pub struct SearchPager {
    state: SearchState,
    seq: u64,
    page: usize,
    page_size: usize,
    /// Source of the search the current state belongs to
    source: Source,
}

impl Default for SearchPager {
    fn default() -> Self {
        Self {
            state: SearchState::Idle,
            seq: 0,
            page: 1,
            page_size: SEARCH_PAGE_SIZE,
            source: Source::default(),
        }
    }
}

impl SearchPager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new search; any response for an older ticket is ignored from now on
    pub fn begin(&mut self, source: Source) -> SearchTicket {
        self.seq += 1;
        self.state = SearchState::Loading;
        self.source = source;
        self.page = 1;
        SearchTicket(self.seq)
    }

    /// Apply a response. Returns false if `ticket` was superseded.
    pub fn complete(&mut self, ticket: SearchTicket, outcome: SearchOutcome) -> bool {
        if ticket.0 != self.seq {
            debug!(ticket = ticket.0, latest = self.seq, "Discarding stale search response");
            return false;
        }
        let outcome = match outcome {
            SearchOutcome::Results(results) if results.is_empty() => {
                SearchOutcome::Empty { message: None }
            }
            other => other,
        };
        self.state = SearchState::Done(outcome);
        self.page = 1;
        true
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn results(&self) -> &[SearchResultEntry] {
        match &self.state {
            SearchState::Done(SearchOutcome::Results(results)) => results,
            _ => &[],
        }
    }

    pub fn total(&self) -> usize {
        self.results().len()
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_count(&self) -> usize {
        self.total().div_ceil(self.page_size)
    }

    pub fn can_go(&self, delta: i32) -> bool {
        self.target_page(delta).is_some()
    }

    fn target_page(&self, delta: i32) -> Option<usize> {
        let target = self.page as i64 + delta as i64;
        if delta == 0 || target < 1 || target > self.page_count() as i64 {
            return None;
        }
        Some(target as usize)
    }

    /// Move by `delta` pages; out-of-range moves are no-ops
    pub fn change_page(&mut self, delta: i32) -> bool {
        match self.target_page(delta) {
            Some(page) => {
                self.page = page;
                true
            }
            None => false,
        }
    }

    /// Entries on the current page, with their index into the full result set
    pub fn current_page(&self) -> impl Iterator<Item = (usize, &SearchResultEntry)> {
        let start = (self.page - 1) * self.page_size;
        self.results().iter().enumerate().skip(start).take(self.page_size)
    }

    pub fn page_range(&self) -> Option<(usize, usize)> {
        if self.total() == 0 {
            return None;
        }
        let start = (self.page - 1) * self.page_size + 1;
        let end = (self.page * self.page_size).min(self.total());
        Some((start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(n: usize) -> Vec<SearchResultEntry> {
        (0..n)
            .map(|i| SearchResultEntry {
                id: i.to_string(),
                service: "qobuz".into(),
                kind: "album".into(),
                url: Some(format!("https://open.qobuz.com/album/{}", i)),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn paginates_twenty_three_results() {
        let mut pager = SearchPager::new();
        let ticket = pager.begin(Source::Qobuz);
        assert!(pager.complete(ticket, SearchOutcome::Results(entries(23))));

        assert_eq!(pager.page_count(), 3);
        assert_eq!(pager.page(), 1);
        assert!(!pager.change_page(-1));
        assert_eq!(pager.page(), 1);

        assert!(pager.change_page(1));
        assert!(pager.change_page(1));
        assert_eq!(pager.page(), 3);
        assert_eq!(pager.current_page().count(), 3);
        assert_eq!(pager.current_page().next().map(|(i, _)| i), Some(20));
        assert_eq!(pager.page_range(), Some((21, 23)));

        assert!(!pager.can_go(1));
        assert!(!pager.change_page(1));
        assert_eq!(pager.page(), 3);
    }

    #[test]
    fn new_search_resets_to_first_page() {
        let mut pager = SearchPager::new();
        let first = pager.begin(Source::Qobuz);
        pager.complete(first, SearchOutcome::Results(entries(30)));
        pager.change_page(2);
        assert_eq!(pager.page(), 3);

        let second = pager.begin(Source::Tidal);
        assert_eq!(pager.state(), &SearchState::Loading);
        pager.complete(second, SearchOutcome::Results(entries(5)));
        assert_eq!(pager.page(), 1);
        assert_eq!(pager.page_count(), 1);
        assert_eq!(pager.source(), Source::Tidal);
    }

    #[test]
    fn stale_response_cannot_overwrite_newer_results() {
        let mut pager = SearchPager::new();
        let old = pager.begin(Source::Qobuz);
        let new = pager.begin(Source::Qobuz);

        assert!(pager.complete(new, SearchOutcome::Results(entries(4))));
        assert!(!pager.complete(old, SearchOutcome::Results(entries(40))));
        assert_eq!(pager.total(), 4);
    }

    #[test]
    fn empty_results_become_empty_outcome() {
        let mut pager = SearchPager::new();
        let ticket = pager.begin(Source::Deezer);
        pager.complete(ticket, SearchOutcome::Results(vec![]));
        assert_eq!(pager.state(), &SearchState::Done(SearchOutcome::Empty { message: None }));
        assert_eq!(pager.page_count(), 0);
        assert!(!pager.can_go(1));
        assert!(!pager.can_go(-1));
        assert_eq!(pager.current_page().count(), 0);
        assert_eq!(pager.page_range(), None);
    }

    #[test]
    fn soundcloud_forces_track_and_restoring_source_keeps_type() {
        let mut form = SearchForm::new(SearchType::Album, Source::Qobuz);
        form.set_source(Source::Soundcloud);
        assert_eq!(form.search_type(), SearchType::Track);
        assert!(!form.type_enabled(SearchType::Album));
        assert!(!form.type_enabled(SearchType::Artist));
        assert!(!form.set_search_type(SearchType::Artist));
        assert_eq!(form.search_type(), SearchType::Track);

        form.set_source(Source::Tidal);
        assert_eq!(form.search_type(), SearchType::Track);
        assert!(form.type_enabled(SearchType::Album));
        assert!(form.set_search_type(SearchType::Artist));
    }

    #[test]
    fn soundcloud_keeps_playlist_selection() {
        let mut form = SearchForm::new(SearchType::Playlist, Source::Deezer);
        form.set_source(Source::Soundcloud);
        assert_eq!(form.search_type(), SearchType::Playlist);
    }

    #[test]
    fn form_built_with_unsupported_pair_is_corrected() {
        let form = SearchForm::new(SearchType::Artist, Source::Soundcloud);
        assert_eq!(form.search_type(), SearchType::Track);
    }
}
