//! View models for the Downloads, History and Search surfaces
//!
//! Everything here is a pure projection of tracker/pager state. The egui
//! code in `app` only paints these structs, so what the user sees can be
//! checked without a window.

use crate::constants::DEBUG_OUTPUT_PREVIEW_CHARS;
use crate::pager::{SearchDebugInfo, SearchOutcome, SearchPager, SearchState};
use crate::tracker::{DownloadRecord, DownloadTracker, TrackerChange};
use crate::types::{DownloadStatus, SearchResultEntry, SearchType, Source, Tab};
use chrono::{DateTime, Utc};
use tracing::trace;

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveCard {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub service: Option<String>,
    pub album_art_url: Option<String>,
    pub status: DownloadStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub output: String,
    pub latest_output: Option<String>,
    pub error_detail: Option<String>,
    pub expanded: bool,
}

impl ActiveCard {
    fn from_record(record: &DownloadRecord) -> Self {
        Self {
            id: record.id.clone(),
            title: record.metadata.title_or_default().to_string(),
            artist: record.metadata.artist_or_default().to_string(),
            service: record.metadata.service.clone(),
            album_art_url: record.metadata.album_art_url.clone(),
            status: record.status,
            started_at: record.started_at,
            ended_at: record.ended_at,
            output: output_text(record),
            latest_output: record.latest_output.clone(),
            error_detail: record.error_detail.clone(),
            expanded: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRow {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub service: Option<String>,
    pub status: DownloadStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration: Option<String>,
    pub error_detail: Option<String>,
    pub output: String,
}

impl HistoryRow {
    fn from_record(record: &DownloadRecord) -> Self {
        let end = record.ended_at.or(record.completed_at);
        Self {
            id: record.id.clone(),
            title: record.metadata.title_or_default().to_string(),
            artist: record.metadata.artist_or_default().to_string(),
            service: record.metadata.service.clone(),
            status: record.status,
            started_at: record.started_at,
            completed_at: record.completed_at,
            duration: end.map(|end| format_duration(record.started_at, end)),
            error_detail: record.error_detail.clone(),
            output: output_text(record),
        }
    }
}

fn output_text(record: &DownloadRecord) -> String {
    match &record.final_output {
        Some(output) => output.clone(),
        None => record.progress_log.join("\n"),
    }
}

/// `42s`, `3m 07s` or `1h 05m`
pub fn format_duration(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    let secs = (end - start).num_seconds().max(0);
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        format!("{}h {:02}m", secs / 3600, (secs % 3600) / 60)
    }
}

/// Cached Downloads/History view models with the targeted update rule:
/// progress ticks patch one expanded card, structural changes rebuild.
pub struct ViewRenderer {
    tab: Tab,
    active: Vec<ActiveCard>,
    history: Vec<HistoryRow>,
    active_stale: bool,
    history_stale: bool,
    rebuilds: usize,
}

impl Default for ViewRenderer {
    fn default() -> Self {
        Self {
            tab: Tab::Downloads,
            active: Vec::new(),
            history: Vec::new(),
            active_stale: true,
            history_stale: true,
            rebuilds: 0,
        }
    }
}

impl ViewRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    /// Switching tabs always renders the new tab from current state
    pub fn select_tab(&mut self, tab: Tab, tracker: &DownloadTracker) {
        self.tab = tab;
        match tab {
            Tab::Downloads => self.rebuild_active(tracker),
            Tab::History => self.rebuild_history(tracker),
            Tab::Search | Tab::Config | Tab::Files => {}
        }
    }

    pub fn on_change(&mut self, change: &TrackerChange, tracker: &DownloadTracker) {
        match change {
            TrackerChange::None => {}
            TrackerChange::Progress { id } => self.patch_output(id, tracker),
            TrackerChange::Structural(surfaces) => {
                if surfaces.active {
                    self.active_stale = true;
                }
                if surfaces.history {
                    self.history_stale = true;
                }
                match self.tab {
                    Tab::Downloads if self.active_stale => self.rebuild_active(tracker),
                    Tab::History if self.history_stale => self.rebuild_history(tracker),
                    _ => {}
                }
            }
        }
    }

    fn patch_output(&mut self, id: &str, tracker: &DownloadTracker) {
        if self.tab != Tab::Downloads {
            return;
        }
        let (Some(card), Some(record)) = (self.active.iter_mut().find(|c| c.id == id), tracker.get(id))
        else {
            return;
        };
        card.latest_output = record.latest_output.clone();
        if card.expanded {
            trace!(id = %id, "Patching expanded card output");
            card.output = output_text(record);
        }
    }

    fn rebuild_active(&mut self, tracker: &DownloadTracker) {
        self.active = tracker.active().map(ActiveCard::from_record).collect();
        self.active_stale = false;
        self.rebuilds += 1;
    }

    fn rebuild_history(&mut self, tracker: &DownloadTracker) {
        self.history = tracker.history().map(HistoryRow::from_record).collect();
        self.history_stale = false;
        self.rebuilds += 1;
    }

    /// Expanded state is per-render: the next full rebuild collapses it again
    pub fn toggle_expanded(&mut self, id: &str, tracker: &DownloadTracker) {
        if let Some(card) = self.active.iter_mut().find(|c| c.id == id) {
            card.expanded = !card.expanded;
            if card.expanded {
                if let Some(record) = tracker.get(id) {
                    card.output = output_text(record);
                }
            }
        }
    }

    pub fn active_cards(&self) -> &[ActiveCard] {
        &self.active
    }

    pub fn history_rows(&self) -> &[HistoryRow] {
        &self.history
    }

    pub fn rebuild_count(&self) -> usize {
        self.rebuilds
    }
}

/// Glyph shown when a result has no usable artwork
pub fn placeholder_glyph(kind: Option<SearchType>) -> &'static str {
    match kind {
        Some(SearchType::Artist) => egui_phosphor::regular::USER,
        Some(SearchType::Track) => egui_phosphor::regular::MUSIC_NOTE,
        _ => egui_phosphor::regular::VINYL_RECORD,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultCard {
    /// Index into the full result set
    pub index: usize,
    pub title: String,
    pub subtitle: Option<String>,
    pub details: Vec<String>,
    pub glyph: &'static str,
    pub downloadable: bool,
    pub art_key: String,
}

impl ResultCard {
    fn from_entry(index: usize, entry: &SearchResultEntry) -> Self {
        let mut details = Vec::new();
        if let Some(album) = entry.album.as_deref().filter(|s| !s.is_empty()) {
            details.push(album.to_string());
        }
        if let Some(year) = &entry.year {
            details.push(year.clone());
        }
        if let Some(label) = entry.label.as_deref().filter(|s| !s.is_empty()) {
            details.push(label.to_string());
        }
        if let Some(count) = entry.track_count {
            details.push(format!("{} tracks", count));
        }
        if let Some(secs) = entry.duration.filter(|d| *d > 0) {
            details.push(format!("{}:{:02}", secs / 60, secs % 60));
        }
        let title = entry.display_title().to_string();
        let subtitle = entry
            .artist
            .as_deref()
            .filter(|a| !a.is_empty() && *a != title)
            .map(String::from);
        Self {
            index,
            title,
            subtitle,
            details,
            glyph: placeholder_glyph(entry.search_type()),
            downloadable: entry.download_url().is_some(),
            art_key: entry.art_key(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchView {
    Idle,
    Loading,
    /// No results: a normal outcome, never styled as an error
    Empty { heading: String },
    Failed { message: String, details: Vec<String> },
    Page {
        cards: Vec<ResultCard>,
        page: usize,
        page_count: usize,
        can_prev: bool,
        can_next: bool,
        range_label: String,
    },
}

pub fn empty_heading(message: Option<&str>, source: Source) -> String {
    match message.map(str::trim).filter(|m| !m.is_empty()) {
        Some(message) => message.to_uppercase(),
        None => format!("NO RESULTS FOUND ON {}", source.label().to_uppercase()),
    }
}

fn debug_lines(debug: &SearchDebugInfo) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(code) = debug.return_code {
        lines.push(format!("Return code: {}", code));
    }
    if let Some(kind) = &debug.exception_type {
        lines.push(format!("Exception: {}", kind));
    }
    if let Some(preview) = &debug.stdout_preview {
        let truncated: String = preview.chars().take(DEBUG_OUTPUT_PREVIEW_CHARS).collect();
        lines.push(format!("Output: {}", truncated));
    }
    lines
}

pub fn search_view(pager: &SearchPager) -> SearchView {
    match pager.state() {
        SearchState::Idle => SearchView::Idle,
        SearchState::Loading => SearchView::Loading,
        SearchState::Done(SearchOutcome::Empty { message }) => SearchView::Empty {
            heading: empty_heading(message.as_deref(), pager.source()),
        },
        SearchState::Done(SearchOutcome::Failed { error, debug }) => SearchView::Failed {
            message: error.clone(),
            details: debug.as_ref().map(debug_lines).unwrap_or_default(),
        },
        SearchState::Done(SearchOutcome::Results(_)) => {
            let range_label = match pager.page_range() {
                Some((start, end)) => format!("{}-{} of {}", start, end, pager.total()),
                None => String::new(),
            };
            SearchView::Page {
                cards: pager
                    .current_page()
                    .map(|(i, entry)| ResultCard::from_entry(i, entry))
                    .collect(),
                page: pager.page(),
                page_count: pager.page_count(),
                can_prev: pager.can_go(-1),
                can_next: pager.can_go(1),
                range_label,
            }
        }
    }
}
