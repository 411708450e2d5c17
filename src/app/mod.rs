//! App module - contains the main application state and logic

mod config;
mod context_menu;
mod downloads;
mod events;
mod files;
mod search;
mod thumbnails;
mod views;

use crate::api::{ApiClient, DownloadAccepted, ServerStatus};
use crate::constants::*;
use crate::listener::{EventListener, ListenerMessage};
use crate::pager::{SearchForm, SearchOutcome, SearchPager, SearchTicket};
use crate::settings::Settings;
use crate::theme;
use crate::tracker::{DownloadTracker, ReconcileTicket};
use crate::types::{FileEntry, Tab};
use crate::views::ViewRenderer;
use eframe::egui;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::info;

// ============================================================================
// BACKGROUND RESULTS
// ============================================================================

/// Results of request/response calls, delivered to the UI thread
pub(crate) enum AppMessage {
    SearchFinished {
        ticket: SearchTicket,
        result: Result<SearchOutcome, String>,
    },
    DownloadQueued {
        label: String,
        result: Result<DownloadAccepted, String>,
    },
    StatusFetched(ReconcileTicket, Result<ServerStatus, String>),
    ArtLoaded {
        key: String,
        image: Option<egui::ColorImage>,
    },
    ConfigLoaded(Result<String, String>),
    ConfigSaved(Result<(), String>),
    FilesLoaded(Result<Vec<FileEntry>, String>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ConnectionState {
    Connecting,
    Connected,
    Disconnected { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConfigState {
    Idle,
    Loading,
    Saving,
}

// ============================================================================
// APP STATE
// ============================================================================

pub struct App {
    pub(crate) runtime: tokio::runtime::Runtime,
    pub(crate) api: ApiClient,
    pub(crate) cancel_token: CancellationToken,
    // Event stream
    pub(crate) listener_rx: UnboundedReceiver<ListenerMessage>,
    pub(crate) connection: ConnectionState,
    pub(crate) last_malformed: Option<String>,
    pub(crate) queue_size: Option<usize>,
    // Background results
    pub(crate) msg_tx: UnboundedSender<AppMessage>,
    pub(crate) msg_rx: UnboundedReceiver<AppMessage>,
    // Downloads + history
    pub(crate) tracker: DownloadTracker,
    pub(crate) renderer: ViewRenderer,
    pub(crate) quality: u8,
    pub(crate) url_input: String,
    pub(crate) url_error: Option<String>,
    // Search
    pub(crate) form: SearchForm,
    pub(crate) pager: SearchPager,
    pub(crate) search_error: Option<String>,
    // Album art cache, failures cached as None
    pub(crate) art_cache: HashMap<String, Option<egui::TextureHandle>>,
    pub(crate) art_loading: HashSet<String>,
    pub(crate) art_limit: Arc<tokio::sync::Semaphore>,
    // Config editor
    pub(crate) config_text: String,
    pub(crate) config_state: ConfigState,
    pub(crate) config_error: Option<String>,
    // Files
    pub(crate) files: Vec<FileEntry>,
    pub(crate) files_loading: bool,
    pub(crate) files_error: Option<String>,
    // Toast notification
    pub(crate) toast_message: Option<String>,
    pub(crate) toast_start: Option<Instant>,
    pub(crate) central_panel_rect: Option<egui::Rect>,
    // Settings
    pub(crate) backend_url: String,
    pub(crate) reconnect_delay_secs: u64,
    pub(crate) window_pos: Option<egui::Pos2>,
    pub(crate) window_size: Option<egui::Vec2>,
    pub(crate) needs_center: bool,
    pub(crate) data_dir: PathBuf,
}

// ============================================================================
// APP INITIALIZATION & HELPERS
// ============================================================================

impl App {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        runtime: tokio::runtime::Runtime,
        settings: Settings,
        data_dir: PathBuf,
    ) -> Self {
        // Force dark theme
        cc.egui_ctx.set_theme(egui::Theme::Dark);

        // Add Phosphor icons font
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);

        // Apply theme from theme.rs
        theme::apply_visuals(&cc.egui_ctx);

        let api = ApiClient::new(&settings.backend_url);
        let cancel_token = CancellationToken::new();
        let (listener_tx, listener_rx) = unbounded_channel();
        let (msg_tx, msg_rx) = unbounded_channel();

        let repaint_ctx = cc.egui_ctx.clone();
        let listener = EventListener::new(
            api.http().clone(),
            api.url(EVENTS_PATH),
            settings.reconnect_delay(),
            listener_tx,
            Arc::new(move || repaint_ctx.request_repaint()),
        );
        runtime.spawn(listener.run(cancel_token.clone()));
        info!(backend = %api.base_url(), "Event listener spawned");

        let mut app = Self {
            runtime,
            api,
            cancel_token,
            listener_rx,
            connection: ConnectionState::Connecting,
            last_malformed: None,
            queue_size: None,
            msg_tx,
            msg_rx,
            tracker: DownloadTracker::new(),
            renderer: ViewRenderer::new(),
            quality: settings.quality.min(MAX_QUALITY),
            url_input: String::new(),
            url_error: None,
            form: SearchForm::new(settings.search_type, settings.source),
            pager: SearchPager::new(),
            search_error: None,
            art_cache: HashMap::new(),
            art_loading: HashSet::new(),
            art_limit: Arc::new(tokio::sync::Semaphore::new(ALBUM_ART_CONCURRENCY)),
            config_text: String::new(),
            config_state: ConfigState::Idle,
            config_error: None,
            files: Vec::new(),
            files_loading: false,
            files_error: None,
            toast_message: None,
            toast_start: None,
            central_panel_rect: None,
            backend_url: settings.backend_url.clone(),
            reconnect_delay_secs: settings.reconnect_delay_secs,
            window_pos: None,
            window_size: None,
            needs_center: settings.window_x.is_none() || settings.window_y.is_none(),
            data_dir,
        };
        app.renderer.select_tab(Tab::Downloads, &app.tracker);
        app
    }

    pub fn save_settings(&self) {
        let settings = Settings {
            backend_url: self.backend_url.clone(),
            reconnect_delay_secs: self.reconnect_delay_secs,
            quality: self.quality,
            search_type: self.form.search_type(),
            source: self.form.source(),
            window_x: self.window_pos.map(|p| p.x),
            window_y: self.window_pos.map(|p| p.y),
            window_w: self.window_size.map(|s| s.x),
            window_h: self.window_size.map(|s| s.y),
        };
        settings.save(&self.data_dir);
    }

    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }

    pub(crate) fn show_toast(&mut self, message: impl Into<String>) {
        self.toast_message = Some(message.into());
        self.toast_start = Some(Instant::now());
    }

    /// Switch tabs; Config and Files refetch from the backend
    pub(crate) fn select_tab(&mut self, tab: Tab, ctx: &egui::Context) {
        self.renderer.select_tab(tab, &self.tracker);
        match tab {
            Tab::Config => self.load_config(ctx),
            Tab::Files => self.load_files(ctx),
            Tab::Downloads | Tab::History | Tab::Search => {}
        }
    }

    /// Run a request on the runtime and post its result back to the UI thread
    pub(crate) fn spawn_task<F>(&self, ctx: &egui::Context, task: F)
    where
        F: std::future::Future<Output = AppMessage> + Send + 'static,
    {
        let tx = self.msg_tx.clone();
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            let message = task.await;
            if tx.send(message).is_ok() {
                ctx.request_repaint();
            }
        });
    }

    /// Drain everything background tasks produced since the last frame
    pub(crate) fn poll_messages(&mut self, ctx: &egui::Context) {
        while let Ok(message) = self.msg_rx.try_recv() {
            match message {
                AppMessage::SearchFinished { ticket, result } => self.finish_search(ticket, result),
                AppMessage::DownloadQueued { label, result } => self.finish_download(label, result),
                AppMessage::StatusFetched(ticket, result) => self.finish_status(ticket, result),
                AppMessage::ArtLoaded { key, image } => self.finish_art(ctx, key, image),
                AppMessage::ConfigLoaded(result) => self.finish_config_load(result),
                AppMessage::ConfigSaved(result) => self.finish_config_save(result),
                AppMessage::FilesLoaded(result) => self.finish_files(result),
            }
        }
    }
}
