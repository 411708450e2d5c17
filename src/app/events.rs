//! Push-stream handling: listener messages, evictions and reconciliation

use super::{App, AppMessage, ConnectionState};
use crate::api::ServerStatus;
use crate::listener::ListenerMessage;
use crate::tracker::{ReconcileTicket, TrackerChange};
use eframe::egui;
use std::time::Instant;
use tracing::{debug, info, warn};

impl App {
    /// Apply every queued listener message to the tracker, in arrival order
    pub(crate) fn poll_listener(&mut self, ctx: &egui::Context) {
        let mut change = TrackerChange::None;
        while let Ok(message) = self.listener_rx.try_recv() {
            match message {
                ListenerMessage::Connected => {
                    self.connection = ConnectionState::Connected;
                    self.refresh_status(ctx);
                }
                ListenerMessage::Event(event) => {
                    change = change.merge(self.tracker.apply(&event, Instant::now()));
                }
                ListenerMessage::Malformed { error, .. } => {
                    self.last_malformed = Some(error);
                }
                ListenerMessage::Disconnected { reason } => {
                    self.connection = ConnectionState::Disconnected { reason };
                }
            }
            // Progress ticks are patched one by one so each reaches its own card
            if matches!(change, TrackerChange::Progress { .. }) {
                self.renderer.on_change(&change, &self.tracker);
                change = TrackerChange::None;
            }
        }
        self.renderer.on_change(&change, &self.tracker);
    }

    /// Evict terminal downloads whose grace period ran out and wake up for the next one
    pub(crate) fn fire_evictions(&mut self, ctx: &egui::Context) {
        let now = Instant::now();
        let change = self.tracker.fire_due(now);
        self.renderer.on_change(&change, &self.tracker);
        if let Some(deadline) = self.tracker.next_eviction() {
            ctx.request_repaint_after(deadline.saturating_duration_since(now));
        }
    }

    /// Ask the backend what it is working on; the answer reconciles the tracker
    pub(crate) fn refresh_status(&mut self, ctx: &egui::Context) {
        let ticket = self.tracker.begin_reconcile();
        let api = self.api.clone();
        self.spawn_task(ctx, async move {
            AppMessage::StatusFetched(ticket, api.status().await.map_err(|e| e.to_string()))
        });
    }

    pub(crate) fn finish_status(&mut self, ticket: ReconcileTicket, result: Result<ServerStatus, String>) {
        match result {
            Ok(status) => {
                debug!(active = status.active.len(), queue = status.queue_size, "Server status received");
                self.queue_size = Some(status.queue_size);
                let change = self.tracker.reconcile(ticket, &status.active, Instant::now());
                if change != TrackerChange::None {
                    info!("Download state reconciled with server");
                }
                self.renderer.on_change(&change, &self.tracker);
            }
            Err(e) => warn!(error = %e, "Failed to fetch server status"),
        }
    }
}
