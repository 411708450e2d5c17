//! Download submission and the Downloads / History tabs

use super::{App, AppMessage};
use crate::api::{validate_download_url, DownloadAccepted, DownloadFromUrlRequest};
use crate::app::thumbnails::ArtSource;
use crate::constants::MAX_QUALITY;
use crate::theme;
use crate::types::{non_blank, DownloadStatus, SearchResultEntry};
use crate::ui::components::{album_art, empty_state, output_box, status_badge};
use crate::utils::format_clock;
use crate::views::{format_duration, ActiveCard, HistoryRow};
use chrono::Utc;
use eframe::egui;
use std::time::Duration;
use tracing::{info, warn};

/// Toast text for an accepted download
pub(crate) fn queued_label(accepted: &DownloadAccepted, fallback: &str) -> String {
    let title = accepted
        .metadata
        .as_ref()
        .and_then(|m| non_blank(m.title.as_deref()))
        .unwrap_or(fallback);
    format!("Queued {}", title)
}

/// Toast text and inline error for a finished submit
pub(crate) fn submit_outcome(label: &str, result: &Result<DownloadAccepted, String>) -> (String, Option<String>) {
    match result {
        Ok(accepted) => (queued_label(accepted, label), None),
        Err(e) => (
            format!("Download failed: {}", e),
            Some(format!("Could not queue {}: {}", label, e)),
        ),
    }
}

impl App {
    /// Validate the URL box and submit it
    pub(crate) fn submit_url_download(&mut self, ctx: &egui::Context) {
        let url = match validate_download_url(&self.url_input) {
            Ok(url) => url.to_string(),
            Err(e) => {
                self.url_error = Some(e.to_string());
                return;
            }
        };
        self.url_error = None;
        self.url_input.clear();

        info!(url = %url, quality = self.quality, "Submitting download");
        let api = self.api.clone();
        let quality = self.quality;
        self.spawn_task(ctx, async move {
            let result = api.start_download(&url, quality).await.map_err(|e| e.to_string());
            AppMessage::DownloadQueued { label: url, result }
        });
    }

    /// Download one search result using the entry's own fields
    pub(crate) fn download_result(&mut self, ctx: &egui::Context, entry: &SearchResultEntry) {
        let Some(url) = entry.download_url() else {
            warn!(id = %entry.id, "Result has no url, not downloadable");
            return;
        };
        let request = DownloadFromUrlRequest::from_entry(entry, url, self.quality);
        let label = entry.display_title().to_string();

        info!(url = %request.url, title = %label, "Downloading search result");
        let api = self.api.clone();
        self.spawn_task(ctx, async move {
            let result = api.download_from_url(&request).await.map_err(|e| e.to_string());
            AppMessage::DownloadQueued { label, result }
        });
    }

    pub(crate) fn finish_download(&mut self, label: String, result: Result<DownloadAccepted, String>) {
        match &result {
            Ok(accepted) => info!(task_id = ?accepted.task_id, "Download accepted"),
            Err(e) => warn!(error = %e, item = %label, "Download rejected"),
        }
        let (toast, inline_error) = submit_outcome(&label, &result);
        // Rejections stay on screen next to the url box until the next edit
        if inline_error.is_some() {
            self.url_error = inline_error;
        }
        self.show_toast(toast);
    }

    // ========================================================================
    // TOP BAR (url + quality)
    // ========================================================================

    pub(crate) fn render_url_bar(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.horizontal(|ui| {
            let edit = ui.add(
                egui::TextEdit::singleline(&mut self.url_input)
                    .hint_text("Paste a Qobuz, Tidal, Deezer, SoundCloud, Spotify or YouTube link...")
                    .desired_width(ui.available_width() - 240.0),
            );
            if edit.changed() {
                self.url_error = None;
            }
            let submit = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

            egui::ComboBox::from_id_salt("quality")
                .width(90.0)
                .selected_text(format!("Quality {}", self.quality))
                .show_ui(ui, |ui| {
                    for q in 0..=MAX_QUALITY {
                        ui.selectable_value(&mut self.quality, q, format!("Quality {}", q));
                    }
                });

            let clicked = ui
                .add(theme::button_accent(format!("{}  Download", egui_phosphor::regular::DOWNLOAD_SIMPLE)))
                .clicked();
            if submit || clicked {
                self.submit_url_download(ctx);
            }
        });
        if let Some(err) = &self.url_error {
            ui.label(egui::RichText::new(err).size(theme::FONT_SMALL).color(theme::STATUS_ERROR));
        }
    }

    // ========================================================================
    // DOWNLOADS TAB
    // ========================================================================

    pub(crate) fn render_downloads_tab(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let cards: Vec<ActiveCard> = self.renderer.active_cards().to_vec();
        if cards.is_empty() {
            empty_state(ui, egui_phosphor::regular::DOWNLOAD_SIMPLE, "No active downloads");
            return;
        }

        let mut toggle = None;
        egui::ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
            for card in &cards {
                if self.render_active_card(ui, ctx, card) {
                    toggle = Some(card.id.clone());
                }
                ui.add_space(theme::SPACING_MD);
            }
        });
        if let Some(id) = toggle {
            self.renderer.toggle_expanded(&id, &self.tracker);
        }

        // elapsed timers
        if cards.iter().any(|c| c.status == DownloadStatus::Downloading) {
            ctx.request_repaint_after(Duration::from_secs(1));
        }
    }

    /// Returns true when the output toggle was clicked
    fn render_active_card(&mut self, ui: &mut egui::Ui, ctx: &egui::Context, card: &ActiveCard) -> bool {
        let mut toggled = false;
        let texture = non_blank(card.album_art_url.as_deref())
            .and_then(|url| self.art_for(ctx, url.to_string(), ArtSource::Direct(url.to_string())));

        theme::card_frame().show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.horizontal(|ui| {
                album_art(ui, texture.as_ref(), egui_phosphor::regular::VINYL_RECORD, theme::ART_SIZE);
                ui.vertical(|ui| {
                    ui.label(egui::RichText::new(&card.title).size(theme::FONT_HEADING).color(theme::TEXT_PRIMARY));
                    let mut byline = card.artist.clone();
                    if let Some(service) = &card.service {
                        byline = format!("{}  ·  {}", byline, service);
                    }
                    ui.label(egui::RichText::new(byline).size(theme::FONT_LABEL).color(theme::TEXT_MUTED));
                    if let Some(latest) = &card.latest_output {
                        ui.add(
                            egui::Label::new(
                                egui::RichText::new(latest).size(theme::FONT_SMALL).color(theme::TEXT_DIM),
                            )
                            .truncate(),
                        );
                    }
                });
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    status_badge(ui, card.status);
                    let end = card.ended_at.unwrap_or_else(Utc::now);
                    ui.label(
                        egui::RichText::new(format_duration(card.started_at, end))
                            .size(theme::FONT_SMALL)
                            .color(theme::TEXT_DIM),
                    );
                });
            });

            if let Some(detail) = &card.error_detail {
                ui.label(egui::RichText::new(detail).size(theme::FONT_LABEL).color(theme::STATUS_ERROR));
            }

            let (icon, text) = if card.expanded {
                (egui_phosphor::regular::CARET_UP, "Hide output")
            } else {
                (egui_phosphor::regular::CARET_DOWN, "Show output")
            };
            if ui.add(theme::button(format!("{}  {}", icon, text)).small()).clicked() {
                toggled = true;
            }
            if card.expanded {
                output_box(ui, &format!("output_{}", card.id), &card.output, 200.0);
            }
        });
        toggled
    }

    // ========================================================================
    // HISTORY TAB
    // ========================================================================

    pub(crate) fn render_history_tab(&mut self, ui: &mut egui::Ui) {
        let rows: &[HistoryRow] = self.renderer.history_rows();
        if rows.is_empty() {
            empty_state(ui, egui_phosphor::regular::CLOCK_COUNTER_CLOCKWISE, "No finished downloads yet");
            return;
        }

        egui::ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
            for row in rows {
                theme::section_frame().show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.horizontal(|ui| {
                        status_badge(ui, row.status);
                        ui.vertical(|ui| {
                            ui.label(egui::RichText::new(&row.title).size(theme::FONT_BODY).color(theme::TEXT_PRIMARY));
                            ui.label(
                                egui::RichText::new(&row.artist).size(theme::FONT_SMALL).color(theme::TEXT_MUTED),
                            );
                        });
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if let Some(duration) = &row.duration {
                                ui.label(egui::RichText::new(duration).size(theme::FONT_SMALL).color(theme::TEXT_DIM));
                            }
                            let finished = row.completed_at.unwrap_or(row.started_at);
                            ui.label(
                                egui::RichText::new(format_clock(finished))
                                    .size(theme::FONT_SMALL)
                                    .color(theme::TEXT_DIM),
                            );
                            if let Some(service) = &row.service {
                                ui.label(egui::RichText::new(service).size(theme::FONT_SMALL).color(theme::TEXT_DIM));
                            }
                        });
                    });
                    if let Some(detail) = &row.error_detail {
                        ui.label(egui::RichText::new(detail).size(theme::FONT_LABEL).color(theme::STATUS_ERROR));
                    }
                    egui::CollapsingHeader::new(egui::RichText::new("Output").size(theme::FONT_SMALL))
                        .id_salt(("history_output", &row.id))
                        .show(ui, |ui| {
                            output_box(ui, &format!("history_{}", row.id), &row.output, 240.0);
                        });
                });
                ui.add_space(theme::SPACING_SM);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DownloadMetadata;

    #[test]
    fn queued_label_prefers_echoed_title() {
        let accepted = DownloadAccepted {
            task_id: Some("dl_1".into()),
            status: Some("queued".into()),
            metadata: Some(DownloadMetadata { title: Some("Kind of Blue".into()), ..Default::default() }),
        };
        assert_eq!(queued_label(&accepted, "https://x"), "Queued Kind of Blue");
    }

    #[test]
    fn queued_label_falls_back_to_submitted_value() {
        let accepted = DownloadAccepted {
            metadata: Some(DownloadMetadata { title: Some("  ".into()), ..Default::default() }),
            ..Default::default()
        };
        assert_eq!(
            queued_label(&accepted, "https://www.qobuz.com/album/1"),
            "Queued https://www.qobuz.com/album/1"
        );
    }

    #[test]
    fn rejected_submit_keeps_an_inline_error() {
        let result = Err("Unsupported service URL".to_string());
        let (toast, inline) = submit_outcome("https://example.com/a", &result);
        assert_eq!(toast, "Download failed: Unsupported service URL");
        assert_eq!(
            inline.as_deref(),
            Some("Could not queue https://example.com/a: Unsupported service URL")
        );
    }

    #[test]
    fn accepted_submit_has_no_inline_error() {
        let result = Ok(DownloadAccepted::default());
        let (toast, inline) = submit_outcome("Kind of Blue", &result);
        assert_eq!(toast, "Queued Kind of Blue");
        assert!(inline.is_none());
    }
}
