//! Search bar, result pages and the search request lifecycle

use super::{App, AppMessage};
use crate::app::thumbnails::ArtSource;
use crate::pager::{SearchOutcome, SearchTicket};
use crate::theme;
use crate::types::{SearchType, Source};
use crate::ui::components::{album_art, empty_state};
use crate::views::{search_view, ResultCard, SearchView};
use eframe::egui;
use tracing::{debug, info, warn};

impl App {
    pub(crate) fn submit_search(&mut self, ctx: &egui::Context) {
        let query = self.form.query.trim().to_string();
        if query.is_empty() {
            self.search_error = Some("Enter something to search for".to_string());
            return;
        }
        self.search_error = None;

        let search_type = self.form.search_type();
        let source = self.form.source();
        let ticket = self.pager.begin(source);
        info!(query = %query, kind = search_type.as_str(), source = source.as_str(), "Searching");

        let api = self.api.clone();
        self.spawn_task(ctx, async move {
            let result = api
                .search(&query, search_type, source)
                .await
                .map_err(|e| e.to_string());
            AppMessage::SearchFinished { ticket, result }
        });
    }

    pub(crate) fn finish_search(&mut self, ticket: SearchTicket, result: Result<SearchOutcome, String>) {
        let outcome = result.unwrap_or_else(|error| {
            warn!(error = %error, "Search request failed");
            SearchOutcome::Failed { error, debug: None }
        });
        if self.pager.complete(ticket, outcome) {
            debug!(total = self.pager.total(), "Search results applied");
        }
    }

    // ========================================================================
    // SEARCH TAB
    // ========================================================================

    pub(crate) fn render_search_tab(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        self.render_search_form(ui, ctx);
        ui.add_space(theme::SPACING_LG);

        match search_view(&self.pager) {
            SearchView::Idle => {
                empty_state(ui, egui_phosphor::regular::MAGNIFYING_GLASS, "Search Qobuz, Tidal, Deezer or SoundCloud");
            }
            SearchView::Loading => {
                ui.add_space(theme::SPACING_XL);
                ui.vertical_centered(|ui| {
                    ui.spinner();
                    ui.label(egui::RichText::new("Searching...").color(theme::TEXT_MUTED));
                });
            }
            SearchView::Empty { heading } => {
                ui.add_space(theme::SPACING_XL);
                ui.vertical_centered(|ui| {
                    ui.label(
                        egui::RichText::new(heading)
                            .size(theme::FONT_HEADING)
                            .strong()
                            .color(theme::TEXT_MUTED),
                    );
                });
            }
            SearchView::Failed { message, details } => {
                theme::error_frame().show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.label(
                        egui::RichText::new(format!("{}  {}", egui_phosphor::regular::WARNING, message))
                            .color(theme::STATUS_ERROR),
                    );
                    if !details.is_empty() {
                        egui::CollapsingHeader::new("Technical details")
                            .id_salt("search_failure_details")
                            .show(ui, |ui| {
                                for line in &details {
                                    ui.label(
                                        egui::RichText::new(line)
                                            .monospace()
                                            .size(theme::FONT_MONO)
                                            .color(theme::TEXT_MUTED),
                                    );
                                }
                            });
                    }
                });
            }
            SearchView::Page { cards, page, page_count, can_prev, can_next, range_label } => {
                self.render_pager_bar(ui, page, page_count, can_prev, can_next, &range_label);
                ui.add_space(theme::SPACING_SM);
                egui::ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
                    for card in &cards {
                        self.render_result_card(ui, ctx, card);
                        ui.add_space(theme::SPACING_SM);
                    }
                });
            }
        }
    }

    fn render_search_form(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.horizontal(|ui| {
            let edit = ui.add(
                egui::TextEdit::singleline(&mut self.form.query)
                    .hint_text("Artist, album, track...")
                    .desired_width(ui.available_width() - 330.0),
            );
            let submit = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

            let mut source = self.form.source();
            egui::ComboBox::from_id_salt("search_source")
                .width(100.0)
                .selected_text(source.label())
                .show_ui(ui, |ui| {
                    for s in Source::ALL {
                        ui.selectable_value(&mut source, s, s.label());
                    }
                });
            if source != self.form.source() {
                self.form.set_source(source);
            }

            let current = self.form.search_type();
            egui::ComboBox::from_id_salt("search_type")
                .width(90.0)
                .selected_text(current.label())
                .show_ui(ui, |ui| {
                    for t in SearchType::ALL {
                        let enabled = self.form.type_enabled(t);
                        let resp = ui.add_enabled(enabled, egui::SelectableLabel::new(t == current, t.label()));
                        if resp.clicked() {
                            self.form.set_search_type(t);
                        }
                    }
                });

            let clicked = ui
                .add(theme::button_accent(format!("{}  Search", egui_phosphor::regular::MAGNIFYING_GLASS)))
                .clicked();
            if submit || clicked {
                self.submit_search(ctx);
            }
        });
        if let Some(err) = &self.search_error {
            ui.label(egui::RichText::new(err).size(theme::FONT_SMALL).color(theme::STATUS_ERROR));
        }
    }

    fn render_pager_bar(
        &mut self,
        ui: &mut egui::Ui,
        page: usize,
        page_count: usize,
        can_prev: bool,
        can_next: bool,
        range_label: &str,
    ) {
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(range_label).size(theme::FONT_SMALL).color(theme::TEXT_DIM));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .add_enabled(can_next, theme::button(egui_phosphor::regular::CARET_RIGHT))
                    .clicked()
                {
                    self.pager.change_page(1);
                }
                ui.label(
                    egui::RichText::new(format!("Page {} of {}", page, page_count))
                        .size(theme::FONT_SMALL)
                        .color(theme::TEXT_MUTED),
                );
                if ui
                    .add_enabled(can_prev, theme::button(egui_phosphor::regular::CARET_LEFT))
                    .clicked()
                {
                    self.pager.change_page(-1);
                }
            });
        });
    }

    fn render_result_card(&mut self, ui: &mut egui::Ui, ctx: &egui::Context, card: &ResultCard) {
        let Some(entry) = self.pager.results().get(card.index).cloned() else {
            return;
        };
        let texture = self.art_for(ctx, card.art_key.clone(), ArtSource::for_entry(&entry));

        let mut download = false;
        let response = theme::card_frame()
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.horizontal(|ui| {
                    album_art(ui, texture.as_ref(), card.glyph, theme::ART_SIZE);
                    ui.vertical(|ui| {
                        ui.label(egui::RichText::new(&card.title).size(theme::FONT_BODY).color(theme::TEXT_PRIMARY));
                        if let Some(subtitle) = &card.subtitle {
                            ui.label(egui::RichText::new(subtitle).size(theme::FONT_LABEL).color(theme::TEXT_MUTED));
                        }
                        if !card.details.is_empty() {
                            ui.label(
                                egui::RichText::new(card.details.join("  ·  "))
                                    .size(theme::FONT_SMALL)
                                    .color(theme::TEXT_DIM),
                            );
                        }
                    });
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let button = ui
                            .add_enabled(
                                card.downloadable,
                                theme::button_accent(format!(
                                    "{}  Download",
                                    egui_phosphor::regular::DOWNLOAD_SIMPLE
                                )),
                            )
                            .on_disabled_hover_text("No link available for this result");
                        download = button.clicked();
                    });
                });
            })
            .response
            .interact(egui::Sense::click());

        response.context_menu(|ui| {
            if self.result_context_menu(ui, ctx, &entry) {
                download = true;
            }
        });

        if download {
            self.download_result(ctx, &entry);
        }
    }
}
