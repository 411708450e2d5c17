//! Window chrome: tab strip, status bar, toast and the per-tab dispatch

use super::{App, ConnectionState};
use crate::constants::APP_VERSION;
use crate::theme;
use crate::types::Tab;
use eframe::egui;

fn tab_icon(tab: Tab) -> &'static str {
    match tab {
        Tab::Downloads => egui_phosphor::regular::DOWNLOAD_SIMPLE,
        Tab::History => egui_phosphor::regular::CLOCK_COUNTER_CLOCKWISE,
        Tab::Search => egui_phosphor::regular::MAGNIFYING_GLASS,
        Tab::Config => egui_phosphor::regular::GEAR,
        Tab::Files => egui_phosphor::regular::FOLDER_OPEN,
    }
}

impl App {
    pub(crate) fn render_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar")
            .frame(
                egui::Frame::new()
                    .fill(theme::BG_BASE)
                    .inner_margin(egui::Margin::symmetric(16, 10)),
            )
            .show(ctx, |ui| {
                self.render_url_bar(ui, ctx);
                ui.add_space(theme::SPACING_MD);

                let current = self.renderer.tab();
                let mut selected = None;
                ui.horizontal(|ui| {
                    ui.spacing_mut().item_spacing.x = 2.0;
                    for tab in Tab::ALL {
                        let label = match tab {
                            Tab::Downloads if self.tracker.active_len() > 0 => {
                                format!("{} ({})", tab.label(), self.tracker.active_len())
                            }
                            _ => tab.label().to_string(),
                        };
                        if theme::tab_button(ui, tab_icon(tab), &label, tab == current).clicked() {
                            selected = Some(tab);
                        }
                    }
                });
                if let Some(tab) = selected {
                    self.select_tab(tab, ctx);
                }
            });
    }

    pub(crate) fn render_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(theme::STATUS_BAR_HEIGHT)
            .frame(
                egui::Frame::new()
                    .fill(theme::BG_ELEVATED)
                    .inner_margin(egui::Margin::symmetric(12, 4)),
            )
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    let (color, text) = match &self.connection {
                        ConnectionState::Connecting => (theme::STATUS_WARNING, "Connecting...".to_string()),
                        ConnectionState::Connected => (theme::STATUS_SUCCESS, "Connected".to_string()),
                        ConnectionState::Disconnected { reason } => {
                            (theme::STATUS_ERROR, format!("Disconnected ({}), retrying", reason))
                        }
                    };
                    ui.label(egui::RichText::new(egui_phosphor::regular::CIRCLE).size(theme::FONT_SMALL).color(color));
                    ui.label(egui::RichText::new(text).size(theme::FONT_SMALL).color(theme::TEXT_MUTED));
                    ui.label(
                        egui::RichText::new(self.api.base_url())
                            .size(theme::FONT_SMALL)
                            .color(theme::TEXT_DIM),
                    );
                    if let Some(queue) = self.queue_size {
                        ui.label(
                            egui::RichText::new(format!("Queue: {}", queue))
                                .size(theme::FONT_SMALL)
                                .color(theme::TEXT_DIM),
                        );
                    }
                    if let Some(err) = &self.last_malformed {
                        ui.label(
                            egui::RichText::new(format!("{} Bad event: {}", egui_phosphor::regular::WARNING, err))
                                .size(theme::FONT_SMALL)
                                .color(theme::STATUS_WARNING),
                        );
                    }
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(
                            egui::RichText::new(format!("v{}", APP_VERSION))
                                .size(theme::FONT_SMALL)
                                .color(theme::BTN_DISABLED_TEXT),
                        );
                    });
                });
            });
    }

    pub(crate) fn render_central(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(
                egui::Frame::new()
                    .fill(theme::BG_BASE)
                    .inner_margin(egui::Margin::symmetric(16, 12)),
            )
            .show(ctx, |ui| {
                // Store panel rect for toast positioning
                self.central_panel_rect = Some(ui.max_rect());
                // Only the selected tab is painted
                match self.renderer.tab() {
                    Tab::Downloads => self.render_downloads_tab(ui, ctx),
                    Tab::History => self.render_history_tab(ui),
                    Tab::Search => self.render_search_tab(ui, ctx),
                    Tab::Config => self.render_config_tab(ui, ctx),
                    Tab::Files => self.render_files_tab(ui, ctx),
                }
            });
    }

    /// Toast notification (bottom-right of central panel, 3s visible then fade, pause on hover)
    pub(crate) fn render_toast(&mut self, ctx: &egui::Context) {
        let (Some(msg), Some(panel_rect)) = (self.toast_message.clone(), self.central_panel_rect) else {
            return;
        };
        let visible_duration = 3.0;
        let fade_duration = 0.5;
        let total_duration = visible_duration + fade_duration;
        let margin = 12.0;

        let toast_pos = egui::pos2(panel_rect.right() - margin, panel_rect.bottom() - margin);
        let elapsed = self.toast_start.map(|t| t.elapsed().as_secs_f32()).unwrap_or(0.0);
        let alpha = if elapsed > visible_duration {
            ((total_duration - elapsed) / fade_duration).clamp(0.0, 1.0)
        } else {
            1.0
        };

        let response = egui::Area::new(egui::Id::new("toast"))
            .fixed_pos(toast_pos)
            .pivot(egui::Align2::RIGHT_BOTTOM)
            .show(ctx, |ui| {
                egui::Frame::new()
                    .fill(egui::Color32::from_rgba_unmultiplied(0x1a, 0x1a, 0x1e, (230.0 * alpha) as u8))
                    .stroke(egui::Stroke::new(
                        theme::STROKE_DEFAULT,
                        egui::Color32::from_rgba_unmultiplied(
                            theme::ACCENT.r(),
                            theme::ACCENT.g(),
                            theme::ACCENT.b(),
                            (100.0 * alpha) as u8,
                        ),
                    ))
                    .corner_radius(theme::RADIUS_MEDIUM)
                    .inner_margin(egui::Margin::symmetric(16, 10))
                    .show(ui, |ui| {
                        ui.label(egui::RichText::new(msg).color(egui::Color32::from_rgba_unmultiplied(
                            255,
                            255,
                            255,
                            (255.0 * alpha) as u8,
                        )));
                    });
            });

        // Pause timer while hovering
        if response.response.hovered() {
            self.toast_start = Some(std::time::Instant::now());
        }

        if elapsed >= total_duration {
            self.toast_message = None;
            self.toast_start = None;
        } else {
            ctx.request_repaint();
        }
    }
}
