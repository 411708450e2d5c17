//! Config tab: raw streamrip TOML editor

use super::{App, AppMessage, ConfigState};
use crate::theme;
use eframe::egui;
use tracing::{info, warn};

impl App {
    pub(crate) fn load_config(&mut self, ctx: &egui::Context) {
        self.config_state = ConfigState::Loading;
        self.config_error = None;
        let api = self.api.clone();
        self.spawn_task(ctx, async move {
            AppMessage::ConfigLoaded(api.load_config().await.map_err(|e| e.to_string()))
        });
    }

    fn save_config(&mut self, ctx: &egui::Context) {
        self.config_state = ConfigState::Saving;
        self.config_error = None;
        let api = self.api.clone();
        let text = self.config_text.clone();
        self.spawn_task(ctx, async move {
            AppMessage::ConfigSaved(api.save_config(&text).await.map_err(|e| e.to_string()))
        });
    }

    pub(crate) fn finish_config_load(&mut self, result: Result<String, String>) {
        self.config_state = ConfigState::Idle;
        match result {
            Ok(text) => self.config_text = text,
            Err(e) => {
                warn!(error = %e, "Failed to load config");
                self.config_error = Some(format!("Failed to load config: {}", e));
            }
        }
    }

    pub(crate) fn finish_config_save(&mut self, result: Result<(), String>) {
        self.config_state = ConfigState::Idle;
        match result {
            Ok(()) => {
                info!("Config saved");
                self.show_toast("Configuration saved");
            }
            Err(e) => {
                warn!(error = %e, "Failed to save config");
                self.config_error = Some(format!("Failed to save config: {}", e));
            }
        }
    }

    pub(crate) fn render_config_tab(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let busy = self.config_state != ConfigState::Idle;
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("streamrip config.toml").size(theme::FONT_LABEL).color(theme::TEXT_MUTED));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .add_enabled(!busy, theme::button_accent(format!("{}  Save", egui_phosphor::regular::FLOPPY_DISK)))
                    .clicked()
                {
                    self.save_config(ctx);
                }
                if ui
                    .add_enabled(!busy, theme::button(format!("{}  Reload", egui_phosphor::regular::ARROW_CLOCKWISE)))
                    .clicked()
                {
                    self.load_config(ctx);
                }
                if busy {
                    ui.spinner();
                }
            });
        });

        if let Some(err) = &self.config_error {
            ui.label(egui::RichText::new(err).size(theme::FONT_SMALL).color(theme::STATUS_ERROR));
        }
        ui.add_space(theme::SPACING_SM);

        theme::section_frame().show(ui, |ui| {
            egui::ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
                ui.add_enabled(
                    self.config_state != ConfigState::Loading,
                    egui::TextEdit::multiline(&mut self.config_text)
                        .code_editor()
                        .frame(false)
                        .desired_width(f32::INFINITY)
                        .desired_rows(30),
                );
            });
        });
    }
}
