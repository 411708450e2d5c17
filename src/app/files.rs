//! Files tab: what the backend has written to its download folder

use super::{App, AppMessage};
use crate::theme;
use crate::types::FileEntry;
use crate::ui::components::empty_state;
use crate::utils::{format_bytes, format_unix_time};
use eframe::egui;
use egui_extras::{Column, TableBuilder};
use tracing::{debug, warn};

impl App {
    pub(crate) fn load_files(&mut self, ctx: &egui::Context) {
        self.files_loading = true;
        self.files_error = None;
        let api = self.api.clone();
        self.spawn_task(ctx, async move {
            AppMessage::FilesLoaded(api.browse().await.map_err(|e| e.to_string()))
        });
    }

    pub(crate) fn finish_files(&mut self, result: Result<Vec<FileEntry>, String>) {
        self.files_loading = false;
        match result {
            Ok(mut files) => {
                files.sort_by(|a, b| b.modified.total_cmp(&a.modified));
                debug!(count = files.len(), "Downloaded files listed");
                self.files = files;
            }
            Err(e) => {
                warn!(error = %e, "Failed to list files");
                self.files_error = Some(format!("Failed to list files: {}", e));
            }
        }
    }

    pub(crate) fn render_files_tab(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.horizontal(|ui| {
            let total: u64 = self.files.iter().map(|f| f.size).sum();
            ui.label(
                egui::RichText::new(format!("{} files  ·  {}", self.files.len(), format_bytes(total)))
                    .size(theme::FONT_LABEL)
                    .color(theme::TEXT_MUTED),
            );
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .add_enabled(
                        !self.files_loading,
                        theme::button(format!("{}  Refresh", egui_phosphor::regular::ARROW_CLOCKWISE)),
                    )
                    .clicked()
                {
                    self.load_files(ctx);
                }
                if self.files_loading {
                    ui.spinner();
                }
            });
        });
        if let Some(err) = &self.files_error {
            ui.label(egui::RichText::new(err).size(theme::FONT_SMALL).color(theme::STATUS_ERROR));
        }
        ui.add_space(theme::SPACING_SM);

        if self.files.is_empty() {
            if !self.files_loading {
                empty_state(ui, egui_phosphor::regular::FOLDER_OPEN, "No downloaded files");
            }
            return;
        }

        let row_height = 24.0;
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .column(Column::remainder().at_least(200.0).clip(true))
            .column(Column::initial(100.0).at_least(70.0))
            .column(Column::initial(150.0).at_least(120.0))
            .header(row_height, |mut header| {
                for title in ["NAME", "SIZE", "MODIFIED"] {
                    header.col(|ui| {
                        ui.label(egui::RichText::new(title).size(theme::FONT_SMALL).color(theme::TEXT_DIM));
                    });
                }
            })
            .body(|body| {
                body.rows(row_height, self.files.len(), |mut row| {
                    let file = &self.files[row.index()];
                    row.col(|ui| {
                        ui.label(egui::RichText::new(&file.name).color(theme::TEXT_SECONDARY));
                    });
                    row.col(|ui| {
                        ui.label(egui::RichText::new(format_bytes(file.size)).color(theme::TEXT_MUTED));
                    });
                    row.col(|ui| {
                        ui.label(egui::RichText::new(format_unix_time(file.modified)).color(theme::TEXT_MUTED));
                    });
                });
            });
    }
}
