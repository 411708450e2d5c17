//! Context menu for search results

use super::App;
use crate::theme;
use crate::types::SearchResultEntry;
use eframe::egui;
use tracing::{debug, warn};

impl App {
    /// Returns true when "Download" was chosen; the other actions run here
    pub(crate) fn result_context_menu(
        &mut self,
        ui: &mut egui::Ui,
        ctx: &egui::Context,
        entry: &SearchResultEntry,
    ) -> bool {
        let mut download = false;
        ui.spacing_mut().item_spacing.y = 2.0;
        let labels = [
            format!("{}  Download", egui_phosphor::regular::DOWNLOAD_SIMPLE),
            format!("{}  Open on service", egui_phosphor::regular::ARROW_SQUARE_OUT),
            format!("{}  Copy URL", egui_phosphor::regular::COPY),
        ];
        let label_refs: Vec<&str> = labels.iter().map(|s| s.as_str()).collect();
        theme::set_menu_width(ui, &label_refs);

        let Some(url) = entry.download_url() else {
            ui.label(egui::RichText::new("No link available").color(theme::TEXT_DIM));
            return false;
        };

        if theme::menu_item(ui, egui_phosphor::regular::DOWNLOAD_SIMPLE, "Download") {
            download = true;
            ui.close_menu();
        }
        ui.separator();
        if theme::menu_item(ui, egui_phosphor::regular::ARROW_SQUARE_OUT, "Open on service") {
            debug!(url, "Opening result in browser");
            if let Err(e) = open::that(url) {
                warn!(url, error = %e, "Failed to open browser");
                self.show_toast(format!("Could not open link: {}", e));
            }
            ui.close_menu();
        }
        if theme::menu_item(ui, egui_phosphor::regular::COPY, "Copy URL") {
            ctx.copy_text(url.to_string());
            self.show_toast("Link copied");
            ui.close_menu();
        }

        download
    }
}
