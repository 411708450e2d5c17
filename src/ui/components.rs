//! Reusable UI components
//!
//! Small painters shared by the Downloads, History and Search tabs.

use crate::theme;
use crate::types::DownloadStatus;
use eframe::egui;

/// Pill with the status label in the status color
pub fn status_badge(ui: &mut egui::Ui, status: DownloadStatus) -> egui::Response {
    let color = theme::status_color(status);
    let galley = ui.fonts(|f| {
        f.layout_no_wrap(
            status.label().to_string(),
            egui::FontId::proportional(theme::FONT_SMALL),
            color,
        )
    });
    let size = egui::vec2(galley.size().x + theme::SPACING_LG * 2.0, theme::BADGE_HEIGHT);
    let (rect, response) = ui.allocate_exact_size(size, egui::Sense::hover());

    if ui.is_rect_visible(rect) {
        let painter = ui.painter();
        painter.rect_filled(rect, rect.height() / 2.0, color.gamma_multiply(0.15));
        painter.rect_stroke(
            rect,
            rect.height() / 2.0,
            egui::Stroke::new(theme::STROKE_DEFAULT, color.gamma_multiply(0.6)),
            egui::StrokeKind::Inside,
        );
        let pos = rect.center() - galley.size() / 2.0;
        painter.galley(pos, galley, color);
    }

    response
}

/// Square album art, or the placeholder glyph when there is no texture
pub fn album_art(
    ui: &mut egui::Ui,
    texture: Option<&egui::TextureHandle>,
    glyph: &str,
    size: f32,
) -> egui::Response {
    let (rect, response) = ui.allocate_exact_size(egui::vec2(size, size), egui::Sense::hover());

    if ui.is_rect_visible(rect) {
        match texture {
            Some(texture) => {
                egui::Image::new(egui::load::SizedTexture::new(texture.id(), rect.size()))
                    .corner_radius(theme::RADIUS_MEDIUM)
                    .paint_at(ui, rect);
            }
            None => {
                let painter = ui.painter();
                painter.rect_filled(rect, theme::RADIUS_MEDIUM, theme::BG_SURFACE);
                painter.text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    glyph,
                    egui::FontId::proportional(size * 0.45),
                    theme::TEXT_DIM,
                );
            }
        }
    }

    response
}

/// Read-only monospace log box
pub fn output_box(ui: &mut egui::Ui, id_salt: &str, text: &str, max_height: f32) {
    theme::section_frame().show(ui, |ui| {
        egui::ScrollArea::vertical()
            .id_salt(id_salt)
            .max_height(max_height)
            .stick_to_bottom(true)
            .auto_shrink([false, true])
            .show(ui, |ui| {
                ui.add(
                    egui::Label::new(
                        egui::RichText::new(text)
                            .monospace()
                            .size(theme::FONT_MONO)
                            .color(theme::TEXT_MUTED),
                    )
                    .wrap(),
                );
            });
    });
}

/// Muted one-liner used for empty surfaces
pub fn empty_state(ui: &mut egui::Ui, icon: &str, text: &str) {
    ui.add_space(theme::SPACING_XL * 2.0);
    ui.vertical_centered(|ui| {
        ui.label(egui::RichText::new(icon).size(32.0).color(theme::TEXT_DIM));
        ui.add_space(theme::SPACING_SM);
        ui.label(egui::RichText::new(text).size(theme::FONT_BODY).color(theme::TEXT_DIM));
    });
}
