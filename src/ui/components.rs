//! Shared UI components

use eframe::egui::{self, Color32, CornerRadius, RichText, Vec2};

use crate::app::BlendioApp;
use crate::state::ui::Tab;
use crate::ui::theme::Theme;

/// Render a tab button; switching tabs unmounts the old view and mounts the new one
pub fn render_tab(app: &mut BlendioApp, ui: &mut egui::Ui, tab: Tab) {
    let theme = &app.ui.current_theme;
    let is_active = app.ui.active_tab == tab;

    let (bg, text_color) = if is_active {
        (theme.bg_medium, theme.accent)
    } else {
        (Color32::TRANSPARENT, theme.text_secondary)
    };

    let button = egui::Button::new(RichText::new(tab.label()).color(text_color))
        .fill(bg)
        .corner_radius(CornerRadius {
            nw: 6,
            ne: 6,
            sw: 0,
            se: 0,
        })
        .min_size(Vec2::new(96.0, 32.0));

    if ui.add(button).clicked() && !is_active {
        app.switch_tab(tab);
    }
}

/// Titled frame used for each section of a tab
pub fn section_frame<R>(
    ui: &mut egui::Ui,
    theme: &Theme,
    title: &str,
    add_contents: impl FnOnce(&mut egui::Ui) -> R,
) -> R {
    let available_width = ui.available_width();
    egui::Frame::new()
        .fill(theme.bg_medium)
        .corner_radius(8)
        .inner_margin(egui::Margin::same(14))
        .stroke(egui::Stroke::new(1.0, theme.border))
        .show(ui, |ui| {
            ui.set_width(available_width - 28.0);
            ui.label(RichText::new(title).color(theme.accent).size(13.0).strong());
            ui.add_space(10.0);
            add_contents(ui)
        })
        .inner
}

/// Small pill-shaped label
pub fn badge(ui: &mut egui::Ui, text: &str, color: Color32) {
    egui::Frame::new()
        .fill(color.gamma_multiply(0.2))
        .corner_radius(4)
        .inner_margin(egui::Margin::symmetric(6, 2))
        .show(ui, |ui| {
            ui.label(RichText::new(text).color(color).size(11.0));
        });
}

pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

/// Render the About dialog
pub fn render_about_dialog(app: &mut BlendioApp, ctx: &egui::Context) {
    if !app.ui.show_about_dialog {
        return;
    }
    let theme = app.ui.current_theme.clone();

    egui::Window::new("About Blendio")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .fixed_size([280.0, 200.0])
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(8.0);
                ui.label(RichText::new("Blendio").size(24.0).strong().color(theme.accent));
                ui.label(
                    RichText::new("Blender version and project launcher")
                        .color(theme.text_secondary),
                );
                ui.add_space(10.0);
                ui.label(
                    RichText::new(format!("Version {}", env!("CARGO_PKG_VERSION")))
                        .color(theme.text_muted),
                );
                ui.add_space(10.0);
                if ui.link("blender.org").clicked() {
                    let _ = open::that("https://www.blender.org/");
                }
                ui.add_space(10.0);
                if ui.button("Close").clicked() {
                    app.ui.show_about_dialog = false;
                }
                ui.add_space(6.0);
            });
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(300 * 1024 * 1024), "300.0 MB");
    }
}
