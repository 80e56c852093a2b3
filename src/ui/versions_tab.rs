//! Installed versions tab

use eframe::egui::{self, RichText};

use crate::app::BlendioApp;
use crate::ui::components::{badge, section_frame};

pub fn render_versions_tab(app: &mut BlendioApp, ui: &mut egui::Ui) {
    let theme = app.ui.current_theme.clone();
    let state = &mut app.versions;

    ui.horizontal(|ui| {
        ui.label(
            RichText::new("Installed Versions")
                .color(theme.text_primary)
                .size(20.0)
                .strong(),
        );
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui
                .add_enabled(!state.is_busy(), egui::Button::new("Refresh"))
                .clicked()
            {
                state.refresh();
            }
            if state.is_busy() {
                ui.spinner();
            }
        });
    });
    ui.add_space(12.0);

    if let Some(ref err) = state.store.error {
        ui.label(RichText::new(format!("Error: {}", err)).color(theme.error));
        ui.add_space(8.0);
    }

    if state.store.is_empty() {
        ui.label(
            RichText::new("No Blender installations found. Add an install location in Settings or download a build.")
                .color(theme.text_muted),
        );
        return;
    }

    let versions = state.store.items().to_vec();
    egui::ScrollArea::vertical()
        .id_salt("versions_scroll")
        .show(ui, |ui| {
            for version in &versions {
                section_frame(ui, &theme, &version.display_name(), |ui| {
                    ui.horizontal(|ui| {
                        if version.is_default {
                            badge(ui, "Default", theme.success);
                        }
                        if version.download_url.is_some() {
                            badge(ui, "Downloaded", theme.accent);
                        }
                        ui.label(
                            RichText::new(&version.installation_directory_path)
                                .color(theme.text_muted)
                                .size(11.0),
                        );
                    });
                    ui.add_space(6.0);

                    ui.horizontal(|ui| {
                        if ui.button("Launch").clicked() {
                            state.launch_now(&version.id);
                        }
                        let waiting = state.pending_launch().is_some();
                        if ui
                            .add_enabled(!waiting, egui::Button::new("Launch with..."))
                            .clicked()
                        {
                            state.request_launch(&version.id);
                        }
                        if ui
                            .add_enabled(!version.is_default, egui::Button::new("Set default"))
                            .clicked()
                        {
                            state.set_default(&version.id);
                        }

                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if state.confirm_uninstall.as_deref() == Some(version.id.as_str()) {
                                if ui.button("Cancel").clicked() {
                                    state.confirm_uninstall = None;
                                }
                                if ui
                                    .button(RichText::new("Confirm uninstall").color(theme.error))
                                    .clicked()
                                {
                                    state.uninstall(&version.id);
                                }
                            } else if ui.button("Uninstall").clicked() {
                                state.confirm_uninstall = Some(version.id.clone());
                            }
                        });
                    });
                });
                ui.add_space(8.0);
            }
        });
}
