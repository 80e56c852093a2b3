//! Settings tab UI rendering

use eframe::egui::{self, RichText};

use crate::app::BlendioApp;
use crate::ui::components::{badge, section_frame};

/// Render the settings tab
pub fn render_settings_tab(app: &mut BlendioApp, ui: &mut egui::Ui) {
    let theme = app.ui.current_theme.clone();

    egui::ScrollArea::vertical()
        .id_salt("settings_scroll")
        .show(ui, |ui| {
            ui.label(
                RichText::new("Settings")
                    .color(theme.text_primary)
                    .size(20.0)
                    .strong(),
            );
            ui.add_space(16.0);

            section_frame(ui, &theme, "Install Locations", |ui| {
                ui.label(
                    RichText::new("Folders scanned for Blender installations and used for downloads")
                        .color(theme.text_muted)
                        .size(11.0),
                );
                ui.add_space(8.0);

                let locations = app.locations.store.items().to_vec();
                if locations.is_empty() {
                    ui.label(RichText::new("No install locations").color(theme.text_muted));
                }
                for location in &locations {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(&location.repo_directory_path).color(theme.text_primary));
                        if location.is_default {
                            badge(ui, "Default", theme.success);
                        }
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.button("Remove").clicked() {
                                app.locations.remove(&location.id);
                            }
                            if !location.is_default && ui.button("Make default").clicked() {
                                app.locations.set_default(&location.id);
                            }
                        });
                    });
                }

                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui
                        .add_enabled(!app.locations.is_busy(), egui::Button::new("Add location..."))
                        .clicked()
                        && let Some(path) = rfd::FileDialog::new()
                            .set_title("Select Install Location")
                            .pick_folder()
                    {
                        app.locations.add(path);
                    }
                    if app.locations.is_busy() {
                        ui.spinner();
                    }
                });
                if let Some(ref err) = app.locations.store.error {
                    ui.label(RichText::new(format!("Error: {}", err)).color(theme.error));
                }
            });

            ui.add_space(12.0);

            section_frame(ui, &theme, "Project Directories", |ui| {
                let mut changed = false;
                let mut remove = None;
                for (i, dir) in app.config.library.project_directories.iter().enumerate() {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(dir).color(theme.text_primary));
                        if app.config.library.creation_directory() == Some(dir.as_str()) {
                            badge(ui, "New files", theme.accent);
                        }
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.button("Remove").clicked() {
                                remove = Some(i);
                            }
                        });
                    });
                }
                if let Some(i) = remove {
                    let removed = app.config.library.project_directories.remove(i);
                    if app.config.library.new_project_directory.as_deref() == Some(removed.as_str()) {
                        app.config.library.new_project_directory = None;
                    }
                    changed = true;
                }

                ui.add_space(8.0);
                if ui.button("Add directory...").clicked()
                    && let Some(path) = rfd::FileDialog::new()
                        .set_title("Select Project Directory")
                        .pick_folder()
                {
                    let path = path.to_string_lossy().to_string();
                    if !app.config.library.project_directories.contains(&path) {
                        app.config.library.project_directories.push(path);
                        changed = true;
                    }
                }

                if !app.config.library.project_directories.is_empty() {
                    ui.add_space(8.0);
                    ui.horizontal(|ui| {
                        ui.label(RichText::new("Create new files in:").color(theme.text_muted));
                        let selected = app
                            .config
                            .library
                            .creation_directory()
                            .unwrap_or_default()
                            .to_string();
                        let dirs = app.config.library.project_directories.clone();
                        egui::ComboBox::from_id_salt("new_project_dir")
                            .selected_text(selected)
                            .width(280.0)
                            .show_ui(ui, |ui| {
                                for dir in dirs {
                                    let current =
                                        app.config.library.new_project_directory.as_deref()
                                            == Some(dir.as_str());
                                    if ui.selectable_label(current, &dir).clicked() {
                                        app.config.library.new_project_directory = Some(dir);
                                        changed = true;
                                    }
                                }
                            });
                    });
                }

                if changed {
                    app.apply_library();
                }
            });

            ui.add_space(12.0);

            section_frame(ui, &theme, "Behavior", |ui| {
                if ui
                    .checkbox(
                        &mut app.config.launcher.keep_open_after_launch,
                        "Keep launcher open after Blender starts",
                    )
                    .changed()
                {
                    app.save_config();
                }
                if ui
                    .checkbox(
                        &mut app.config.launcher.popup_always_on_top,
                        "Keep popup windows on top",
                    )
                    .changed()
                {
                    app.save_config();
                }
            });

            ui.add_space(12.0);

            section_frame(ui, &theme, "Downloads", |ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new("Build listing:").color(theme.text_muted));
                    ui.label(
                        RichText::new(&app.config.downloads.builds_url)
                            .color(theme.text_secondary)
                            .size(11.0),
                    );
                });
                ui.add_space(8.0);

                if ui
                    .checkbox(
                        &mut app.config.downloads.verify_checksums,
                        "Verify SHA-256 checksums of downloads",
                    )
                    .changed()
                {
                    let verify = app.config.downloads.verify_checksums;
                    app.downloads.set_verify_checksums(verify);
                    app.save_config();
                }

                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    ui.label(RichText::new("Recent arguments and scripts shown:").color(theme.text_muted));
                    if ui
                        .add(
                            egui::DragValue::new(&mut app.config.downloads.recent_limit)
                                .range(1..=200)
                                .speed(1.0),
                        )
                        .changed()
                    {
                        app.save_config();
                    }
                });
            });
        });
}
