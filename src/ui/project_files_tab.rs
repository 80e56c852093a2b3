//! Project files tab

use eframe::egui::{self, RichText};

use crate::app::BlendioApp;
use crate::ui::components::section_frame;

pub fn render_project_files_tab(app: &mut BlendioApp, ui: &mut egui::Ui) {
    let theme = app.ui.current_theme.clone();
    let has_directories = !app.config.library.project_directories.is_empty();
    let state = &mut app.project_files;

    ui.horizontal(|ui| {
        ui.label(
            RichText::new("Project Files")
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
            if ui
                .add_enabled(
                    has_directories && !state.pending_create(),
                    egui::Button::new("New..."),
                )
                .clicked()
            {
                state.request_create();
            }
            if state.is_busy() {
                ui.spinner();
            }
        });
    });
    ui.add_space(8.0);

    ui.horizontal(|ui| {
        ui.label(RichText::new("Search:").color(theme.text_muted));
        ui.add(egui::TextEdit::singleline(&mut state.search).desired_width(240.0));
    });
    ui.add_space(8.0);

    if let Some(ref err) = state.store.error {
        ui.label(RichText::new(format!("Error: {}", err)).color(theme.error));
        ui.add_space(8.0);
    }

    if !has_directories {
        ui.label(
            RichText::new("Add a project directory in Settings to track .blend files.")
                .color(theme.text_muted),
        );
        return;
    }

    let files: Vec<_> = state.visible().into_iter().cloned().collect();
    if files.is_empty() {
        ui.label(RichText::new("No project files").color(theme.text_muted));
        return;
    }

    egui::ScrollArea::vertical()
        .id_salt("project_files_scroll")
        .show(ui, |ui| {
            for file in &files {
                section_frame(ui, &theme, &file.file_name, |ui| {
                    ui.label(
                        RichText::new(&file.file_path)
                            .color(theme.text_muted)
                            .size(11.0),
                    );
                    ui.add_space(6.0);

                    ui.horizontal(|ui| {
                        let waiting = state.pending_open().is_some();
                        if ui.add_enabled(!waiting, egui::Button::new("Open...")).clicked() {
                            state.request_open(&file.id);
                        }
                        if ui.button("Show in folder").clicked() {
                            state.reveal(&file.id);
                        }
                        if ui.button("Archive").clicked() {
                            state.archive(&file.id);
                        }

                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if state.confirm_delete.as_deref() == Some(file.id.as_str()) {
                                if ui.button("Cancel").clicked() {
                                    state.confirm_delete = None;
                                }
                                if ui
                                    .button(RichText::new("Confirm delete").color(theme.error))
                                    .clicked()
                                {
                                    state.delete(&file.id);
                                }
                            } else if ui.button("Delete").clicked() {
                                state.confirm_delete = Some(file.id.clone());
                            }
                        });
                    });
                });
                ui.add_space(8.0);
            }
        });
}
