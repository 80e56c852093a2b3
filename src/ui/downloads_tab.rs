//! Downloads tab

use eframe::egui::{self, RichText};

use crate::app::BlendioApp;
use crate::ui::components::{badge, format_size, section_frame};

pub fn render_downloads_tab(app: &mut BlendioApp, ui: &mut egui::Ui) {
    let theme = app.ui.current_theme.clone();
    let state = &mut app.downloads;

    ui.horizontal(|ui| {
        ui.label(
            RichText::new("Downloads")
                .color(theme.text_primary)
                .size(20.0)
                .strong(),
        );
        match state.online {
            Some(true) => badge(ui, "Online", theme.success),
            Some(false) => badge(ui, "Offline", theme.error),
            None => {}
        }
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui
                .add_enabled(!state.is_busy(), egui::Button::new("Refresh"))
                .clicked()
            {
                state.check_connectivity();
                state.refresh();
            }
            if state.is_busy() {
                ui.spinner();
            }
        });
    });
    ui.add_space(12.0);

    if let Some(ref err) = state.builds.error {
        ui.label(RichText::new(format!("Error: {}", err)).color(theme.error));
        ui.add_space(8.0);
    }

    if state.builds.is_empty() {
        ui.label(RichText::new("No builds available for this platform").color(theme.text_muted));
        return;
    }

    let builds = state.builds.items().to_vec();
    let waiting = state.pending_download().is_some();

    egui::ScrollArea::vertical()
        .id_salt("downloads_scroll")
        .show(ui, |ui| {
            for build in &builds {
                let title = format!("Blender {} {}", build.version, build.risk_id);
                section_frame(ui, &theme, &title, |ui| {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(&build.branch).color(theme.text_secondary));
                        ui.label(
                            RichText::new(format_size(build.file_size.max(0) as u64))
                                .color(theme.text_muted),
                        );
                        ui.label(
                            RichText::new(&build.file_name)
                                .color(theme.text_muted)
                                .size(11.0),
                        );
                    });
                    ui.add_space(6.0);

                    if let Some(progress) = state.progress_for(build) {
                        let text = if progress.total > 0 {
                            format!(
                                "{}%  {} / {}  ({}/s)",
                                progress.percent(),
                                format_size(progress.sent),
                                format_size(progress.total),
                                format_size(progress.speed)
                            )
                        } else {
                            "Starting...".to_string()
                        };
                        ui.add(
                            egui::ProgressBar::new(progress.fraction())
                                .text(text)
                                .animate(true),
                        );
                    } else if state.is_installed(build) {
                        badge(ui, "Installed", theme.success);
                    } else if !build.is_installable() {
                        let label = format!(".{} not supported", build.file_extension);
                        badge(ui, &label, theme.warning);
                    } else if ui
                        .add_enabled(!waiting, egui::Button::new("Download..."))
                        .clicked()
                    {
                        state.request_download(build);
                    }
                });
                ui.add_space(8.0);
            }
        });
}
