//! Popup windows rendered as egui immediate viewports

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Result, bail};
use eframe::egui::{self, RichText};

use crate::popup::{
    CreateProjectFilePopup, DownloadPathPopup, LaunchOptions, LaunchProjectFilePopup,
    LaunchVersionPopup, Popup,
};
use crate::ui::theme::Theme;
use crate::workflow::{PopupRoute, WindowHost};

#[derive(Default)]
struct HostQueue {
    live: HashSet<String>,
    opening: Vec<PopupRoute>,
    closing: Vec<String>,
}

/// [`WindowHost`] backed by the eframe event loop.
///
/// Requests are queued and picked up by the app on its next frame, which is
/// where the viewport is actually created or dropped.
#[derive(Default)]
pub struct EguiWindowHost {
    queue: Mutex<HostQueue>,
}

impl EguiWindowHost {
    fn queue(&self) -> MutexGuard<'_, HostQueue> {
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn take_opening(&self) -> Vec<PopupRoute> {
        std::mem::take(&mut self.queue().opening)
    }

    pub fn take_closing(&self) -> Vec<String> {
        std::mem::take(&mut self.queue().closing)
    }

    /// The viewport for `label` is gone; the label may be reused
    pub fn forget(&self, label: &str) {
        self.queue().live.remove(label);
    }
}

impl WindowHost for EguiWindowHost {
    fn open_window(&self, label: &str, title: &str, route: PopupRoute) -> Result<()> {
        let mut queue = self.queue();
        if !queue.live.insert(label.to_string()) {
            bail!("A window labelled '{}' is already open", label);
        }
        tracing::debug!("Queued popup window '{}' ({})", label, title);
        queue.opening.push(route);
        Ok(())
    }

    fn close_window(&self, label: &str) {
        self.queue().closing.push(label.to_string());
    }
}

/// Draw one popup in its own viewport. Returns true when the user closed
/// the window from its title bar.
pub fn show_popup(ctx: &egui::Context, popup: &mut Popup, theme: &Theme, always_on_top: bool) -> bool {
    let route = popup.handle().route();
    let mut builder = egui::ViewportBuilder::default()
        .with_title(route.title())
        .with_inner_size([440.0, 340.0])
        .with_min_inner_size([360.0, 240.0]);
    if always_on_top {
        builder = builder.with_always_on_top();
    }

    ctx.show_viewport_immediate(
        egui::ViewportId::from_hash_of(route.label()),
        builder,
        |ctx, _class| {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.label(
                    RichText::new(route.title())
                        .color(theme.text_primary)
                        .size(18.0)
                        .strong(),
                );
                ui.add_space(12.0);

                match popup {
                    Popup::CreateProjectFile(p) => create_project_file(ui, p, theme),
                    Popup::LaunchProjectFile(p) => launch_project_file(ui, p, theme),
                    Popup::LaunchVersion(p) => launch_version(ui, p, theme),
                    Popup::DownloadPath(p) => download_path(ui, p, theme),
                }
            });
            ctx.input(|i| i.viewport().close_requested())
        },
    )
}

fn error_line(ui: &mut egui::Ui, error: &Option<String>, theme: &Theme) {
    if let Some(message) = error {
        ui.add_space(6.0);
        ui.label(RichText::new(message).color(theme.error));
    }
}

/// Confirm and Cancel buttons, right aligned. Returns (confirm, cancel).
fn buttons(ui: &mut egui::Ui, confirm_label: &str, can_confirm: bool) -> (bool, bool) {
    let mut clicked = (false, false);
    ui.add_space(12.0);
    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
        clicked.0 = ui
            .add_enabled(can_confirm, egui::Button::new(confirm_label))
            .clicked();
        clicked.1 = ui.button("Cancel").clicked();
    });
    clicked
}

fn version_combo(
    ui: &mut egui::Ui,
    id: &str,
    versions: &[crate::models::InstalledVersion],
    selected: &mut Option<String>,
) {
    let selected_text = selected
        .as_deref()
        .and_then(|id| versions.iter().find(|v| v.id == id))
        .map(|v| v.display_name())
        .unwrap_or_else(|| "Select a version".to_string());

    egui::ComboBox::from_id_salt(id)
        .selected_text(selected_text)
        .width(240.0)
        .show_ui(ui, |ui| {
            for version in versions {
                let label = if version.is_default {
                    format!("{} (default)", version.display_name())
                } else {
                    version.display_name()
                };
                ui.selectable_value(selected, Some(version.id.clone()), label);
            }
        });
}

fn create_project_file(ui: &mut egui::Ui, popup: &mut CreateProjectFilePopup, theme: &Theme) {
    ui.horizontal(|ui| {
        ui.label(RichText::new("File name:").color(theme.text_muted));
        ui.text_edit_singleline(&mut popup.file_name);
    });
    ui.add_space(6.0);
    ui.horizontal(|ui| {
        ui.label(RichText::new("Version:").color(theme.text_muted));
        if popup.versions.is_loading() {
            ui.spinner();
        } else {
            version_combo(
                ui,
                "create_version",
                &popup.versions.items,
                &mut popup.selected_version,
            );
        }
    });

    error_line(ui, &popup.versions.error, theme);
    error_line(ui, &popup.error, theme);

    let (confirm, cancel) = buttons(ui, "Create", popup.can_confirm());
    if confirm {
        popup.confirm();
    } else if cancel {
        popup.cancel();
    }
}

fn launch_options(ui: &mut egui::Ui, options: &mut LaunchOptions, theme: &Theme) {
    ui.horizontal(|ui| {
        ui.label(RichText::new("Arguments:").color(theme.text_muted));
        if options.is_loading() {
            ui.spinner();
        }

        let saved: Vec<(String, String)> = options
            .arguments
            .iter()
            .map(|a| (a.id.clone(), a.argument_string.clone()))
            .collect();
        let mut picked = None;
        egui::ComboBox::from_id_salt("saved_arguments")
            .selected_text("Recent")
            .width(120.0)
            .show_ui(ui, |ui| {
                for (id, text) in &saved {
                    if ui.selectable_label(false, text).clicked() {
                        picked = Some(id.clone());
                    }
                }
            });
        if let Some(id) = picked {
            options.select_argument(&id);
        }
        if ui.button("Use default").clicked() {
            options.use_default_argument();
        }
    });
    ui.add(
        egui::TextEdit::singleline(&mut options.argument_text)
            .hint_text("--factory-startup")
            .desired_width(f32::INFINITY),
    );

    ui.add_space(6.0);
    ui.horizontal(|ui| {
        ui.label(RichText::new("Script:").color(theme.text_muted));
        let selected_text = options
            .selected_script
            .as_deref()
            .map(|id| options.script_label(id))
            .unwrap_or_else(|| "None".to_string());
        let scripts: Vec<(String, String)> = options
            .scripts
            .iter()
            .map(|s| (s.id.clone(), s.script_file_path.clone()))
            .collect();

        egui::ComboBox::from_id_salt("script_select")
            .selected_text(selected_text)
            .width(220.0)
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut options.selected_script, None, "None");
                for (id, path) in scripts {
                    ui.selectable_value(&mut options.selected_script, Some(id), path);
                }
            });

        if ui.button("Add...").clicked()
            && let Some(path) = rfd::FileDialog::new()
                .set_title("Select Python Script")
                .add_filter("Python", &["py"])
                .pick_file()
        {
            options.add_script(path);
        }
    });

    if options.needs_script() && options.selected_script.is_none() {
        ui.label(
            RichText::new("The arguments end with --python; choose a script")
                .color(theme.warning)
                .size(11.0),
        );
    }
    error_line(ui, &options.error, theme);
}

fn launch_project_file(ui: &mut egui::Ui, popup: &mut LaunchProjectFilePopup, theme: &Theme) {
    ui.horizontal(|ui| {
        ui.label(RichText::new("Version:").color(theme.text_muted));
        if popup.versions.is_loading() {
            ui.spinner();
        } else {
            version_combo(
                ui,
                "open_version",
                &popup.versions.items,
                &mut popup.selected_version,
            );
            if ui.button("Use default").clicked() {
                popup.use_default_version();
            }
        }
    });
    error_line(ui, &popup.versions.error, theme);
    ui.add_space(6.0);

    launch_options(ui, &mut popup.options, theme);
    error_line(ui, &popup.error, theme);

    let (confirm, cancel) = buttons(ui, "Open", popup.can_confirm());
    if confirm {
        popup.confirm();
    } else if cancel {
        popup.cancel();
    }
}

fn launch_version(ui: &mut egui::Ui, popup: &mut LaunchVersionPopup, theme: &Theme) {
    launch_options(ui, &mut popup.options, theme);
    error_line(ui, &popup.error, theme);

    let (confirm, cancel) = buttons(ui, "Launch", popup.can_confirm());
    if confirm {
        popup.confirm();
    } else if cancel {
        popup.cancel();
    }
}

fn download_path(ui: &mut egui::Ui, popup: &mut DownloadPathPopup, theme: &Theme) {
    if popup.locations.is_loading() {
        ui.spinner();
    } else if popup.locations.items.is_empty() {
        ui.label(
            RichText::new("No install locations. Add one in Settings.").color(theme.text_muted),
        );
    } else {
        egui::ScrollArea::vertical()
            .max_height(180.0)
            .show(ui, |ui| {
                for location in &popup.locations.items {
                    let label = if location.is_default {
                        format!("{} (default)", location.repo_directory_path)
                    } else {
                        location.repo_directory_path.clone()
                    };
                    ui.radio_value(&mut popup.selected, Some(location.id.clone()), label);
                }
            });
        if ui.button("Use default").clicked() {
            popup.use_default();
        }
    }

    error_line(ui, &popup.locations.error, theme);
    error_line(ui, &popup.error, theme);

    let (confirm, cancel) = buttons(ui, "Download", popup.can_confirm());
    if confirm {
        popup.confirm();
    } else if cancel {
        popup.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_label_is_refused_until_forgotten() {
        let host = EguiWindowHost::default();
        let route = PopupRoute::LaunchVersion;

        host.open_window(route.label(), route.title(), route).unwrap();
        assert!(host.open_window(route.label(), route.title(), route).is_err());
        assert_eq!(host.take_opening(), vec![route]);

        host.close_window(route.label());
        assert_eq!(host.take_closing(), vec![route.label().to_string()]);
        assert!(host.take_closing().is_empty());

        host.forget(route.label());
        assert!(host.open_window(route.label(), route.title(), route).is_ok());
    }
}
