use std::sync::Arc;
use std::time::Duration;

use eframe::egui::{self, RichText};

use crate::backend::{Backend, LocalBackend};
use crate::config::Config;
use crate::popup::Popup;
use crate::state::ui::{Tab, UiState};
use crate::state::{DownloadsState, LocationsState, ProjectFilesState, StateEvent, VersionsState};
use crate::transfer::Transfer;
use crate::ui::components::{render_about_dialog, render_tab};
use crate::ui::popups::show_popup;
use crate::ui::theme::Theme;
use crate::ui::{
    EguiWindowHost, render_downloads_tab, render_project_files_tab, render_settings_tab,
    render_versions_tab,
};
use crate::workflow::{EventChannel, WindowLauncher};

/// Main application state
pub struct BlendioApp {
    pub config: Config,
    backend: Arc<LocalBackend>,
    launcher: WindowLauncher,
    host: Arc<EguiWindowHost>,
    /// Open popup windows, one per label
    popups: Vec<Popup>,

    pub versions: VersionsState,
    pub project_files: ProjectFilesState,
    pub downloads: DownloadsState,
    pub locations: LocationsState,

    pub ui: UiState,
}

impl BlendioApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        config: Config,
        backend: Arc<LocalBackend>,
        transfer: Arc<dyn Transfer>,
    ) -> Self {
        let host = Arc::new(EguiWindowHost::default());
        let launcher = WindowLauncher::new(host.clone(), EventChannel::new());
        let shared: Arc<dyn Backend> = backend.clone();

        let mut app = Self {
            versions: VersionsState::new(shared.clone(), launcher.clone()),
            project_files: ProjectFilesState::new(shared.clone(), launcher.clone()),
            downloads: DownloadsState::new(
                shared.clone(),
                launcher.clone(),
                transfer,
                config.downloads.verify_checksums,
            ),
            locations: LocationsState::new(shared),
            config,
            backend,
            launcher,
            host,
            popups: Vec::new(),
            ui: UiState::new(Theme::default()),
        };

        app.mount(app.ui.active_tab);
        // Settings data backs the downloads popup and empty-state hints
        app.locations.refresh();
        app
    }

    fn mount(&mut self, tab: Tab) {
        match tab {
            Tab::Versions => self.versions.mount(),
            Tab::ProjectFiles => self.project_files.mount(),
            Tab::Downloads => self.downloads.mount(),
            Tab::Settings => self.locations.refresh(),
        }
    }

    fn unmount(&mut self, tab: Tab) {
        match tab {
            Tab::Versions => self.versions.unmount(),
            Tab::ProjectFiles => self.project_files.unmount(),
            Tab::Downloads => self.downloads.unmount(),
            Tab::Settings => {}
        }
    }

    pub fn switch_tab(&mut self, tab: Tab) {
        tracing::debug!("Switching to {:?} tab", tab);
        self.unmount(self.ui.active_tab);
        self.ui.active_tab = tab;
        self.mount(tab);
    }

    pub fn save_config(&self) {
        if let Err(e) = self.config.save() {
            tracing::error!("Failed to save config: {}", e);
        }
    }

    /// Persist library settings and rescan project files with them
    pub fn apply_library(&mut self) {
        self.save_config();
        self.backend.set_library(self.config.library.clone());
        self.project_files.refresh();
    }

    fn is_busy(&self) -> bool {
        self.versions.is_busy()
            || self.project_files.is_busy()
            || self.downloads.is_busy()
            || self.locations.is_busy()
    }

    fn poll_states(&mut self, ctx: &egui::Context) {
        let mut events = self.versions.poll();
        events.extend(self.project_files.poll());
        events.extend(self.downloads.poll());
        events.extend(self.locations.poll());

        for event in events {
            match event {
                StateEvent::StatusMessage(message) => self.ui.status_message = message,
                StateEvent::Failed(e) => {
                    self.ui.status_message = format!("Error: {}", e);
                    self.ui.errors.push(e.to_string());
                }
                StateEvent::VersionsChanged => self.versions.refresh(),
                StateEvent::LogInfo(message) => tracing::info!("{}", message),
                StateEvent::Launched => {
                    if !self.config.launcher.keep_open_after_launch {
                        tracing::info!("Closing launcher after launch");
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                }
            }
        }
    }

    /// Create requested popups, draw the open ones and tear down the closed ones
    fn update_popups(&mut self, ctx: &egui::Context) {
        for route in self.host.take_opening() {
            self.popups.push(Popup::open(
                route,
                self.backend.clone(),
                &self.launcher,
                self.config.downloads.recent_limit,
            ));
        }

        let theme = self.ui.current_theme.clone();
        let always_on_top = self.config.launcher.popup_always_on_top;
        let mut closed = Vec::new();
        for popup in &mut self.popups {
            popup.poll();
            if show_popup(ctx, popup, &theme, always_on_top) {
                closed.push(popup.handle().label().to_string());
            }
        }
        // Confirm and Cancel queue their close while the popup is drawn
        closed.extend(self.host.take_closing());

        for label in closed {
            self.popups.retain(|p| p.handle().label() != label);
            self.host.forget(&label);
            self.launcher.window_closed(&label);
        }
    }

    fn render_error_banner(&mut self, ui: &mut egui::Ui) {
        let theme = &self.ui.current_theme;
        let mut dismiss = None;
        for (i, error) in self.ui.errors.iter().enumerate() {
            egui::Frame::new()
                .fill(theme.error.gamma_multiply(0.15))
                .corner_radius(4)
                .inner_margin(egui::Margin::symmetric(8, 4))
                .show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(error).color(theme.error));
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.small_button("Dismiss").clicked() {
                                dismiss = Some(i);
                            }
                        });
                    });
                });
            ui.add_space(4.0);
        }
        if let Some(i) = dismiss {
            self.ui.errors.remove(i);
        }
    }
}

impl eframe::App for BlendioApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.ui.theme_dirty {
            self.ui.current_theme.apply(ctx);
            self.ui.theme_dirty = false;
        }

        self.poll_states(ctx);

        egui::TopBottomPanel::top("tab_bar").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                for tab in Tab::all() {
                    render_tab(self, ui, *tab);
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("About").clicked() {
                        self.ui.show_about_dialog = true;
                    }
                });
            });
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(
                    RichText::new(&self.ui.status_message).color(self.ui.current_theme.text_secondary),
                );
                if self.is_busy() {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.spinner();
                    });
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if !self.ui.errors.is_empty() {
                self.render_error_banner(ui);
                ui.add_space(6.0);
            }
            match self.ui.active_tab {
                Tab::Versions => render_versions_tab(self, ui),
                Tab::ProjectFiles => render_project_files_tab(self, ui),
                Tab::Downloads => render_downloads_tab(self, ui),
                Tab::Settings => render_settings_tab(self, ui),
            }
        });

        render_about_dialog(self, ctx);
        self.update_popups(ctx);

        // Keep polling while background work or popups are alive
        if self.is_busy() || !self.popups.is_empty() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}
