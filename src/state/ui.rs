//! UI-related application state

use crate::ui::theme::Theme;

/// Primary views, one per tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    /// Installed Blender versions: launch, set default, uninstall
    #[default]
    Versions,
    /// Project files: create, open, reveal, archive, delete
    ProjectFiles,
    /// Downloadable builds with progress
    Downloads,
    /// Install locations, project directories and launcher options
    Settings,
}

impl Tab {
    pub fn all() -> &'static [Tab] {
        &[Tab::Versions, Tab::ProjectFiles, Tab::Downloads, Tab::Settings]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tab::Versions => "Versions",
            Tab::ProjectFiles => "Project Files",
            Tab::Downloads => "Downloads",
            Tab::Settings => "Settings",
        }
    }
}

pub struct UiState {
    pub current_theme: Theme,
    pub active_tab: Tab,
    /// Whether the theme still has to be applied to the context
    pub theme_dirty: bool,
    pub show_about_dialog: bool,
    /// Last status line shown in the bottom bar
    pub status_message: String,
    /// Errors waiting to be acknowledged in the banner
    pub errors: Vec<String>,
}

impl UiState {
    pub fn new(theme: Theme) -> Self {
        Self {
            current_theme: theme,
            active_tab: Tab::default(),
            theme_dirty: true,
            show_about_dialog: false,
            status_message: "Ready".to_string(),
            errors: Vec::new(),
        }
    }
}
