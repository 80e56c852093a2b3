//! UI modules for Blendio
//!
//! Rendering code for the main window, organized by tab, plus the popup
//! viewports.

pub mod components;
mod downloads_tab;
pub mod popups;
mod project_files_tab;
mod settings_tab;
pub mod theme;
mod versions_tab;

pub use downloads_tab::render_downloads_tab;
pub use popups::EguiWindowHost;
pub use project_files_tab::render_project_files_tab;
pub use settings_tab::render_settings_tab;
pub use versions_tab::render_versions_tab;
