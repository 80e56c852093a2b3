use eframe::egui::{self, Color32, Stroke, Visuals};

/// Colors used across the main window and the popups
#[derive(Debug, Clone)]
pub struct Theme {
    pub bg_darkest: Color32,
    pub bg_dark: Color32,
    pub bg_medium: Color32,
    pub bg_light: Color32,

    pub text_primary: Color32,
    pub text_secondary: Color32,
    pub text_muted: Color32,

    pub accent: Color32,
    pub accent_hover: Color32,
    pub accent_muted: Color32,

    pub success: Color32,
    pub warning: Color32,
    pub error: Color32,

    pub border: Color32,
}

impl Default for Theme {
    fn default() -> Self {
        Self::studio()
    }
}

impl Theme {
    /// Neutral greys with an orange accent, close to Blender's own UI
    pub fn studio() -> Self {
        Self {
            bg_darkest: Color32::from_rgb(24, 24, 24),
            bg_dark: Color32::from_rgb(40, 40, 40),
            bg_medium: Color32::from_rgb(48, 48, 48),
            bg_light: Color32::from_rgb(61, 61, 61),

            text_primary: Color32::from_rgb(230, 230, 230),
            text_secondary: Color32::from_rgb(190, 190, 190),
            text_muted: Color32::from_rgb(135, 135, 135),

            accent: Color32::from_rgb(232, 125, 13),
            accent_hover: Color32::from_rgb(255, 153, 51),
            accent_muted: Color32::from_rgb(160, 86, 10),

            success: Color32::from_rgb(96, 186, 96),
            warning: Color32::from_rgb(230, 190, 60),
            error: Color32::from_rgb(230, 80, 80),

            border: Color32::from_rgb(30, 30, 30),
        }
    }

    pub fn apply(&self, ctx: &egui::Context) {
        let mut visuals = Visuals::dark();

        visuals.window_fill = self.bg_dark;
        visuals.panel_fill = self.bg_dark;
        visuals.faint_bg_color = self.bg_medium;
        visuals.extreme_bg_color = self.bg_darkest;

        let widgets = [
            (&mut visuals.widgets.noninteractive, self.bg_medium, self.border, self.text_secondary),
            (&mut visuals.widgets.inactive, self.bg_light, self.border, self.text_primary),
            (&mut visuals.widgets.hovered, self.bg_light, self.accent, self.text_primary),
            (&mut visuals.widgets.active, self.accent_muted, self.accent_hover, self.text_primary),
            (&mut visuals.widgets.open, self.bg_light, self.accent, self.text_primary),
        ];
        for (widget, fill, stroke, text) in widgets {
            widget.bg_fill = fill;
            widget.weak_bg_fill = fill;
            widget.bg_stroke = Stroke::new(1.0, stroke);
            widget.fg_stroke = Stroke::new(1.0, text);
        }

        visuals.selection.bg_fill = self.accent.gamma_multiply(0.35);
        visuals.selection.stroke = Stroke::new(1.0, self.accent);
        visuals.hyperlink_color = self.accent;

        visuals.window_stroke = Stroke::new(1.0, self.border);
        visuals.window_shadow = egui::epaint::Shadow::NONE;
        visuals.popup_shadow = egui::epaint::Shadow::NONE;

        ctx.set_visuals(visuals);
    }
}
