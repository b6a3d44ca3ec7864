//! Optics parameter panel
//!
//! An egui window with one slider per optical parameter. Slider edits are
//! queued and applied to the controller after the frame, the same way the
//! dock's buttons only raise flags for the main loop to act on.

use egui::{Color32, Context, FontFamily, FontId, Margin, RichText, Rounding, Style, Visuals};

use crate::controller::{HmdController, HmdSnapshot};
use crate::optics::{OpticalConfig, OpticalParameter};
use crate::viewport::DisplayMode;

/// Something the user asked for this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelAction {
    Edit {
        parameter: OpticalParameter,
        value: f64,
    },
    ToggleDisplayMode,
    SetOverlayVisible(bool),
    Recenter,
}

pub struct ParameterPanel {
    pub open: bool,
    values: OpticalConfig,
    overlay_visible: bool,
    pending: Vec<PanelAction>,
    last_error: Option<String>,
}

impl ParameterPanel {
    pub fn new(ctx: &Context, config: &OpticalConfig) -> Self {
        Self::apply_theme(ctx);

        Self {
            open: true,
            values: *config,
            overlay_visible: true,
            pending: Vec::new(),
            last_error: None,
        }
    }

    fn apply_theme(ctx: &Context) {
        let mut style = Style::default();
        style.spacing.item_spacing = egui::vec2(8.0, 6.0);
        style.spacing.slider_width = 180.0;
        style.text_styles.insert(
            egui::TextStyle::Body,
            FontId::new(14.0, FontFamily::Proportional),
        );

        let mut visuals = Visuals::dark();
        visuals.window_rounding = Rounding::same(12.0);
        visuals.widgets.inactive.rounding = Rounding::same(8.0);
        visuals.widgets.active.rounding = Rounding::same(8.0);
        visuals.selection.bg_fill = Color32::from_rgb(100, 180, 255);

        ctx.set_style(style);
        ctx.set_visuals(visuals);
    }

    /// Pull slider values back from the controller's committed config
    pub fn sync(&mut self, config: &OpticalConfig) {
        self.values = *config;
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn queue(&mut self, action: PanelAction) {
        self.pending.push(action);
    }

    pub fn take_actions(&mut self) -> Vec<PanelAction> {
        std::mem::take(&mut self.pending)
    }

    pub fn render(&mut self, ctx: &Context, snapshot: &HmdSnapshot) {
        if !self.open {
            return;
        }

        egui::Window::new("Optics")
            .anchor(egui::Align2::LEFT_TOP, egui::vec2(16.0, 16.0))
            .resizable(false)
            .collapsible(true)
            .frame(
                egui::Frame::window(&ctx.style())
                    .inner_margin(Margin::same(12.0))
                    .rounding(Rounding::same(12.0))
                    .fill(Color32::from_black_alpha(220)),
            )
            .show(ctx, |ui| {
                for parameter in OpticalParameter::ALL {
                    let range = parameter.range();
                    let value = self.values.get(parameter);
                    let mut edited = value;

                    ui.horizontal(|ui| {
                        ui.label(RichText::new(parameter.label()).size(13.0));
                        let slider = egui::Slider::new(&mut edited, range.min..=range.max)
                            .step_by(range.step)
                            .fixed_decimals(4)
                            .suffix(" m");
                        if ui.add(slider).changed() && edited != value {
                            self.values = self.values.with(parameter, edited);
                            self.pending.push(PanelAction::Edit {
                                parameter,
                                value: edited,
                            });
                        }
                    });
                }

                if let Some(err) = &self.last_error {
                    ui.label(
                        RichText::new(format!("⚠ {}", err))
                            .size(12.0)
                            .color(Color32::from_rgb(255, 150, 100)),
                    );
                }

                ui.separator();

                let optics = &snapshot.optics;
                let magnification = format!("Magnification  {:.2}×", optics.magnification);
                ui.label(RichText::new(magnification).size(12.0));
                ui.label(
                    RichText::new(format!(
                        "FOV  {:.1}° H ({:.1}° nasal + {:.1}° temporal)  {:.1}° V",
                        optics.fov_horizontal,
                        optics.fov_h_nasal,
                        optics.fov_h_temporal,
                        optics.fov_vertical
                    ))
                    .size(12.0),
                );
                ui.label(
                    RichText::new(format!(
                        "Near {:.3} m  Far {:.3} m  Aspect {:.3}",
                        optics.near, optics.far, optics.aspect_ratio_eye
                    ))
                    .size(12.0)
                    .weak(),
                );

                ui.separator();

                ui.horizontal(|ui| {
                    let immersive = snapshot.display_mode == DisplayMode::Immersive;
                    let label = if immersive { "Picture-in-picture" } else { "Immersive" };
                    if ui.button(label).clicked() {
                        self.pending.push(PanelAction::ToggleDisplayMode);
                    }
                    if ui.button("Recenter").clicked() {
                        self.pending.push(PanelAction::Recenter);
                    }
                    if ui.checkbox(&mut self.overlay_visible, "Frustums").changed() {
                        let action = PanelAction::SetOverlayVisible(self.overlay_visible);
                        self.pending.push(action);
                    }
                });
            });
    }

    /// Apply queued actions in order. A rejected edit is reported and the
    /// sliders snap back to the last valid config.
    pub fn apply(&mut self, controller: &mut HmdController) {
        for action in self.take_actions() {
            match action {
                PanelAction::Edit { parameter, value } => {
                    match controller.set_parameter(parameter, value) {
                        Ok(()) => self.last_error = None,
                        Err(e) => self.last_error = Some(e.to_string()),
                    }
                }
                PanelAction::ToggleDisplayMode => {
                    controller.set_display_mode(controller.display_mode().toggled());
                }
                PanelAction::SetOverlayVisible(visible) => {
                    controller.set_overlay_visible(visible);
                }
                PanelAction::Recenter => controller.recenter(),
            }
        }
        self.sync(controller.config());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::HmdSettings;

    fn setup() -> (Context, HmdController, ParameterPanel) {
        let ctx = Context::default();
        let controller =
            HmdController::new(OpticalConfig::cardboard(), HmdSettings::default()).unwrap();
        let panel = ParameterPanel::new(&ctx, controller.config());
        (ctx, controller, panel)
    }

    #[test]
    fn test_idle_frame_queues_nothing() {
        let (ctx, controller, mut panel) = setup();
        let snapshot = controller.snapshot();
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            panel.render(ctx, &snapshot)
        });
        assert!(panel.take_actions().is_empty());
    }

    #[test]
    fn test_rejected_edit_reports_and_snaps_back() {
        let (_ctx, mut controller, mut panel) = setup();
        panel.queue(PanelAction::Edit {
            parameter: OpticalParameter::FocalLength,
            value: 0.042,
        });
        panel.apply(&mut controller);

        assert!(panel.last_error().unwrap().contains("magnification"));
        assert_eq!(panel.values.f, 0.043);
        assert_eq!(controller.config().f, 0.043);
    }

    #[test]
    fn test_actions_reach_controller() {
        let (_ctx, mut controller, mut panel) = setup();
        panel.queue(PanelAction::Edit {
            parameter: OpticalParameter::Ipd,
            value: 0.07,
        });
        panel.queue(PanelAction::ToggleDisplayMode);
        panel.queue(PanelAction::SetOverlayVisible(false));
        panel.apply(&mut controller);

        assert!(panel.last_error().is_none());
        assert_eq!(controller.config().ipd, 0.07);
        assert_eq!(controller.display_mode(), DisplayMode::Immersive);
        assert!(controller.overlay().is_empty());
        assert!(panel.take_actions().is_empty());
    }
}
