//! Shared UI components.

use eframe::egui::{self, Button, Color32, CornerRadius, Frame, Margin, Response, RichText, Ui};
use egui_phosphor::regular::{FILE, FILE_DOC, FILE_PDF, FILE_TEXT, FILE_XLS, FILE_ZIP, IMAGE, X};

use crate::controllers::attachments::FileKind;
use crate::controllers::communication::BadgeView;
use crate::controllers::{Alert, AlertLevel};

/// Status indicator colors.
pub mod colors {
    use super::Color32;

    pub const SUCCESS: Color32 = Color32::from_rgb(100, 200, 100);
    pub const ERROR: Color32 = Color32::from_rgb(255, 100, 100);
    pub const WARNING: Color32 = Color32::from_rgb(255, 200, 100);
    pub const INFO: Color32 = Color32::from_rgb(110, 170, 255);
    pub const NEUTRAL: Color32 = Color32::from_rgb(150, 150, 150);
    pub const BADGE: Color32 = Color32::from_rgb(220, 53, 69);
}

pub fn alert_color(level: AlertLevel) -> Color32 {
    match level {
        AlertLevel::Info => colors::INFO,
        AlertLevel::Success => colors::SUCCESS,
        AlertLevel::Warning => colors::WARNING,
        AlertLevel::Danger => colors::ERROR,
    }
}

/// Render a panel header with title.
pub fn panel_header(ui: &mut Ui, title: &str) {
    ui.heading(RichText::new(title).size(24.0));
    ui.add_space(10.0);
    ui.separator();
    ui.add_space(10.0);
}

/// Framed section with a bold title.
pub fn section<R>(ui: &mut Ui, title: &str, add_contents: impl FnOnce(&mut Ui) -> R) -> R {
    Frame::new()
        .fill(ui.style().visuals.extreme_bg_color)
        .inner_margin(Margin::same(15))
        .corner_radius(CornerRadius::same(8))
        .show(ui, |ui| {
            ui.label(RichText::new(title).strong());
            ui.add_space(8.0);
            add_contents(ui)
        })
        .inner
}

/// Colored box used for inline status (dues result, confirmation).
pub fn status_box(ui: &mut Ui, color: Color32, add_contents: impl FnOnce(&mut Ui)) {
    Frame::new()
        .stroke(egui::Stroke::new(1.0, color))
        .fill(color.gamma_multiply(0.12))
        .inner_margin(Margin::same(10))
        .corner_radius(CornerRadius::same(6))
        .show(ui, add_contents);
}

/// Show dismissible alerts. Returns the index of the dismissed one, if any.
pub fn alert_list(ui: &mut Ui, alerts: &[Alert]) -> Option<usize> {
    let mut dismissed = None;
    for (index, alert) in alerts.iter().enumerate() {
        status_box(ui, alert_color(alert.level), |ui| {
            ui.horizontal(|ui| {
                ui.colored_label(alert_color(alert.level), &alert.message);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button(X).clicked() {
                        dismissed = Some(index);
                    }
                });
            });
        });
        ui.add_space(4.0);
    }
    dismissed
}

/// Small pill with the badge text. Draws nothing when hidden.
pub fn badge(ui: &mut Ui, view: &BadgeView) {
    if !view.visible {
        return;
    }
    Frame::new()
        .fill(colors::BADGE)
        .inner_margin(Margin::symmetric(6, 1))
        .corner_radius(CornerRadius::same(8))
        .show(ui, |ui| {
            ui.label(RichText::new(&view.text).size(11.0).color(Color32::WHITE));
        });
}

/// Button with a leading icon.
pub fn icon_button(ui: &mut Ui, icon: &str, text: &str) -> Response {
    ui.add(Button::new(RichText::new(format!("{icon}  {text}")).size(14.0)))
}

/// Accent-filled button with a leading icon, optionally disabled.
pub fn primary_button(ui: &mut Ui, enabled: bool, icon: &str, text: &str) -> Response {
    let button = Button::new(RichText::new(format!("{icon}  {text}")).size(14.0).color(Color32::WHITE))
        .fill(ui.visuals().selection.bg_fill);
    ui.add_enabled(enabled, button)
}

pub fn file_icon(kind: FileKind) -> &'static str {
    match kind {
        FileKind::Pdf => FILE_PDF,
        FileKind::Word => FILE_DOC,
        FileKind::Excel => FILE_XLS,
        FileKind::Image => IMAGE,
        FileKind::Text => FILE_TEXT,
        FileKind::Archive => FILE_ZIP,
        FileKind::Other => FILE,
    }
}
