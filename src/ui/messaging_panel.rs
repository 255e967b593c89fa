//! Messaging panel: conversations, thread and composer.

use eframe::egui::{self, Align, Layout, RichText, Ui};
use egui_phosphor::regular::{ARROW_CLOCKWISE, DOWNLOAD_SIMPLE, PAPERCLIP, PAPER_PLANE_RIGHT, TRASH, USER};
use tracing::warn;

use crate::controllers::messaging::{AttachmentId, FileCandidate, RenderedMessage};

use super::app::App;
use super::components::{self, colors};

pub fn show(app: &mut App, ui: &mut Ui) {
    egui::SidePanel::left("conversation_list")
        .resizable(true)
        .default_width(240.0)
        .show_inside(ui, |ui| show_conversations(app, ui));

    egui::TopBottomPanel::bottom("composer")
        .resizable(false)
        .show_inside(ui, |ui| show_composer(app, ui));

    egui::CentralPanel::default().show_inside(ui, |ui| {
        if let Some(index) = components::alert_list(ui, app.messaging.alerts()) {
            app.messaging.dismiss_alert(index);
        }
        show_thread(app, ui);
    });
}

fn show_conversations(app: &mut App, ui: &mut Ui) {
    ui.horizontal(|ui| {
        ui.heading("Conversations");
        components::badge(ui, &app.badge_view("msg-widget-count"));
        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
            if ui.small_button(ARROW_CLOCKWISE).on_hover_text("Actualiser").clicked() {
                app.run_messaging(app.messaging.load_conversations());
            }
        });
    });
    ui.horizontal(|ui| {
        ui.colored_label(colors::NEUTRAL, "Notifications");
        components::badge(ui, &app.badge_view("notif-widget-count"));
    });
    ui.separator();

    let mut opened = None;
    egui::ScrollArea::vertical()
        .id_salt("conversation_scroll")
        .show(ui, |ui| {
            if app.messaging.conversations().is_empty() {
                ui.colored_label(colors::NEUTRAL, "Aucune conversation");
            }
            for conversation in app.messaging.conversations() {
                let active = app.messaging.active_conversation() == Some(conversation.id);
                let mut title = conversation.peer.name.clone();
                if conversation.unread > 0 {
                    title = format!("{title}  ({})", conversation.unread);
                }
                let response = ui.selectable_label(active, RichText::new(title).strong());
                if !conversation.last_message.is_empty() {
                    ui.label(RichText::new(&conversation.last_message).small().color(colors::NEUTRAL));
                }
                ui.add_space(4.0);
                if response.clicked()
                    && let Some(user_id) = conversation.peer.id
                {
                    opened = Some((conversation.id, user_id));
                }
            }
        });

    if let Some((conversation_id, user_id)) = opened {
        let request = app.messaging.select_conversation(conversation_id, user_id);
        app.run_messaging(request);
    }
}

fn show_thread(app: &mut App, ui: &mut Ui) {
    if app.messaging.active_conversation().is_none() {
        ui.centered_and_justified(|ui| {
            ui.colored_label(colors::NEUTRAL, "Sélectionnez une conversation");
        });
        return;
    }

    let mut download = None;
    egui::ScrollArea::vertical()
        .id_salt("thread_scroll")
        .stick_to_bottom(true)
        .auto_shrink([false, false])
        .show(ui, |ui| {
            for message in app.messaging.thread() {
                if let Some(attachment) = show_message(ui, message) {
                    download = Some(attachment);
                }
                ui.add_space(6.0);
            }
        });

    if let Some((attachment_id, name)) = download
        && let Some(dest) = rfd::FileDialog::new().set_file_name(&name).save_file()
    {
        let request = app.messaging.download_attachment(attachment_id, dest);
        app.run_messaging(request);
    }
}

/// Returns the attachment whose download button was clicked.
fn show_message(ui: &mut Ui, message: &RenderedMessage) -> Option<(i64, String)> {
    let mut clicked = None;
    let layout = if message.own {
        Layout::top_down(Align::Max)
    } else {
        Layout::top_down(Align::Min)
    };
    let fill = if message.own {
        ui.visuals().selection.bg_fill.gamma_multiply(0.35)
    } else {
        ui.style().visuals.extreme_bg_color
    };

    ui.with_layout(layout, |ui| {
        egui::Frame::new()
            .fill(fill)
            .inner_margin(egui::Margin::same(10))
            .corner_radius(egui::CornerRadius::same(8))
            .show(ui, |ui| {
                ui.set_max_width(420.0);
                ui.horizontal(|ui| {
                    ui.label(RichText::new(&message.sender).strong());
                    ui.label(RichText::new(&message.sent_at).small().color(colors::NEUTRAL));
                });
                if !message.body.is_empty() {
                    ui.label(&message.body);
                }
                for attachment in &message.attachments {
                    ui.horizontal(|ui| {
                        ui.label(components::file_icon(attachment.kind));
                        ui.label(&attachment.name);
                        ui.colored_label(colors::NEUTRAL, &attachment.size_label);
                        if ui.small_button(DOWNLOAD_SIMPLE).on_hover_text("Télécharger").clicked() {
                            clicked = Some((attachment.id, attachment.name.clone()));
                        }
                    });
                }
            });
    });

    clicked
}

fn show_composer(app: &mut App, ui: &mut Ui) {
    ui.add_space(6.0);

    if app.messaging.active_conversation().is_none() {
        ui.horizontal(|ui| {
            ui.label(format!("{USER}  Destinataire (ID) :"));
            let edit = ui.add(egui::TextEdit::singleline(&mut app.new_recipient).desired_width(100.0));
            if edit.changed() {
                app.messaging.set_recipient(app.new_recipient.trim().parse().ok());
            }
        });
    }

    if app.messaging.preview_visible() {
        show_attachment_preview(app, ui);
    }

    ui.horizontal(|ui| {
        if ui.button(PAPERCLIP).on_hover_text("Joindre des fichiers").clicked() {
            pick_attachments(app);
        }
        ui.add(
            egui::TextEdit::multiline(&mut app.messaging.draft)
                .hint_text("Écrire un message...")
                .desired_rows(2)
                .desired_width(ui.available_width() - 120.0),
        );
        let sending = app.messaging.is_sending();
        if components::primary_button(ui, !sending, PAPER_PLANE_RIGHT, "Envoyer").clicked()
            && let Some(request) = app.messaging.send_message()
        {
            app.run_messaging(request);
        }
        if sending {
            ui.spinner();
        }
    });
    ui.add_space(6.0);
}

fn show_attachment_preview(app: &mut App, ui: &mut Ui) {
    let mut removed: Option<AttachmentId> = None;
    egui::Frame::new()
        .fill(ui.style().visuals.extreme_bg_color)
        .inner_margin(egui::Margin::same(8))
        .corner_radius(egui::CornerRadius::same(6))
        .show(ui, |ui| {
            for attachment in app.messaging.pending() {
                ui.horizontal(|ui| {
                    ui.label(components::file_icon(attachment.kind()));
                    ui.label(&attachment.name);
                    ui.colored_label(colors::NEUTRAL, attachment.size_label());
                    if ui.small_button(TRASH).on_hover_text("Retirer").clicked() {
                        removed = Some(attachment.id);
                    }
                });
            }
        });
    if let Some(id) = removed {
        app.messaging.remove_attachment(id);
    }
    ui.add_space(4.0);
}

fn pick_attachments(app: &mut App) {
    let Some(paths) = rfd::FileDialog::new().set_title("Joindre des fichiers").pick_files() else {
        return;
    };
    let candidates: Vec<FileCandidate> = paths
        .into_iter()
        .filter_map(|path| match FileCandidate::from_path(path.clone()) {
            Ok(candidate) => Some(candidate),
            Err(e) => {
                warn!("Cannot read {}: {e}", path.display());
                None
            }
        })
        .collect();
    app.messaging.select_attachments(candidates);
}
