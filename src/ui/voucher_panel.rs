//! Care voucher creation panel.

use eframe::egui::{self, RichText, Ui};
use egui_phosphor::regular::{
    ARROW_LEFT, ARROW_RIGHT, CHECK_CIRCLE, MAGNIFYING_GLASS, PAPER_PLANE_RIGHT, PLUS, SHIELD_CHECK, WARNING, X,
};

use crate::controllers::voucher::{DuesDisplay, FormStep, SearchState};

use super::app::App;
use super::components::{self, colors};

pub fn show(app: &mut App, ui: &mut Ui) {
    components::panel_header(ui, "Nouveau bon de soin");

    if let Some(index) = components::alert_list(ui, app.voucher.alerts()) {
        app.voucher.dismiss_alert(index);
    }

    show_stats(app, ui);
    ui.add_space(10.0);

    egui::ScrollArea::vertical()
        .id_salt("voucher_scroll")
        .show(ui, |ui| match app.voucher.step() {
            FormStep::MemberSelection => show_member_step(app, ui),
            FormStep::VoucherDetails => show_details_step(app, ui),
        });

    show_confirmation(app, ui.ctx());
}

fn show_stats(app: &App, ui: &mut Ui) {
    let Some(stats) = app.voucher.stats() else {
        return;
    };
    ui.horizontal(|ui| {
        ui.label(RichText::new(format!("Bons émis aujourd'hui : {}", stats.vouchers_today)).strong());
        ui.separator();
        let color = if stats.remaining_quota > 0 {
            colors::SUCCESS
        } else {
            colors::ERROR
        };
        ui.colored_label(color, format!("Limite restante : {}", stats.remaining_quota));
    });
}

fn show_member_step(app: &mut App, ui: &mut Ui) {
    components::section(ui, "1. Sélection du membre", |ui| {
        ui.horizontal(|ui| {
            let edit = ui.add(
                egui::TextEdit::singleline(&mut app.voucher.search_query)
                    .hint_text("Nom, prénom ou numéro de membre")
                    .desired_width(320.0),
            );
            if edit.changed()
                && let Some(request) = app.voucher.on_query_changed()
            {
                app.run_voucher(request);
            }

            let enter = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if components::icon_button(ui, MAGNIFYING_GLASS, "Rechercher").clicked() || enter {
                let query = app.voucher.search_query.clone();
                if let Some(request) = app.voucher.search(&query) {
                    app.run_voucher(request);
                }
            }
        });
        ui.add_space(8.0);

        show_search_results(app, ui);
        show_selected_member(app, ui);
    });

    ui.add_space(10.0);
    ui.horizontal(|ui| {
        if components::primary_button(ui, app.voucher.can_advance(), ARROW_RIGHT, "Suivant").clicked() {
            app.voucher.advance();
        }
    });
}

fn show_search_results(app: &mut App, ui: &mut Ui) {
    let mut chosen = None;
    match app.voucher.search_state() {
        SearchState::Hidden => {}
        SearchState::Loading => {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Recherche en cours...");
            });
        }
        SearchState::NoResults => {
            ui.colored_label(colors::NEUTRAL, "Aucun membre trouvé");
        }
        SearchState::Results(members) => {
            egui::Frame::new()
                .stroke(ui.visuals().widgets.noninteractive.bg_stroke)
                .inner_margin(egui::Margin::same(6))
                .show(ui, |ui| {
                    for member in members {
                        let text = format!("{}  ({})", member.full_name, member.member_number);
                        let response = ui.selectable_label(false, text);
                        let response = if member.phone.is_empty() {
                            response
                        } else {
                            response.on_hover_text(format!("Tél. {}", member.phone))
                        };
                        if response.clicked() {
                            chosen = Some(member.clone());
                        }
                    }
                });
        }
    }

    if let Some(member) = chosen {
        app.voucher.select(&member);
    }
}

fn show_selected_member(app: &mut App, ui: &mut Ui) {
    let Some(member) = app.voucher.selected().cloned() else {
        return;
    };

    ui.add_space(8.0);
    components::status_box(ui, colors::INFO, |ui| {
        ui.horizontal(|ui| {
            ui.label(RichText::new(&member.full_name).strong());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.small_button(X).on_hover_text("Changer de membre").clicked() {
                    app.voucher.deselect();
                }
            });
        });
        egui::Grid::new("selected_member_grid")
            .num_columns(2)
            .spacing([20.0, 4.0])
            .show(ui, |ui| {
                ui.label("N° membre :");
                ui.label(&member.member_number);
                ui.end_row();
                ui.label("Téléphone :");
                ui.label(&member.phone);
                ui.end_row();
                ui.label("Inscription :");
                ui.label(&member.registration_date);
                ui.end_row();
            });
    });

    ui.add_space(8.0);
    ui.horizontal(|ui| {
        let checking = matches!(app.voucher.dues(), DuesDisplay::Checking);
        if ui
            .add_enabled(!checking, egui::Button::new(format!("{SHIELD_CHECK}  Vérifier les cotisations")))
            .clicked()
            && let Some(request) = app.voucher.verify_dues()
        {
            app.run_voucher(request);
        }
    });
    show_dues(app, ui);
}

fn show_dues(app: &App, ui: &mut Ui) {
    match app.voucher.dues() {
        DuesDisplay::Empty => {}
        DuesDisplay::Checking => {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Vérification...");
            });
        }
        DuesDisplay::UpToDate { next_due } => {
            components::status_box(ui, colors::SUCCESS, |ui| {
                ui.colored_label(colors::SUCCESS, format!("{CHECK_CIRCLE}  Cotisations à jour"));
                if let Some(date) = next_due {
                    ui.label(format!("Prochaine échéance : {date}"));
                }
            });
        }
        DuesDisplay::Overdue { last_due } => {
            components::status_box(ui, colors::ERROR, |ui| {
                ui.colored_label(colors::ERROR, format!("{WARNING}  Cotisations en retard"));
                if let Some(date) = last_due {
                    ui.label(format!("Dernière échéance : {date}"));
                }
            });
        }
        DuesDisplay::Failed => {
            components::status_box(ui, colors::WARNING, |ui| {
                ui.colored_label(colors::WARNING, "Erreur lors de la vérification");
            });
        }
    }
}

fn show_details_step(app: &mut App, ui: &mut Ui) {
    if let Some(member) = app.voucher.selected() {
        ui.label(RichText::new(format!("Membre : {} ({})", member.full_name, member.member_number)).strong());
        ui.add_space(8.0);
    }

    components::section(ui, "2. Détails du bon", |ui| {
        egui::Grid::new("voucher_details_grid")
            .num_columns(2)
            .spacing([20.0, 10.0])
            .show(ui, |ui| {
                ui.label("Montant maximum :");
                ui.add(
                    egui::TextEdit::singleline(&mut app.voucher.form.amount)
                        .hint_text("0.00")
                        .desired_width(160.0),
                );
                ui.end_row();

                ui.label("Médecin :");
                let selected_text = app
                    .voucher
                    .form
                    .doctor_id
                    .and_then(|id| app.voucher.doctor_label(id))
                    .unwrap_or_else(|| "Sélectionner un médecin".to_string());
                let mut doctor_id = app.voucher.form.doctor_id;
                egui::ComboBox::from_id_salt("voucher_doctor")
                    .selected_text(selected_text)
                    .width(300.0)
                    .show_ui(ui, |ui| {
                        for doctor in app.voucher.doctors() {
                            ui.selectable_value(&mut doctor_id, Some(doctor.id), doctor.label());
                        }
                    });
                app.voucher.form.doctor_id = doctor_id;
                ui.end_row();

                ui.label("Motif :");
                ui.add(
                    egui::TextEdit::multiline(&mut app.voucher.form.reason)
                        .hint_text("Motif de la consultation")
                        .desired_rows(4)
                        .desired_width(400.0),
                );
                ui.end_row();
            });
    });

    ui.add_space(10.0);
    ui.horizontal(|ui| {
        if components::icon_button(ui, ARROW_LEFT, "Précédent").clicked() {
            app.voucher.back();
        }
        let submitting = app.voucher.is_submitting();
        if components::primary_button(ui, !submitting, PAPER_PLANE_RIGHT, "Créer le bon").clicked()
            && let Some(request) = app.voucher.submit()
        {
            app.run_voucher(request);
        }
        if submitting {
            ui.spinner();
            ui.label("Création...");
        }
    });
}

fn show_confirmation(app: &mut App, ctx: &egui::Context) {
    let Some(confirmation) = app.voucher.confirmation().cloned() else {
        return;
    };

    egui::Window::new("Bon de soin créé")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.colored_label(colors::SUCCESS, format!("{CHECK_CIRCLE}  Le bon a été créé avec succès"));
            ui.add_space(10.0);
            egui::Grid::new("confirmation_grid")
                .num_columns(2)
                .spacing([20.0, 6.0])
                .show(ui, |ui| {
                    ui.label("Code :");
                    ui.label(RichText::new(&confirmation.code).monospace().strong().size(18.0));
                    ui.end_row();
                    ui.label("Expire le :");
                    ui.label(&confirmation.expires_on);
                    ui.end_row();
                    ui.label("Montant max :");
                    ui.label(&confirmation.max_amount);
                    ui.end_row();
                    ui.label("Médecin :");
                    ui.label(&confirmation.doctor);
                    ui.end_row();
                });
            ui.add_space(10.0);
            ui.horizontal(|ui| {
                if ui.button("Copier le code").clicked() {
                    ui.ctx().copy_text(confirmation.code.clone());
                }
                if components::icon_button(ui, PLUS, "Nouveau bon").clicked() {
                    app.voucher.start_new_voucher();
                }
            });
        });
}
