//! Member list panel.

use eframe::egui::{self, RichText, Ui};
use egui_extras::{Column, TableBuilder};
use egui_phosphor::regular::{ARROW_CLOCKWISE, CARET_LEFT, CARET_RIGHT, FUNNEL, TICKET, X};

use super::app::App;
use super::components::{self, colors};

const FILTER_NAME: &str = "nom";
const FILTER_NUMBER: &str = "numero";

/// Show the member list. Returns true when a voucher should be started for
/// the chosen member.
pub fn show(app: &mut App, ui: &mut Ui) -> bool {
    components::panel_header(ui, "Membres");

    show_filters(app, ui);
    ui.add_space(10.0);
    show_toolbar(app, ui);
    show_pager(app, ui);
    ui.add_space(6.0);

    if let Some(error) = app.members.error() {
        ui.colored_label(colors::ERROR, error);
        ui.add_space(6.0);
    }

    show_table(app, ui)
}

fn show_filters(app: &mut App, ui: &mut Ui) {
    ui.horizontal(|ui| {
        ui.label("Nom :");
        ui.add(egui::TextEdit::singleline(&mut app.member_name_filter).desired_width(180.0));
        ui.label("N° membre :");
        ui.add(egui::TextEdit::singleline(&mut app.member_number_filter).desired_width(120.0));

        if components::icon_button(ui, FUNNEL, "Filtrer").clicked() {
            let name = app.member_name_filter.clone();
            let number = app.member_number_filter.clone();
            // The first load is superseded by the second; only that one is sent.
            app.members.set_filter(FILTER_NAME, &name);
            let request = app.members.set_filter(FILTER_NUMBER, &number);
            app.run_members(request);
        }
        if ui
            .add_enabled(
                !app.members.filters().is_empty(),
                egui::Button::new(format!("{X}  Effacer")),
            )
            .clicked()
        {
            app.member_name_filter.clear();
            app.member_number_filter.clear();
            let request = app.members.clear_filters();
            app.run_members(request);
        }
    });
}

fn show_toolbar(app: &mut App, ui: &mut Ui) {
    ui.horizontal(|ui| {
        if components::icon_button(ui, ARROW_CLOCKWISE, "Actualiser").clicked() {
            let request = app.members.load_members();
            app.run_members(request);
        }
        if app.members.is_loading() {
            ui.spinner();
        }
        ui.separator();
        if ui.button("Tout sélectionner").clicked() {
            app.members.select_all_visible();
        }
        if ui
            .add_enabled(
                !app.members.selected_ids().is_empty(),
                egui::Button::new("Désélectionner"),
            )
            .clicked()
        {
            app.members.clear_selection();
        }
        ui.label(format!("{} sélectionné(s)", app.members.selected_ids().len()));
    });
}

fn show_table(app: &mut App, ui: &mut Ui) -> bool {
    let mut toggled = None;
    let mut voucher_for = None;

    TableBuilder::new(ui)
        .id_salt("member_table")
        .striped(true)
        .resizable(true)
        .column(Column::exact(30.0))
        .column(Column::auto().at_least(90.0))
        .column(Column::remainder().at_least(180.0))
        .column(Column::auto().at_least(110.0))
        .column(Column::auto().at_least(100.0))
        .column(Column::exact(40.0))
        .header(22.0, |mut header| {
            header.col(|_| {});
            header.col(|ui| {
                ui.label(RichText::new("N°").strong());
            });
            header.col(|ui| {
                ui.label(RichText::new("Nom complet").strong());
            });
            header.col(|ui| {
                ui.label(RichText::new("Téléphone").strong());
            });
            header.col(|ui| {
                ui.label(RichText::new("Inscription").strong());
            });
            header.col(|_| {});
        })
        .body(|mut body| {
            for member in app.members.rows() {
                body.row(24.0, |mut row| {
                    row.col(|ui| {
                        let mut checked = app.members.is_selected(member.id);
                        if ui.checkbox(&mut checked, "").changed() {
                            toggled = Some(member.id);
                        }
                    });
                    row.col(|ui| {
                        ui.label(&member.member_number);
                    });
                    row.col(|ui| {
                        ui.label(&member.full_name);
                    });
                    row.col(|ui| {
                        ui.label(&member.phone);
                    });
                    row.col(|ui| {
                        ui.label(&member.registration_date);
                    });
                    row.col(|ui| {
                        if ui.small_button(TICKET).on_hover_text("Créer un bon de soin").clicked() {
                            voucher_for = Some(member.clone());
                        }
                    });
                });
            }
        });

    if let Some(id) = toggled {
        app.members.toggle_selection(id);
    }
    match voucher_for {
        Some(member) => {
            app.voucher.start_new_voucher();
            app.voucher.select(&member);
            true
        }
        None => false,
    }
}

fn show_pager(app: &mut App, ui: &mut Ui) {
    ui.horizontal(|ui| {
        if ui.button(CARET_LEFT).clicked()
            && let Some(request) = app.members.prev_page()
        {
            app.run_members(request);
        }
        let label = match app.members.total_pages() {
            Some(total) => format!("Page {} / {}", app.members.page(), total),
            None => format!("Page {}", app.members.page()),
        };
        ui.label(label);
        if ui.button(CARET_RIGHT).clicked()
            && let Some(request) = app.members.next_page()
        {
            app.run_members(request);
        }
    });
}
