//! Application state and frame loop.

use std::sync::Arc;
use std::time::Duration;

use eframe::egui::{self, Align, Layout, RichText};
use egui_phosphor::regular::{BELL, CHAT_CIRCLE_TEXT, TICKET, USER_CIRCLE, USERS};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::api::ApiClient;
use crate::config::AppConfig;
use crate::controllers::attachments::AttachmentPolicy;
use crate::controllers::communication::{self, BadgeView};
use crate::controllers::{CommunicationIntegration, MemberListManager, MessagingPanel, VoucherWizard};
use crate::controllers::{member_list, messaging, voucher};
use crate::error::Result;
use crate::tasks::{Dispatcher, PollHandle, UiMessage};

use super::components::{self, colors};
use super::{member_panel, messaging_panel, voucher_panel};

/// Available panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Panel {
    #[default]
    Vouchers,
    Members,
    Messaging,
}

impl Panel {
    /// Get the display name for the panel.
    pub fn name(&self) -> &'static str {
        match self {
            Panel::Vouchers => "Bons de soin",
            Panel::Members => "Membres",
            Panel::Messaging => "Messagerie",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Panel::Vouchers => TICKET,
            Panel::Members => USERS,
            Panel::Messaging => CHAT_CIRCLE_TEXT,
        }
    }
}

/// Main application state.
pub struct App {
    #[allow(dead_code)]
    rt: tokio::runtime::Runtime,
    dispatcher: Dispatcher,
    rx: mpsc::UnboundedReceiver<UiMessage>,
    pub config: AppConfig,
    pub current_panel: Panel,

    pub voucher: VoucherWizard,
    pub members: MemberListManager,
    pub communication: CommunicationIntegration,
    pub messaging: MessagingPanel,

    /// Member list filter inputs, applied on demand.
    pub member_name_filter: String,
    pub member_number_filter: String,
    /// Recipient typed for a message outside any conversation.
    pub new_recipient: String,

    poll: Option<PollHandle>,
    startup_error: Option<String>,
}

impl App {
    pub fn new(
        config: AppConfig,
        rt: tokio::runtime::Runtime,
        ctx: egui::Context,
        startup_error: Option<String>,
    ) -> Result<Self> {
        let api = Arc::new(ApiClient::new(&config.server, &config.endpoints)?);
        info!("API client ready for {}", api.base_url());

        let (tx, rx) = mpsc::unbounded_channel();
        let dispatcher = Dispatcher::new(rt.handle().clone(), api, tx).with_repaint(ctx);

        let mut app = Self {
            voucher: VoucherWizard::new(config.voucher.min_search_length),
            members: MemberListManager::new(),
            communication: CommunicationIntegration::new(&config.badges.policies),
            messaging: MessagingPanel::new(AttachmentPolicy::from(&config.attachments)),
            member_name_filter: String::new(),
            member_number_filter: String::new(),
            new_recipient: String::new(),
            current_panel: Panel::default(),
            poll: None,
            startup_error,
            rt,
            dispatcher,
            rx,
            config,
        };

        // Load initial data
        app.run_voucher(app.voucher.load_doctors());
        app.run_voucher(app.voucher.refresh_stats());
        let request = app.members.load_members();
        app.run_members(request);
        app.refresh_counts();
        app.run_messaging(app.messaging.load_conversations());
        app.start_polling();

        Ok(app)
    }

    // Request dispatch

    pub fn run_voucher(&self, request: voucher::Request) {
        self.dispatcher.voucher(request);
    }

    pub fn run_members(&self, request: member_list::Request) {
        self.dispatcher.members(request);
    }

    pub fn run_messaging(&self, request: messaging::Request) {
        self.dispatcher.messaging(request);
    }

    pub fn refresh_counts(&mut self) {
        let requests = self.communication.refresh_counts();
        self.dispatcher.counts(requests);
    }

    /// (Re)start badge polling at the configured interval.
    pub fn start_polling(&mut self) {
        let period = Duration::from_secs(self.config.polling.interval_secs);
        // Replacing the handle drops, and so stops, any previous timer.
        self.poll = Some(self.dispatcher.start_polling(period));
        debug!("Badge polling every {period:?}");
    }

    pub fn stop_polling(&mut self) {
        if let Some(poll) = self.poll.take() {
            poll.stop();
        }
    }

    pub fn badge_view(&self, class: &str) -> BadgeView {
        self.communication
            .badge(class)
            .map(|b| b.view.clone())
            .unwrap_or_default()
    }

    /// Poll async operation results.
    fn poll_async_results(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                UiMessage::Voucher(response) => {
                    if let Some(next) = self.voucher.apply(response) {
                        self.run_voucher(next);
                    }
                }
                UiMessage::Members(response) => self.members.apply(response),
                UiMessage::Counts(response) => self.communication.apply(response),
                UiMessage::Messaging(response) => {
                    if let Some(next) = self.messaging.apply(response) {
                        self.run_messaging(next);
                    }
                }
                UiMessage::PollTick => self.refresh_counts(),
            }
        }
    }

    fn track_focus(&mut self, ctx: &egui::Context) {
        let focused = ctx.input(|i| i.focused);
        if let Some(requests) = self.communication.on_focus_changed(focused) {
            debug!("Window focus regained, refreshing counts");
            self.dispatcher.counts(requests);
        }
    }

    fn show_menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                for panel in [Panel::Vouchers, Panel::Members, Panel::Messaging] {
                    let label = format!("{}  {}", panel.icon(), panel.name());
                    if ui.selectable_label(self.current_panel == panel, label).clicked() {
                        self.current_panel = panel;
                    }
                    if panel == Panel::Messaging {
                        components::badge(ui, &self.badge_view("communication-badge"));
                    }
                }

                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    ui.menu_button(RichText::new(USER_CIRCLE).size(18.0), |ui| {
                        ui.horizontal(|ui| {
                            ui.label("Messages non lus");
                            components::badge(ui, &self.badge_view(communication::USER_MESSAGE_BADGE));
                        });
                        ui.separator();
                        if ui.button("Actualiser les compteurs").clicked() {
                            self.refresh_counts();
                            ui.close();
                        }
                        let mut auto_refresh = self.poll.is_some();
                        if ui.checkbox(&mut auto_refresh, "Actualisation automatique").changed() {
                            if auto_refresh {
                                self.start_polling();
                            } else {
                                self.stop_polling();
                            }
                        }
                    });
                    components::badge(ui, &self.badge_view("msg-count"));
                    if ui.button(CHAT_CIRCLE_TEXT).clicked() {
                        self.current_panel = Panel::Messaging;
                    }
                    components::badge(ui, &self.badge_view("notif-count"));
                    ui.label(RichText::new(BELL).size(16.0));
                });
            });
        });
    }

    fn show_sidebar(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("sidebar")
            .resizable(false)
            .exact_width(180.0)
            .show(ctx, |ui| {
                ui.add_space(10.0);
                for panel in [Panel::Vouchers, Panel::Members, Panel::Messaging] {
                    ui.horizontal(|ui| {
                        let label = format!("{}  {}", panel.icon(), panel.name());
                        if ui.selectable_label(self.current_panel == panel, label).clicked() {
                            self.current_panel = panel;
                        }
                        if panel == Panel::Messaging {
                            components::badge(ui, &self.badge_view("sidebar-msg-count"));
                        }
                    });
                }
                ui.separator();
                ui.horizontal(|ui| {
                    ui.label(format!("{BELL}  Notifications"));
                    components::badge(ui, &self.badge_view("sidebar-notif-count"));
                });
            });
    }

    /// Render status bar (display only, no interaction).
    fn show_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar")
            .min_height(28.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.colored_label(colors::NEUTRAL, self.config.server.base_url.as_str());
                    if let Some(stats) = self.voucher.stats() {
                        ui.separator();
                        ui.label(format!(
                            "{} bon(s) aujourd'hui, {} restant(s)",
                            stats.vouchers_today, stats.remaining_quota
                        ));
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        components::badge(ui, &self.badge_view("msg-count-sm"));
                        ui.label(CHAT_CIRCLE_TEXT);
                        components::badge(ui, &self.badge_view("notif-count-sm"));
                        ui.label(BELL);
                    });
                });
            });
    }

    fn show_startup_error(&mut self, ctx: &egui::Context) {
        let Some(error) = self.startup_error.clone() else {
            return;
        };
        egui::Window::new("Configuration invalide")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.colored_label(colors::ERROR, &error);
                ui.label("Les valeurs par défaut sont utilisées.");
                ui.add_space(10.0);
                if ui.button("OK").clicked() {
                    self.startup_error = None;
                }
            });
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Poll async results
        self.poll_async_results();
        self.track_focus(ctx);

        self.voucher.prune_alerts();
        self.messaging.prune_alerts();
        if !self.voucher.alerts().is_empty() || !self.messaging.alerts().is_empty() {
            ctx.request_repaint_after(Duration::from_secs(1));
        }

        self.show_menu_bar(ctx);
        self.show_status_bar(ctx);
        self.show_sidebar(ctx);
        self.show_startup_error(ctx);

        egui::CentralPanel::default().show(ctx, |ui| match self.current_panel {
            Panel::Vouchers => voucher_panel::show(self, ui),
            Panel::Members => {
                if member_panel::show(self, ui) {
                    self.current_panel = Panel::Vouchers;
                }
            }
            Panel::Messaging => messaging_panel::show(self, ui),
        });
    }
}
