//! Per-panel controllers.
//!
//! A controller owns the view state of one panel. User actions are methods
//! that validate locally and return the network request to run, if any;
//! responses come back through `apply`. Controllers never perform I/O.

pub mod attachments;
pub mod communication;
pub mod member_list;
pub mod messaging;
pub mod voucher;

use chrono::{DateTime, Local, TimeDelta};

pub use communication::CommunicationIntegration;
pub use member_list::MemberListManager;
pub use messaging::MessagingPanel;
pub use voucher::VoucherWizard;

/// How long an inline alert stays visible.
pub const ALERT_LIFETIME: TimeDelta = TimeDelta::seconds(5);

/// Alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertLevel {
    Info,
    Success,
    Warning,
    Danger,
}

/// Inline, self-expiring user-facing message.
#[derive(Debug, Clone)]
pub struct Alert {
    pub level: AlertLevel,
    pub message: String,
    pub raised_at: DateTime<Local>,
}

impl Alert {
    pub fn new(level: AlertLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            raised_at: Local::now(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(AlertLevel::Warning, message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(AlertLevel::Danger, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(AlertLevel::Success, message)
    }

    /// Whether the alert has outlived [`ALERT_LIFETIME`] at `now`.
    pub fn is_expired(&self, now: DateTime<Local>) -> bool {
        now - self.raised_at >= ALERT_LIFETIME
    }
}

/// Drop expired alerts.
pub fn prune_alerts(alerts: &mut Vec<Alert>, now: DateTime<Local>) {
    alerts.retain(|a| !a.is_expired(now));
}

/// Tag attached to a request so late responses can be recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Seq(u64);

/// Monotonic request counter for one UI region.
///
/// Only the response to the most recently issued request is applied; anything
/// older is stale.
#[derive(Debug, Default)]
pub struct Sequencer {
    latest: u64,
}

impl Sequencer {
    /// Issue a new tag, invalidating every earlier one.
    pub fn next(&mut self) -> Seq {
        self.latest += 1;
        Seq(self.latest)
    }

    /// Invalidate in-flight requests without issuing a new one.
    pub fn invalidate(&mut self) {
        self.latest += 1;
    }

    pub fn is_current(&self, seq: Seq) -> bool {
        seq.0 == self.latest
    }
}
