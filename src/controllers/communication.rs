//! Unread message and notification badges.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{Seq, Sequencer};
use crate::error::Result;

/// Badge class that always shows its count, including "0".
pub const USER_MESSAGE_BADGE: &str = "user-msg-badge";

/// Badge classes fed by the notification count.
pub const NOTIFICATION_BADGES: &[&str] = &["notif-count", "notif-count-sm", "sidebar-notif-count", "notif-widget-count"];

/// Badge classes fed by the unread message count.
pub const MESSAGE_BADGES: &[&str] = &[
    "msg-count",
    "msg-count-sm",
    "sidebar-msg-count",
    "msg-widget-count",
    "communication-badge",
    USER_MESSAGE_BADGE,
];

/// Which counter a badge shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountKind {
    Notifications,
    Messages,
}

/// How a badge reacts to a zero count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgePolicy {
    /// Hidden at zero, visible with the count otherwise.
    #[default]
    HideWhenZero,
    /// Always visible with the count as text, even "0".
    AlwaysShowText,
}

/// What a badge displays.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BadgeView {
    pub text: String,
    pub visible: bool,
}

impl BadgePolicy {
    /// Policy used when the config says nothing about `class`.
    pub fn builtin(class: &str) -> Self {
        if class == USER_MESSAGE_BADGE {
            Self::AlwaysShowText
        } else {
            Self::HideWhenZero
        }
    }

    /// Badge display as a pure function of the count.
    pub fn render(self, count: u32) -> BadgeView {
        match self {
            Self::HideWhenZero if count == 0 => BadgeView {
                text: String::new(),
                visible: false,
            },
            _ => BadgeView {
                text: count.to_string(),
                visible: true,
            },
        }
    }
}

/// A badge element somewhere in the application chrome.
#[derive(Debug, Clone, PartialEq)]
pub struct Badge {
    pub class: String,
    pub kind: CountKind,
    pub policy: BadgePolicy,
    pub view: BadgeView,
}

/// Last fetched counts. `None` until the first successful fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NotificationCounts {
    pub unread_messages: Option<u32>,
    pub unread_notifications: Option<u32>,
}

/// Network work requested by the badge controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    FetchCount { kind: CountKind, seq: Seq },
}

/// Outcome of a [`Request`].
#[derive(Debug)]
pub enum Response {
    CountFetched { kind: CountKind, seq: Seq, result: Result<u32> },
}

/// Keeps every badge in sync with the server counts.
#[derive(Debug)]
pub struct CommunicationIntegration {
    counts: NotificationCounts,
    badges: Vec<Badge>,
    notifications_seq: Sequencer,
    messages_seq: Sequencer,
    focused: bool,
}

impl CommunicationIntegration {
    /// Build the badge set. Configured policies override the built-in ones
    /// class by class; unlisted classes keep [`BadgePolicy::builtin`].
    pub fn new(policies: &BTreeMap<String, BadgePolicy>) -> Self {
        let badge = |class: &str, kind| Badge {
            class: class.to_string(),
            kind,
            policy: policies
                .get(class)
                .copied()
                .unwrap_or_else(|| BadgePolicy::builtin(class)),
            view: BadgeView::default(),
        };

        let badges = NOTIFICATION_BADGES
            .iter()
            .map(|c| badge(*c, CountKind::Notifications))
            .chain(MESSAGE_BADGES.iter().map(|c| badge(*c, CountKind::Messages)))
            .collect();

        Self {
            counts: NotificationCounts::default(),
            badges,
            notifications_seq: Sequencer::default(),
            messages_seq: Sequencer::default(),
            focused: true,
        }
    }

    pub fn counts(&self) -> NotificationCounts {
        self.counts
    }

    pub fn badges(&self) -> &[Badge] {
        &self.badges
    }

    pub fn badge(&self, class: &str) -> Option<&Badge> {
        self.badges.iter().find(|b| b.class == class)
    }

    /// Fetch both counts. The two requests are independent.
    pub fn refresh_counts(&mut self) -> [Request; 2] {
        [
            Request::FetchCount {
                kind: CountKind::Notifications,
                seq: self.notifications_seq.next(),
            },
            Request::FetchCount {
                kind: CountKind::Messages,
                seq: self.messages_seq.next(),
            },
        ]
    }

    /// Track window focus; regaining it triggers an immediate refresh.
    pub fn on_focus_changed(&mut self, focused: bool) -> Option<[Request; 2]> {
        let regained = focused && !self.focused;
        self.focused = focused;
        regained.then(|| self.refresh_counts())
    }

    pub fn apply(&mut self, response: Response) {
        let Response::CountFetched { kind, seq, result } = response;

        let sequencer = match kind {
            CountKind::Notifications => &self.notifications_seq,
            CountKind::Messages => &self.messages_seq,
        };
        if !sequencer.is_current(seq) {
            return;
        }

        match result {
            Ok(count) => self.update_badges(kind, count),
            Err(e) => warn!("Failed to load {kind:?} count: {e}"),
        }
    }

    fn update_badges(&mut self, kind: CountKind, count: u32) {
        match kind {
            CountKind::Notifications => self.counts.unread_notifications = Some(count),
            CountKind::Messages => self.counts.unread_messages = Some(count),
        }
        for badge in self.badges.iter_mut().filter(|b| b.kind == kind) {
            badge.view = badge.policy.render(count);
        }
    }
}
