//! Background execution of controller requests.
//!
//! Requests run on the tokio runtime; their outcomes come back to the UI
//! thread as [`UiMessage`]s over an unbounded channel.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use eframe::egui;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::api::ApiClient;
use crate::controllers::{communication, member_list, messaging, voucher};

/// Messages from async tasks to UI.
#[derive(Debug)]
pub enum UiMessage {
    Voucher(voucher::Response),
    Members(member_list::Response),
    Counts(communication::Response),
    Messaging(messaging::Response),
    /// Badge polling interval elapsed.
    PollTick,
}

/// Runs controller requests against the API.
#[derive(Clone)]
pub struct Dispatcher {
    rt: Handle,
    api: Arc<ApiClient>,
    tx: mpsc::UnboundedSender<UiMessage>,
    repaint: Option<egui::Context>,
}

impl Dispatcher {
    pub fn new(rt: Handle, api: Arc<ApiClient>, tx: mpsc::UnboundedSender<UiMessage>) -> Self {
        Self {
            rt,
            api,
            tx,
            repaint: None,
        }
    }

    /// Wake the UI whenever a result arrives.
    pub fn with_repaint(mut self, ctx: egui::Context) -> Self {
        self.repaint = Some(ctx);
        self
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = UiMessage> + Send + 'static,
    {
        let tx = self.tx.clone();
        let repaint = self.repaint.clone();
        self.rt.spawn(async move {
            let _ = tx.send(task.await);
            if let Some(ctx) = repaint {
                ctx.request_repaint();
            }
        });
    }

    pub fn voucher(&self, request: voucher::Request) {
        use voucher::{Request, Response};

        debug!("voucher request: {request:?}");
        let api = self.api.clone();
        self.spawn(async move {
            let response = match request {
                Request::SearchMembers { seq, query } => Response::MembersFound {
                    seq,
                    result: api.search_members(&query).await,
                },
                Request::VerifyDues { seq, member_id } => Response::DuesChecked {
                    seq,
                    result: api.verify_dues(member_id).await,
                },
                Request::LoadDoctors => Response::DoctorsLoaded(api.list_doctors().await),
                Request::LoadStats => Response::StatsLoaded(api.daily_stats().await),
                Request::CreateVoucher(voucher) => Response::VoucherCreated(api.create_voucher(&voucher).await),
            };
            UiMessage::Voucher(response)
        });
    }

    pub fn members(&self, request: member_list::Request) {
        use member_list::{Request, Response};

        let api = self.api.clone();
        self.spawn(async move {
            let Request::LoadMembers { seq, page, filters } = request;
            UiMessage::Members(Response::MembersLoaded {
                seq,
                result: api.list_members(page, &filters).await,
            })
        });
    }

    /// Each count runs as its own task so one failing never holds up the other.
    pub fn counts(&self, requests: impl IntoIterator<Item = communication::Request>) {
        use communication::{CountKind, Request, Response};

        for request in requests {
            let api = self.api.clone();
            self.spawn(async move {
                let Request::FetchCount { kind, seq } = request;
                let result = match kind {
                    CountKind::Notifications => api.notification_count().await,
                    CountKind::Messages => api.unread_message_count().await,
                };
                UiMessage::Counts(Response::CountFetched { kind, seq, result })
            });
        }
    }

    pub fn messaging(&self, request: messaging::Request) {
        use messaging::{Request, Response};

        let api = self.api.clone();
        self.spawn(async move {
            let response = match request {
                Request::LoadConversations => Response::ConversationsLoaded(api.list_conversations().await),
                Request::LoadMessages { seq, conversation_id } => Response::MessagesLoaded {
                    seq,
                    result: api.conversation_messages(conversation_id).await,
                },
                Request::SendMessage(message) => Response::MessageSent(api.send_message(&message).await),
                Request::DownloadAttachment { attachment_id, dest } => Response::AttachmentDownloaded {
                    attachment_id,
                    result: api.download_attachment(attachment_id, &dest).await,
                },
            };
            UiMessage::Messaging(response)
        });
    }

    /// Start the badge polling timer.
    pub fn start_polling(&self, period: Duration) -> PollHandle {
        let tx = self.tx.clone();
        let repaint = self.repaint.clone();
        PollHandle::spawn(&self.rt, period, move || {
            let _ = tx.send(UiMessage::PollTick);
            if let Some(ctx) = &repaint {
                ctx.request_repaint();
            }
        })
    }
}

/// Cancellable periodic timer.
///
/// The first tick fires one full period after start. Dropping the handle
/// stops the timer.
#[derive(Debug)]
pub struct PollHandle {
    handle: JoinHandle<()>,
}

impl PollHandle {
    pub fn spawn<F>(rt: &Handle, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let handle = rt.spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                tick();
            }
        });
        Self { handle }
    }

    pub fn stop(&self) {
        self.handle.abort();
    }

    pub fn is_stopped(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EndpointsConfig, ServerConfig};
    use crate::controllers::CommunicationIntegration;
    use crate::controllers::communication::{CountKind, Response};
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_poll_handle_ticks_until_stopped() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        let poll = PollHandle::spawn(&Handle::current(), Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(55)).await;
        poll.stop();
        tokio::task::yield_now().await;
        let at_stop = ticks.load(Ordering::SeqCst);
        assert!(at_stop >= 1, "expected ticks before stop, got {at_stop}");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), at_stop);
        assert!(poll.is_stopped());
    }

    #[tokio::test]
    async fn test_dropping_poll_handle_stops_timer() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        let poll = PollHandle::spawn(&Handle::current(), Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        drop(poll);

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unreachable_server_reports_each_count_separately() {
        let server = ServerConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..Default::default()
        };
        let api = Arc::new(ApiClient::new(&server, &EndpointsConfig::default()).unwrap());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = Dispatcher::new(Handle::current(), api, tx);

        let mut comm = CommunicationIntegration::new(&BTreeMap::new());
        dispatcher.counts(comm.refresh_counts());

        let mut kinds = Vec::new();
        for _ in 0..2 {
            match rx.recv().await {
                Some(UiMessage::Counts(Response::CountFetched { kind, result, .. })) => {
                    assert!(result.is_err());
                    kinds.push(kind);
                }
                other => panic!("unexpected message {other:?}"),
            }
        }
        assert!(kinds.contains(&CountKind::Notifications));
        assert!(kinds.contains(&CountKind::Messages));
    }
}
