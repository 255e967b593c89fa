//! Conversations, message composition with attachments, and thread rendering.

use std::path::PathBuf;

use chrono::{DateTime, Local, NaiveDateTime};
use tracing::{info, warn};

use super::attachments::{AttachmentPolicy, FileKind, extension_of, format_size};
use super::{Alert, Seq, Sequencer, prune_alerts};
use crate::api::{ConversationSummary, Message, OutgoingMessage};
use crate::error::Result;

/// Title the server expects on one-to-one messages.
pub const PRIVATE_MESSAGE_TITLE: &str = "Message privé";

const MSG_NO_RECIPIENT: &str = "Veuillez choisir un destinataire";
const MSG_SEND_FAILED: &str = "Erreur lors de l'envoi du message";
const MSG_CONNECTION_FAILED: &str = "Erreur de connexion";
const MSG_LOAD_FAILED: &str = "Erreur lors du chargement des messages";

/// Identity of a pending attachment within one panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttachmentId(u64);

/// A file picked by the user, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub path: PathBuf,
    pub name: String,
    pub size_bytes: u64,
}

impl FileCandidate {
    /// Read name and size from the filesystem.
    pub fn from_path(path: PathBuf) -> std::io::Result<Self> {
        let size_bytes = std::fs::metadata(&path)?.len();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { path, name, size_bytes })
    }
}

/// Accepted file waiting to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAttachment {
    pub id: AttachmentId,
    pub path: PathBuf,
    pub name: String,
    pub size_bytes: u64,
    pub extension: String,
}

impl PendingAttachment {
    pub fn kind(&self) -> FileKind {
        FileKind::from_extension(&self.extension)
    }

    pub fn size_label(&self) -> String {
        format_size(self.size_bytes)
    }
}

/// Attachment row under a rendered message.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedAttachment {
    pub id: i64,
    pub name: String,
    pub size_label: String,
    pub kind: FileKind,
}

/// One message as shown in the thread.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMessage {
    pub id: i64,
    pub sender: String,
    pub own: bool,
    pub sent_at: String,
    pub body: String,
    pub attachments: Vec<RenderedAttachment>,
}

/// Server timestamp as `dd/mm/yyyy HH:MM`; unparseable values pass through.
pub fn display_timestamp(raw: &str) -> String {
    const FORMAT: &str = "%d/%m/%Y %H:%M";
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Local).format(FORMAT).to_string();
    }
    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(dt) => dt.format(FORMAT).to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Network work requested by the messaging panel.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    LoadConversations,
    LoadMessages { seq: Seq, conversation_id: i64 },
    SendMessage(OutgoingMessage),
    DownloadAttachment { attachment_id: i64, dest: PathBuf },
}

/// Outcome of a [`Request`].
#[derive(Debug)]
pub enum Response {
    ConversationsLoaded(Result<Vec<ConversationSummary>>),
    MessagesLoaded { seq: Seq, result: Result<Vec<Message>> },
    MessageSent(Result<()>),
    AttachmentDownloaded { attachment_id: i64, result: Result<PathBuf> },
}

/// Messaging panel state.
#[derive(Debug)]
pub struct MessagingPanel {
    policy: AttachmentPolicy,
    pending: Vec<PendingAttachment>,
    next_attachment_id: u64,
    /// Composer text.
    pub draft: String,
    recipient_id: Option<i64>,
    active_conversation: Option<i64>,
    conversations: Vec<ConversationSummary>,
    thread: Vec<RenderedMessage>,
    thread_seq: Sequencer,
    sending: bool,
    alerts: Vec<Alert>,
}

impl MessagingPanel {
    pub fn new(policy: AttachmentPolicy) -> Self {
        Self {
            policy,
            pending: Vec::new(),
            next_attachment_id: 0,
            draft: String::new(),
            recipient_id: None,
            active_conversation: None,
            conversations: Vec::new(),
            thread: Vec::new(),
            thread_seq: Sequencer::default(),
            sending: false,
            alerts: Vec::new(),
        }
    }

    pub fn pending(&self) -> &[PendingAttachment] {
        &self.pending
    }

    /// The preview area is shown while at least one file is pending.
    pub fn preview_visible(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn recipient_id(&self) -> Option<i64> {
        self.recipient_id
    }

    pub fn active_conversation(&self) -> Option<i64> {
        self.active_conversation
    }

    pub fn conversations(&self) -> &[ConversationSummary] {
        &self.conversations
    }

    pub fn thread(&self) -> &[RenderedMessage] {
        &self.thread
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn prune_alerts(&mut self) {
        prune_alerts(&mut self.alerts, Local::now());
    }

    pub fn dismiss_alert(&mut self, index: usize) {
        if index < self.alerts.len() {
            self.alerts.remove(index);
        }
    }

    // Attachments

    /// Validate and queue picked files. Each file is judged on its own.
    pub fn select_attachments(&mut self, files: impl IntoIterator<Item = FileCandidate>) {
        for file in files {
            match self.policy.check(&file.name, file.size_bytes) {
                Ok(extension) => {
                    let id = AttachmentId(self.next_attachment_id);
                    self.next_attachment_id += 1;
                    self.pending.push(PendingAttachment {
                        id,
                        path: file.path,
                        name: file.name,
                        size_bytes: file.size_bytes,
                        extension,
                    });
                }
                Err(rejection) => self.alerts.push(Alert::danger(rejection.to_string())),
            }
        }
    }

    pub fn remove_attachment(&mut self, id: AttachmentId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|a| a.id != id);
        self.pending.len() != before
    }

    // Conversations

    pub fn load_conversations(&self) -> Request {
        Request::LoadConversations
    }

    /// Open a conversation; its history replaces the current thread.
    pub fn select_conversation(&mut self, conversation_id: i64, user_id: i64) -> Request {
        self.active_conversation = Some(conversation_id);
        self.recipient_id = Some(user_id);
        Request::LoadMessages {
            seq: self.thread_seq.next(),
            conversation_id,
        }
    }

    /// Set the recipient for a message outside any existing conversation.
    pub fn set_recipient(&mut self, user_id: Option<i64>) {
        self.recipient_id = user_id;
    }

    fn reload_thread(&mut self) -> Option<Request> {
        let conversation_id = self.active_conversation?;
        Some(Request::LoadMessages {
            seq: self.thread_seq.next(),
            conversation_id,
        })
    }

    /// Append a message to the thread. No de-duplication is done.
    pub fn render_message(&mut self, message: &Message) {
        let attachments = message
            .attachments
            .iter()
            .map(|a| RenderedAttachment {
                id: a.id,
                name: a.name.clone(),
                size_label: a.size_label.clone(),
                kind: match &a.kind {
                    Some(label) => FileKind::from_type_label(label),
                    None => FileKind::from_extension(&extension_of(&a.name)),
                },
            })
            .collect();

        self.thread.push(RenderedMessage {
            id: message.id,
            sender: message.sender_display().to_string(),
            own: message.is_own(self.recipient_id),
            sent_at: display_timestamp(&message.sent_at),
            body: message.body.clone(),
            attachments,
        });
    }

    // Sending

    pub fn send_message(&mut self) -> Option<Request> {
        if self.sending {
            return None;
        }
        let Some(recipient_id) = self.recipient_id else {
            self.alerts.push(Alert::warning(MSG_NO_RECIPIENT));
            return None;
        };

        self.sending = true;
        Some(Request::SendMessage(OutgoingMessage {
            recipient_id,
            title: PRIVATE_MESSAGE_TITLE.to_string(),
            body: self.draft.clone(),
            attachments: self.pending.iter().map(|a| a.path.clone()).collect(),
        }))
    }

    fn reset_composer(&mut self) {
        self.draft.clear();
        self.pending.clear();
    }

    pub fn download_attachment(&self, attachment_id: i64, dest: PathBuf) -> Request {
        Request::DownloadAttachment { attachment_id, dest }
    }

    pub fn apply(&mut self, response: Response) -> Option<Request> {
        match response {
            Response::ConversationsLoaded(result) => {
                match result {
                    Ok(conversations) => self.conversations = conversations,
                    Err(e) => warn!("Conversation list failed to load: {e}"),
                }
                None
            }
            Response::MessagesLoaded { seq, result } => {
                if !self.thread_seq.is_current(seq) {
                    return None;
                }
                match result {
                    Ok(messages) => {
                        self.thread.clear();
                        for message in &messages {
                            self.render_message(message);
                        }
                    }
                    Err(e) => {
                        warn!("Messages failed to load: {e}");
                        let message = if e.is_server_failure() {
                            MSG_LOAD_FAILED
                        } else {
                            MSG_CONNECTION_FAILED
                        };
                        self.alerts.push(Alert::danger(message));
                    }
                }
                None
            }
            Response::MessageSent(result) => {
                self.sending = false;
                match result {
                    Ok(()) => {
                        self.reset_composer();
                        self.reload_thread()
                    }
                    Err(e) => {
                        warn!("Message send failed: {e}");
                        let message = if e.is_server_failure() {
                            MSG_SEND_FAILED
                        } else {
                            MSG_CONNECTION_FAILED
                        };
                        self.alerts.push(Alert::danger(message));
                        None
                    }
                }
            }
            Response::AttachmentDownloaded { attachment_id, result } => {
                match result {
                    Ok(path) => {
                        info!("Attachment {attachment_id} saved to {}", path.display());
                        self.alerts
                            .push(Alert::success(format!("Fichier enregistré : {}", path.display())));
                    }
                    Err(e) => {
                        warn!("Attachment {attachment_id} download failed: {e}");
                        self.alerts.push(Alert::danger("Erreur lors du téléchargement"));
                    }
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{AttachmentInfo, Participant};
    use crate::controllers::attachments::MAX_ATTACHMENT_BYTES;
    use crate::error::AppError;

    fn file(name: &str, size_bytes: u64) -> FileCandidate {
        FileCandidate {
            path: PathBuf::from(format!("/tmp/{name}")),
            name: name.to_string(),
            size_bytes,
        }
    }

    fn message(id: i64, sender_id: i64, attachments: Vec<AttachmentInfo>) -> Message {
        Message {
            id,
            sender: Some(Participant {
                id: Some(sender_id),
                name: format!("Utilisateur {sender_id}"),
            }),
            sender_name: None,
            sent_by_me: None,
            body: "Bonjour".to_string(),
            sent_at: "2024-01-02T10:00:00".to_string(),
            attachments,
        }
    }

    #[test]
    fn test_display_timestamp() {
        assert_eq!(display_timestamp("2024-01-02T10:00:00"), "02/01/2024 10:00");
        assert_eq!(display_timestamp("2024-01-02T10:00:00.123456"), "02/01/2024 10:00");
        assert_eq!(display_timestamp("hier"), "hier");
    }

    fn panel() -> MessagingPanel {
        MessagingPanel::new(AttachmentPolicy::default())
    }

    #[test]
    fn test_one_oversized_file_of_three() {
        let mut panel = panel();
        panel.select_attachments(vec![
            file("ordonnance.pdf", 200_000),
            file("radio.png", MAX_ATTACHMENT_BYTES + 1),
            file("facture.xlsx", 50_000),
        ]);

        assert_eq!(panel.pending().len(), 2);
        assert_eq!(panel.alerts().len(), 1);
        assert!(panel.alerts()[0].message.contains("radio.png"));
        assert!(panel.preview_visible());
        assert_eq!(panel.pending()[0].name, "ordonnance.pdf");
        assert_eq!(panel.pending()[1].name, "facture.xlsx");
    }

    #[test]
    fn test_same_file_twice_is_two_entries() {
        let mut panel = panel();
        panel.select_attachments(vec![file("a.txt", 10)]);
        panel.select_attachments(vec![file("a.txt", 10)]);

        assert_eq!(panel.pending().len(), 2);
        assert_ne!(panel.pending()[0].id, panel.pending()[1].id);

        let first = panel.pending()[0].id;
        assert!(panel.remove_attachment(first));
        assert_eq!(panel.pending().len(), 1);
        assert!(!panel.remove_attachment(first));
    }

    #[test]
    fn test_removing_last_hides_preview() {
        let mut panel = panel();
        panel.select_attachments(vec![file("a.txt", 10)]);
        let id = panel.pending()[0].id;
        panel.remove_attachment(id);
        assert!(!panel.preview_visible());
    }

    #[test]
    fn test_send_requires_recipient() {
        let mut panel = panel();
        panel.draft = "Bonjour".to_string();
        assert_eq!(panel.send_message(), None);
        assert_eq!(panel.alerts()[0].message, "Veuillez choisir un destinataire");
        assert!(!panel.is_sending());
    }

    #[test]
    fn test_send_builds_multipart_payload() {
        let mut panel = panel();
        panel.select_conversation(5, 12);
        panel.draft = "Voici les documents".to_string();
        panel.select_attachments(vec![file("a.pdf", 10), file("b.jpg", 20)]);

        let Some(Request::SendMessage(outgoing)) = panel.send_message() else {
            panic!("expected send request");
        };
        assert_eq!(outgoing.recipient_id, 12);
        assert_eq!(outgoing.title, PRIVATE_MESSAGE_TITLE);
        assert_eq!(outgoing.body, "Voici les documents");
        assert_eq!(
            outgoing.attachments,
            vec![PathBuf::from("/tmp/a.pdf"), PathBuf::from("/tmp/b.jpg")]
        );
        assert!(panel.is_sending());
        assert_eq!(panel.send_message(), None);
    }

    #[test]
    fn test_send_success_clears_composer_and_reloads_thread() {
        let mut panel = panel();
        panel.select_conversation(5, 12);
        panel.draft = "Bonjour".to_string();
        panel.select_attachments(vec![file("a.pdf", 10)]);
        panel.send_message();

        let follow_up = panel.apply(Response::MessageSent(Ok(())));
        assert!(matches!(
            follow_up,
            Some(Request::LoadMessages {
                conversation_id: 5,
                ..
            })
        ));
        assert!(panel.draft.is_empty());
        assert!(panel.pending().is_empty());
        assert!(!panel.preview_visible());
        assert!(!panel.is_sending());
    }

    #[test]
    fn test_send_failure_keeps_composer() {
        let mut panel = panel();
        panel.select_conversation(5, 12);
        panel.draft = "Bonjour".to_string();
        panel.select_attachments(vec![file("a.pdf", 10)]);
        panel.send_message();

        let follow_up = panel.apply(Response::MessageSent(Err(AppError::server("refus"))));
        assert_eq!(follow_up, None);
        assert_eq!(panel.draft, "Bonjour");
        assert_eq!(panel.pending().len(), 1);
        assert_eq!(panel.alerts()[0].message, "Erreur lors de l'envoi du message");
        assert!(!panel.is_sending());
    }

    #[test]
    fn test_render_is_append_only() {
        let mut panel = panel();
        panel.set_recipient(Some(12));
        let msg = message(1, 3, vec![]);
        panel.render_message(&msg);
        panel.render_message(&msg);

        assert_eq!(panel.thread().len(), 2);
        assert!(panel.thread()[0].own);
        assert_eq!(panel.thread()[0].sender, "Utilisateur 3");
    }

    #[test]
    fn test_render_attachment_rows() {
        let mut panel = panel();
        panel.set_recipient(Some(3));
        panel.render_message(&message(
            1,
            3,
            vec![
                AttachmentInfo {
                    id: 8,
                    name: "ordonnance.pdf".to_string(),
                    size_label: "1.2 Mo".to_string(),
                    kind: None,
                },
                AttachmentInfo {
                    id: 9,
                    name: "photo".to_string(),
                    size_label: "300 Ko".to_string(),
                    kind: Some("Image".to_string()),
                },
            ],
        ));

        let rendered = &panel.thread()[0];
        assert!(!rendered.own);
        assert_eq!(rendered.attachments.len(), 2);
        assert_eq!(rendered.attachments[0].kind, FileKind::Pdf);
        assert_eq!(rendered.attachments[1].kind, FileKind::Image);
    }

    #[test]
    fn test_select_conversation_replaces_thread() {
        let mut panel = panel();
        let Request::LoadMessages { seq, .. } = panel.select_conversation(5, 12) else {
            panic!("expected load request");
        };
        panel.apply(Response::MessagesLoaded {
            seq,
            result: Ok(vec![message(1, 12, vec![]), message(2, 3, vec![])]),
        });
        assert_eq!(panel.thread().len(), 2);

        let Request::LoadMessages { seq, .. } = panel.select_conversation(6, 20) else {
            panic!("expected load request");
        };
        panel.apply(Response::MessagesLoaded {
            seq,
            result: Ok(vec![message(10, 20, vec![])]),
        });
        assert_eq!(panel.thread().len(), 1);
        assert_eq!(panel.thread()[0].id, 10);
        assert_eq!(panel.recipient_id(), Some(20));
    }

    #[test]
    fn test_late_thread_for_previous_conversation_ignored() {
        let mut panel = panel();
        let Request::LoadMessages { seq: old, .. } = panel.select_conversation(5, 12) else {
            panic!("expected load request");
        };
        let Request::LoadMessages { seq: new, .. } = panel.select_conversation(6, 20) else {
            panic!("expected load request");
        };

        panel.apply(Response::MessagesLoaded {
            seq: new,
            result: Ok(vec![message(10, 20, vec![])]),
        });
        panel.apply(Response::MessagesLoaded {
            seq: old,
            result: Ok(vec![message(1, 12, vec![]), message(2, 12, vec![])]),
        });

        assert_eq!(panel.thread().len(), 1);
        assert_eq!(panel.active_conversation(), Some(6));
    }

    #[test]
    fn test_thread_load_failure_reported_and_thread_kept() {
        let mut panel = panel();
        let Request::LoadMessages { seq, .. } = panel.select_conversation(5, 12) else {
            panic!("expected load request");
        };
        panel.apply(Response::MessagesLoaded {
            seq,
            result: Ok(vec![message(1, 12, vec![])]),
        });

        let Request::LoadMessages { seq, .. } = panel.select_conversation(5, 12) else {
            panic!("expected load request");
        };
        panel.apply(Response::MessagesLoaded {
            seq,
            result: Err(AppError::server("Conversation introuvable")),
        });

        assert_eq!(panel.thread().len(), 1);
        assert_eq!(panel.alerts().len(), 1);
        assert_eq!(panel.alerts()[0].message, "Erreur lors du chargement des messages");
    }
}
