//! Wire models for the mutuelle REST endpoints.
//!
//! Field names on the wire are French; the Rust side uses English names with
//! `serde(rename)`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// Accept a JSON string, number or null as a display string.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn first_page() -> u32 {
    1
}

/// Member row returned by search and list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberSummary {
    pub id: i64,
    #[serde(rename = "nom_complet")]
    pub full_name: String,
    #[serde(rename = "numero", default, deserialize_with = "string_or_number")]
    pub member_number: String,
    #[serde(rename = "telephone", default, deserialize_with = "string_or_number")]
    pub phone: String,
    #[serde(rename = "date_inscription", default, deserialize_with = "string_or_number")]
    pub registration_date: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MemberSearchResponse {
    #[serde(default)]
    pub membres: Vec<MemberSummary>,
}

/// One page of the member listing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MemberPage {
    #[serde(rename = "membres", default)]
    pub members: Vec<MemberSummary>,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub total_pages: Option<u32>,
}

/// Dues verification result.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DuesStatus {
    #[serde(rename = "est_a_jour")]
    pub up_to_date: bool,
    /// Next due date when up to date, last due date otherwise.
    #[serde(rename = "prochaine_echeance", default)]
    pub due_date: Option<String>,
}

/// Doctor selectable on a voucher.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Doctor {
    pub id: i64,
    #[serde(rename = "nom")]
    pub name: String,
    #[serde(rename = "specialite", default, deserialize_with = "string_or_number")]
    pub specialty: String,
}

impl Doctor {
    /// Label shown in the doctor selector and on the confirmation.
    pub fn label(&self) -> String {
        format!("Dr. {} - {}", self.name, self.specialty)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DoctorListResponse {
    #[serde(default)]
    pub medecins: Vec<Doctor>,
}

/// Daily voucher counters for the logged-in agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DailyStats {
    #[serde(rename = "bons_du_jour")]
    pub vouchers_today: u32,
    #[serde(rename = "limite_restante")]
    pub remaining_quota: i64,
}

/// Voucher creation payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewVoucher {
    #[serde(rename = "membre_id")]
    pub member_id: i64,
    #[serde(rename = "montant_max")]
    pub max_amount: String,
    #[serde(rename = "motif")]
    pub reason: String,
    #[serde(rename = "medecin_id")]
    pub doctor_id: i64,
}

/// Voucher issued by the server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IssuedVoucher {
    pub code: String,
    #[serde(rename = "date_expiration", default, deserialize_with = "string_or_number")]
    pub expires_on: String,
    #[serde(rename = "montant_max", default, deserialize_with = "string_or_number")]
    pub max_amount: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VoucherCreationResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub bon_soin: Option<IssuedVoucher>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NotificationCountResponse {
    #[serde(default)]
    pub count: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UnreadCountResponse {
    #[serde(default)]
    pub unread_count: u32,
}

/// Conversation participant.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Participant {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "nom", default)]
    pub name: String,
}

/// Conversation row in the messaging side list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConversationSummary {
    pub id: i64,
    #[serde(rename = "autre_participant")]
    pub peer: Participant,
    #[serde(rename = "dernier_message", default)]
    pub last_message: String,
    #[serde(rename = "dernier_message_date", default)]
    pub last_message_at: Option<String>,
    #[serde(rename = "nb_messages_non_lus", default)]
    pub unread: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConversationListResponse {
    #[serde(default)]
    pub conversations: Vec<ConversationSummary>,
}

/// File attached to a received message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AttachmentInfo {
    pub id: i64,
    #[serde(rename = "nom", alias = "nom_original")]
    pub name: String,
    #[serde(rename = "taille", alias = "get_taille_lisible", default)]
    pub size_label: String,
    #[serde(rename = "type_fichier", default)]
    pub kind: Option<String>,
}

/// Message as returned by the conversation endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Message {
    pub id: i64,
    #[serde(rename = "expediteur", default)]
    pub sender: Option<Participant>,
    #[serde(rename = "expediteur_nom", default)]
    pub sender_name: Option<String>,
    #[serde(rename = "est_expediteur", default)]
    pub sent_by_me: Option<bool>,
    #[serde(rename = "contenu", default)]
    pub body: String,
    #[serde(rename = "date_envoi", default)]
    pub sent_at: String,
    #[serde(rename = "pieces_jointes", default)]
    pub attachments: Vec<AttachmentInfo>,
}

impl Message {
    /// Display name of the sender, whichever shape the server used.
    pub fn sender_display(&self) -> &str {
        self.sender_name
            .as_deref()
            .or(self.sender.as_ref().map(|s| s.name.as_str()))
            .unwrap_or("")
    }

    /// Whether the message was written by the current user.
    ///
    /// Falls back to comparing the sender with the conversation peer when the
    /// server does not flag it.
    pub fn is_own(&self, peer_id: Option<i64>) -> bool {
        match self.sent_by_me {
            Some(flag) => flag,
            None => match (self.sender.as_ref().and_then(|s| s.id), peer_id) {
                (Some(sender), Some(peer)) => sender != peer,
                _ => false,
            },
        }
    }
}

/// Conversation history. The server answers 200 with an `error` field when
/// it could not load the messages.
#[derive(Debug, Deserialize)]
pub(crate) struct MessageListResponse {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub error: Option<String>,
}

impl MessageListResponse {
    pub(crate) fn into_messages(self) -> crate::error::Result<Vec<Message>> {
        match self.error {
            Some(error) => Err(crate::error::AppError::server(error)),
            None => Ok(self.messages),
        }
    }
}

/// Outgoing private message.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMessage {
    pub recipient_id: i64,
    pub title: String,
    pub body: String,
    pub attachments: Vec<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SendMessageResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}
