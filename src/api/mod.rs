//! Typed client for the mutuelle server REST API.

pub mod client;
pub mod models;

pub use client::ApiClient;
pub use models::{
    AttachmentInfo, ConversationSummary, DailyStats, Doctor, DuesStatus, IssuedVoucher, MemberPage, MemberSummary,
    Message, NewVoucher, OutgoingMessage, Participant,
};
